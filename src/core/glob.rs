//! Purpose: Shell-style glob matching for property keys.
//! Exports: `GlobPattern`, `matches`.
//! Role: Leaf of the matching policy; compiled once per pattern and reused on every scan.
//! Invariants: Backslash is an ordinary character (no-escape mode).
//! Invariants: `*` and `?` also match `/` and a leading `.`; no pathname or period rules.
//! Invariants: Compilation never fails; odd constructs degrade to literals or "no match".

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum NamedClass {
    Alnum,
    Alpha,
    Blank,
    Cntrl,
    Digit,
    Graph,
    Lower,
    Print,
    Punct,
    Space,
    Upper,
    Xdigit,
}

impl NamedClass {
    fn from_name(name: &str) -> Option<Self> {
        let class = match name {
            "alnum" => Self::Alnum,
            "alpha" => Self::Alpha,
            "blank" => Self::Blank,
            "cntrl" => Self::Cntrl,
            "digit" => Self::Digit,
            "graph" => Self::Graph,
            "lower" => Self::Lower,
            "print" => Self::Print,
            "punct" => Self::Punct,
            "space" => Self::Space,
            "upper" => Self::Upper,
            "xdigit" => Self::Xdigit,
            _ => return None,
        };
        Some(class)
    }

    // C locale semantics.
    fn contains(self, c: char) -> bool {
        match self {
            Self::Alnum => c.is_ascii_alphanumeric(),
            Self::Alpha => c.is_ascii_alphabetic(),
            Self::Blank => c == ' ' || c == '\t',
            Self::Cntrl => c.is_ascii_control(),
            Self::Digit => c.is_ascii_digit(),
            Self::Graph => c.is_ascii_graphic(),
            Self::Lower => c.is_ascii_lowercase(),
            Self::Print => c.is_ascii_graphic() || c == ' ',
            Self::Punct => c.is_ascii_punctuation(),
            Self::Space => c.is_ascii_whitespace() || c == '\u{0b}',
            Self::Upper => c.is_ascii_uppercase(),
            Self::Xdigit => c.is_ascii_hexdigit(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum ClassItem {
    Char(char),
    Range(char, char),
    Named(NamedClass),
}

impl ClassItem {
    fn contains(&self, c: char) -> bool {
        match *self {
            ClassItem::Char(item) => item == c,
            ClassItem::Range(lo, hi) => lo <= c && c <= hi,
            ClassItem::Named(class) => class.contains(c),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct CharClass {
    negated: bool,
    items: Vec<ClassItem>,
}

impl CharClass {
    fn contains(&self, c: char) -> bool {
        let hit = self.items.iter().any(|item| item.contains(c));
        hit != self.negated
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    Literal(char),
    AnyChar,
    AnyRun,
    Class(CharClass),
}

impl Token {
    fn matches_char(&self, c: char) -> bool {
        match self {
            Token::Literal(expected) => *expected == c,
            Token::AnyChar => true,
            Token::AnyRun => false,
            Token::Class(class) => class.contains(c),
        }
    }
}

/// A compiled glob pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
    tokens: Vec<Token>,
}

impl fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobPattern")
            .field("source", &self.source)
            .finish()
    }
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            tokens: compile(pattern),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        match_tokens(&self.tokens, &text)
    }
}

/// One-off match without keeping the compiled pattern.
pub fn matches(pattern: &str, text: &str) -> bool {
    GlobPattern::new(pattern).matches(text)
}

fn compile(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::with_capacity(chars.len());
    let mut idx = 0;

    while idx < chars.len() {
        match chars[idx] {
            '*' => {
                if tokens.last() != Some(&Token::AnyRun) {
                    tokens.push(Token::AnyRun);
                }
                idx += 1;
            }
            '?' => {
                tokens.push(Token::AnyChar);
                idx += 1;
            }
            '[' => match parse_bracket(&chars, idx) {
                Some((class, next)) => {
                    tokens.push(Token::Class(class));
                    idx = next;
                }
                None => {
                    tokens.push(Token::Literal('['));
                    idx += 1;
                }
            },
            c => {
                tokens.push(Token::Literal(c));
                idx += 1;
            }
        }
    }

    tokens
}

// Returns the class and the index just past the closing `]`, or `None` when unterminated.
fn parse_bracket(chars: &[char], open: usize) -> Option<(CharClass, usize)> {
    let mut idx = open + 1;
    let mut class = CharClass {
        negated: false,
        items: Vec::new(),
    };

    if matches!(chars.get(idx), Some('!') | Some('^')) {
        class.negated = true;
        idx += 1;
    }

    let mut first = true;
    loop {
        let c = *chars.get(idx)?;

        if c == ']' && !first {
            return Some((class, idx + 1));
        }
        first = false;

        if c == '[' {
            if let Some(&delim @ (':' | '.' | '=')) = chars.get(idx + 1) {
                if let Some(close) = find_bracket_term(chars, idx + 2, delim) {
                    let inner = &chars[idx + 2..close];
                    push_bracket_term(&mut class, delim, inner);
                    idx = close + 2;
                    continue;
                }
            }
        }

        match (chars.get(idx + 1), chars.get(idx + 2)) {
            (Some('-'), Some(&hi)) if hi != ']' => {
                class.items.push(ClassItem::Range(c, hi));
                idx += 3;
            }
            _ => {
                class.items.push(ClassItem::Char(c));
                idx += 1;
            }
        }
    }
}

// `[:name:]` adds a named class; `[.c.]` and `[=c=]` add the single character `c`.
// Unknown names and multi-character elements add nothing, leaving the rest of the bracket intact.
fn push_bracket_term(class: &mut CharClass, delim: char, inner: &[char]) {
    match delim {
        ':' => {
            let name: String = inner.iter().collect();
            if let Some(named) = NamedClass::from_name(&name) {
                class.items.push(ClassItem::Named(named));
            }
        }
        _ => {
            if let [c] = inner {
                class.items.push(ClassItem::Char(*c));
            }
        }
    }
}

fn find_bracket_term(chars: &[char], start: usize, delim: char) -> Option<usize> {
    (start..chars.len().saturating_sub(1)).find(|&i| chars[i] == delim && chars[i + 1] == ']')
}

fn match_tokens(tokens: &[Token], text: &[char]) -> bool {
    let mut t = 0;
    let mut s = 0;
    // Last `*` seen and the text position it currently absorbs up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while s < text.len() {
        if let Some(token) = tokens.get(t) {
            if *token == Token::AnyRun {
                backtrack = Some((t, s));
                t += 1;
                continue;
            }
            if token.matches_char(text[s]) {
                t += 1;
                s += 1;
                continue;
            }
        }
        match backtrack {
            Some((star, absorbed)) => {
                t = star + 1;
                s = absorbed + 1;
                backtrack = Some((star, absorbed + 1));
            }
            None => return false,
        }
    }

    tokens[t..].iter().all(|token| *token == Token::AnyRun)
}
