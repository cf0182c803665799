//! Purpose: Decide whether a property satisfies the caller's patterns and target value.
//! Exports: `Matcher`, `evaluate`, `DEFAULT_TARGET`.
//! Role: Pure predicate applied to every snapshot entry by the wait loop.
//! Invariants: Value comparison is exact and case-sensitive.
//! Invariants: Patterns are tried in argument order and the first hit wins.

use crate::core::error::{Error, ErrorKind};
use crate::core::glob::{self, GlobPattern};

pub const DEFAULT_TARGET: &str = "running";

/// Compiled pattern set plus target value.
#[derive(Clone, Debug)]
pub struct Matcher {
    patterns: Vec<GlobPattern>,
    target: String,
}

impl Matcher {
    /// An empty pattern set can never match, so it is rejected as a usage error.
    pub fn new<I, S>(patterns: I, target: impl Into<String>) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<GlobPattern> = patterns
            .into_iter()
            .map(|pattern| GlobPattern::new(pattern.as_ref()))
            .collect();
        if patterns.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("at least one pattern is required"));
        }
        Ok(Self {
            patterns,
            target: target.into(),
        })
    }

    pub fn patterns(&self) -> &[GlobPattern] {
        &self.patterns
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Index of the first pattern that accepts `(key, value)`.
    pub fn first_match(&self, key: &str, value: &str) -> Option<usize> {
        if value != self.target {
            return None;
        }
        self.patterns.iter().position(|pattern| pattern.matches(key))
    }

    pub fn evaluate(&self, key: &str, value: &str) -> bool {
        self.first_match(key, value).is_some()
    }
}

/// Uncompiled form of [`Matcher::evaluate`].
pub fn evaluate<S: AsRef<str>>(patterns: &[S], target: &str, key: &str, value: &str) -> bool {
    value == target
        && patterns
            .iter()
            .any(|pattern| glob::matches(pattern.as_ref(), key))
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_TARGET, Matcher, evaluate};
    use crate::core::error::ErrorKind;
    use crate::core::glob;

    #[test]
    fn requires_glob_and_exact_value() {
        let cases = [
            ("foo.bar", "foo.bar", "running", true),
            ("foo.bar", "foo.bar", "stopped", false),
            ("foo.bar", "foo.bar", "Running", false),
            ("foo.bar", "foo.bar", "running ", false),
            ("foo.bar", "foo.bar", "runn", false),
            ("svc.*", "svc.b", "running", true),
            ("svc.*", "other.b", "running", false),
            ("init.svc.vendor.hwcomposer-2-*", "init.svc.vendor.hwcomposer-2-1", "running", true),
        ];
        for (pattern, key, value, expected) in cases {
            assert_eq!(
                evaluate(&[pattern], DEFAULT_TARGET, key, value),
                expected,
                "pattern={pattern} key={key} value={value}"
            );
            assert_eq!(
                evaluate(&[pattern], DEFAULT_TARGET, key, value),
                glob::matches(pattern, key) && value == DEFAULT_TARGET
            );
        }
    }

    #[test]
    fn evaluation_is_repeatable() {
        let matcher = Matcher::new(["x.*"], "ready").expect("matcher");
        for _ in 0..4 {
            assert!(matcher.evaluate("x.y", "ready"));
            assert!(!matcher.evaluate("x.y", "running"));
        }
    }

    #[test]
    fn first_matching_pattern_wins() {
        let matcher = Matcher::new(["a.c", "a.*", "*"], DEFAULT_TARGET).expect("matcher");
        assert_eq!(matcher.first_match("a.c", "running"), Some(0));
        assert_eq!(matcher.first_match("a.b", "running"), Some(1));
        assert_eq!(matcher.first_match("z", "running"), Some(2));
        assert_eq!(matcher.first_match("z", "stopped"), None);
    }

    #[test]
    fn custom_target_replaces_default() {
        let matcher = Matcher::new(["sys.boot_completed"], "1").expect("matcher");
        assert_eq!(matcher.target(), "1");
        assert!(matcher.evaluate("sys.boot_completed", "1"));
        assert!(!matcher.evaluate("sys.boot_completed", "running"));
    }

    #[test]
    fn empty_target_matches_only_empty_values() {
        let matcher = Matcher::new(["k"], "").expect("matcher");
        assert!(matcher.evaluate("k", ""));
        assert!(!matcher.evaluate("k", "running"));
    }

    #[test]
    fn empty_pattern_set_is_usage_error() {
        let err = Matcher::new(Vec::<String>::new(), DEFAULT_TARGET).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
