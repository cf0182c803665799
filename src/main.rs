//! Purpose: `waitforservice` CLI entry point.
//! Role: Binary crate root; parses args, waits for a matching property, prints it on stdout.
//! Invariants: stdout carries only the match line; logs and errors go to stderr.
//! Invariants: Zero patterns prints usage on stderr and exits 1 before any backend work.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::error::Error as StdError;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::{Shell, generate};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use waitforservice::api::{
    DEFAULT_BIONIC_LIBC, DEFAULT_HYBRIS_LIB, DEFAULT_PROPERTIES_LIB, DEFAULT_READY_MARKER, Error,
    ErrorKind, Matcher, NativeBackend, NativeLibraries, PropertyMatch, ReadinessGate,
    resolve_target, to_exit_code, wait_for_match,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                return Ok(RunOutcome::ok());
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `waitforservice --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        generate(shell, &mut command, "waitforservice", &mut io::stdout());
        return Ok(RunOutcome::ok());
    }

    if cli.patterns.is_empty() {
        eprintln!("{}", Cli::command().render_usage());
        return Ok(RunOutcome::with_code(to_exit_code(ErrorKind::Usage)));
    }

    init_tracing();

    let matcher =
        Matcher::new(&cli.patterns, resolve_target(cli.value)).map_err(|err| (err, color_mode))?;
    let gate = ReadinessGate::new(cli.ready_marker);
    let libraries = NativeLibraries {
        hybris: cli.hybris_lib,
        properties: cli.properties_lib,
        bionic_libc: cli.bionic_libc,
    };

    let found = wait_for_match(&gate, || NativeBackend::bind(&libraries), matcher)
        .map_err(|err| (err, color_mode))?;
    emit_match(&found, cli.format).map_err(|err| (err, color_mode))?;
    Ok(RunOutcome::ok())
}

#[derive(Parser)]
#[command(
    name = "waitforservice",
    version,
    about = "Wait until an Android system property matching a pattern reaches a value",
    override_usage = "waitforservice [OPTIONS] PATTERN [PATTERN ...]",
    long_about = None,
    before_help = r#"Blocks until at least one property whose name matches any PATTERN has the
target value (default: `running`), prints `<key>: <value>`, and exits 0.
PATTERNs are shell globs (`*`, `?`, `[...]`); backslash is not an escape.
There is no timeout; wrap the command with `timeout(1)` if you need one."#,
    after_help = r#"EXAMPLES
  $ waitforservice init.svc.vendor.hwcomposer-2-1 'init.svc.vendor.hwcomposer-2-*'
  init.svc.vendor.hwcomposer-2-1: running

  $ WAITFORSERVICE_VALUE=1 waitforservice sys.boot_completed
  sys.boot_completed: 1

ENVIRONMENT
  WAITFORSERVICE_VALUE  target value when --value is not given
  RUST_LOG              log filter for stderr diagnostics (default: warn)"#
)]
struct Cli {
    #[arg(value_name = "PATTERN", help = "Glob matched against property names")]
    patterns: Vec<String>,
    #[arg(
        long,
        value_name = "VALUE",
        help = "Value a matching property must equal (default: $WAITFORSERVICE_VALUE, then `running`)"
    )]
    value: Option<String>,
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_READY_MARKER,
        help = "Path whose existence means the property service is up",
        value_hint = ValueHint::AnyPath
    )]
    ready_marker: PathBuf,
    #[arg(
        long,
        value_enum,
        default_value = "text",
        help = "Output format for the matched property"
    )]
    format: OutputFormat,
    #[arg(
        long,
        value_enum,
        default_value = "auto",
        help = "Colorize human-readable errors"
    )]
    color: ColorMode,
    #[arg(
        long,
        value_enum,
        value_name = "SHELL",
        help = "Print a shell completion script and exit"
    )]
    completions: Option<Shell>,
    #[arg(long, hide = true, default_value = DEFAULT_HYBRIS_LIB)]
    hybris_lib: String,
    #[arg(long, hide = true, default_value = DEFAULT_PROPERTIES_LIB)]
    properties_lib: String,
    #[arg(long, hide = true, default_value = DEFAULT_BIONIC_LIBC)]
    bionic_libc: String,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn render_match(found: &PropertyMatch, format: OutputFormat) -> Result<String, Error> {
    match format {
        OutputFormat::Text => Ok(format!("{}: {}", found.key, found.value)),
        OutputFormat::Json => serde_json::to_string(found).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode match")
                .with_source(err)
        }),
    }
}

fn emit_match(found: &PropertyMatch, format: OutputFormat) -> Result<(), Error> {
    let line = render_match(found, format)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")
        .and_then(|()| stdout.flush())
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write match to stdout")
                .with_source(err)
        })
}

enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
