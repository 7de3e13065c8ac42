//! CLI parsing and configuration module
//!
//! The command line is split at the first `--` into driver arguments and
//! program arguments. Driver arguments are parsed with clap; unknown options
//! and options missing their value are reported and dropped instead of
//! aborting the run.

use clap::Parser as CliParser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use log::warn;
use std::ffi::OsString;
use std::path::PathBuf;

/// Longest accepted `-D` definition, `=` excluded.
pub const MAX_DEFINE_LEN: usize = 1024;

/// Token that separates driver arguments from program arguments.
pub const SEPARATOR: &str = "--";

/// CLI interface using clap
#[derive(CliParser, Debug, Default, Clone)]
#[command(
    name = "cjit",
    about = "Run C source on the fly",
    override_usage = "cjit [options] files(*) -- app arguments",
    after_help = "(*) can be any source (.c) or built object (dll, dylib, .so)",
    disable_version_flag = true,
    args_override_self = true
)]
pub struct Cli {
    /// Stay quiet and only print errors and output
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Print version information
    #[arg(short = 'v')]
    pub version: bool,

    /// Define a macro symbol or key=value
    #[arg(short = 'D', value_name = "SYM", action = clap::ArgAction::Append)]
    pub defines: Vec<String>,

    /// Set compiler flags (default from env var CFLAGS)
    #[arg(short = 'C', value_name = "FLAGS", allow_hyphen_values = true, action = clap::ArgAction::Append)]
    pub cflags: Vec<String>,

    /// Also search folder 'dir' for header files
    #[arg(short = 'I', value_name = "DIR", action = clap::ArgAction::Append)]
    pub include_paths: Vec<PathBuf>,

    /// Search the library named 'lib' when linking
    #[arg(short = 'l', value_name = "LIB", action = clap::ArgAction::Append)]
    pub libraries: Vec<String>,

    /// Also search inside folder 'dir' for -l libs
    #[arg(short = 'L', value_name = "DIR", action = clap::ArgAction::Append)]
    pub library_paths: Vec<PathBuf>,

    /// Entry point function (default 'main')
    #[arg(short = 'e', value_name = "FUN")]
    pub entry: Option<String>,

    /// Write pid of executed program to file
    #[arg(short = 'p', value_name = "FILE")]
    pub pid_file: Option<PathBuf>,

    /// Compile a single source file, do not execute
    #[arg(short = 'c')]
    pub compile_only: bool,

    /// Compile to an 'exe' file, do not execute
    #[arg(short = 'o', value_name = "EXE")]
    pub output: Option<PathBuf>,

    /// Run interactive editor for live coding
    #[arg(long)]
    pub live: bool,

    /// Create the runtime temporary dir and exit
    #[arg(long)]
    pub temp: bool,

    /// Extract all contents from a USTAR tar.gz
    #[arg(long, value_name = "ARCHIVE")]
    pub xtgz: Option<PathBuf>,

    /// Extract source code to cjit_source
    #[arg(long, hide = !cfg!(feature = "selfhost"))]
    pub src: bool,

    /// Toolchain options accepted for compatibility and ignored
    #[arg(short = 'f', short_aliases = ['W', 'O', 'U', 'M', 'm'], hide = true, action = clap::ArgAction::Append)]
    pub tolerated: Vec<String>,

    /// Toolchain switches accepted for compatibility and ignored
    #[arg(short = 'g', short_aliases = ['E', 'S'], hide = true, action = clap::ArgAction::Count)]
    pub tolerated_switches: u8,

    /// Source files, objects or libraries; `-` reads code from standard input
    #[arg(value_name = "FILES", value_parser = clap::value_parser!(OsString))]
    pub files: Vec<OsString>,
}

/// The command line split at the first bare `--`.
///
/// Arguments stay `OsString` so program arguments reach the child byte for
/// byte.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArgPartition {
    /// Arguments left of the separator, program name excluded.
    pub driver: Vec<OsString>,
    /// Arguments right of the separator, forwarded to the program.
    pub program: Vec<OsString>,
    /// Position of the separator in the full argument vector.
    pub separator: Option<usize>,
}

impl ArgPartition {
    /// Split a full argument vector (`argv[0]` included).
    pub fn split(argv: &[OsString]) -> Self {
        let args = argv.get(1..).unwrap_or_default();
        match args.iter().position(|arg| arg == SEPARATOR) {
            Some(pos) => ArgPartition {
                driver: args[..pos].to_vec(),
                program: args[pos + 1..].to_vec(),
                separator: Some(pos + 1),
            },
            None => ArgPartition {
                driver: args.to_vec(),
                program: Vec::new(),
                separator: None,
            },
        }
    }
}

/// Errors in a `-D` definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefineError {
    #[error("Invalid char used in -D define symbol: {0}")]
    InvalidChar(String),

    #[error("Equal sign used twice in -D define symbol: {0}")]
    DuplicateEquals(String),

    #[error("Missing name in -D define symbol: {0}")]
    EmptyName(String),

    #[error("-D define symbol longer than {MAX_DEFINE_LEN} characters")]
    TooLong,
}

/// Split a `-D` argument into its macro name and optional value.
///
/// Names and values may only hold ASCII alphanumerics and underscores, with a
/// single `=` between them.
pub fn parse_define(arg: &str) -> Result<(&str, Option<&str>), DefineError> {
    let mut equals = None;
    let mut len = 0;

    for (i, ch) in arg.char_indices() {
        if ch == '=' {
            if equals.is_some() {
                return Err(DefineError::DuplicateEquals(arg.to_string()));
            }
            equals = Some(i);
            continue;
        }
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(DefineError::InvalidChar(arg.to_string()));
        }
        len += 1;
        if len > MAX_DEFINE_LEN {
            return Err(DefineError::TooLong);
        }
    }

    let (key, value) = match equals {
        Some(i) => (&arg[..i], Some(&arg[i + 1..])),
        None => (arg, None),
    };
    if key.is_empty() {
        return Err(DefineError::EmptyName(arg.to_string()));
    }
    Ok((key, value))
}

/// Result of parsing the command line.
#[derive(Debug, Clone)]
pub struct ParsedArgs {
    pub cli: Cli,
    pub partition: ArgPartition,
    /// Tokens dropped because clap could not make sense of them.
    pub skipped: Vec<OsString>,
}

/// Short options that never take a value, so they may share a cluster.
const SWITCHES: &[char] = &['q', 'v', 'c', 'g', 'E', 'S', 'h'];

/// Parse a full argument vector, dropping bad options one at a time.
///
/// Any error naming a single offending option drops that option and parsing
/// starts over. Other errors (help requests) are handed back to the caller.
pub fn parse_args(argv: &[OsString]) -> Result<ParsedArgs, clap::Error> {
    let partition = ArgPartition::split(argv);
    let program_name = argv.first().cloned().unwrap_or_else(|| OsString::from("cjit"));
    let mut args: Vec<OsString> = std::iter::once(program_name)
        .chain(partition.driver.iter().cloned())
        .collect();
    let mut skipped = Vec::new();

    loop {
        match Cli::try_parse_from(&args) {
            Ok(cli) => {
                return Ok(ParsedArgs {
                    cli,
                    partition,
                    skipped,
                });
            }
            Err(err) => {
                let Some((index, reason)) = offending_token(&err, &args) else {
                    return Err(err);
                };
                let token = args.remove(index);
                warn!("{}: {}", reason, token.to_string_lossy());
                skipped.push(token);
            }
        }
    }
}

/// Locate the token clap choked on, if the error names one.
fn offending_token(err: &clap::Error, args: &[OsString]) -> Option<(usize, &'static str)> {
    let reason = match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            return None;
        }
        ErrorKind::UnknownArgument => "unknown opt",
        ErrorKind::InvalidValue | ErrorKind::NoEquals => "missing arg",
        _ => "bad opt",
    };
    let ContextValue::String(invalid) = err.get(ContextKind::InvalidArg)? else {
        return None;
    };
    // missing values are reported as "-I <DIR>"
    let flag = invalid.split_whitespace().next()?;
    let with_value = format!("{}=", flag);

    let exact = args
        .iter()
        .skip(1)
        .rposition(|arg| arg == flag || arg.to_string_lossy().starts_with(&with_value));
    let index = match exact {
        Some(pos) => pos,
        None => {
            let letter = short_letter(flag)?;
            args.iter()
                .skip(1)
                .rposition(|arg| cluster_reaches(&arg.to_string_lossy(), letter))?
        }
    };
    Some((index + 1, reason))
}

/// `-x` gives `x`.
fn short_letter(flag: &str) -> Option<char> {
    let mut chars = flag.strip_prefix('-')?.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter != '-' => Some(letter),
        _ => None,
    }
}

/// Whether `arg` is a cluster of switches that gets as far as `letter`.
fn cluster_reaches(arg: &str, letter: char) -> bool {
    let Some(body) = arg.strip_prefix('-') else {
        return false;
    };
    if body.starts_with('-') {
        return false;
    }
    for ch in body.chars() {
        if ch == letter {
            return true;
        }
        if !SWITCHES.contains(&ch) {
            return false;
        }
    }
    false
}
