//! Core compilation pipeline orchestration module
//!
//! [`Driver`] takes the raw command line through option parsing, session
//! setup, one of the run modes and the terminal action, and funnels every
//! outcome through a single teardown before turning it into an exit code.

use log::{error, info, warn};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::archive::{self, ArchiveError};
use crate::assets;
use crate::backend::{Backend, BackendError, CcBackend, OutputType};
use crate::exec::{ExecError, Executor, IsolatedExecutor};
use crate::input::{Input, StdInput};
use crate::repl;

use super::cli::{self, DefineError, ParsedArgs};
use super::session::{CFLAGS_VAR, Session};

/// Argument meaning "read code from standard input here".
pub const STDIN_ARG: &str = "-";

/// Object file name used when `-c` compiles standard input without `-o`.
pub const DEFAULT_OBJECT: &str = "a.o";

/// The interactive front end: runs until the user leaves, returns a status.
pub type LiveFn<B> = fn(&mut Session<B>, &mut dyn Executor, &[OsString]) -> Result<i32, DriverError>;

/// How the sources reach the compiler handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Interactive editing on a terminal.
    Live,
    /// The whole of standard input is one translation unit.
    StdinScript,
    /// One source compiled to one object file.
    CompileToObject,
    /// Positional arguments ingested left to right.
    FileBatch,
}

impl Mode {
    /// Pick the run mode once parsing is done.
    ///
    /// Terminal detection alone decides between live and stdin when no
    /// positional arguments are given.
    pub fn select(live: bool, positional: usize, stdin_is_terminal: bool, output: OutputType) -> Mode {
        if live || (positional == 0 && stdin_is_terminal) {
            Mode::Live
        } else if positional == 0 {
            Mode::StdinScript
        } else if output == OutputType::Object {
            Mode::CompileToObject
        } else {
            Mode::FileBatch
        }
    }
}

/// Main compiler driver
pub struct Driver<B: Backend, I: Input, X: Executor> {
    backend: B,
    input: I,
    executor: X,
    live: LiveFn<B>,
    cflags: Option<String>,
}

impl Driver<CcBackend, StdInput, IsolatedExecutor> {
    /// Driver wired to the system toolchain, the real stdin and child processes.
    pub fn from_env() -> Self {
        Driver::new(CcBackend::new(), StdInput, IsolatedExecutor).with_cflags(std::env::var(CFLAGS_VAR).ok())
    }
}

impl<B: Backend, I: Input, X: Executor> Driver<B, I, X> {
    pub fn new(backend: B, input: I, executor: X) -> Self {
        Driver {
            backend,
            input,
            executor,
            live: repl::run::<B>,
            cflags: None,
        }
    }

    /// Baseline compiler options, overridden by `-C`.
    pub fn with_cflags(mut self, cflags: Option<String>) -> Self {
        self.cflags = cflags;
        self
    }

    /// Replace the interactive front end.
    pub fn with_live(mut self, live: LiveFn<B>) -> Self {
        self.live = live;
        self
    }

    /// Run one invocation and return the process exit code.
    pub fn run(self, argv: &[OsString]) -> i32 {
        let parsed = match cli::parse_args(argv) {
            Ok(parsed) => parsed,
            Err(err) => return report_usage(err),
        };
        crate::logger::set_quiet(parsed.cli.quiet);

        let Driver {
            backend,
            mut input,
            mut executor,
            live,
            cflags,
        } = self;

        let mut session = match Session::new(backend, cflags.as_deref()) {
            Ok(session) => session,
            Err(e) => {
                report(&e);
                return e.exit_code();
            }
        };

        let result = run_session(&mut session, &parsed, &mut input, &mut executor, live);

        // the only teardown point
        let tmp_dir = session.tmp_dir().to_path_buf();
        if let Err(e) = session.close() {
            warn!("Cannot remove temp dir {}: {}", tmp_dir.display(), e);
        }

        match result {
            Ok(code) => code,
            Err(e) => {
                report(&e);
                e.exit_code()
            }
        }
    }
}

fn run_session<B: Backend, I: Input, X: Executor>(
    session: &mut Session<B>,
    parsed: &ParsedArgs,
    input: &mut I,
    executor: &mut X,
    live: LiveFn<B>,
) -> Result<i32, DriverError> {
    let cli = &parsed.cli;
    session.configure(cli)?;

    if cli.version {
        print!("{}", status(session));
        return Ok(0);
    }
    if cli.temp {
        println!("{}", session.persist_tmp_dir().display());
        return Ok(0);
    }
    if let Some(path) = &cli.xtgz {
        info!("Extract contents of: {}", path.display());
        archive::extract_file(path, Path::new("."))?;
        return Ok(0);
    }
    if cli.src {
        return extract_sources();
    }

    info!("cjit {}", env!("CARGO_PKG_VERSION"));

    let files = &cli.files;
    let mode = Mode::select(session.live(), files.len(), input.is_terminal(), session.output_mode());
    match mode {
        Mode::Live => {
            if files.is_empty() && !session.live() {
                info!("No input file: interactive mode");
            }
            if !input.is_terminal() {
                return Err(DriverError::LiveModeUnavailable);
            }
            live(session, executor, &parsed.partition.program)
        }
        Mode::StdinScript => {
            info!("No files specified on commandline, reading code from stdin");
            let code = read_stdin(input)?;
            session.backend_mut().compile_string(&code)?;
            finish(session, executor, &parsed.partition.program, None)
        }
        Mode::CompileToObject => {
            let [source] = files.as_slice() else {
                return Err(DriverError::Usage(
                    "Compiling to object files supports only one file argument".to_string(),
                ));
            };
            ingest(session, input, source)?;
            finish(session, executor, &parsed.partition.program, Some(source))
        }
        Mode::FileBatch => {
            info!("Source code:");
            for file in files {
                ingest(session, input, file)?;
            }
            finish(session, executor, &parsed.partition.program, files.first())
        }
    }
}

/// Add one positional argument to the handle, reading stdin for `-`.
fn ingest<B: Backend, I: Input>(session: &mut Session<B>, input: &mut I, arg: &OsStr) -> Result<(), DriverError> {
    if arg == STDIN_ARG {
        info!("| standard input");
        let code = read_stdin(input)?;
        session.backend_mut().compile_string(&code)?;
    } else {
        info!("+ {}", arg.to_string_lossy());
        session.backend_mut().add_file(Path::new(arg))?;
    }
    Ok(())
}

fn read_stdin<I: Input>(input: &mut I) -> Result<Vec<u8>, DriverError> {
    input
        .read_to_end()
        .map_err(|e| DriverError::Io(format!("Error reading from standard input: {}", e)))
}

/// The terminal action selected by the output mode.
fn finish<B: Backend>(
    session: &mut Session<B>,
    executor: &mut dyn Executor,
    program_args: &[OsString],
    first_source: Option<&OsString>,
) -> Result<i32, DriverError> {
    match session.output_mode() {
        OutputType::Object => {
            let target = match session.output_filename() {
                Some(path) => path.to_path_buf(),
                None => default_object_name(first_source.map(OsString::as_os_str)),
            };
            info!("Create object: {}", target.display());
            session.backend_mut().output_file(&target)?;
            Ok(0)
        }
        OutputType::Executable => {
            let target = session
                .output_filename()
                .map(Path::to_path_buf)
                .ok_or_else(|| DriverError::Usage("missing output filename".to_string()))?;
            info!("Create executable: {}", target.display());
            session.backend_mut().output_file(&target)?;
            Ok(0)
        }
        OutputType::Memory => run_program(session, executor, program_args),
    }
}

/// Relocate everything compiled so far and run it in a child process.
pub fn run_program<B: Backend>(
    session: &mut Session<B>,
    executor: &mut dyn Executor,
    program_args: &[OsString],
) -> Result<i32, DriverError> {
    let entry = session.entry().to_string();
    let program = session.backend_mut().relocate(&entry)?;
    let argv = program_argv(&entry, program_args);
    Ok(executor.execute(&program, &argv, session.pid_file())?)
}

/// `argv` as seen by the executed program.
pub fn program_argv(entry: &str, program_args: &[OsString]) -> Vec<OsString> {
    std::iter::once(OsString::from(entry))
        .chain(program_args.iter().cloned())
        .collect()
}

/// `dir/name.c` compiles to `name.o` in the current directory.
pub fn default_object_name(source: Option<&OsStr>) -> PathBuf {
    source
        .filter(|s| *s != STDIN_ARG)
        .and_then(|s| Path::new(s).file_stem())
        .map(|stem| PathBuf::from(stem).with_extension("o"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OBJECT))
}

fn extract_sources() -> Result<i32, DriverError> {
    if !assets::has_sources() {
        return Err(DriverError::Usage(
            "this build does not carry its own source code".to_string(),
        ));
    }
    let dest = Path::new(".").join(assets::SOURCE_DIR);
    info!("Extracting cjit's own source to {}", dest.display());
    assets::write_sources(&dest).map_err(|e| DriverError::Io(format!("Cannot write {}: {}", dest.display(), e)))?;
    Ok(0)
}

/// Version banner and session details printed by `-v`.
pub fn status<B: Backend>(session: &Session<B>) -> String {
    format!(
        "cjit {}\n\
         target: {}\n\
         temp dir: {}\n\
         include paths: {}\n\
         library paths: {}\n",
        env!("CARGO_PKG_VERSION"),
        target_lexicon::Triple::host(),
        session.tmp_dir().display(),
        session.include_paths().joined(),
        session.lib_paths().joined(),
    )
}

fn report_usage(err: clap::Error) -> i32 {
    // help requests print to stdout and succeed
    let _ = err.print();
    if err.use_stderr() {
        1
    } else {
        0
    }
}

fn report(err: &DriverError) {
    for line in err.diagnostics() {
        error!("{}", line);
    }
    error!("{}", err);
}

/// Error types for the compiler driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    InvalidDefine(#[from] DefineError),

    #[error("{0}")]
    Environment(String),

    #[error("Live mode only available in terminal (tty not found)")]
    LiveModeUnavailable,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Code compilation error in {unit}")]
    Compilation { unit: String, diagnostics: Vec<String> },

    #[error("{message}")]
    Link { message: String, diagnostics: Vec<String> },

    #[error(transparent)]
    Execution(#[from] ExecError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl DriverError {
    /// Every fatal error ends the process with status 1.
    pub fn exit_code(&self) -> i32 {
        1
    }

    pub fn diagnostics(&self) -> &[String] {
        match self {
            DriverError::Compilation { diagnostics, .. } | DriverError::Link { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl From<BackendError> for DriverError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Compile { unit, diagnostics } => DriverError::Compilation { unit, diagnostics },
            BackendError::Link { message, diagnostics } => DriverError::Link { message, diagnostics },
            err @ BackendError::Toolchain { .. } => DriverError::Environment(err.to_string()),
            err @ BackendError::Io { .. } => DriverError::Io(err.to_string()),
        }
    }
}
