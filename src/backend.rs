//! The compiler handle
//!
//! The driver never compiles C itself. It talks to a [`Backend`], which
//! accepts translation units, search paths and macro definitions, and either
//! relocates everything into a runnable [`Program`] or emits an object or
//! executable file. Failures come back as [`BackendError`] values carrying the
//! diagnostics the compiler produced.

use std::path::{Path, PathBuf};

pub mod cc;

pub use cc::CcBackend;

/// What the handle produces once all units are in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OutputType {
    /// Relocate into a program image and run it.
    #[default]
    Memory,
    /// Emit a single relocatable object file.
    Object,
    /// Link a standalone executable.
    Executable,
}

/// A relocated program, ready to be started by an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    image: PathBuf,
}

impl Program {
    pub fn from_image(image: impl Into<PathBuf>) -> Self {
        Self { image: image.into() }
    }

    /// Location of the runnable image.
    pub fn image(&self) -> &Path {
        &self.image
    }
}

/// Errors reported by the compiler handle.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("compilation of {unit} failed")]
    Compile { unit: String, diagnostics: Vec<String> },

    #[error("{message}")]
    Link { message: String, diagnostics: Vec<String> },

    #[error("cannot run C toolchain `{tool}`: {source}")]
    Toolchain {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BackendError::Io {
            context: context.into(),
            source,
        }
    }

    /// Compiler diagnostics attached to this error, if any.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            BackendError::Compile { diagnostics, .. } => diagnostics,
            BackendError::Link { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

/// Operations the driver needs from a C compiler/linker.
///
/// Units are compiled in the order they are added, which is also the order
/// symbols are resolved at link time.
pub trait Backend {
    /// Directory where the handle may keep intermediate files.
    fn set_work_dir(&mut self, dir: &Path);

    /// Raw compiler options, appended after the ones already set.
    fn set_options(&mut self, options: &str);

    fn define_symbol(&mut self, key: &str, value: Option<&str>);

    fn add_include_path(&mut self, dir: &Path);

    fn add_library_path(&mut self, dir: &Path);

    fn add_library(&mut self, name: &str);

    fn set_output_type(&mut self, output: OutputType);

    /// Add a C source, object file or library to the unit list.
    fn add_file(&mut self, path: &Path) -> Result<(), BackendError>;

    /// Compile a source buffer as one translation unit.
    ///
    /// The buffer is taken as raw bytes, the way the compiler reads files.
    fn compile_string(&mut self, code: &[u8]) -> Result<(), BackendError>;

    /// Resolve all symbols into a runnable program that starts at `entry`.
    fn relocate(&mut self, entry: &str) -> Result<Program, BackendError>;

    /// Write the object or executable file selected by the output type.
    fn output_file(&mut self, path: &Path) -> Result<(), BackendError>;
}
