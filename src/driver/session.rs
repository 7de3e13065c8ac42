//! Session state
//!
//! A [`Session`] is everything one invocation knows: the compiler handle, the
//! temporary directory, search paths and the flags that decide what happens
//! after the sources are in. It is created once by the driver and closed once.

use log::info;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::assets;
use crate::backend::{Backend, OutputType};
use crate::paths::{self, PathList};

use super::cli::{Cli, parse_define};
use super::compiler::DriverError;

/// Function started when no `-e` is given.
pub const DEFAULT_ENTRY: &str = "main";

/// Environment variable with baseline compiler options.
pub const CFLAGS_VAR: &str = "CFLAGS";

pub struct Session<B: Backend> {
    backend: B,
    entry: String,
    output_filename: Option<PathBuf>,
    pid_file: Option<PathBuf>,
    /// `None` once the directory has been persisted or closed.
    tmp_dir: Option<TempDir>,
    tmp_path: PathBuf,
    output_mode: OutputType,
    quiet: bool,
    live: bool,
    lib_paths: PathList,
    include_paths: PathList,
}

impl<B: Backend> Session<B> {
    /// Set up the runtime environment before any flag is applied.
    ///
    /// Creates the temporary directory, puts it first on both search paths,
    /// writes the bundled headers into it and applies `cflags` as baseline
    /// compiler options. On failure the directory is removed again.
    pub fn new(backend: B, cflags: Option<&str>) -> Result<Self, DriverError> {
        let tmp_dir = paths::create_tmp_dir()
            .map_err(|e| DriverError::Environment(format!("Error creating temp dir: {}", e)))?;
        let tmp_path = tmp_dir.path().to_path_buf();

        let mut session = Session {
            backend,
            entry: DEFAULT_ENTRY.to_string(),
            output_filename: None,
            pid_file: None,
            tmp_dir: Some(tmp_dir),
            tmp_path: tmp_path.clone(),
            output_mode: OutputType::Memory,
            quiet: false,
            live: false,
            lib_paths: PathList::new(),
            include_paths: PathList::new(),
        };

        session.backend.set_work_dir(&tmp_path);
        session.lib_paths.prepend(&tmp_path);
        session.backend.add_library_path(&tmp_path);
        session.include_paths.prepend(&tmp_path);
        session.backend.add_include_path(&tmp_path);

        assets::write_headers(&tmp_path).map_err(|e| {
            DriverError::Environment(format!("Error writing headers to {}: {}", tmp_path.display(), e))
        })?;

        if let Some(cflags) = cflags.filter(|c| !c.trim().is_empty()) {
            session.backend.set_options(cflags);
        }

        Ok(session)
    }

    /// Apply parsed command-line flags.
    ///
    /// Compiler options and include paths reach the handle right away. A bad
    /// `-D` fails the whole invocation.
    pub fn configure(&mut self, cli: &Cli) -> Result<(), DriverError> {
        self.quiet = cli.quiet;
        self.live = cli.live;

        for def in &cli.defines {
            let (key, value) = parse_define(def)?;
            self.backend.define_symbol(key, value);
        }
        for flags in &cli.cflags {
            info!("cflags: {}", flags);
            self.backend.set_options(flags);
        }
        for dir in &cli.include_paths {
            info!("inc: {}", dir.display());
            self.add_include_path(dir);
        }
        for dir in &cli.library_paths {
            info!("lib path: {}", dir.display());
            self.add_library_path(dir);
        }
        for lib in &cli.libraries {
            info!("lib: {}", lib);
            self.backend.add_library(lib);
        }
        if let Some(entry) = &cli.entry {
            info!("entry: {}", entry);
            self.entry = entry.clone();
        }
        if let Some(pid_file) = &cli.pid_file {
            info!("pid file: {}", pid_file.display());
            self.pid_file = Some(pid_file.clone());
        }
        if !cli.tolerated.is_empty() || cli.tolerated_switches > 0 {
            log::debug!("ignored toolchain options: {:?}", cli.tolerated);
        }

        self.output_filename = cli.output.clone();
        self.output_mode = if cli.compile_only {
            OutputType::Object
        } else if cli.output.is_some() {
            OutputType::Executable
        } else {
            OutputType::Memory
        };
        self.backend.set_output_type(self.output_mode);
        Ok(())
    }

    pub fn add_include_path(&mut self, dir: &Path) {
        if self.include_paths.append(dir) {
            self.backend.add_include_path(dir);
        }
    }

    pub fn add_library_path(&mut self, dir: &Path) {
        if self.lib_paths.append(dir) {
            self.backend.add_library_path(dir);
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn output_filename(&self) -> Option<&Path> {
        self.output_filename.as_deref()
    }

    pub fn pid_file(&self) -> Option<&Path> {
        self.pid_file.as_deref()
    }

    pub fn output_mode(&self) -> OutputType {
        self.output_mode
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    pub fn live(&self) -> bool {
        self.live
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_path
    }

    pub fn lib_paths(&self) -> &PathList {
        &self.lib_paths
    }

    pub fn include_paths(&self) -> &PathList {
        &self.include_paths
    }

    /// Keep the temporary directory on disk past the end of the session.
    pub fn persist_tmp_dir(&mut self) -> &Path {
        if let Some(dir) = self.tmp_dir.take() {
            let _ = dir.keep();
        }
        &self.tmp_path
    }

    /// Release the session, removing the temporary directory.
    pub fn close(mut self) -> io::Result<()> {
        match self.tmp_dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}
