//! Execution engine
//!
//! A relocated program never runs inside the driver. It is started as a child
//! process with the forwarded arguments, its pid optionally recorded, and its
//! exit status turned into the driver's own exit code.

use log::{debug, error};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::backend::Program;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("cannot start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("lost track of child process: {0}")]
    Wait(#[source] std::io::Error),
}

/// Runs a relocated program and reports how it ended.
pub trait Executor {
    /// `argv[0]` is what the program sees as its own name.
    fn execute(&mut self, program: &Program, argv: &[OsString], pid_file: Option<&Path>) -> Result<i32, ExecError>;
}

/// Starts each program in its own child process.
#[derive(Debug, Default)]
pub struct IsolatedExecutor;

impl Executor for IsolatedExecutor {
    fn execute(&mut self, program: &Program, argv: &[OsString], pid_file: Option<&Path>) -> Result<i32, ExecError> {
        let mut cmd = Command::new(program.image());
        if let Some((name, args)) = argv.split_first() {
            set_arg0(&mut cmd, name);
            cmd.args(args);
        }
        debug!("Executing program: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.image().display().to_string(),
            source,
        })?;

        if let Some(path) = pid_file {
            // the child keeps running if the pid cannot be recorded
            if let Err(e) = fs::write(path, format!("{}\n", child.id())) {
                error!("Cannot write pid file {}: {}", path.display(), e);
            }
        }

        let status = child.wait().map_err(ExecError::Wait)?;
        Ok(exit_code(status))
    }
}

#[cfg(unix)]
fn set_arg0(cmd: &mut Command, name: &OsStr) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(name);
}

#[cfg(not(unix))]
fn set_arg0(_cmd: &mut Command, _name: &OsStr) {}

/// Exit code of a finished child; death by signal `s` maps to `128 + s`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
