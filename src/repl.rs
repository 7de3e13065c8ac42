//! Live coding front end
//!
//! Lines typed at the terminal accumulate into one translation unit. End of
//! input or `:run` compiles and runs it with the session, `:clear` starts
//! over, `:quit` leaves without running anything.

use log::info;
use std::ffi::OsString;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::backend::Backend;
use crate::driver::{DriverError, Session, run_program};
use crate::exec::Executor;

const PROMPT: &str = "cjit> ";

/// What the loop does after a line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LiveCommand {
    Continue,
    Run,
    Clear,
    Quit,
}

/// Code typed so far.
#[derive(Debug, Default)]
pub struct LiveBuffer {
    code: String,
}

impl LiveBuffer {
    /// Take one line, either a command or more code.
    pub fn feed(&mut self, line: &str) -> LiveCommand {
        match line.trim() {
            ":run" => LiveCommand::Run,
            ":quit" | ":q" => LiveCommand::Quit,
            ":clear" => {
                self.code.clear();
                LiveCommand::Clear
            }
            _ => {
                self.code.push_str(line);
                self.code.push('\n');
                LiveCommand::Continue
            }
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_empty(&self) -> bool {
        self.code.trim().is_empty()
    }
}

/// Run the editor on the terminal until the user runs or leaves.
pub fn run<B: Backend>(
    session: &mut Session<B>,
    executor: &mut dyn Executor,
    program_args: &[OsString],
) -> Result<i32, DriverError> {
    let mut editor =
        DefaultEditor::new().map_err(|e| DriverError::Environment(format!("Cannot start line editor: {}", e)))?;
    info!("Type C code, then :run or Ctrl-D to execute it (:clear, :quit)");

    let mut buffer = LiveBuffer::default();
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                match buffer.feed(&line) {
                    LiveCommand::Continue => {}
                    LiveCommand::Clear => info!("buffer cleared"),
                    LiveCommand::Run => break,
                    LiveCommand::Quit => return Ok(0),
                }
            }
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => return Ok(0),
            Err(e) => return Err(DriverError::Io(format!("Error reading from terminal: {}", e))),
        }
    }

    if buffer.is_empty() {
        return Ok(0);
    }
    session.backend_mut().compile_string(buffer.code().as_bytes())?;
    run_program(session, executor, program_args)
}
