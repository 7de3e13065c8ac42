//! Standard input as seen by the driver.

use std::io::{self, IsTerminal};

/// Source of script code and of the live-vs-stdin decision.
pub trait Input {
    /// Whether standard input is attached to a terminal.
    fn is_terminal(&self) -> bool;

    /// Read standard input to the end, bytes as they come.
    fn read_to_end(&mut self) -> io::Result<Vec<u8>>;
}

/// The process's real standard input.
#[derive(Debug, Default)]
pub struct StdInput;

impl Input for StdInput {
    fn is_terminal(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        crate::paths::load_all(io::stdin().lock())
    }
}
