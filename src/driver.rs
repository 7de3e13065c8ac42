//! Compiler driver module
//!
//! Option parsing, the session state and the pipeline that ties them to the
//! compiler handle and the execution engine.

pub mod cli;
pub mod compiler;
pub mod session;

#[cfg(test)]
mod tests_cli;

pub use cli::{ArgPartition, Cli, DefineError, parse_define};
pub use compiler::{Driver, DriverError, Mode, program_argv, run_program};
pub use session::Session;
