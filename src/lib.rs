//! Run C source on the fly.
//!
//! `cjit` compiles C files (or code piped on standard input) with a compiler
//! handle, runs the result in a child process and reports its exit status,
//! or writes an object or executable file instead.

/// gzip + tar extraction.
pub mod archive;
/// Files bundled into the binary.
pub mod assets;
/// The compiler handle.
pub mod backend;
/// Option parsing, session state and the run pipeline.
pub mod driver;
/// Runs relocated programs in child processes.
pub mod exec;
pub mod input;
/// Contains the logger.
pub mod logger;
pub mod paths;
/// Interactive live coding.
pub mod repl;
