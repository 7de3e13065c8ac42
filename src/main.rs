use cjit::driver::Driver;
use std::ffi::OsString;
use std::process::exit;

/// The main entry point for the application.
///
/// Parses command-line arguments, compiles the given sources and runs them,
/// exiting with the program's own status.
fn main() {
    cjit::logger::init();
    let args: Vec<OsString> = std::env::args_os().collect();
    exit(Driver::from_env().run(&args));
}
