//! Status and diagnostic output.
//!
//! Everything the driver reports goes through the `log` macros and ends up
//! on stderr, so the executed program owns stdout.

use log::{Level, LevelFilter};
use std::io::Write;

/// Installs the stderr logger.
///
/// The default level is `info`; `RUST_LOG` overrides it. Calling this more
/// than once is harmless.
pub fn init() {
    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| match record.level() {
            Level::Error => writeln!(buf, "error: {}", record.args()),
            Level::Warn => writeln!(buf, "warning: {}", record.args()),
            _ => writeln!(buf, "{}", record.args()),
        })
        .try_init();
}

/// Only errors get through once quiet mode is on.
pub fn set_quiet(quiet: bool) {
    if quiet {
        log::set_max_level(LevelFilter::Error);
    }
}
