//! Files bundled into the binary.

use std::fs;
use std::io;
use std::path::Path;

/// Directory `--src` writes the embedded sources into.
pub const SOURCE_DIR: &str = "cjit_source";

/// Headers made available to every program through the session include path.
pub fn headers() -> Vec<(&'static str, String)> {
    vec![(
        "cjit.h",
        format!(
            "#ifndef CJIT_H\n\
             #define CJIT_H\n\
             #define CJIT_VERSION \"{}\"\n\
             #endif\n",
            env!("CARGO_PKG_VERSION")
        ),
    )]
}

/// Write the bundled headers into `dir`.
pub fn write_headers(dir: &Path) -> io::Result<()> {
    write_files(dir, headers().iter().map(|(name, body)| (*name, body.as_str())))
}

/// Lists the crate files once, for `SOURCE_FILES` and the embedded table.
macro_rules! source_tree {
    ($($path:literal),* $(,)?) => {
        /// Files `--src` writes out, relative to the crate root.
        pub const SOURCE_FILES: &[&str] = &[$($path),*];

        #[cfg(feature = "selfhost")]
        const SOURCES: &[(&str, &str)] = &[
            $(($path, include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/", $path)))),*
        ];
    };
}

source_tree![
    "Cargo.toml",
    "README.md",
    "src/lib.rs",
    "src/main.rs",
    "src/archive.rs",
    "src/assets.rs",
    "src/backend.rs",
    "src/backend/cc.rs",
    "src/driver.rs",
    "src/driver/cli.rs",
    "src/driver/compiler.rs",
    "src/driver/session.rs",
    "src/driver/tests_cli.rs",
    "src/driver/tests_compiler.rs",
    "src/exec.rs",
    "src/input.rs",
    "src/logger.rs",
    "src/paths.rs",
    "src/repl.rs",
    "src/test_utils.rs",
];

#[cfg(not(feature = "selfhost"))]
const SOURCES: &[(&str, &str)] = &[];

/// Whether this build carries its own sources.
pub fn has_sources() -> bool {
    !SOURCES.is_empty()
}

/// Write the embedded source tree into `dir`.
pub fn write_sources(dir: &Path) -> io::Result<()> {
    write_files(dir, SOURCES.iter().copied())
}

fn write_files<'a>(dir: &Path, files: impl IntoIterator<Item = (&'a str, &'a str)>) -> io::Result<()> {
    for (name, body) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, body)?;
    }
    Ok(())
}
