//! Shared helpers for the command-line tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};

/// C compiler the binary will pick up.
pub fn c_compiler() -> String {
    std::env::var("CC").unwrap_or_else(|_| "cc".to_string())
}

/// Whether a working C toolchain is installed; tests that compile skip without one.
pub fn toolchain_available() -> bool {
    std::process::Command::new(c_compiler())
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// The `cjit` binary with a private temp root, so leftovers can be checked.
pub fn cjit(tmp_root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cjit"));
    cmd.env("TMPDIR", tmp_root).env_remove("CFLAGS").env_remove("RUST_LOG");
    cmd
}

pub fn write_source(dir: &Path, name: &str, code: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, code).unwrap();
    path
}

/// Session directories still present under `tmp_root`.
pub fn leftover_sessions(tmp_root: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(tmp_root)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with("cjit-"))
                .unwrap_or(false)
        })
        .collect()
}
