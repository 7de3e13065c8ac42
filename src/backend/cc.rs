//! Compiler handle backed by the system C toolchain.
//!
//! Every unit is compiled to an object file inside the work directory as soon
//! as it is added, so syntax errors surface at the position of the unit on the
//! command line. Relocation links the objects into a program image next to
//! them; emission links (or copies, for objects) to the requested path.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::{Backend, BackendError, OutputType, Program};

/// Toolchain used when `CC` is unset.
pub const DEFAULT_TOOL: &str = "cc";

/// Extensions that are handed to the linker untouched.
const PREBUILT_EXTENSIONS: &[&str] = &["o", "obj", "a", "lib", "so", "dylib", "dll"];

#[derive(Debug)]
pub struct CcBackend {
    tool: String,
    tool_args: Vec<String>,
    options: Vec<String>,
    defines: Vec<String>,
    include_paths: Vec<PathBuf>,
    library_paths: Vec<PathBuf>,
    libraries: Vec<String>,
    /// Link inputs, in the order they were added.
    inputs: Vec<PathBuf>,
    output: OutputType,
    work_dir: Option<PathBuf>,
    units: usize,
}

impl Default for CcBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CcBackend {
    /// Uses `$CC` when set, `cc` otherwise.
    pub fn new() -> Self {
        let cc = std::env::var("CC").unwrap_or_default();
        if cc.trim().is_empty() {
            Self::with_tool(DEFAULT_TOOL)
        } else {
            Self::with_tool(&cc)
        }
    }

    /// `command` may carry leading arguments, e.g. `"ccache gcc"`.
    pub fn with_tool(command: &str) -> Self {
        let mut words = command.split_whitespace().map(str::to_string);
        let tool = words.next().unwrap_or_else(|| DEFAULT_TOOL.to_string());
        CcBackend {
            tool,
            tool_args: words.collect(),
            options: Vec::new(),
            defines: Vec::new(),
            include_paths: Vec::new(),
            library_paths: Vec::new(),
            libraries: Vec::new(),
            inputs: Vec::new(),
            output: OutputType::Memory,
            work_dir: None,
            units: 0,
        }
    }

    /// The toolchain command line prefix, for status output.
    pub fn tool(&self) -> String {
        std::iter::once(self.tool.as_str())
            .chain(self.tool_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    fn work_dir(&self) -> Result<&Path, BackendError> {
        self.work_dir.as_deref().ok_or_else(|| {
            BackendError::io(
                "compiler handle has no work directory",
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })
    }

    /// Fresh path inside the work directory for the next generated file.
    fn next_unit_path(&mut self, stem: &str, extension: &str) -> Result<PathBuf, BackendError> {
        self.units += 1;
        let name = format!("{:03}-{}.{}", self.units, stem, extension);
        Ok(self.work_dir()?.join(name))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.tool);
        cmd.args(&self.tool_args).args(&self.options);
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<Output, BackendError> {
        debug!("Executing toolchain: {:?}", cmd);
        cmd.output().map_err(|source| BackendError::Toolchain {
            tool: self.tool.clone(),
            source,
        })
    }

    /// Compile `source` to an object in the work directory and queue it for linking.
    fn compile_unit(&mut self, source: &Path, unit: &str) -> Result<(), BackendError> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unit".to_string());
        let object = self.next_unit_path(&stem, "o")?;

        let mut cmd = self.command();
        cmd.args(&self.defines);
        for dir in &self.include_paths {
            cmd.arg("-I").arg(dir);
        }
        cmd.arg("-c").arg(source).arg("-o").arg(&object);

        let output = self.run(cmd)?;
        if !output.status.success() {
            return Err(BackendError::Compile {
                unit: unit.to_string(),
                diagnostics: diagnostic_lines(&output),
            });
        }

        self.inputs.push(object);
        Ok(())
    }

    /// Link all inputs (plus `extra`, placed first) into `target`.
    fn link(&self, target: &Path, extra: &[PathBuf], runtime_paths: bool) -> Result<(), BackendError> {
        if self.inputs.is_empty() && extra.is_empty() {
            return Err(BackendError::Link {
                message: "no input files to link".to_string(),
                diagnostics: Vec::new(),
            });
        }

        let mut cmd = self.command();
        cmd.args(extra).args(&self.inputs).arg("-o").arg(target);
        for dir in &self.library_paths {
            cmd.arg("-L").arg(dir);
            if runtime_paths && cfg!(unix) {
                cmd.arg(format!("-Wl,-rpath,{}", dir.display()));
            }
        }
        for lib in &self.libraries {
            cmd.arg(format!("-l{}", lib));
        }

        let output = self.run(cmd)?;
        if !output.status.success() {
            let _ = fs::remove_file(target);
            return Err(BackendError::Link {
                message: format!("linking {} failed", target.display()),
                diagnostics: diagnostic_lines(&output),
            });
        }
        Ok(())
    }

    /// Build the trampoline that starts the program at `entry` instead of `main`.
    fn entry_trampoline(&mut self, entry: &str) -> Result<PathBuf, BackendError> {
        if !is_c_identifier(entry) {
            return Err(BackendError::Link {
                message: format!("invalid entry symbol: {}", entry),
                diagnostics: Vec::new(),
            });
        }
        let source = self.next_unit_path("entry", "c")?;
        let code = format!(
            "extern int {entry}(int, char **, char **);\n\
             int main(int argc, char **argv, char **envp) {{ return {entry}(argc, argv, envp); }}\n"
        );
        fs::write(&source, code).map_err(|e| BackendError::io("cannot write entry trampoline", e))?;

        // compiled like any other unit, then pulled back out of the input list
        self.compile_unit(&source, "<entry>")?;
        Ok(self.inputs.pop().unwrap_or(source))
    }
}

impl Backend for CcBackend {
    fn set_work_dir(&mut self, dir: &Path) {
        self.work_dir = Some(dir.to_path_buf());
    }

    fn set_options(&mut self, options: &str) {
        self.options.extend(options.split_whitespace().map(str::to_string));
    }

    fn define_symbol(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => self.defines.push(format!("-D{}={}", key, value)),
            None => self.defines.push(format!("-D{}", key)),
        }
    }

    fn add_include_path(&mut self, dir: &Path) {
        self.include_paths.push(dir.to_path_buf());
    }

    fn add_library_path(&mut self, dir: &Path) {
        self.library_paths.push(dir.to_path_buf());
    }

    fn add_library(&mut self, name: &str) {
        self.libraries.push(name.to_string());
    }

    fn set_output_type(&mut self, output: OutputType) {
        self.output = output;
    }

    fn add_file(&mut self, path: &Path) -> Result<(), BackendError> {
        fs::metadata(path).map_err(|e| BackendError::io(format!("cannot open {}", path.display()), e))?;

        let prebuilt = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| PREBUILT_EXTENSIONS.contains(&ext));
        if prebuilt {
            self.inputs.push(path.to_path_buf());
            return Ok(());
        }

        self.compile_unit(path, &path.display().to_string())
    }

    fn compile_string(&mut self, code: &[u8]) -> Result<(), BackendError> {
        let source = self.next_unit_path("stdin", "c")?;
        fs::write(&source, code).map_err(|e| BackendError::io("cannot buffer standard input", e))?;
        self.compile_unit(&source, "<stdin>")
    }

    fn relocate(&mut self, entry: &str) -> Result<Program, BackendError> {
        let mut extra = Vec::new();
        if entry != "main" {
            extra.push(self.entry_trampoline(entry)?);
        }

        let image = self.next_unit_path("program", "bin")?;
        let image = image.with_extension(std::env::consts::EXE_EXTENSION);
        self.link(&image, &extra, true).map_err(|e| match e {
            BackendError::Link { diagnostics, .. } => BackendError::Link {
                message: "symbol relocation failed (some library missing?)".to_string(),
                diagnostics,
            },
            other => other,
        })?;
        Ok(Program::from_image(image))
    }

    fn output_file(&mut self, path: &Path) -> Result<(), BackendError> {
        match self.output {
            OutputType::Object => {
                let [object] = self.inputs.as_slice() else {
                    return Err(BackendError::Link {
                        message: format!(
                            "object output needs exactly one translation unit, got {}",
                            self.inputs.len()
                        ),
                        diagnostics: Vec::new(),
                    });
                };
                if let Err(e) = fs::copy(object, path) {
                    let _ = fs::remove_file(path);
                    return Err(BackendError::io(format!("cannot write {}", path.display()), e));
                }
                Ok(())
            }
            OutputType::Executable | OutputType::Memory => {
                self.link(path, &[], false)?;
                if let Err(e) = set_executable(path) {
                    log::warn!("Failed to set executable permissions on {}: {}", path.display(), e);
                }
                Ok(())
            }
        }
    }
}

fn diagnostic_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Mark `path` rwxr-xr-x.
#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755); // rwxr-xr-x
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
