//! Shells out to a host C++17 compiler to turn generated source into an
//! executable (and optionally run it).
//!
//! The compiler binary is resolved from `GLINTC_CXX` if set, else the
//! first of `c++`, `g++`, `clang++` found on `PATH`. Invocation is a
//! thin `std::process::Command` wrapper; there is no attempt to parse
//! compiler diagnostics back into this pipeline's own `Diagnostic`
//! format — a host compiler failure is reported as an `Emission` error
//! carrying the compiler's raw stderr.

use crate::diagnostics::{Diagnostic, ErrorKind, Position, Reporter, Severity, Span};
use crate::interning::ModulePath;
use std::path::{Path, PathBuf};
use std::process::Command;

const CANDIDATE_COMPILERS: &[&str] = &["c++", "g++", "clang++"];

pub fn resolve_compiler() -> String {
    if let Ok(from_env) = std::env::var("GLINTC_CXX") {
        if !from_env.is_empty() {
            return from_env;
        }
    }
    for candidate in CANDIDATE_COMPILERS {
        if Command::new(candidate).arg("--version").output().is_ok() {
            return candidate.to_string();
        }
    }
    CANDIDATE_COMPILERS[0].to_string()
}

/// An RAII guard over a scratch `.cpp` file: written on construction,
/// removed on drop so a failed or successful build never leaves stray
/// generated source behind.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn write(cpp_source: &str) -> std::io::Result<Self> {
        let mut path = std::env::temp_dir();
        path.push(format!("glintc-{}.cpp", std::process::id()));
        std::fs::write(&path, cpp_source)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn emission_error(message: String) -> Diagnostic {
    let module = ModulePath::new();
    let pos = Position::new(1, 1);
    Diagnostic {
        severity: Severity::Error,
        kind: ErrorKind::Emission,
        message,
        span: Span::to_here(module, pos),
        help: None,
        code: None,
    }
}

/// Compiles `cpp_source` to the executable at `output_path`, at the
/// given `-O` optimization level (0-3). Appends an `Emission` diagnostic
/// to `reporter` and returns `Err(())` on compiler failure.
pub fn compile_only(cpp_source: &str, output_path: &Path, optimization: u8, reporter: &mut Reporter) -> Result<(), ()> {
    let scratch = ScratchFile::write(cpp_source).map_err(|e| {
        reporter.push(emission_error(format!("could not write generated source: {e}")));
    })?;

    let compiler = resolve_compiler();
    let output = Command::new(&compiler)
        .arg("-std=c++17")
        .arg(format!("-O{}", optimization.min(3)))
        .arg(scratch.path())
        .arg("-o")
        .arg(output_path)
        .output();

    match output {
        Ok(result) if result.status.success() => Ok(()),
        Ok(result) => {
            let stderr = String::from_utf8_lossy(&result.stderr);
            reporter.push(emission_error(format!("{compiler} failed:\n{stderr}")));
            Err(())
        }
        Err(e) => {
            reporter.push(
                emission_error(format!("could not invoke host compiler '{compiler}': {e}"))
                    .with_help("set GLINTC_CXX to a working C++17 compiler on PATH"),
            );
            Err(())
        }
    }
}

/// Compiles and immediately runs the resulting binary, forwarding its
/// stdout/stderr/exit code. Used by the `run` CLI command.
pub fn compile_and_run(cpp_source: &str, optimization: u8, reporter: &mut Reporter) -> Result<i32, ()> {
    let mut binary_path = std::env::temp_dir();
    binary_path.push(format!("glintc-{}-bin", std::process::id()));

    compile_only(cpp_source, &binary_path, optimization, reporter)?;

    let status = Command::new(&binary_path).status();
    let _ = std::fs::remove_file(&binary_path);

    match status {
        Ok(status) => Ok(status.code().unwrap_or(1)),
        Err(e) => {
            reporter.push(emission_error(format!("could not run compiled binary: {e}")));
            Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_compiler_respects_env_override() {
        std::env::set_var("GLINTC_CXX", "my-custom-cxx");
        assert_eq!(resolve_compiler(), "my-custom-cxx");
        std::env::remove_var("GLINTC_CXX");
    }

    #[test]
    fn scratch_file_is_removed_on_drop() {
        let path = {
            let scratch = ScratchFile::write("int main() {}").unwrap();
            let path = scratch.path().to_path_buf();
            assert!(path.exists());
            path
        };
        assert!(!path.exists());
    }
}
