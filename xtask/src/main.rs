//! Developer task runner invoked as `cargo xtask <task>`.
//!
//! Kept dependency-free: every task shells out to `cargo` itself via
//! `std::process::Command` rather than reimplementing anything cargo
//! already does.

use std::process::{Command, ExitCode};

fn main() -> ExitCode {
    let task = std::env::args().nth(1);
    match task.as_deref() {
        Some("test") => run_cargo(&["test", "--workspace"]),
        Some("lint") => run_cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]),
        Some("fmt") => run_cargo(&["fmt", "--all"]),
        Some("ci") => {
            let fmt = run_cargo(&["fmt", "--all", "--check"]);
            if fmt != ExitCode::SUCCESS {
                return fmt;
            }
            let lint = run_cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]);
            if lint != ExitCode::SUCCESS {
                return lint;
            }
            run_cargo(&["test", "--workspace"])
        }
        _ => {
            eprintln!("usage: cargo xtask <test|lint|fmt|ci>");
            ExitCode::from(2)
        }
    }
}

fn run_cargo(args: &[&str]) -> ExitCode {
    let status = Command::new("cargo").args(args).status();
    match status {
        Ok(status) if status.success() => ExitCode::SUCCESS,
        Ok(status) => ExitCode::from(status.code().unwrap_or(1) as u8),
        Err(e) => {
            eprintln!("failed to run cargo {}: {e}", args.join(" "));
            ExitCode::from(1)
        }
    }
}
