//! Common test utilities

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Variables that would leak into option defaults or settings.
const SCRUBBED: &[&str] = &[
    "USAGE",
    "OPTSH_DIALECT",
    "OPTSH_FD",
    "OPTSH_MAX_OPTIONS",
    "OPTSH_DUMP_TABLE",
    "OPTSH_LOG",
    "HELP",
    "VERSION",
    "VERBOSE",
    "PRINT_MAN_PAGE",
    "BARS",
];

/// Path of the optsh binary under test.
pub fn optsh_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("optsh")
}

/// A shell command with a scrubbed environment.
pub fn sh(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script);
    for var in SCRUBBED {
        cmd.env_remove(var);
    }
    cmd
}

/// Result of one optsh run: the assertion handle and what reached fd 3.
pub struct Run {
    pub assert: Assert,
    pub channel: String,
    _dir: TempDir,
}

/// Run optsh with `input` on stdin and `args` as the script's arguments,
/// capturing descriptor 3 in a temporary file.
pub fn run_with_env(input: &str, args: &[&str], env: &[(&str, &str)]) -> Run {
    let dir = TempDir::new().unwrap();
    let channel_path = dir.path().join("fd3");

    let mut cmd = sh(r#"bin="$1"; out="$2"; shift 2; exec "$bin" "$@" 3>"$out""#);
    cmd.arg("sh")
        .arg(optsh_bin())
        .arg(&channel_path)
        .args(args)
        .write_stdin(input);
    for (key, value) in env {
        cmd.env(key, value);
    }

    let assert = cmd.assert();
    let channel = fs::read_to_string(&channel_path).unwrap_or_default();
    Run {
        assert,
        channel,
        _dir: dir,
    }
}

pub fn run(input: &str, args: &[&str]) -> Run {
    run_with_env(input, args, &[])
}
