//! optsh - declarative option parsing for shell scripts.

use anyhow::{Context, Result};
use optsh::config::{Settings, DEFAULT_FD};
use optsh::defaults::Environment;
use optsh::driver::{default_program, run, Outcome};
use optsh::output::{open_channel, write_channel, FAILURE_STATEMENT};
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Log to standard error; standard output and the channel carry the
/// protocol. `OPTSH_LOG` takes an EnvFilter directive.
fn init_logging() {
    let filter = EnvFilter::try_from_env("OPTSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Write a successful outcome where it belongs.
fn deliver(outcome: Outcome, fd: u32) -> Result<()> {
    match outcome {
        Outcome::Exports(bytes) => {
            let mut channel = open_channel(fd);
            write_channel(&mut *channel, &bytes).context("failed to write shell statements")?;
        }
        Outcome::Help(text)
        | Outcome::Version(text)
        | Outcome::Table(text)
        | Outcome::ManPage(text) => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write to standard output")?;
        }
    }
    Ok(())
}

/// Report a fatal error and make the caller's `eval` exit too.
fn abend(program: &str, message: &str, fd: u32) -> ExitCode {
    eprintln!("{}: {}", program, message);
    let mut channel = open_channel(fd);
    if let Err(err) = write_channel(&mut *channel, FAILURE_STATEMENT.as_bytes()) {
        warn!(error = %err, "could not write the failure statement");
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    init_logging();

    let argv: Vec<OsString> = std::env::args_os().collect();
    let program = default_program(&argv);

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => return abend(&program, &err.to_string(), DEFAULT_FD),
    };

    let env = Environment::snapshot();
    let outcome = match run(io::stdin().lock(), &argv, &env, &settings) {
        Ok(outcome) => outcome,
        Err(fatal) => return abend(&fatal.program, &fatal.source.to_string(), settings.fd),
    };

    match deliver(outcome, settings.fd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => abend(&program, &format!("{:#}", err), settings.fd),
    }
}
