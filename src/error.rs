//! Crate-level errors.

use crate::compiler::CompileError;
use crate::constraint::RangeError;
use crate::scanner::ScanError;
use thiserror::Error;

/// Invalid `OPTSH_*` setting.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid setting: {0}")]
pub struct SettingsError(pub String);

impl From<clap::Error> for SettingsError {
    fn from(err: clap::Error) -> Self {
        let rendered = err.render().to_string();
        let line = rendered.lines().next().unwrap_or_default();
        SettingsError(line.strip_prefix("error: ").unwrap_or(line).to_string())
    }
}

/// Everything that stops optsh.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("failed to serialize the option table: {0}")]
    Json(#[from] serde_json::Error),
}

/// An error together with the program name it is reported under.
#[derive(Debug, Error)]
#[error("{program}: {source}")]
pub struct Fatal {
    pub program: String,
    pub source: Error,
}

impl Fatal {
    pub fn new(program: impl Into<String>, source: impl Into<Error>) -> Self {
        Fatal {
            program: program.into(),
            source: source.into(),
        }
    }
}
