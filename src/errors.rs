use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy for the toggle engine. Every variant carries a stable
/// machine-readable code surfaced in the `--json` error envelope.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Prerequisite(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to schedule failsafe job: {0}")]
    Scheduling(String),

    #[error("failed to {op} {}: {source}", path.display())]
    Toggle {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("policy validation failed: {0}")]
    Validation(String),

    #[error("policy reload failed: {0}")]
    Reload(String),

    #[error("account {0} is not currently disabled")]
    NotDisabled(String),

    #[error("restoration incomplete for {0}; verify connectivity manually")]
    RestoreIncomplete(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Prerequisite(_) => "PREREQUISITE",
            Error::InvalidRequest(_) => "INVALID_REQUEST",
            Error::Scheduling(_) => "SCHEDULING",
            Error::Toggle { .. } => "TOGGLE",
            Error::Validation(_) => "VALIDATION",
            Error::Reload(_) => "RELOAD",
            Error::NotDisabled(_) => "NOT_DISABLED",
            Error::RestoreIncomplete(_) => "RESTORE_INCOMPLETE",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
