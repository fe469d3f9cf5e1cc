use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP failure talking to the library server or an
    /// acquisition service. Fatal to the current instance only.
    #[error("Service unavailable ({service}): {reason}")]
    ServiceUnavailable { service: String, reason: String },

    #[error("Input rejected: {0}")]
    InputRejected(String),

    #[error("Action failed on {}: {reason}", path.display())]
    ActionFailed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub fn unavailable(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ServiceUnavailable {
            service: service.into(),
            reason: reason.into(),
        }
    }
}
