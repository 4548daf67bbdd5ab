use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building a forecast page.
///
/// The variants are coarse on purpose: callers decide how much of the page
/// survives based on which stage failed.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("request to {provider} failed: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} {endpoint} request failed with status {status}: {body}")]
    Status {
        provider: &'static str,
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    #[error("cannot load history from {}: {message}", path.display())]
    History { path: PathBuf, message: String },

    #[error("temperature model failed: {0}")]
    Model(String),

    #[error("missing form input: {0}")]
    MissingInput(&'static str),
}

impl ForecastError {
    /// Short stable tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::Network { .. } => "network",
            ForecastError::Status { .. } => "status",
            ForecastError::Parse { .. } => "parse",
            ForecastError::History { .. } => "history",
            ForecastError::Model(_) => "model",
            ForecastError::MissingInput(_) => "missing_input",
        }
    }

    pub(crate) fn parse(provider: &'static str, message: impl Into<String>) -> Self {
        ForecastError::Parse { provider, message: message.into() }
    }

    pub(crate) fn history(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ForecastError::History { path: path.into(), message: message.to_string() }
    }
}

pub type Result<T, E = ForecastError> = std::result::Result<T, E>;
