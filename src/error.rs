use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {setting} (set {env_var} or pass it on the command line)")]
    Missing {
        setting: &'static str,
        env_var: &'static str,
    },

    #[error("invalid value for {setting}: {reason}")]
    Invalid {
        setting: &'static str,
        reason: String,
    },
}

/// Failure of a single call against the management API or the object store.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("invalid argument: {0} must not be empty")]
    InvalidArgument(&'static str),

    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}
