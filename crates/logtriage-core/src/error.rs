//! Error taxonomy for log triage.
//!
//! Every variant is fatal to a run. A failure that matches no known pattern
//! is not an error; it is classified as an unknown failure instead.

/// Errors produced while locating, segmenting, classifying or delivering.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// No execution log exists where one was expected.
    #[error("no execution log found matching {searched}")]
    LogNotFound { searched: String },

    /// The log is missing its summary line or its delimiters are unbalanced.
    #[error("malformed execution log: {0}")]
    MalformedLog(String),

    /// The reporting server answered with something other than 200.
    #[error("reporting server rejected classification: HTTP {status}")]
    Delivery { status: u16 },

    /// The request never got a response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Required startup configuration is absent.
    #[error("missing required configuration: environment variable {var} is not set")]
    MissingConfig { var: String },

    /// A failure pattern or file glob did not compile.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TriageError {
    fn from(err: reqwest::Error) -> Self {
        TriageError::Http(err.to_string())
    }
}

/// Result type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;
