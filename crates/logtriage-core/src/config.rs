//! Reporting server configuration.

use crate::error::{Result, TriageError};
use serde::{Deserialize, Serialize};

/// Environment variable naming the reporting server.
pub const REPORTING_SERVER_ENV: &str = "YAMATO_REPORTING_SERVER";

/// Where classification records are POSTed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportingConfig {
    /// Base URL of the reporting server.
    pub server_url: String,
}

impl ReportingConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`; an unset or blank server is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        match lookup(REPORTING_SERVER_ENV) {
            Some(url) if !url.trim().is_empty() => Ok(Self::new(url.trim())),
            _ => Err(TriageError::MissingConfig {
                var: REPORTING_SERVER_ENV.to_string(),
            }),
        }
    }

    /// Endpoint receiving classification records.
    pub fn result_endpoint(&self) -> String {
        format!("{}/result", self.server_url.trim_end_matches('/'))
    }
}
