//! Delivery of the classification record.
//!
//! A run hands at most one [`Classification`] to a [`DeliverySink`]:
//! [`HttpSink`] posts it to the reporting server, [`StdoutSink`] prints it in
//! local mode and [`RecordingSink`] keeps it in memory for tests.

use crate::config::ReportingConfig;
use crate::error::{Result, TriageError};
use crate::record::Classification;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::cell::RefCell;
use std::io::Write;
use tracing::{debug, info};

/// Reporting boundary receiving the classification.
pub trait DeliverySink {
    /// Deliver one classification. Any error is fatal to the run.
    fn deliver(&self, classification: &Classification) -> Result<()>;
}

/// POSTs classifications as JSON to the reporting server.
pub struct HttpSink {
    endpoint: String,
    client: Client,
}

impl HttpSink {
    pub fn new(config: &ReportingConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("logtriage/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: config.result_endpoint(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DeliverySink for HttpSink {
    fn deliver(&self, classification: &Classification) -> Result<()> {
        info!(endpoint = %self.endpoint, title = %classification.title, "Posting classification");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(classification)
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TriageError::Delivery {
                status: status.as_u16(),
            });
        }

        debug!(status = status.as_u16(), "Reporting server accepted classification");
        Ok(())
    }
}

/// Local-only mode: prints the classification instead of posting it.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl DeliverySink for StdoutSink {
    fn deliver(&self, classification: &Classification) -> Result<()> {
        let json = serde_json::to_string_pretty(classification)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}")?;
        Ok(())
    }
}

/// In-memory sink that records deliveries, optionally answering with an error status.
#[derive(Debug, Default)]
pub struct RecordingSink {
    delivered: RefCell<Vec<Classification>>,
    reject_status: Option<u16>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails with `status`.
    pub fn rejecting(status: u16) -> Self {
        Self {
            delivered: RefCell::new(Vec::new()),
            reject_status: Some(status),
        }
    }

    /// Classifications accepted so far.
    pub fn delivered(&self) -> Vec<Classification> {
        self.delivered.borrow().clone()
    }
}

impl DeliverySink for RecordingSink {
    fn deliver(&self, classification: &Classification) -> Result<()> {
        if let Some(status) = self.reject_status {
            return Err(TriageError::Delivery { status });
        }
        self.delivered.borrow_mut().push(classification.clone());
        Ok(())
    }
}
