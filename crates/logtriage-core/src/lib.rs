//! logtriage core library
//!
//! Turns a CI job runner's execution log into typed command records and
//! classifies the first failing command against a catalog of known failure
//! signatures.
//!
//! ## Flow
//!
//! - [`segment`]: split the log into [`CommandRecord`]s and read the job status
//! - [`Classifier::classify`]: diagnose the first eligible failure
//! - [`DeliverySink`]: hand the [`Classification`] to the reporting boundary

pub mod classify;
pub mod config;
pub mod error;
pub mod locate;
pub mod obs;
pub mod patterns;
pub mod pipeline;
pub mod record;
pub mod segment;
pub mod sink;
pub mod telemetry;

pub use classify::{
    skip_reason, Classifier, RuleScan, TEST_FAILURE_REASON, UNKNOWN_FAILURE_CONCLUSION,
    UNKNOWN_FAILURE_SUMMARY, UNKNOWN_FAILURE_TAG,
};
pub use config::{ReportingConfig, REPORTING_SERVER_ENV};
pub use error::{Result, TriageError};
pub use locate::{ExplicitPath, GlobLocator, LogLocator, EXECUTION_LOG_GLOB};
pub use patterns::{PatternCatalog, PatternRule};
pub use pipeline::{run_pipeline, triage_file, DEFAULT_OUTPUT};
pub use record::{
    Classification, CommandLog, CommandRecord, CommandStatus, ParseResult, COMMAND_FAILED_MARKER,
};
pub use segment::{segment, BLOCK_END, BLOCK_START, SUMMARY_MARKER};
pub use sink::{DeliverySink, HttpSink, RecordingSink, StdoutSink};
pub use telemetry::init_tracing;
