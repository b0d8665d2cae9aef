//! Structured lifecycle events for a triage run.
//!
//! Events are emitted at `info!` unless noted; filter with `RUST_LOG`.

use std::path::Path;
use tracing::{debug, info, warn};

/// RAII guard entering a span tagged with the log being triaged.
pub struct TriageSpan {
    _span: tracing::span::EnteredSpan,
}

impl TriageSpan {
    pub fn enter(log_path: &Path) -> Self {
        let span = tracing::info_span!("logtriage.run", log = %log_path.display());
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: execution log resolved.
pub fn emit_log_located(log_path: &Path) {
    info!(event = "log.located", path = %log_path.display());
}

/// Emit event: log split into command records.
pub fn emit_log_segmented(commands: usize, failed: usize, overall_status: &str) {
    info!(
        event = "log.segmented",
        commands = commands,
        failed = failed,
        overall_status = %overall_status,
    );
}

/// Emit event (debug): a command was passed over by the classifier.
pub fn emit_command_skipped(command: &str, reason: &str) {
    debug!(event = "command.skipped", command = %command, reason = %reason);
}

/// Emit event: the first eligible failure was classified.
pub fn emit_failure_classified(command: &str, conclusion: &str, matched: bool) {
    info!(
        event = "failure.classified",
        command = %command,
        conclusion = %conclusion,
        matched = matched,
    );
}

/// Emit event: classification accepted by the sink.
pub fn emit_classification_delivered(command: &str) {
    info!(event = "classification.delivered", command = %command);
}

/// Emit event (warn): the sink refused the classification.
pub fn emit_delivery_failed(command: &str, error: &dyn std::fmt::Display) {
    warn!(event = "delivery.failed", command = %command, error = %error);
}

/// Emit event: parsed log artifact written.
pub fn emit_artifact_written(path: &Path, commands: usize) {
    info!(event = "artifact.written", path = %path.display(), commands = commands);
}
