//! End-to-end triage of one execution log.

use crate::classify::Classifier;
use crate::error::Result;
use crate::obs;
use crate::record::ParseResult;
use crate::segment::segment;
use crate::sink::DeliverySink;
use std::path::Path;
use tracing::info;

/// Default location of the parsed log artifact.
pub const DEFAULT_OUTPUT: &str = "parsed_logs.json";

/// Segment `raw` and, when the job failed, classify its first failure.
pub fn run_pipeline(
    raw: &str,
    classifier: &Classifier,
    sink: &dyn DeliverySink,
) -> Result<ParseResult> {
    let mut result = segment(raw)?;
    obs::emit_log_segmented(
        result.records.len(),
        result.records.failed_count(),
        &result.overall_status,
    );

    if result.is_failed() {
        classifier.classify(&mut result.records, sink)?;
    } else {
        info!(overall_status = %result.overall_status, "Job did not fail; skipping classification");
    }

    Ok(result)
}

/// Read the log at `path` and run the pipeline over it.
pub fn triage_file(
    path: &Path,
    classifier: &Classifier,
    sink: &dyn DeliverySink,
) -> Result<ParseResult> {
    let raw = std::fs::read_to_string(path)?;
    run_pipeline(&raw, classifier, sink)
}

impl ParseResult {
    /// The command map as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Write the command map to `path`.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        std::fs::write(path, json)?;
        obs::emit_artifact_written(path, self.records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{PatternCatalog, PatternRule};
    use crate::segment::{BLOCK_END, BLOCK_START};
    use crate::sink::RecordingSink;

    fn failing_log(status: &str) -> String {
        format!(
            "{BLOCK_START}\nbuild\n{BLOCK_END}\nCommand failed with exit code 1\nNo space left on device\n[t] Commands finished with result: {status}\n"
        )
    }

    fn classifier() -> Classifier {
        Classifier::new(
            PatternCatalog::new(vec![PatternRule::new(
                "No space left on device",
                "infrastructure",
                &["disk space"],
            )])
            .expect("catalog"),
        )
    }

    #[test]
    fn test_failed_job_is_classified() {
        let sink = RecordingSink::new();
        let result = run_pipeline(&failing_log("Failed"), &classifier(), &sink).expect("run");
        assert_eq!(result.records.classified().count(), 1);
        assert_eq!(sink.delivered().len(), 1);
    }

    #[test]
    fn test_successful_job_is_not_classified() {
        // The command itself failed but the runner reported success overall.
        let sink = RecordingSink::new();
        let result = run_pipeline(&failing_log("Success"), &classifier(), &sink).expect("run");
        assert_eq!(result.records.failed_count(), 1);
        assert_eq!(result.records.classified().count(), 0);
        assert!(sink.delivered().is_empty());
    }

    #[test]
    fn test_write_json_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_OUTPUT);
        let sink = RecordingSink::new();
        let result = run_pipeline(&failing_log("Failed"), &classifier(), &sink).expect("run");

        result.write_json(&path).expect("write");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"build\": {"));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["build"]["conclusion"], "infrastructure");
        assert_eq!(value["build"]["tags"][0], "disk space");
    }
}
