//! Failure classification.
//!
//! Only the first failing command that is not a plain test failure is
//! classified; every later command is left untouched even if it failed too.
//! Test failures are reported by the CI system itself and are passed over.

use crate::error::Result;
use crate::obs;
use crate::patterns::{PatternCatalog, PatternRule};
use crate::record::{Classification, CommandLog, CommandRecord, CommandStatus};
use crate::sink::DeliverySink;

/// Output line marking a command that failed only because tests failed.
pub const TEST_FAILURE_REASON: &str = "Reason(s): One or more tests have failed.";

/// Summary used when no rule matches.
pub const UNKNOWN_FAILURE_SUMMARY: &str = "Unknown failure: check logs for more details.";

/// Conclusion used when no rule matches.
pub const UNKNOWN_FAILURE_CONCLUSION: &str = "failure";

/// Tag used when no rule matches.
pub const UNKNOWN_FAILURE_TAG: &str = "unknown failure";

/// How much of the catalog is consulted for the failing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleScan {
    /// Walk the catalog in order; the first matching rule wins.
    #[default]
    FirstMatch,

    /// Consult only the first rule; anything else is an unknown failure.
    LeadingRuleOnly,
}

impl Classification {
    /// Classification for a command whose output matched `rule`.
    pub fn matched(command: &str, summary: &str, rule: &PatternRule) -> Self {
        Self {
            title: command.to_string(),
            summary: summary.to_string(),
            conclusion: rule.conclusion.clone(),
            tags: rule.tags.clone(),
        }
    }

    /// Classification for a failure no rule recognises.
    pub fn unknown(command: &str) -> Self {
        Self {
            title: command.to_string(),
            summary: UNKNOWN_FAILURE_SUMMARY.to_string(),
            conclusion: UNKNOWN_FAILURE_CONCLUSION.to_string(),
            tags: vec![UNKNOWN_FAILURE_TAG.to_string()],
        }
    }
}

/// Why a command is not classified, or `None` when it is eligible.
pub fn skip_reason(record: &CommandRecord) -> Option<&'static str> {
    if record.status == CommandStatus::Success {
        Some("command succeeded")
    } else if record.output_contains(TEST_FAILURE_REASON) {
        Some("test failures are reported by the CI system")
    } else {
        None
    }
}

/// Matches failing commands against an injected pattern catalog.
#[derive(Debug, Clone)]
pub struct Classifier {
    catalog: PatternCatalog,
    scan: RuleScan,
}

impl Classifier {
    pub fn new(catalog: PatternCatalog) -> Self {
        Self {
            catalog,
            scan: RuleScan::default(),
        }
    }

    pub fn with_scan(mut self, scan: RuleScan) -> Self {
        self.scan = scan;
        self
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn scan(&self) -> RuleScan {
        self.scan
    }

    /// Diagnose one failing record without touching it.
    pub fn diagnose(&self, record: &CommandRecord) -> Classification {
        self.lookup(record).0
    }

    /// The classification plus whether a rule matched.
    fn lookup(&self, record: &CommandRecord) -> (Classification, bool) {
        let text = record.output_text();
        let hit = match self.scan {
            RuleScan::FirstMatch => self.catalog.first_match(&text),
            RuleScan::LeadingRuleOnly => self.catalog.leading_match(&text),
        };

        match hit {
            Some((rule, matched)) => (
                Classification::matched(&record.command, matched, rule),
                true,
            ),
            None => (Classification::unknown(&record.command), false),
        }
    }

    /// Classify the first eligible failing command and deliver the result.
    ///
    /// Annotates at most one record and returns its classification. A sink
    /// error aborts classification and is returned as is.
    pub fn classify(
        &self,
        records: &mut CommandLog,
        sink: &dyn DeliverySink,
    ) -> Result<Option<Classification>> {
        for record in records.iter_mut() {
            if let Some(reason) = skip_reason(record) {
                obs::emit_command_skipped(&record.command, reason);
                continue;
            }

            let (classification, matched) = self.lookup(record);
            obs::emit_failure_classified(&record.command, &classification.conclusion, matched);
            record.classification = Some(classification.clone());

            if let Err(e) = sink.deliver(&classification) {
                obs::emit_delivery_failed(&record.command, &e);
                return Err(e);
            }
            obs::emit_classification_delivered(&record.command);

            return Ok(Some(classification));
        }

        Ok(None)
    }
}
