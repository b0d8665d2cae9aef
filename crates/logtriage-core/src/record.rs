//! Parsed command records and the ordered command log.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Line marker the job runner prints when a command exits non-zero.
pub const COMMAND_FAILED_MARKER: &str = "Command failed";

/// Pass/fail state of one command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failed,
}

impl CommandStatus {
    /// Derive the status from a command's output lines.
    pub fn from_output(output: &[String]) -> Self {
        if output.iter().any(|line| line.contains(COMMAND_FAILED_MARKER)) {
            CommandStatus::Failed
        } else {
            CommandStatus::Success
        }
    }
}

/// Diagnostic attached to the one failing command that was classified.
///
/// This is also the payload sent to the reporting server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    /// The command text of the failing command.
    pub title: String,

    /// The matched failure text, or the unknown-failure notice.
    pub summary: String,

    /// Short outcome label such as `failure` or `infrastructure`.
    pub conclusion: String,

    /// Labels from the matching rule.
    pub tags: Vec<String>,
}

/// One command block of the execution log.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandRecord {
    /// Verbatim command text; it is the key of the record in the artifact.
    #[serde(skip)]
    pub command: String,

    pub output: Vec<String>,

    pub status: CommandStatus,

    // Diagnostic fields serialize inline beside `output` and `status`.
    #[serde(flatten)]
    pub classification: Option<Classification>,
}

impl CommandRecord {
    /// Create a record, deriving its status from the output.
    pub fn new(command: String, output: Vec<String>) -> Self {
        let status = CommandStatus::from_output(&output);
        Self {
            command,
            output,
            status,
            classification: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == CommandStatus::Failed
    }

    /// Whether any output line contains `needle`.
    pub fn output_contains(&self, needle: &str) -> bool {
        self.output.iter().any(|line| line.contains(needle))
    }

    /// Output lines joined into one searchable text.
    pub fn output_text(&self) -> String {
        self.output.join("\n")
    }
}

/// Command records keyed by command text, in first-seen order.
///
/// Inserting a command whose text is already present replaces the earlier
/// record but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLog {
    records: Vec<CommandRecord>,
    index: HashMap<String, usize>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&mut self, record: CommandRecord) -> Option<CommandRecord> {
        match self.index.get(&record.command) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.index.insert(record.command.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, command: &str) -> Option<&CommandRecord> {
        self.index.get(command).map(|&pos| &self.records[pos])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandRecord> {
        self.records.iter()
    }

    /// Mutable iteration; command text is the key and must not be changed.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, CommandRecord> {
        self.records.iter_mut()
    }

    /// Command texts in order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.command.as_str())
    }

    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_failed()).count()
    }

    /// Records carrying a classification (at most one per run).
    pub fn classified(&self) -> impl Iterator<Item = &CommandRecord> {
        self.records.iter().filter(|r| r.classification.is_some())
    }
}

impl<'a> IntoIterator for &'a CommandLog {
    type Item = &'a CommandRecord;
    type IntoIter = std::slice::Iter<'a, CommandRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for CommandLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.command, record)?;
        }
        map.end()
    }
}

/// Segmented execution log: the command records plus the job's overall status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub records: CommandLog,

    /// Result string from the runner's summary line, e.g. `Success` or `Failed`.
    pub overall_status: String,
}

impl ParseResult {
    /// Whether the runner reported the job as failed.
    pub fn is_failed(&self) -> bool {
        self.overall_status.contains("Failed")
    }
}
