//! Execution log segmentation.
//!
//! The job runner frames every command it runs like this:
//!
//! ```text
//! ################################### Running next command ###################################
//! <command text, possibly several lines>
//! ############################################################################################
//! <output lines>
//! <trailing separator line>
//! ```
//!
//! and ends the log with a summary line containing
//! `Commands finished with result: <STATUS>`. [`segment`] turns that text into
//! a [`ParseResult`].

use crate::error::{Result, TriageError};
use crate::record::{CommandLog, CommandRecord, ParseResult};

/// Line opening a command block.
pub const BLOCK_START: &str =
    "################################### Running next command ###################################";

/// Line closing a command block's header.
pub const BLOCK_END: &str =
    "############################################################################################";

/// Marker of the runner's summary line.
pub const SUMMARY_MARKER: &str = "Commands finished with result:";

/// Split raw log text into lines, dropping empty ones.
pub fn log_lines(raw: &str) -> Vec<&str> {
    raw.lines().filter(|line| !line.is_empty()).collect()
}

fn is_block_start(line: &str) -> bool {
    line.contains(BLOCK_START)
}

fn is_block_end(line: &str) -> bool {
    !is_block_start(line) && line.contains(BLOCK_END)
}

/// Segment an execution log into command records and the overall job status.
///
/// A start delimiter on the very last line opens no record. A block whose
/// header is never closed, or a log without a summary line, is a
/// [`TriageError::MalformedLog`].
pub fn segment(raw: &str) -> Result<ParseResult> {
    let lines = log_lines(raw);
    let overall_status = overall_status(&lines)?;
    let records = command_blocks(&lines)?;

    Ok(ParseResult {
        records,
        overall_status,
    })
}

/// Build the command records from already-split log lines.
pub fn command_blocks(lines: &[&str]) -> Result<CommandLog> {
    let mut starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_block_start(line))
        .map(|(i, _)| i)
        .collect();
    let ends: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_block_end(line))
        .map(|(i, _)| i)
        .collect();

    // Sentinel bounding the last command's output.
    starts.push(lines.len());

    let mut records = CommandLog::new();
    for bounds in starts.windows(2) {
        let (start, next) = (bounds[0], bounds[1]);
        if start + 1 == lines.len() {
            continue;
        }

        let end = ends
            .iter()
            .copied()
            .find(|&e| e > start && e < next)
            .ok_or_else(|| {
                TriageError::MalformedLog(format!(
                    "command block starting at line {} has no closing delimiter",
                    start + 1
                ))
            })?;

        let command = lines[start + 1..end].join("\n");
        // The line right before the next block is a separator, not output.
        let output_end = next.saturating_sub(1);
        let output = if end + 1 < output_end {
            lines[end + 1..output_end]
                .iter()
                .map(|line| line.to_string())
                .collect()
        } else {
            Vec::new()
        };

        records.insert(CommandRecord::new(command, output));
    }

    Ok(records)
}

/// Extract the job result from the runner's summary line.
///
/// Given `[12:00:01] Commands finished with result: Failed` this returns
/// `Failed`.
pub fn overall_status(lines: &[&str]) -> Result<String> {
    let line = lines
        .iter()
        .find(|line| line.contains(SUMMARY_MARKER))
        .ok_or_else(|| {
            TriageError::MalformedLog(format!("no line containing {SUMMARY_MARKER:?}"))
        })?;

    let status = line
        .split_once(SUMMARY_MARKER)
        .map(|(_, rest)| rest)
        .unwrap_or_default()
        .trim()
        .trim_end_matches(']')
        .trim();

    Ok(status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CommandStatus;

    fn last_block(command: &str, output: &[&str]) -> String {
        let mut text = format!("{BLOCK_START}\n{command}\n{BLOCK_END}\n");
        for line in output {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    fn block(command: &str, output: &[&str]) -> String {
        format!("{}----\n", last_block(command, output))
    }

    fn summary(status: &str) -> String {
        format!("[12:00:00] Commands finished with result: {status}\n")
    }

    #[test]
    fn test_segments_two_commands() {
        let log = format!(
            "{}{}{}",
            block("echo one", &["one"]),
            last_block("make all", &["compiling", "Command failed with exit code 1"]),
            summary("Failed")
        );
        let result = segment(&log).expect("segment");

        assert_eq!(result.overall_status, "Failed");
        assert_eq!(result.records.len(), 2);
        let first = result.records.get("echo one").expect("first");
        assert_eq!(first.output, vec!["one".to_string()]);
        assert_eq!(first.status, CommandStatus::Success);
        let second = result.records.get("make all").expect("second");
        assert_eq!(second.status, CommandStatus::Failed);
        assert_eq!(second.output.len(), 2);
    }

    #[test]
    fn test_last_block_drops_final_line() {
        // The final line of the file bounds the last command like a separator.
        let log = format!(
            "{BLOCK_START}\nbuild\n{BLOCK_END}\nline a\nline b\n{}",
            summary("Success")
        );
        let result = segment(&log).expect("segment");
        let record = result.records.get("build").expect("record");
        assert_eq!(record.output, vec!["line a".to_string(), "line b".to_string()]);
    }

    #[test]
    fn test_multiline_command_text() {
        let log = format!(
            "{BLOCK_START}\ncd project\nmake test\n{BLOCK_END}\nran\n{}",
            summary("Success")
        );
        let result = segment(&log).expect("segment");
        let record = result.records.get("cd project\nmake test").expect("record");
        assert_eq!(record.output, vec!["ran".to_string()]);
    }

    #[test]
    fn test_blank_lines_are_discarded() {
        let log = format!(
            "{BLOCK_START}\n\nrun\n{BLOCK_END}\n\nfirst\n\nsecond\n\n{}",
            summary("Success")
        );
        let result = segment(&log).expect("segment");
        let record = result.records.get("run").expect("record");
        assert_eq!(record.output, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_trailing_start_delimiter_is_discarded() {
        let log = format!(
            "{}{}{BLOCK_START}\n",
            last_block("only", &["out"]),
            summary("Success")
        );
        let result = segment(&log).expect("segment");
        assert_eq!(result.records.len(), 1);
        assert!(result.records.get("only").is_some());
    }

    #[test]
    fn test_duplicate_command_overwrites() {
        let log = format!(
            "{}{}{}{}",
            block("retry.sh", &["Command failed"]),
            block("other", &["fine"]),
            last_block("retry.sh", &["fine now"]),
            summary("Success")
        );
        let result = segment(&log).expect("segment");
        assert_eq!(result.records.len(), 2);
        let commands: Vec<&str> = result.records.commands().collect();
        assert_eq!(commands, vec!["retry.sh", "other"]);
        let retry = result.records.get("retry.sh").expect("record");
        assert_eq!(retry.status, CommandStatus::Success);
        assert_eq!(retry.output, vec!["fine now".to_string()]);
    }

    #[test]
    fn test_missing_summary_is_malformed() {
        let log = block("echo", &["x"]);
        let err = segment(&log).expect_err("should fail");
        assert!(matches!(err, TriageError::MalformedLog(_)));
    }

    #[test]
    fn test_unclosed_block_is_malformed() {
        let log = format!("{BLOCK_START}\nhang\nno end\nmore\n{}", summary("Failed"));
        let err = segment(&log).expect_err("should fail");
        assert!(matches!(err, TriageError::MalformedLog(_)));
    }

    #[test]
    fn test_delimiters_with_timestamp_prefix() {
        let log = format!(
            "[10:00:00] {BLOCK_START}\nunity -batchmode\n[10:00:00] {BLOCK_END}\nstarted\n{}",
            summary("Success")
        );
        let result = segment(&log).expect("segment");
        assert!(result.records.get("unity -batchmode").is_some());
    }

    #[test]
    fn test_overall_status_variants() {
        assert_eq!(
            overall_status(&["[t] Commands finished with result: Failed"]).expect("status"),
            "Failed"
        );
        assert_eq!(
            overall_status(&["[t] Commands finished with result: Success]"]).expect("status"),
            "Success"
        );
        assert_eq!(
            overall_status(&["Commands finished with result: Cancelled "]).expect("status"),
            "Cancelled"
        );
    }

    #[test]
    fn test_windows_line_endings() {
        let log = format!(
            "{BLOCK_START}\r\nbuild\r\n{BLOCK_END}\r\nok\r\n[t] Commands finished with result: Success\r\n"
        );
        let result = segment(&log).expect("segment");
        assert_eq!(result.overall_status, "Success");
        assert_eq!(
            result.records.get("build").map(|r| r.output.clone()),
            Some(vec!["ok".to_string()])
        );
    }
}
