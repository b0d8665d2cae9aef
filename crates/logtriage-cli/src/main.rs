//! logtriage - CI execution log triage CLI
//!
//! Reads a job runner's execution log, splits it into commands, classifies
//! the first failing command against the failure catalog and writes the
//! parsed commands to `parsed_logs.json`.
//!
//! Unless `--local` is given the classification is POSTed to the reporting
//! server named by `YAMATO_REPORTING_SERVER`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};

use logtriage_core::obs::{self, TriageSpan};
use logtriage_core::{
    init_tracing, triage_file, Classifier, DeliverySink, ExplicitPath, GlobLocator, HttpSink,
    LogLocator, PatternCatalog, ReportingConfig, RuleScan, StdoutSink, DEFAULT_OUTPUT,
};

#[derive(Parser)]
#[command(name = "logtriage")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Classify the first failure in a CI execution log", long_about = None)]
struct Cli {
    /// Path to execution log file. If not specified, ../../Execution-*.log is used.
    #[arg(long, value_name = "PATH")]
    execution_log: Option<PathBuf>,

    /// Print the classification instead of posting it to the reporting server
    #[arg(long)]
    local: bool,

    /// JSON failure catalog to use instead of the built-in one
    #[arg(long, value_name = "FILE")]
    patterns: Option<PathBuf>,

    /// Consult only the first catalog rule, as older runners did
    #[arg(long)]
    leading_rule_only: bool,

    /// Where to write the parsed log artifact
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    // Delivery configuration is checked before any work is done.
    let sink = build_sink(cli.local)?;
    let classifier = build_classifier(cli.patterns.as_ref(), cli.leading_rule_only)?;

    let locator: Box<dyn LogLocator> = match cli.execution_log {
        Some(path) => Box::new(ExplicitPath(path)),
        None => Box::new(GlobLocator::from_cwd().context("Failed to prepare log search")?),
    };
    let log_path = locator
        .locate()
        .context("Failed to locate execution log")?;
    obs::emit_log_located(&log_path);
    let _span = TriageSpan::enter(&log_path);

    let result = triage_file(&log_path, &classifier, sink.as_ref())
        .with_context(|| format!("Failed to triage {}", log_path.display()))?;

    result
        .write_json(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    info!(
        overall_status = %result.overall_status,
        commands = result.records.len(),
        "Triage complete"
    );
    Ok(())
}

fn build_sink(local: bool) -> Result<Box<dyn DeliverySink>> {
    if local {
        return Ok(Box::new(StdoutSink));
    }

    let config = ReportingConfig::from_env()
        .context("Reporting server is not configured (use --local to skip delivery)")?;
    let sink = HttpSink::new(&config).context("Failed to create HTTP client")?;
    info!(endpoint = %sink.endpoint(), "Delivering classifications to reporting server");
    Ok(Box::new(sink))
}

fn build_classifier(patterns: Option<&PathBuf>, leading_rule_only: bool) -> Result<Classifier> {
    let catalog = match patterns {
        Some(path) => PatternCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load failure catalog {}", path.display()))?,
        None => PatternCatalog::builtin().context("Built-in failure catalog is invalid")?,
    };

    let scan = if leading_rule_only {
        RuleScan::LeadingRuleOnly
    } else {
        RuleScan::FirstMatch
    };
    Ok(Classifier::new(catalog).with_scan(scan))
}
