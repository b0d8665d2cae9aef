//! Known failure signatures.
//!
//! A [`PatternCatalog`] is an ordered list of [`PatternRule`]s compiled once
//! at startup. Earlier rules win when several match the same output.

use crate::error::{Result, TriageError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One known failure signature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternRule {
    /// Regular expression searched anywhere in a command's output.
    pub pattern: String,

    /// Outcome label reported for a match, e.g. `failure` or `infrastructure`.
    pub conclusion: String,

    /// Classification labels reported for a match.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PatternRule {
    pub fn new(pattern: impl Into<String>, conclusion: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            pattern: pattern.into(),
            conclusion: conclusion.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Built-in catalog: infrastructure faults first, then build and runtime failures.
const BUILTIN_RULES: &[(&str, &str, &[&str])] = &[
    (r"No space left on device", "infrastructure", &["disk space"]),
    (
        r"OutOfMemoryError|Cannot allocate memory|Out of memory",
        "infrastructure",
        &["oom"],
    ),
    (
        r"Could not resolve host[^\n]*|Temporary failure in name resolution",
        "infrastructure",
        &["network", "dns"],
    ),
    (
        r"Connection (?:refused|reset by peer|timed out)",
        "infrastructure",
        &["network"],
    ),
    (
        r"TLS handshake (?:failed|timeout)|SSL_ERROR_[A-Z_]+",
        "infrastructure",
        &["network", "tls"],
    ),
    (
        r"Failed to (?:download|fetch) [^\n]*",
        "infrastructure",
        &["artifacts"],
    ),
    (
        r"No valid Unity Editor license found|License (?:activation|return) failed",
        "infrastructure",
        &["license"],
    ),
    (
        r"adb: (?:device offline|no devices/emulators found)|Device (?:disconnected|not found)",
        "infrastructure",
        &["device"],
    ),
    (
        r"Timeout while waiting for [^\n]*|Command timed out[^\n]*",
        "failure",
        &["timeout"],
    ),
    (
        r"Segmentation fault|Received signal SIG[A-Z]+|Bus error",
        "failure",
        &["crash"],
    ),
    (
        r"error CS\d{4}: [^\n]*|Scripts have compiler errors\.",
        "failure",
        &["compilation"],
    ),
    (
        r"Shader error in '[^']*'[^\n]*",
        "failure",
        &["shader compilation"],
    ),
];

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: PatternRule,
    regex: Regex,
}

impl CompiledRule {
    fn compile(rule: PatternRule) -> Result<Self> {
        let regex = Regex::new(&rule.pattern).map_err(|e| TriageError::InvalidPattern {
            pattern: rule.pattern.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { rule, regex })
    }
}

/// Ordered, compiled failure catalog.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    rules: Vec<CompiledRule>,
}

impl PatternCatalog {
    /// Compile `rules`, keeping their order as match priority.
    pub fn new(rules: Vec<PatternRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::new(
            BUILTIN_RULES
                .iter()
                .map(|(pattern, conclusion, tags)| PatternRule::new(*pattern, *conclusion, tags))
                .collect(),
        )
    }

    /// Parse a JSON array of rules.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rules: Vec<PatternRule> = serde_json::from_str(json)?;
        Self::new(rules)
    }

    /// Load a JSON catalog file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in priority order.
    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// The earliest rule matching `text`, with the matched substring.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<(&PatternRule, &'t str)> {
        self.rules.iter().find_map(|compiled| {
            compiled
                .regex
                .find(text)
                .map(|m| (&compiled.rule, m.as_str()))
        })
    }

    /// Match `text` against the first rule only.
    pub fn leading_match<'t>(&self, text: &'t str) -> Option<(&PatternRule, &'t str)> {
        let compiled = self.rules.first()?;
        compiled
            .regex
            .find(text)
            .map(|m| (&compiled.rule, m.as_str()))
    }
}
