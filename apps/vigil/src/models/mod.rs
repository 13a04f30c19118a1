//! Shared data models for findings and per-file audit records.

pub mod metadata;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use metadata::{MetadataRecord, ParseOutcome};

/// File id used for the anonymous unit read from standard input.
pub const STDIN_ID: &str = "<stdin>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Severity of a finding. Ordered so that `Low < Medium < High`.
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// How sure a check is that its finding is a real issue.
pub enum Confidence {
    Low,
    Medium,
    High,
}

fn parse_level(s: &str) -> Option<u8> {
    match s.trim().to_ascii_lowercase().as_str() {
        "low" | "l" => Some(0),
        "medium" | "med" | "m" => Some(1),
        "high" | "h" => Some(2),
        _ => None,
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_level(s) {
            Some(0) => Ok(Severity::Low),
            Some(1) => Ok(Severity::Medium),
            Some(2) => Ok(Severity::High),
            _ => Err(format!("unknown severity '{}' (expected low|medium|high)", s)),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_level(s) {
            Some(0) => Ok(Confidence::Low),
            Some(1) => Ok(Confidence::Medium),
            Some(2) => Ok(Confidence::High),
            _ => Err(format!("unknown confidence '{}' (expected low|medium|high)", s)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        })
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single reported security issue.
///
/// Built by checks through `CheckContext::finding` and never modified once
/// it reaches the `FindingStore`.
pub struct Finding {
    file: String,
    line: usize,
    column: usize,
    check_id: String,
    severity: Severity,
    confidence: Confidence,
    message: String,
    code: String,
}

impl Finding {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file: impl Into<String>,
        line: usize,
        column: usize,
        check_id: impl Into<String>,
        severity: Severity,
        confidence: Confidence,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            check_id: check_id.into(),
            severity,
            confidence,
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// 1-based line of the flagged node.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 0-based column of the flagged node.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn check_id(&self) -> &str {
        &self.check_id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source line(s) covered by the flagged node.
    pub fn code(&self) -> &str {
        &self.code
    }
}
