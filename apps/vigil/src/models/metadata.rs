//! Per-file audit record written once for every attempted file.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
/// What happened when a file was acquired and parsed.
pub enum ParseOutcome {
    Success,
    SyntaxError,
    /// The file could not be read, so it was never parsed.
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataRecord {
    pub file: String,
    pub outcome: ParseOutcome,
    pub nodes: usize,
    pub lines: usize,
}

impl MetadataRecord {
    pub fn success(file: impl Into<String>, nodes: usize, lines: usize) -> Self {
        Self {
            file: file.into(),
            outcome: ParseOutcome::Success,
            nodes,
            lines,
        }
    }

    pub fn syntax_error(file: impl Into<String>, lines: usize) -> Self {
        Self {
            file: file.into(),
            outcome: ParseOutcome::SyntaxError,
            nodes: 0,
            lines,
        }
    }

    pub fn unreadable(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            outcome: ParseOutcome::Unreadable,
            nodes: 0,
            lines: 0,
        }
    }
}
