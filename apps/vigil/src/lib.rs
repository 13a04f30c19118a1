//! Vigil core library.
//!
//! This crate exposes the orchestration core of a static security scanner:
//! files are parsed into syntax trees, walked by a registry of checks, and
//! the findings collected into a store, with per-file error isolation.
//!
//! High-level modules:
//! - `scan`: `ScanManager`, the run loop over files or stdin.
//! - `walker`: ordered traversal of one tree against the registry.
//! - `checks`: the check contract, registry and built-in checks.
//! - `store` / `metadata`: findings and the per-file audit trail.
//! - `parser` / `tree`: the parser capability and the owned syntax tree.
//! - `config`, `cli`, `logging`, `output`, `targets`: ambient pieces used by
//!   the binary.

pub mod cancel;
pub mod checks;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod output;
pub mod parser;
pub mod progress;
pub mod scan;
pub mod store;
pub mod targets;
pub mod tree;
pub mod walker;

pub use cancel::CancellationToken;
pub use checks::{Check, CheckContext, CheckDescriptor, CheckRegistry, Visit};
pub use error::{CheckFault, ConfigError, FileError, ScanError};
pub use metadata::TreeMetadataLog;
pub use models::{Confidence, Finding, MetadataRecord, ParseOutcome, Severity, STDIN_ID};
pub use parser::{ParseError, PythonParser, SourceParser};
pub use progress::{ProgressEvent, ProgressSink};
pub use scan::{RunSummary, ScanManager, ScanOptions, ScanScope};
pub use store::{FindingStore, ReportView};
