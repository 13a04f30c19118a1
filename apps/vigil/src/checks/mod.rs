//! Check plugin contract.
//!
//! A check subscribes to node kinds and is invoked by the walker on every
//! node of those kinds. Checks never see a tree that failed to parse and
//! must not hold on to the context beyond a call.

pub mod builtin;
pub mod registry;

use crate::context::NodeContext;
use crate::error::CheckFault;
use crate::models::{Confidence, Finding, Severity};
use crate::tree::NodeRef;

pub use registry::{CheckDescriptor, CheckRegistry, CheckRegistryBuilder};

/// Lines of source kept with each finding.
const SNIPPET_LINES: usize = 3;

pub trait Check: Send + Sync {
    /// Stable identifier, unique within a registry (e.g. `B101`).
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Node kinds this check wants to be invoked on.
    fn interested_kinds(&self) -> &[&'static str];

    fn visit(&self, node: NodeRef<'_>, ctx: &CheckContext<'_>) -> Result<Visit, CheckFault>;
}

/// Result of one check invocation.
#[derive(Debug, Default)]
pub struct Visit {
    pub findings: Vec<Finding>,
    /// Do not descend into the visited node's children.
    pub skip_children: bool,
}

impl Visit {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn finding(finding: Finding) -> Self {
        Self {
            findings: vec![finding],
            skip_children: false,
        }
    }

    pub fn findings(findings: Vec<Finding>) -> Self {
        Self {
            findings,
            skip_children: false,
        }
    }

    pub fn skip_children(mut self) -> Self {
        self.skip_children = true;
        self
    }
}

/// Read-only view handed to a check for one invocation.
pub struct CheckContext<'a> {
    file: &'a str,
    check_id: &'a str,
    scope: &'a NodeContext,
}

impl<'a> CheckContext<'a> {
    pub(crate) fn new(file: &'a str, check_id: &'a str, scope: &'a NodeContext) -> Self {
        Self {
            file,
            check_id,
            scope,
        }
    }

    pub fn file(&self) -> &str {
        self.file
    }

    pub fn check_id(&self) -> &str {
        self.check_id
    }

    /// Enclosing function/class frames.
    pub fn scope(&self) -> &NodeContext {
        self.scope
    }

    /// Build a finding located at `node` for the current file and check.
    pub fn finding(
        &self,
        node: NodeRef<'_>,
        severity: Severity,
        confidence: Confidence,
        message: impl Into<String>,
    ) -> Finding {
        let start = node.start();
        Finding::new(
            self.file,
            start.line,
            start.column,
            self.check_id,
            severity,
            confidence,
            message,
            node.source_lines(SNIPPET_LINES),
        )
    }
}
