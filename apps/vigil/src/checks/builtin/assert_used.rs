use crate::checks::{Check, CheckContext, Visit};
use crate::error::CheckFault;
use crate::models::{Confidence, Severity};
use crate::tree::NodeRef;

/// `assert` is stripped when Python runs with `-O`; guards built on it vanish.
pub struct AssertUsed;

impl Check for AssertUsed {
    fn id(&self) -> &str {
        "B101"
    }

    fn name(&self) -> &str {
        "assert_used"
    }

    fn description(&self) -> &str {
        "Use of assert detected; it is removed when compiling to optimised byte code."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["assert_statement"]
    }

    fn visit(&self, node: NodeRef<'_>, ctx: &CheckContext<'_>) -> Result<Visit, CheckFault> {
        Ok(Visit::finding(ctx.finding(
            node,
            Severity::Low,
            Confidence::High,
            "Use of assert detected. The enclosed code will be removed when compiling to optimised byte code.",
        )))
    }
}
