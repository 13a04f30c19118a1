//! Checks over call expressions.

use super::call_name;
use crate::checks::{Check, CheckContext, Visit};
use crate::error::CheckFault;
use crate::models::{Confidence, Severity};
use crate::tree::NodeRef;

pub struct ExecUsed;

impl Check for ExecUsed {
    fn id(&self) -> &str {
        "B102"
    }

    fn name(&self) -> &str {
        "exec_used"
    }

    fn description(&self) -> &str {
        "Use of exec detected."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["call"]
    }

    fn visit(&self, node: NodeRef<'_>, ctx: &CheckContext<'_>) -> Result<Visit, CheckFault> {
        if call_name(node) != Some("exec") {
            return Ok(Visit::none());
        }
        Ok(Visit::finding(ctx.finding(
            node,
            Severity::Medium,
            Confidence::High,
            "Use of exec detected.",
        )))
    }
}

/// Calls that deserialize or evaluate untrusted input.
const BLACKLIST: &[(&str, Severity, &str)] = &[
    ("eval", Severity::Medium, "Use of possibly insecure function - consider using safer ast.literal_eval."),
    ("pickle.loads", Severity::Medium, "Pickle can be unsafe when used to deserialize untrusted data."),
    ("pickle.load", Severity::Medium, "Pickle can be unsafe when used to deserialize untrusted data."),
    ("marshal.loads", Severity::Medium, "Deserialization with the marshal module is possibly dangerous."),
    ("marshal.load", Severity::Medium, "Deserialization with the marshal module is possibly dangerous."),
    ("yaml.load", Severity::Medium, "Use of unsafe yaml load. Allows instantiation of arbitrary objects. Consider yaml.safe_load()."),
];

pub struct BlacklistCalls;

impl Check for BlacklistCalls {
    fn id(&self) -> &str {
        "B301"
    }

    fn name(&self) -> &str {
        "blacklist_calls"
    }

    fn description(&self) -> &str {
        "Calls to functions known to be unsafe with untrusted input."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["call"]
    }

    fn visit(&self, node: NodeRef<'_>, ctx: &CheckContext<'_>) -> Result<Visit, CheckFault> {
        let Some(name) = call_name(node) else {
            return Ok(Visit::none());
        };
        match BLACKLIST.iter().find(|(n, _, _)| *n == name) {
            Some((_, severity, message)) => Ok(Visit::finding(ctx.finding(
                node,
                *severity,
                Confidence::High,
                *message,
            ))),
            None => Ok(Visit::none()),
        }
    }
}

pub struct SubprocessShellTrue;

impl SubprocessShellTrue {
    fn shell_enabled(call: NodeRef<'_>) -> bool {
        let Some(args) = call.child_by_field("arguments") else {
            return false;
        };
        args.children_by_kind("keyword_argument").any(|kw| {
            kw.child_by_field("name").map(|n| n.text()) == Some("shell")
                && kw.child_by_field("value").map(|v| v.kind()) == Some("true")
        })
    }
}

impl Check for SubprocessShellTrue {
    fn id(&self) -> &str {
        "B602"
    }

    fn name(&self) -> &str {
        "subprocess_popen_with_shell_equals_true"
    }

    fn description(&self) -> &str {
        "subprocess call with shell=True."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["call"]
    }

    fn visit(&self, node: NodeRef<'_>, ctx: &CheckContext<'_>) -> Result<Visit, CheckFault> {
        let is_subprocess = call_name(node)
            .map(|n| n.starts_with("subprocess."))
            .unwrap_or(false);
        if !is_subprocess || !Self::shell_enabled(node) {
            return Ok(Visit::none());
        }
        Ok(Visit::finding(ctx.finding(
            node,
            Severity::High,
            Confidence::High,
            "subprocess call with shell=True identified, security issue.",
        )))
    }
}
