//! Checks over string literals.

use super::string_value;
use crate::checks::{Check, CheckContext, Visit};
use crate::error::CheckFault;
use crate::models::{Confidence, Severity};
use crate::tree::NodeRef;
use regex::Regex;

pub struct HardcodedBindAllInterfaces;

impl Check for HardcodedBindAllInterfaces {
    fn id(&self) -> &str {
        "B104"
    }

    fn name(&self) -> &str {
        "hardcoded_bind_all_interfaces"
    }

    fn description(&self) -> &str {
        "Possible binding to all interfaces."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["string"]
    }

    fn visit(&self, node: NodeRef<'_>, ctx: &CheckContext<'_>) -> Result<Visit, CheckFault> {
        if string_value(node) != Some("0.0.0.0") {
            return Ok(Visit::none());
        }
        Ok(Visit::finding(ctx.finding(
            node,
            Severity::Medium,
            Confidence::Medium,
            "Possible binding to all interfaces.",
        ))
        .skip_children())
    }
}

/// Assignment of a non-empty string literal to a password-like name.
pub struct HardcodedPasswordString {
    candidate: Regex,
}

impl HardcodedPasswordString {
    pub fn new() -> Self {
        Self {
            candidate: Regex::new(r"(?i)(pass(wd|word)?|pwd|secret|token)$")
                .expect("bad password pattern"),
        }
    }

    fn target_name<'t>(left: NodeRef<'t>) -> Option<&'t str> {
        match left.kind() {
            "identifier" => Some(left.text()),
            "attribute" => left.child_by_field("attribute").map(|a| a.text()),
            _ => None,
        }
    }
}

impl Default for HardcodedPasswordString {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for HardcodedPasswordString {
    fn id(&self) -> &str {
        "B105"
    }

    fn name(&self) -> &str {
        "hardcoded_password_string"
    }

    fn description(&self) -> &str {
        "Possible hardcoded password assigned to a variable."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["assignment"]
    }

    fn visit(&self, node: NodeRef<'_>, ctx: &CheckContext<'_>) -> Result<Visit, CheckFault> {
        let (Some(left), Some(right)) = (node.child_by_field("left"), node.child_by_field("right"))
        else {
            return Ok(Visit::none());
        };
        let Some(name) = Self::target_name(left) else {
            return Ok(Visit::none());
        };
        match string_value(right) {
            Some(value) if !value.is_empty() && self.candidate.is_match(name) => {
                Ok(Visit::finding(ctx.finding(
                    node,
                    Severity::Low,
                    Confidence::Medium,
                    format!("Possible hardcoded password: '{}'", value),
                )))
            }
            _ => Ok(Visit::none()),
        }
    }
}
