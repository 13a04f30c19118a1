//! Default test set for Python sources.
//!
//! Ids follow the B-numbering familiar from Python security linters.

mod assert_used;
mod calls;
mod strings;

pub use assert_used::AssertUsed;
pub use calls::{BlacklistCalls, ExecUsed, SubprocessShellTrue};
pub use strings::{HardcodedBindAllInterfaces, HardcodedPasswordString};

use super::{Check, CheckRegistry};
use crate::error::ConfigError;
use crate::tree::NodeRef;
use std::sync::Arc;

/// Which built-in checks to load. Empty `include` means all of them.
#[derive(Debug, Clone, Default)]
pub struct CheckSelection {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Every built-in check, in registration order.
pub fn all() -> Vec<Arc<dyn Check>> {
    vec![
        Arc::new(AssertUsed),
        Arc::new(ExecUsed),
        Arc::new(HardcodedBindAllInterfaces),
        Arc::new(HardcodedPasswordString::new()),
        Arc::new(BlacklistCalls),
        Arc::new(SubprocessShellTrue),
    ]
}

/// Build the registry for `selection`. Unknown ids are configuration errors.
pub fn registry(selection: &CheckSelection) -> Result<CheckRegistry, ConfigError> {
    let checks = all();
    for id in selection.include.iter().chain(selection.exclude.iter()) {
        if !checks.iter().any(|c| c.id().eq_ignore_ascii_case(id)) {
            return Err(ConfigError::UnknownCheck(id.clone()));
        }
    }
    let wanted = |id: &str| {
        let included = selection.include.is_empty()
            || selection.include.iter().any(|i| i.eq_ignore_ascii_case(id));
        let excluded = selection.exclude.iter().any(|e| e.eq_ignore_ascii_case(id));
        included && !excluded
    };
    let mut registry = CheckRegistry::new();
    for check in checks {
        if wanted(check.id()) {
            registry.register_arc(check)?;
        }
    }
    Ok(registry)
}

/// Value of a plain string literal without prefix and quotes.
///
/// Returns `None` for f-strings and concatenations.
pub(crate) fn string_value<'t>(node: NodeRef<'t>) -> Option<&'t str> {
    if node.kind() != "string" || node.children_by_kind("interpolation").next().is_some() {
        return None;
    }
    let text = node.text();
    let body = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote) {
            return Some(&body[quote.len()..body.len() - quote.len()]);
        }
    }
    None
}

/// Dotted name of a call target (`subprocess.Popen`, `eval`), if simple.
pub(crate) fn call_name<'t>(call: NodeRef<'t>) -> Option<&'t str> {
    let func = call.child_by_field("function")?;
    match func.kind() {
        "identifier" | "attribute" => Some(func.text()),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_every_check() {
        let reg = registry(&CheckSelection::default()).unwrap();
        assert_eq!(
            reg.ids(),
            vec!["B101", "B102", "B104", "B105", "B301", "B602"]
        );
    }

    #[test]
    fn test_include_and_exclude() {
        let sel = CheckSelection {
            include: vec!["B101".into(), "b602".into()],
            exclude: vec!["B602".into()],
        };
        assert_eq!(registry(&sel).unwrap().ids(), vec!["B101"]);
    }

    #[test]
    fn test_unknown_id_is_config_error() {
        let sel = CheckSelection {
            include: vec![],
            exclude: vec!["B999".into()],
        };
        assert!(matches!(
            registry(&sel),
            Err(ConfigError::UnknownCheck(ref id)) if id == "B999"
        ));
    }
}
