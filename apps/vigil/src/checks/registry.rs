use super::Check;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered check together with its subscriptions.
#[derive(Clone)]
pub struct CheckDescriptor {
    pub id: String,
    pub kinds: Vec<&'static str>,
    pub check: Arc<dyn Check>,
}

impl std::fmt::Debug for CheckDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckDescriptor")
            .field("id", &self.id)
            .field("kinds", &self.kinds)
            .finish()
    }
}

/// Configured test set. Filled once before a run and read-only afterwards.
#[derive(Default, Debug)]
pub struct CheckRegistry {
    descriptors: Vec<CheckDescriptor>,
    by_kind: HashMap<&'static str, Vec<usize>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> CheckRegistryBuilder {
        CheckRegistryBuilder::new()
    }

    pub fn register<C: Check + 'static>(&mut self, check: C) -> Result<(), ConfigError> {
        self.register_arc(Arc::new(check))
    }

    /// Fails on a duplicate id instead of overwriting.
    pub fn register_arc(&mut self, check: Arc<dyn Check>) -> Result<(), ConfigError> {
        let id = check.id().to_string();
        if self.descriptors.iter().any(|d| d.id == id) {
            return Err(ConfigError::DuplicateCheck(id));
        }
        let mut kinds: Vec<&'static str> = Vec::new();
        for kind in check.interested_kinds() {
            if !kinds.contains(kind) {
                kinds.push(kind);
            }
        }
        let slot = self.descriptors.len();
        for kind in &kinds {
            self.by_kind.entry(*kind).or_default().push(slot);
        }
        self.descriptors.push(CheckDescriptor { id, kinds, check });
        Ok(())
    }

    /// Checks subscribed to `kind`, in registration order.
    pub fn subscribers_for<'r>(&'r self, kind: &str) -> impl Iterator<Item = &'r CheckDescriptor> + 'r {
        self.by_kind
            .get(kind)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&slot| &self.descriptors[slot])
    }

    pub fn descriptors(&self) -> &[CheckDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, id: &str) -> Option<&CheckDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[derive(Default, Debug)]
pub struct CheckRegistryBuilder {
    registry: CheckRegistry,
}

impl CheckRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check<C: Check + 'static>(mut self, check: C) -> Result<Self, ConfigError> {
        self.registry.register(check)?;
        Ok(self)
    }

    pub fn with_arc(mut self, check: Arc<dyn Check>) -> Result<Self, ConfigError> {
        self.registry.register_arc(check)?;
        Ok(self)
    }

    pub fn build(self) -> CheckRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckContext, Visit};
    use crate::error::CheckFault;
    use crate::tree::NodeRef;

    struct Named(&'static str, &'static [&'static str]);

    impl Check for Named {
        fn id(&self) -> &str {
            self.0
        }
        fn name(&self) -> &str {
            self.0
        }
        fn interested_kinds(&self) -> &[&'static str] {
            self.1
        }
        fn visit(&self, _: NodeRef<'_>, _: &CheckContext<'_>) -> Result<Visit, CheckFault> {
            Ok(Visit::none())
        }
    }

    #[test]
    fn test_subscribers_follow_registration_order() {
        let reg = CheckRegistry::builder()
            .with_check(Named("b", &["call", "string"]))
            .unwrap()
            .with_check(Named("a", &["call"]))
            .unwrap()
            .build();
        let ids: Vec<_> = reg.subscribers_for("call").map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        let ids: Vec<_> = reg.subscribers_for("string").map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(reg.subscribers_for("module").count(), 0);
    }

    #[test]
    fn test_duplicate_id_fails_fast() {
        let mut reg = CheckRegistry::new();
        reg.register(Named("dup", &["call"])).unwrap();
        let err = reg.register(Named("dup", &["string"])).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCheck(ref id) if id == "dup"));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("dup").unwrap().kinds, vec!["call"]);
    }

    #[test]
    fn test_repeated_kind_subscribes_once() {
        let reg = CheckRegistry::builder()
            .with_check(Named("x", &["call", "call"]))
            .unwrap()
            .build();
        assert_eq!(reg.subscribers_for("call").count(), 1);
    }
}
