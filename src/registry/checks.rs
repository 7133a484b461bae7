//! The check registry.

use std::fmt;

use crate::checkup::{Check, CheckContributor};
use crate::error::{CheckupError, Result};

/// Explicit set of checks for one run.
///
/// Static checks are registered first, then contributed checks, so
/// registration order doubles as the tie-break order of the graph.
#[derive(Default)]
pub struct CheckRegistry {
    checks: Vec<Box<dyn Check>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check. Ids are unique, compared case-insensitively.
    pub fn register(&mut self, check: Box<dyn Check>) -> Result<()> {
        if self.contains(check.id()) {
            return Err(CheckupError::DuplicateCheck {
                id: check.id().to_string(),
            });
        }
        tracing::debug!("Registered check '{}'", check.id());
        self.checks.push(check);
        Ok(())
    }

    /// Register every check a contributor produces; returns how many were added.
    pub fn contribute(&mut self, contributor: &dyn CheckContributor) -> Result<usize> {
        let contributed = contributor.contribute();
        let count = contributed.len();
        for check in contributed {
            self.register(check)?;
        }
        Ok(count)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&dyn Check> {
        self.checks
            .iter()
            .find(|c| c.id().eq_ignore_ascii_case(id))
            .map(|c| c.as_ref())
    }

    /// Checks in registration order.
    pub fn checks(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(|c| c.as_ref())
    }

    /// Every registered id in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.checks.iter().map(|c| c.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("checks", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkup::{CheckContext, Diagnosis};

    struct Named(&'static str);

    impl Check for Named {
        fn id(&self) -> &str {
            self.0
        }

        fn title(&self) -> &str {
            self.0
        }

        fn examine(&self, _ctx: &mut CheckContext<'_>) -> Result<Diagnosis> {
            Ok(Diagnosis::ok(self.0))
        }
    }

    struct PerVersion(Vec<&'static str>);

    impl CheckContributor for PerVersion {
        fn contribute(&self) -> Vec<Box<dyn Check>> {
            self.0
                .iter()
                .map(|v| Box::new(Named(v)) as Box<dyn Check>)
                .collect()
        }
    }

    #[test]
    fn registers_in_order() {
        let mut registry = CheckRegistry::new();
        registry.register(Box::new(Named("git"))).unwrap();
        registry.register(Box::new(Named("dotnet"))).unwrap();
        assert_eq!(registry.ids(), vec!["git", "dotnet"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn rejects_duplicate_ids_case_insensitively() {
        let mut registry = CheckRegistry::new();
        registry.register(Box::new(Named("dotnet"))).unwrap();
        let err = registry.register(Box::new(Named("DotNet"))).unwrap_err();
        assert!(matches!(err, CheckupError::DuplicateCheck { .. }));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry = CheckRegistry::new();
        registry.register(Box::new(Named("openjdk"))).unwrap();
        assert!(registry.contains("OpenJDK"));
        assert_eq!(registry.get("OPENJDK").unwrap().id(), "openjdk");
        assert!(registry.get("android").is_none());
    }

    #[test]
    fn contributed_checks_follow_static_ones() {
        let mut registry = CheckRegistry::new();
        registry.register(Box::new(Named("dotnet"))).unwrap();
        let added = registry
            .contribute(&PerVersion(vec!["packages-6.0.100", "packages-7.0.100"]))
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(
            registry.ids(),
            vec!["dotnet", "packages-6.0.100", "packages-7.0.100"]
        );
    }

    #[test]
    fn empty_registry() {
        let registry = CheckRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.checks().count(), 0);
    }
}
