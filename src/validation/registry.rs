//! Validation Registry
//!
//! Maps each cluster [`Kind`] to the ordered list of checks that apply to it.
//! A registry is assembled once through [`ValidationRegistryBuilder`] and is
//! read-only afterwards; the built-in registry lives behind a `LazyLock`.

use crate::domain::ports::{Kind, ValidationCheck, ValidationCheckRef};
use crate::error::{Error, Result};
use crate::validation::checks::{AzureCliVersionCheck, KindVersionCheck, MinikubeVersionCheck};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

static BUILTIN: LazyLock<ValidationRegistry> = LazyLock::new(|| {
    ValidationRegistry::builtin().expect("built-in validation check names are unique per kind")
});

// =============================================================================
// Registry
// =============================================================================

/// Immutable mapping from cluster kind to its validation checks
#[derive(Clone, Default)]
pub struct ValidationRegistry {
    checks: BTreeMap<Kind, Vec<ValidationCheckRef>>,
}

impl ValidationRegistry {
    /// Start building a registry
    pub fn builder() -> ValidationRegistryBuilder {
        ValidationRegistryBuilder::default()
    }

    /// The process-wide registry of built-in checks
    pub fn global() -> &'static ValidationRegistry {
        &BUILTIN
    }

    /// Build a fresh copy of the built-in checks
    pub fn builtin() -> Result<Self> {
        Ok(Self::builder()
            .register(Kind::Minikube, MinikubeVersionCheck::default())?
            .register(Kind::Kind, KindVersionCheck::default())?
            .register(Kind::Aks, AzureCliVersionCheck::default())?
            .build())
    }

    /// Checks for `kind` in registration order; empty when none are registered
    pub fn checks_for(&self, kind: Kind) -> &[ValidationCheckRef] {
        self.checks.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of the checks for `kind`, in registration order
    pub fn check_names(&self, kind: Kind) -> Vec<&str> {
        self.checks_for(kind).iter().map(|c| c.name()).collect()
    }

    /// Kinds that have at least one check
    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ {
        self.checks.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.checks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ValidationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for kind in self.kinds() {
            map.entry(&kind, &self.check_names(kind));
        }
        map.finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder that enforces unique check names per kind
#[derive(Default)]
pub struct ValidationRegistryBuilder {
    checks: BTreeMap<Kind, Vec<ValidationCheckRef>>,
}

impl ValidationRegistryBuilder {
    /// Append a check to `kind`'s list
    pub fn register<C>(self, kind: Kind, check: C) -> Result<Self>
    where
        C: ValidationCheck + 'static,
    {
        self.register_arc(kind, Arc::new(check))
    }

    /// Append an already shared check to `kind`'s list
    pub fn register_arc(mut self, kind: Kind, check: ValidationCheckRef) -> Result<Self> {
        let list = self.checks.entry(kind).or_default();

        if list.iter().any(|existing| existing.name() == check.name()) {
            return Err(Error::DuplicateCheck {
                kind,
                check: check.name().to_string(),
            });
        }

        list.push(check);
        Ok(self)
    }

    pub fn build(self) -> ValidationRegistry {
        ValidationRegistry {
            checks: self.checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CheckContext;
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl ValidationCheck for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn check(&self, _ctx: &CheckContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ValidationRegistry::global();

        assert_eq!(registry.check_names(Kind::Minikube), vec!["minimum-version"]);
        assert_eq!(registry.check_names(Kind::Kind), vec!["kind-version"]);
        assert_eq!(registry.check_names(Kind::Aks), vec!["az-version"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_absent_kind_has_no_checks() {
        let registry = ValidationRegistry::global();

        for kind in [Kind::Unknown, Kind::Eks, Kind::Gke, Kind::K3s] {
            assert!(registry.checks_for(kind).is_empty());
        }
        assert!(ValidationRegistry::default().is_empty());
    }

    #[test]
    fn test_registration_order_preserved() {
        let registry = ValidationRegistry::builder()
            .register(Kind::Eks, Named("first"))
            .unwrap()
            .register(Kind::Eks, Named("second"))
            .unwrap()
            .register(Kind::Eks, Named("third"))
            .unwrap()
            .build();

        assert_eq!(registry.check_names(Kind::Eks), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = ValidationRegistry::builder()
            .register(Kind::Gke, Named("version"))
            .unwrap()
            .register(Kind::Gke, Named("version"))
            .err()
            .unwrap();

        assert_matches!(err, Error::DuplicateCheck { kind: Kind::Gke, ref check } if check == "version");
    }

    #[test]
    fn test_same_name_allowed_across_kinds() {
        let registry = ValidationRegistry::builder()
            .register(Kind::Gke, Named("version"))
            .unwrap()
            .register(Kind::Eks, Named("version"))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.kinds().collect::<Vec<_>>(), vec![Kind::Eks, Kind::Gke]);
    }
}
