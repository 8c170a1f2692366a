//! Explicit migration registry

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::Migration;
use crate::error::{Error, Result};
use crate::version::{MigrationId, Version};

/// Builds a fresh migration instance for each run.
pub type MigrationFactory = Arc<dyn Fn() -> Box<dyn Migration> + Send + Sync>;

/// A migration that can be applied: its version and full identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableMigration {
    pub version: Version,
    pub name: String,
}

#[derive(Clone)]
struct Entry {
    id: MigrationId,
    factory: MigrationFactory,
}

/// Versioned migration factories, ordered by version.
///
/// All versions in one registry must have the same number of digits, so that
/// string order and chronological order agree.
#[derive(Clone, Default)]
pub struct MigrationRegistry {
    entries: BTreeMap<Version, Entry>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration under an identifier like
    /// `Version20240101000001_CreateCustomerTable`.
    pub fn register<M, F>(&mut self, identifier: &str, factory: F) -> Result<&mut Self>
    where
        M: Migration + 'static,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let factory: MigrationFactory = Arc::new(move || Box::new(factory()) as Box<dyn Migration>);
        self.register_factory(identifier, factory)
    }

    /// Register an already boxed factory.
    pub fn register_factory(
        &mut self,
        identifier: &str,
        factory: MigrationFactory,
    ) -> Result<&mut Self> {
        let id = MigrationId::parse(identifier)?;
        self.insert(Entry { id, factory })?;
        Ok(self)
    }

    /// Builder form of [`MigrationRegistry::register`].
    pub fn with<M, F>(mut self, identifier: &str, factory: F) -> Result<Self>
    where
        M: Migration + 'static,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.register(identifier, factory)?;
        Ok(self)
    }

    /// Add every migration of `other`, with the same checks as registration.
    pub fn merge(&mut self, other: MigrationRegistry) -> Result<()> {
        for (_, entry) in other.entries {
            self.insert(entry)?;
        }
        Ok(())
    }

    /// Registered migrations, ascending by version.
    pub fn available(&self) -> Vec<AvailableMigration> {
        self.entries
            .iter()
            .map(|(version, entry)| AvailableMigration {
                version: version.clone(),
                name: entry.id.to_string(),
            })
            .collect()
    }

    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.entries.keys()
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.entries.contains_key(version)
    }

    /// Full identifier of the migration registered for `version`.
    pub fn name_of(&self, version: &Version) -> Option<String> {
        self.entries.get(version).map(|e| e.id.to_string())
    }

    /// A new instance of the migration registered for `version`.
    pub fn instantiate(&self, version: &Version) -> Option<Box<dyn Migration>> {
        self.entries.get(version).map(|e| (e.factory)())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, entry: Entry) -> Result<()> {
        let version = entry.id.version.clone();

        if let Some(existing) = self.entries.get(&version) {
            return Err(Error::DuplicateVersion {
                version: version.to_string(),
                first: existing.id.to_string(),
                second: entry.id.to_string(),
            });
        }

        if let Some(expected) = self.entries.keys().next().map(Version::width) {
            if version.width() != expected {
                return Err(Error::VersionWidthMismatch {
                    name: entry.id.to_string(),
                    width: version.width(),
                    expected,
                });
            }
        }

        self.entries.insert(version, entry);
        Ok(())
    }
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.values().map(|e| e.id.to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationContext;

    struct Noop;

    impl Migration for Noop {
        fn up(&self, _ctx: &mut MigrationContext<'_>) -> Result<()> {
            Ok(())
        }

        fn down(&self, _ctx: &mut MigrationContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_available_is_sorted() {
        let registry = MigrationRegistry::new()
            .with("Version20240101000002_B", || Noop)
            .unwrap()
            .with("Version20240101000001_A", || Noop)
            .unwrap();

        let available = registry.available();
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].version, "20240101000001");
        assert_eq!(available[0].name, "Version20240101000001_A");
        assert_eq!(available[1].version, "20240101000002");
    }

    #[test]
    fn test_malformed_identifier() {
        let mut registry = MigrationRegistry::new();
        assert!(matches!(
            registry.register("CreateCustomerTable", || Noop),
            Err(Error::InvalidMigrationId(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_version() {
        let mut registry = MigrationRegistry::new();
        registry.register("Version20240101000001_A", || Noop).unwrap();

        let err = registry
            .register("Version20240101000001_B", || Noop)
            .unwrap_err();
        match err {
            Error::DuplicateVersion { first, second, .. } => {
                assert_eq!(first, "Version20240101000001_A");
                assert_eq!(second, "Version20240101000001_B");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mixed_widths_rejected() {
        let mut registry = MigrationRegistry::new();
        registry.register("Version20240101000001_A", || Noop).unwrap();

        assert!(matches!(
            registry.register("Version9_B", || Noop),
            Err(Error::VersionWidthMismatch {
                width: 1,
                expected: 14,
                ..
            })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_merge_checks_conflicts() {
        let mut a = MigrationRegistry::new()
            .with("Version0001_A", || Noop)
            .unwrap();
        let b = MigrationRegistry::new()
            .with("Version0002_B", || Noop)
            .unwrap();
        a.merge(b).unwrap();
        assert_eq!(a.len(), 2);

        let c = MigrationRegistry::new()
            .with("Version0002_C", || Noop)
            .unwrap();
        assert!(a.merge(c).is_err());
    }

    #[test]
    fn test_instantiate() {
        let registry = MigrationRegistry::new()
            .with("Version0001", || Noop)
            .unwrap();
        let version = Version::parse("0001").unwrap();
        assert!(registry.instantiate(&version).is_some());
        assert_eq!(registry.name_of(&version).as_deref(), Some("Version0001"));
        assert!(registry
            .instantiate(&Version::parse("0002").unwrap())
            .is_none());
    }
}
