//! In-memory storage driver
//!
//! Backs `HELM_DRIVER=memory` and tests. Records are kept as decoded
//! releases; an engine that runs in-process writes them with `insert`.

use async_trait::async_trait;
use helmkit_core::HelmRelease;
use std::sync::{Arc, PoisonError, RwLock};

use super::{ReleaseStorage, into_history};
use crate::error::Result;

/// In-memory release records
#[derive(Clone, Default)]
pub struct MemoryStorage {
    releases: Arc<RwLock<Vec<HelmRelease>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated records
    pub fn with_releases(releases: Vec<HelmRelease>) -> Self {
        Self {
            releases: Arc::new(RwLock::new(releases)),
        }
    }

    /// Store a record, replacing the same revision if present
    pub fn insert(&self, release: HelmRelease) {
        let mut releases = self.releases.write().unwrap_or_else(PoisonError::into_inner);
        releases.retain(|r| {
            !(r.namespace == release.namespace
                && r.name == release.name
                && r.version == release.version)
        });
        releases.push(release);
    }

    /// Remove every revision of a release, returning what was removed
    pub fn remove(&self, namespace: &str, name: &str) -> Vec<HelmRelease> {
        let mut releases = self.releases.write().unwrap_or_else(PoisonError::into_inner);
        let (removed, kept) = releases
            .drain(..)
            .partition(|r| r.namespace == namespace && r.name == name);
        *releases = kept;
        removed
    }

    /// All stored records
    pub fn all(&self) -> Vec<HelmRelease> {
        self.releases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn matching(&self, predicate: impl Fn(&HelmRelease) -> bool) -> Vec<HelmRelease> {
        self.releases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ReleaseStorage for MemoryStorage {
    async fn list(&self, namespace: &str) -> Result<Vec<HelmRelease>> {
        Ok(self.matching(|r| namespace.is_empty() || r.namespace == namespace))
    }

    async fn history(&self, namespace: &str, name: &str) -> Result<Vec<HelmRelease>> {
        let releases = self.matching(|r| r.namespace == namespace && r.name == name);
        into_history(releases, namespace, name)
    }
}
