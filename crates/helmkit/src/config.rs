//! Per-namespace configuration
//!
//! A [`HelmConfig`] bundles everything a release client needs for one
//! namespace. [`ConfigCache`] hands out one shared config per namespace,
//! connecting on first use.

use helmkit_kube::storage::ReleaseStorage;
use helmkit_kube::{ClusterSource, ObjectSource, StorageDriver};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::engine::{HelmCli, HelmEngine};
use crate::error::Result;
use crate::settings::HelmSettings;

/// Release storage, cluster access and engine for one namespace
#[derive(Clone)]
pub struct HelmConfig {
    pub namespace: String,
    pub settings: HelmSettings,
    pub storage: Arc<dyn ReleaseStorage>,
    pub source: Arc<dyn ObjectSource>,
    pub engine: Arc<dyn HelmEngine>,
}

impl HelmConfig {
    /// Assemble a config from its parts
    pub fn new(
        namespace: impl Into<String>,
        settings: HelmSettings,
        storage: Arc<dyn ReleaseStorage>,
        source: Arc<dyn ObjectSource>,
        engine: Arc<dyn HelmEngine>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            settings,
            storage,
            source,
            engine,
        }
    }

    /// Connect to the cluster selected by the settings
    ///
    /// Storage follows `HELM_DRIVER`; operations run through the `helm` binary.
    pub async fn connect(settings: HelmSettings, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let driver = StorageDriver::from_name(&settings.driver)?;
        let cluster = ClusterSource::for_context(settings.kube_context.as_deref()).await?;
        debug!(namespace = %namespace, ?driver, "helm configuration ready");

        let storage = driver.open(cluster.client().clone());
        let engine = Arc::new(HelmCli::new(&settings));
        Ok(Self::new(namespace, settings, storage, Arc::new(cluster), engine))
    }
}

impl fmt::Debug for HelmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelmConfig")
            .field("namespace", &self.namespace)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// One [`HelmConfig`] per namespace, created on first request
pub struct ConfigCache {
    settings: HelmSettings,
    configs: Mutex<HashMap<String, Arc<HelmConfig>>>,
}

impl ConfigCache {
    pub fn new(settings: HelmSettings) -> Self {
        Self {
            settings,
            configs: Mutex::new(HashMap::new()),
        }
    }

    /// Cache over the settings found in the environment
    pub fn from_env() -> Self {
        Self::new(HelmSettings::from_env())
    }

    pub fn settings(&self) -> &HelmSettings {
        &self.settings
    }

    /// Config for a namespace, connecting if there is none yet
    ///
    /// The lock is held while connecting, so concurrent callers for the same
    /// namespace share a single connection.
    pub async fn get(&self, namespace: &str) -> Result<Arc<HelmConfig>> {
        let mut configs = self.configs.lock().await;
        if let Some(config) = configs.get(namespace) {
            return Ok(Arc::clone(config));
        }

        let settings = self.settings.clone().with_namespace(namespace);
        let config = Arc::new(HelmConfig::connect(settings, namespace).await?);
        configs.insert(namespace.to_string(), Arc::clone(&config));
        Ok(config)
    }

    /// Register a config, replacing any for the same namespace
    pub async fn insert(&self, config: HelmConfig) -> Arc<HelmConfig> {
        let config = Arc::new(config);
        self.configs
            .lock()
            .await
            .insert(config.namespace.clone(), Arc::clone(&config));
        config
    }

    pub async fn remove(&self, namespace: &str) -> Option<Arc<HelmConfig>> {
        self.configs.lock().await.remove(namespace)
    }

    pub async fn clear(&self) {
        self.configs.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.configs.lock().await.len()
    }
}

impl fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigCache")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_config;

    #[tokio::test]
    async fn test_cached_config_is_shared() {
        let cache = ConfigCache::new(HelmSettings::from_lookup(|_| None));
        let inserted = cache.insert(memory_config("apps")).await;

        let first = cache.get("apps").await.unwrap();
        let second = cache.get("apps").await.unwrap();
        assert!(Arc::ptr_eq(&first, &inserted));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = ConfigCache::new(HelmSettings::from_lookup(|_| None));
        cache.insert(memory_config("apps")).await;
        cache.insert(memory_config("db")).await;

        assert_eq!(cache.remove("apps").await.unwrap().namespace, "apps");
        assert!(cache.remove("apps").await.is_none());
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
