//! Entry point tying releases, charts and repositories together

use helmkit_core::HelmContext;
use helmkit_repo::RepoClient;
use std::sync::Arc;

use crate::chart::ChartClient;
use crate::config::{ConfigCache, HelmConfig};
use crate::error::Result;
use crate::release::{
    InstallRequest, ReleaseClient, RollbackRequest, UninstallRequest, UpgradeRequest,
};

/// Helm client for one namespace
///
/// ```ignore
/// let cache = ConfigCache::from_env();
/// let helm = Helm::for_namespace(&cache, "apps").await?;
/// let release = helm
///     .install("web", "bitnami/nginx")
///     .set("replicaCount", &2)
///     .wait()
///     .run()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Helm {
    config: Arc<HelmConfig>,
    context: HelmContext,
}

impl Helm {
    /// Client for the namespace found in the environment
    pub async fn new(cache: &ConfigCache) -> Result<Self> {
        let namespace = cache.settings().namespace.clone();
        Self::for_namespace(cache, &namespace).await
    }

    pub async fn for_namespace(cache: &ConfigCache, namespace: &str) -> Result<Self> {
        Ok(Self::from_config(cache.get(namespace).await?))
    }

    pub fn from_config(config: Arc<HelmConfig>) -> Self {
        Self {
            config,
            context: HelmContext::new(),
        }
    }

    /// Values pinned per release for installs and upgrades
    pub fn with_context(mut self, context: HelmContext) -> Self {
        self.context = context;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn config(&self) -> &Arc<HelmConfig> {
        &self.config
    }

    pub fn repos(&self) -> RepoClient {
        let settings = &self.config.settings;
        RepoClient::new(
            settings.repository_config.clone(),
            settings.repository_cache.clone(),
        )
    }

    pub fn charts(&self) -> ChartClient {
        ChartClient::new(Arc::clone(&self.config.engine))
    }

    pub fn releases(&self) -> ReleaseClient {
        ReleaseClient::new(Arc::clone(&self.config)).with_context(self.context.clone())
    }

    pub fn install(&self, name: impl Into<String>, chart: impl Into<String>) -> InstallRequest {
        self.releases().install(name, chart)
    }

    pub fn upgrade(&self, name: impl Into<String>, chart: impl Into<String>) -> UpgradeRequest {
        self.releases().upgrade(name, chart)
    }

    pub fn rollback(&self, name: impl Into<String>) -> RollbackRequest {
        self.releases().rollback(name)
    }

    pub fn uninstall(&self, name: impl Into<String>) -> UninstallRequest {
        self.releases().uninstall(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{chart_dir, memory_config, settings};
    use helmkit_core::Values;
    use serde_json::json;

    async fn cache() -> ConfigCache {
        let cache = ConfigCache::new(settings("apps"));
        cache.insert(memory_config("apps")).await;
        cache.insert(memory_config("db")).await;
        cache
    }

    #[tokio::test]
    async fn test_namespace_selection() {
        let cache = cache().await;
        assert_eq!(Helm::new(&cache).await.unwrap().namespace(), "apps");

        let helm = Helm::for_namespace(&cache, "db").await.unwrap();
        assert_eq!(helm.namespace(), "db");
        assert_eq!(helm.releases().namespace(), "db");
    }

    #[tokio::test]
    async fn test_install_through_entry_point() {
        let cache = cache().await;
        let chart = chart_dir();
        let mut pinned = Values::new();
        pinned.set("replicas", &5).unwrap();
        let helm = Helm::new(&cache)
            .await
            .unwrap()
            .with_context(HelmContext::new().with_release("web", pinned.into_immutable()));

        let release = helm
            .install("web", chart.path().to_string_lossy())
            .set("replicas", &2)
            .run()
            .await
            .unwrap();
        assert_eq!(release.values().get("replicas"), Some(json!(5)));

        helm.upgrade("web", chart.path().to_string_lossy())
            .run()
            .await
            .unwrap();
        helm.rollback("web").run().await.unwrap();
        assert_eq!(helm.releases().get("web").await.unwrap().revision(), 3);

        helm.uninstall("web").run().await.unwrap();
        assert!(helm.releases().list().await.unwrap().is_empty());

        // releases are per namespace
        let db = Helm::for_namespace(&cache, "db").await.unwrap();
        assert!(db.releases().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repos_use_settings_paths() {
        let cache = cache().await;
        let helm = Helm::new(&cache).await.unwrap();
        let repos = helm.repos();
        assert_eq!(
            repos.repository_config(),
            helm.config().settings.repository_config.as_path()
        );
    }
}
