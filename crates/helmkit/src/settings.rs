//! Settings resolved from the Helm environment variables

use helmkit_kube::namespace::namespace_from_lookup;
use std::path::PathBuf;

pub const HELM_DRIVER_ENV: &str = "HELM_DRIVER";
pub const HELM_REPOSITORY_CONFIG_ENV: &str = "HELM_REPOSITORY_CONFIG";
pub const HELM_REPOSITORY_CACHE_ENV: &str = "HELM_REPOSITORY_CACHE";
pub const HELM_CONFIG_HOME_ENV: &str = "HELM_CONFIG_HOME";
pub const HELM_CACHE_HOME_ENV: &str = "HELM_CACHE_HOME";
pub const HELM_KUBECONTEXT_ENV: &str = "HELM_KUBECONTEXT";
pub const HELM_BIN_ENV: &str = "HELM_BIN";

/// Environment-derived settings shared by every client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelmSettings {
    /// Default namespace
    pub namespace: String,
    /// Release storage driver name (`secret`, `configmap`, `memory`)
    pub driver: String,
    /// Path of `repositories.yaml`
    pub repository_config: PathBuf,
    /// Directory holding cached repository indexes
    pub repository_cache: PathBuf,
    /// Kubeconfig context, current context when unset
    pub kube_context: Option<String>,
    /// Helm binary used by the CLI engine
    pub helm_binary: PathBuf,
}

impl HelmSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from any variable lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let config_home = var(HELM_CONFIG_HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir(dirs::config_dir()).join("helm"));
        let cache_home = var(HELM_CACHE_HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir(dirs::cache_dir()).join("helm"));

        Self {
            namespace: namespace_from_lookup(&lookup),
            driver: var(HELM_DRIVER_ENV).unwrap_or_default(),
            repository_config: var(HELM_REPOSITORY_CONFIG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| config_home.join("repositories.yaml")),
            repository_cache: var(HELM_REPOSITORY_CACHE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| cache_home.join("repository")),
            kube_context: var(HELM_KUBECONTEXT_ENV),
            helm_binary: var(HELM_BIN_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("helm")),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    pub fn with_repository_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.repository_config = path.into();
        self
    }

    pub fn with_repository_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.repository_cache = path.into();
        self
    }

    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.helm_binary = path.into();
        self
    }
}

impl Default for HelmSettings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn base_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| PathBuf::from("."))
}
