//! Helm release operations
//!
//! [`ReleaseClient`] reads releases from Helm's storage and builds request
//! objects for the operations that change them. Requests are configured
//! with chained builder calls and take effect on `run()`.

mod install;
mod rollback;
mod uninstall;
mod upgrade;

pub use install::InstallRequest;
pub use rollback::RollbackRequest;
pub use uninstall::UninstallRequest;
pub use upgrade::UpgradeRequest;

use helmkit_core::{
    ChartMetadata, HelmContext, HelmRelease, ImmutableValues, LoadedChart, ReleaseStatus,
    StatusReport,
};
use helmkit_kube::{KubeError, KubernetesClient, ReleaseFilter, ResourceList};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::HelmConfig;
use crate::engine::{ChartSource, HelmEngine, PulledChart};
use crate::error::{HelmError, Result};

/// Release operations bound to a namespace
#[derive(Clone)]
pub struct ReleaseClient {
    config: Arc<HelmConfig>,
    context: HelmContext,
}

impl ReleaseClient {
    pub fn new(config: Arc<HelmConfig>) -> Self {
        Self {
            config,
            context: HelmContext::new(),
        }
    }

    /// Values pinned per release, applied over request values
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

    /// Latest revision of a release
    pub async fn get(&self, name: &str) -> Result<Release> {
        let history = self
            .config
            .storage
            .history(self.namespace(), name)
            .await
            .map_err(|e| self.not_found(name, e))?;

        let Some(latest) = history.iter().map(|r| r.version).max() else {
            return Err(self.release_not_found(name));
        };
        let mut current: Vec<HelmRelease> = history
            .into_iter()
            .filter(|r| r.version == latest)
            .collect();
        if current.len() > 1 {
            return Err(HelmError::AmbiguousRelease {
                name: name.to_string(),
                namespace: self.namespace().to_string(),
                revision: latest,
                count: current.len(),
            });
        }

        match current.pop() {
            Some(record) => Release::from_record(&self.config, record),
            None => Err(self.release_not_found(name)),
        }
    }

    /// Latest revision of every release in the namespace, by name
    pub async fn list(&self) -> Result<Vec<Release>> {
        let records = self.config.storage.list(self.namespace()).await?;

        let mut latest: BTreeMap<String, HelmRelease> = BTreeMap::new();
        for record in records {
            match latest.get(&record.name) {
                Some(existing) if existing.version >= record.version => {}
                _ => {
                    latest.insert(record.name.clone(), record);
                }
            }
        }

        latest
            .into_values()
            .map(|record| Release::from_record(&self.config, record))
            .collect()
    }

    pub async fn status(&self, name: &str) -> Result<StatusReport> {
        Ok(self.get(name).await?.status_report().clone())
    }

    pub fn install(&self, name: impl Into<String>, chart: impl Into<String>) -> InstallRequest {
        InstallRequest::new(self.clone(), name.into(), chart.into())
    }

    pub fn upgrade(&self, name: impl Into<String>, chart: impl Into<String>) -> UpgradeRequest {
        UpgradeRequest::new(self.clone(), name.into(), chart.into())
    }

    pub fn rollback(&self, name: impl Into<String>) -> RollbackRequest {
        RollbackRequest::new(self.clone(), name.into())
    }

    pub fn uninstall(&self, name: impl Into<String>) -> UninstallRequest {
        UninstallRequest::new(self.clone(), name.into())
    }

    fn engine(&self) -> &dyn HelmEngine {
        self.config.engine.as_ref()
    }

    fn release_not_found(&self, name: &str) -> HelmError {
        HelmError::ReleaseNotFound {
            name: name.to_string(),
            namespace: self.namespace().to_string(),
        }
    }

    fn not_found(&self, name: &str, err: KubeError) -> HelmError {
        match err {
            KubeError::ReleaseNotFound { .. } => self.release_not_found(name),
            other => other.into(),
        }
    }
}

impl fmt::Debug for ReleaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseClient")
            .field("namespace", &self.config.namespace)
            .finish_non_exhaustive()
    }
}

/// A revision of a release
///
/// The Kubernetes client returned by [`Release::client`] only sees the
/// objects of this release: those in its manifest, the objects they own,
/// and pods and endpoints labelled with their instance.
#[derive(Clone)]
pub struct Release {
    name: String,
    namespace: String,
    revision: u32,
    status: StatusReport,
    description: String,
    chart: Option<ChartMetadata>,
    values: ImmutableValues,
    manifest: String,
    client: KubernetesClient,
}

impl Release {
    pub(crate) fn from_record(config: &HelmConfig, record: HelmRelease) -> Result<Self> {
        let namespace = if record.namespace.is_empty() {
            config.namespace.clone()
        } else {
            record.namespace.clone()
        };

        let resources = ResourceList::from_manifest(&record.manifest, &namespace)?;
        debug!(
            release = %record.name,
            revision = record.version,
            resources = resources.len(),
            "release loaded"
        );
        let filter = ReleaseFilter::new(Arc::clone(&config.source), namespace.clone(), resources);
        let client = KubernetesClient::with_source(Arc::clone(&config.source), namespace.clone())
            .with_filter(Arc::new(filter));

        Ok(Self {
            status: record.status_report(),
            values: record.values(),
            description: record.info.description,
            chart: record.chart.map(|c| c.metadata),
            name: record.name,
            namespace,
            revision: record.version,
            manifest: record.manifest,
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn status(&self) -> ReleaseStatus {
        self.status.status
    }

    pub fn status_report(&self) -> &StatusReport {
        &self.status
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Metadata of the chart this revision was installed from
    pub fn chart(&self) -> Option<&ChartMetadata> {
        self.chart.as_ref()
    }

    /// Chart defaults overridden by the values supplied for this revision
    pub fn values(&self) -> ImmutableValues {
        self.values.clone()
    }

    pub fn manifest(&self) -> &str {
        &self.manifest
    }

    /// Kubernetes client restricted to this release's objects
    pub fn client(&self) -> &KubernetesClient {
        &self.client
    }
}

impl fmt::Debug for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Release")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("revision", &self.revision)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Resolve a chart reference to a directory on disk
///
/// Existing local paths are used as they are unless a repository is set;
/// anything else (`repo/chart`, a name in `--repo`) is pulled by the engine.
/// A pulled chart is deleted when the returned handle is dropped.
pub(crate) async fn locate_chart(
    engine: &dyn HelmEngine,
    chart: &str,
    source: &ChartSource,
) -> Result<PulledChart> {
    let local = Path::new(chart);
    if !source.is_remote() && local.exists() {
        return Ok(PulledChart::local(local));
    }
    debug!(chart = %chart, repo = ?source.repo, "pulling chart");
    engine.pull(chart, source).await
}

/// Load a chart, fetching missing dependencies first when allowed
pub(crate) async fn load_chart(
    engine: &dyn HelmEngine,
    path: &Path,
    dependency_update: bool,
) -> Result<LoadedChart> {
    let chart = LoadedChart::load(path)?;
    let missing = missing_names(&chart);
    if missing.is_empty() {
        return Ok(chart);
    }
    if !dependency_update {
        return Err(HelmError::DependencyUnsatisfied {
            chart: chart.name().to_string(),
            missing,
        });
    }

    debug!(chart = %chart.name(), ?missing, "updating chart dependencies");
    engine.dependency_update(path).await?;

    let chart = LoadedChart::load(path)?;
    let missing = missing_names(&chart);
    if missing.is_empty() {
        Ok(chart)
    } else {
        Err(HelmError::DependencyUnsatisfied {
            chart: chart.name().to_string(),
            missing,
        })
    }
}

fn missing_names(chart: &LoadedChart) -> Vec<String> {
    chart
        .missing_dependencies()
        .into_iter()
        .map(|d| d.name.clone())
        .collect()
}

/// Builder methods describing where a chart comes from
macro_rules! chart_source_methods {
    () => {
        /// Repository URL to fetch the chart from
        pub fn repo(mut self, url: impl Into<String>) -> Self {
            self.source.repo = Some(url.into());
            self
        }

        /// Chart version constraint
        pub fn version(mut self, version: impl Into<String>) -> Self {
            self.source.version = Some(version.into());
            self
        }

        pub fn ca_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
            self.source.ca_file = Some(path.into());
            self
        }

        pub fn key_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
            self.source.key_file = Some(path.into());
            self
        }

        pub fn cert_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
            self.source.cert_file = Some(path.into());
            self
        }

        pub fn username(mut self, username: impl Into<String>) -> Self {
            self.source.username = Some(username.into());
            self
        }

        pub fn password(mut self, password: impl Into<String>) -> Self {
            self.source.password = Some(password.into());
            self
        }

        /// Set a value at a dotted path
        ///
        /// An invalid path or value fails the request when it runs.
        pub fn set<T: serde::Serialize + ?Sized>(mut self, path: &str, value: &T) -> Self {
            if self.invalid.is_none() {
                if let Err(e) = self.values.set(path, value) {
                    self.invalid = Some(e.into());
                }
            }
            self
        }

        /// Merge a whole set of values, later calls winning
        pub fn values(mut self, values: &helmkit_core::Values) -> Self {
            self.values.merge(values);
            self
        }
    };
}

pub(crate) use chart_source_methods;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::test_support::{MANIFEST, memory_config_with};
    use helmkit_kube::kinds::{apps_v1, core_v1};
    use helmkit_kube::{MemorySource, MemoryStorage};
    use k8s_openapi::api::core::v1::Service;
    use serde_json::json;

    fn record(name: &str, version: u32, status: ReleaseStatus) -> HelmRelease {
        let mut release = HelmRelease {
            name: name.to_string(),
            namespace: "apps".to_string(),
            version,
            manifest: MANIFEST.to_string(),
            ..Default::default()
        };
        release.info.status = status;
        release
    }

    fn client(records: Vec<HelmRelease>, source: MemorySource) -> ReleaseClient {
        let engine = MockEngine::new(MemoryStorage::with_releases(records));
        ReleaseClient::new(Arc::new(memory_config_with("apps", source, engine)))
    }

    #[tokio::test]
    async fn test_get_latest_revision() {
        let client = client(
            vec![
                record("web", 1, ReleaseStatus::Superseded),
                record("web", 2, ReleaseStatus::Deployed),
            ],
            MemorySource::new(),
        );

        let release = client.get("web").await.unwrap();
        assert_eq!(release.revision(), 2);
        assert_eq!(release.status(), ReleaseStatus::Deployed);
        assert_eq!(
            client.status("web").await.unwrap().status,
            ReleaseStatus::Deployed
        );
    }

    #[tokio::test]
    async fn test_get_missing_release() {
        let client = client(vec![], MemorySource::new());
        let err = client.get("web").await.unwrap_err();
        assert!(matches!(err, HelmError::ReleaseNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_ambiguous_release() {
        let client = client(
            vec![
                record("web", 2, ReleaseStatus::Superseded),
                record("web", 3, ReleaseStatus::Deployed),
                record("web", 3, ReleaseStatus::Failed),
            ],
            MemorySource::new(),
        );

        match client.get("web").await.unwrap_err() {
            HelmError::AmbiguousRelease {
                revision, count, ..
            } => {
                assert_eq!(revision, 3);
                assert_eq!(count, 2);
            }
            other => panic!("expected ambiguous release, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_latest_per_name() {
        let client = client(
            vec![
                record("web", 1, ReleaseStatus::Superseded),
                record("db", 1, ReleaseStatus::Deployed),
                record("web", 2, ReleaseStatus::Deployed),
            ],
            MemorySource::new(),
        );

        let releases = client.list().await.unwrap();
        let names: Vec<_> = releases
            .iter()
            .map(|r| (r.name().to_string(), r.revision()))
            .collect();
        assert_eq!(names, vec![("db".to_string(), 1), ("web".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_release_client_is_filtered() {
        let source = MemorySource::new()
            .with_object(
                &core_v1::SERVICE,
                MemorySource::object(&core_v1::SERVICE, "apps", "web"),
            )
            .with_object(
                &core_v1::SERVICE,
                MemorySource::object(&core_v1::SERVICE, "apps", "other"),
            )
            .with_object(
                &apps_v1::DEPLOYMENT,
                MemorySource::object(&apps_v1::DEPLOYMENT, "apps", "web"),
            );
        let client = client(vec![record("web", 1, ReleaseStatus::Deployed)], source);

        let release = client.get("web").await.unwrap();
        let services: Vec<_> = release
            .client()
            .reader::<Service>(&core_v1::SERVICE)
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(services, vec!["web"]);
        assert!(
            release
                .client()
                .core_v1()
                .services()
                .get("other")
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_release_values() {
        let mut release = record("web", 1, ReleaseStatus::Deployed);
        release.chart = Some(helmkit_core::ReleaseChart {
            metadata: ChartMetadata {
                name: "web".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            values: Some(
                json!({"replicas": 1, "image": {"tag": "stable"}})
                    .as_object()
                    .unwrap()
                    .clone(),
            ),
        });
        release.config = Some(json!({"replicas": 3}).as_object().unwrap().clone());
        let client = client(vec![release], MemorySource::new());

        let release = client.get("web").await.unwrap();
        assert_eq!(release.values().get("replicas"), Some(json!(3)));
        assert_eq!(release.values().get("image.tag"), Some(json!("stable")));
        assert_eq!(release.chart().unwrap().name, "web");
    }
}
