use helmkit_core::Values;
use std::time::Duration;
use tracing::{debug, info};

use super::{Release, ReleaseClient, chart_source_methods, load_chart, locate_chart};
use crate::engine::{ChartSource, InstallOptions};
use crate::error::{HelmError, Result};

/// Install a chart as a new release
#[derive(Debug)]
#[must_use = "requests do nothing until `run` is called"]
pub struct InstallRequest {
    client: ReleaseClient,
    name: String,
    chart: String,
    pub(super) source: ChartSource,
    pub(super) values: Values,
    pub(super) invalid: Option<HelmError>,
    pub(super) options: InstallOptions,
    dependency_update: bool,
}

impl InstallRequest {
    pub(super) fn new(client: ReleaseClient, name: String, chart: String) -> Self {
        let options = InstallOptions {
            namespace: client.namespace().to_string(),
            ..Default::default()
        };
        Self {
            client,
            name,
            chart,
            source: ChartSource::default(),
            values: Values::new(),
            invalid: None,
            options,
            dependency_update: false,
        }
    }

    chart_source_methods!();

    /// Do not install the chart's CRDs
    pub fn skip_crds(mut self) -> Self {
        self.options.skip_crds = true;
        self
    }

    /// Include CRDs in the rendered manifest
    ///
    /// The option is handed to the engine as is. `helm install` has no such
    /// flag: it always installs a chart's CRDs unless [`skip_crds`] is set and
    /// never records them in the release manifest, so [`HelmCli`] ignores it.
    ///
    /// [`skip_crds`]: InstallRequest::skip_crds
    /// [`HelmCli`]: crate::HelmCli
    pub fn include_crds(mut self) -> Self {
        self.options.include_crds = true;
        self
    }

    pub fn disable_hooks(mut self) -> Self {
        self.options.disable_hooks = true;
        self
    }

    pub fn disable_openapi_validation(mut self) -> Self {
        self.options.disable_openapi_validation = true;
        self
    }

    /// Render without installing anything
    pub fn dry_run(mut self) -> Self {
        self.options.dry_run = true;
        self
    }

    /// Reuse the name of an uninstalled release
    pub fn replace(mut self) -> Self {
        self.options.replace = true;
        self
    }

    /// Roll everything back if the install fails
    pub fn atomic(mut self) -> Self {
        self.options.atomic = true;
        self
    }

    /// Wait until the release's resources are ready
    pub fn wait(mut self) -> Self {
        self.options.wait = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Fetch missing chart dependencies instead of failing
    pub fn dependency_update(mut self) -> Self {
        self.dependency_update = true;
        self
    }

    /// Execute the install
    pub async fn run(mut self) -> Result<Release> {
        if let Some(err) = self.invalid.take() {
            return Err(err);
        }

        let engine = self.client.engine();
        let located = locate_chart(engine, &self.chart, &self.source).await?;
        let path = located.path();
        let chart = load_chart(engine, path, self.dependency_update).await?;

        let pinned = self.client.context.release(&self.name).to_values();
        let values = self.values.override_with(&pinned);

        debug!(
            release = %self.name,
            chart = %chart.name(),
            version = %chart.version(),
            namespace = %self.options.namespace,
            "installing release"
        );
        let record = engine
            .install(&self.name, path, values.as_map(), &self.options)
            .await?;
        info!(release = %record.name, revision = record.version, "release installed");

        Release::from_record(&self.client.config, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCall, MockEngine};
    use crate::test_support::{
        MANIFEST, chart_dir, chart_with_dependency, memory_config_with, redis_archive,
    };
    use helmkit_core::{HelmContext, ReleaseStatus};
    use helmkit_kube::{MemorySource, MemoryStorage};
    use serde_json::json;
    use std::sync::Arc;

    fn client(engine: MockEngine) -> ReleaseClient {
        ReleaseClient::new(Arc::new(memory_config_with(
            "apps",
            MemorySource::new(),
            engine,
        )))
    }

    #[tokio::test]
    async fn test_install_local_chart() {
        let chart = chart_dir();
        let engine = MockEngine::new(MemoryStorage::new()).with_manifest(MANIFEST);
        let client = client(engine.clone());

        let release = client
            .install("web", chart.path().to_string_lossy())
            .set("replicas", &3)
            .set("image.tag", "1.25")
            .include_crds()
            .wait()
            .timeout(Duration::from_secs(120))
            .run()
            .await
            .unwrap();

        assert_eq!(release.name(), "web");
        assert_eq!(release.namespace(), "apps");
        assert_eq!(release.revision(), 1);
        assert_eq!(release.status(), ReleaseStatus::Deployed);
        assert_eq!(release.values().get("replicas"), Some(json!(3)));
        assert_eq!(release.values().get("image.repository"), Some(json!("nginx")));
        assert_eq!(release.values().get("image.tag"), Some(json!("1.25")));

        match &engine.calls()[0] {
            EngineCall::Install { options, .. } => {
                assert!(options.wait);
                assert!(options.include_crds);
                assert_eq!(options.timeout, Some(Duration::from_secs(120)));
                assert_eq!(options.namespace, "apps");
            }
            other => panic!("expected install, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_context_values_win() {
        let chart = chart_dir();
        let mut pinned = Values::new();
        pinned.set("image.tag", "pinned").unwrap();
        let client = client(MockEngine::new(MemoryStorage::new()))
            .with_context(HelmContext::new().with_release("web", pinned.into_immutable()));

        let release = client
            .install("web", chart.path().to_string_lossy())
            .set("image.tag", "requested")
            .set("replicas", &2)
            .run()
            .await
            .unwrap();
        assert_eq!(release.values().get("image.tag"), Some(json!("pinned")));
        assert_eq!(release.values().get("replicas"), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_invalid_set_path_fails_on_run() {
        let chart = chart_dir();
        let engine = MockEngine::new(MemoryStorage::new());
        let err = client(engine.clone())
            .install("web", chart.path().to_string_lossy())
            .set("image.t\"ag", &1)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, HelmError::Core(_)));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_dependencies_fail() {
        let chart = chart_with_dependency();
        let engine = MockEngine::new(MemoryStorage::new());

        let err = client(engine.clone())
            .install("web", chart.path().to_string_lossy())
            .run()
            .await
            .unwrap_err();
        match err {
            HelmError::DependencyUnsatisfied { chart, missing } => {
                assert_eq!(chart, "web");
                assert_eq!(missing, vec!["redis".to_string()]);
            }
            other => panic!("expected unsatisfied dependencies, got {:?}", other),
        }
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dependency_update() {
        let chart = chart_with_dependency();
        let engine = MockEngine::new(MemoryStorage::new())
            .with_dependency_archive("redis-17.0.0.tgz", redis_archive());

        let release = client(engine.clone())
            .install("web", chart.path().to_string_lossy())
            .dependency_update()
            .run()
            .await
            .unwrap();
        assert_eq!(release.revision(), 1);
        assert!(chart.path().join("charts/redis-17.0.0.tgz").is_file());
        assert!(matches!(engine.calls()[0], EngineCall::DependencyUpdate { .. }));
    }

    #[tokio::test]
    async fn test_dependency_update_still_missing() {
        let chart = chart_with_dependency();
        let engine = MockEngine::new(MemoryStorage::new());

        let err = client(engine)
            .install("web", chart.path().to_string_lossy())
            .dependency_update()
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, HelmError::DependencyUnsatisfied { .. }));
    }

    #[tokio::test]
    async fn test_install_from_repository() {
        let chart = chart_dir();
        let engine = MockEngine::new(MemoryStorage::new()).with_chart("web", chart.path());

        let release = client(engine.clone())
            .install("frontend", "web")
            .repo("https://charts.example.com")
            .version("1.0.0")
            .username("user")
            .password("pass")
            .run()
            .await
            .unwrap();
        assert_eq!(release.chart().unwrap().name, "web");

        match &engine.calls()[0] {
            EngineCall::Pull { chart, source } => {
                assert_eq!(chart, "web");
                assert_eq!(source.repo.as_deref(), Some("https://charts.example.com"));
                assert_eq!(source.version.as_deref(), Some("1.0.0"));
                assert_eq!(source.username.as_deref(), Some("user"));
            }
            other => panic!("expected pull, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_chart() {
        let err = client(MockEngine::new(MemoryStorage::new()))
            .install("web", "/no/such/chart")
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, HelmError::ChartNotFound { .. }));
    }

    #[tokio::test]
    async fn test_dry_run() {
        let chart = chart_dir();
        let engine = MockEngine::new(MemoryStorage::new());

        let release = client(engine.clone())
            .install("web", chart.path().to_string_lossy())
            .dry_run()
            .run()
            .await
            .unwrap();
        assert_eq!(release.status(), ReleaseStatus::PendingInstall);
        assert!(engine.storage().all().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pulled_chart_cleaned_up_after_install() {
        use crate::test_support::{cache_entries, fake_cli_config};

        let tmp = tempfile::TempDir::new().unwrap();
        let client = ReleaseClient::new(Arc::new(fake_cli_config(tmp.path())));

        let release = client.install("web", "example/web").run().await.unwrap();
        assert_eq!(release.name(), "web");
        assert_eq!(cache_entries(&tmp.path().join("cache")), 0);
    }
}
