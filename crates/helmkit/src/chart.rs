//! Chart client
//!
//! Locates charts the same way installs do and exposes their default values
//! and sub-charts.

use helmkit_core::{ChartDependency, ChartMetadata, ImmutableValues, LoadedChart};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::engine::{ChartSource, HelmEngine, PulledChart};
use crate::error::{HelmError, Result};
use crate::release::locate_chart;

#[derive(Clone)]
pub struct ChartClient {
    engine: Arc<dyn HelmEngine>,
}

impl ChartClient {
    pub fn new(engine: Arc<dyn HelmEngine>) -> Self {
        Self { engine }
    }

    /// Load a chart from a local path or a `repo/chart` reference
    pub async fn get(&self, name: &str) -> Result<Chart> {
        self.get_from(name, &ChartSource::default()).await
    }

    /// Load a chart, pulling it from `source` when it is remote
    pub async fn get_from(&self, name: &str, source: &ChartSource) -> Result<Chart> {
        let location = locate_chart(self.engine.as_ref(), name, source).await?;
        let chart = LoadedChart::load(location.path())?;
        Ok(Chart::new(chart, location, Arc::clone(&self.engine)))
    }
}

impl fmt::Debug for ChartClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartClient").finish_non_exhaustive()
    }
}

/// A loaded chart
///
/// A chart pulled from a repository stays on disk while any `Chart` loaded
/// from it, sub-charts included, is alive.
#[derive(Clone)]
pub struct Chart {
    chart: LoadedChart,
    values: ImmutableValues,
    location: PulledChart,
    engine: Arc<dyn HelmEngine>,
}

impl Chart {
    fn new(chart: LoadedChart, location: PulledChart, engine: Arc<dyn HelmEngine>) -> Self {
        let values = chart.values.immutable();
        Self {
            chart,
            values,
            location,
            engine,
        }
    }

    pub fn name(&self) -> &str {
        self.chart.name()
    }

    pub fn version(&self) -> &str {
        self.chart.version()
    }

    pub fn metadata(&self) -> &ChartMetadata {
        &self.chart.metadata
    }

    /// Default values from `values.yaml`
    pub fn values(&self) -> ImmutableValues {
        self.values.clone()
    }

    /// A declared dependency, fetched first if it is not vendored yet
    pub async fn sub_chart(&self, name: &str) -> Result<Chart> {
        let dependency = self
            .chart
            .metadata
            .dependencies
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| HelmError::ChartNotFound {
                name: name.to_string(),
            })?;

        let chart = self.with_dependencies().await?;
        self.resolve(&chart, dependency)
    }

    /// Every declared dependency, fetched first if any is not vendored yet
    pub async fn sub_charts(&self) -> Result<Vec<Chart>> {
        let dependencies = &self.chart.metadata.dependencies;
        if dependencies.is_empty() {
            return Err(HelmError::ChartNotFound {
                name: format!("{} has no dependencies", self.name()),
            });
        }

        let chart = self.with_dependencies().await?;
        dependencies
            .iter()
            .map(|dependency| self.resolve(&chart, dependency))
            .collect()
    }

    /// The chart as it is after fetching missing dependencies
    async fn with_dependencies(&self) -> Result<LoadedChart> {
        if self.chart.missing_dependencies().is_empty() {
            return Ok(self.chart.clone());
        }

        let path = self.local_dir()?;
        debug!(chart = %self.name(), "fetching missing dependencies");
        self.engine.dependency_update(path).await?;
        Ok(LoadedChart::load(path)?)
    }

    fn resolve(&self, chart: &LoadedChart, dependency: &ChartDependency) -> Result<Chart> {
        if let Some(archive) = chart.dependency_archive(dependency).filter(|p| p.is_file()) {
            let loaded = LoadedChart::load(&archive)?;
            return Ok(self.child(loaded));
        }

        chart
            .sub_chart(&dependency.name)
            .map(|loaded| self.child(loaded.clone()))
            .ok_or_else(|| HelmError::ChartNotFound {
                name: format!("{}-{}", dependency.name, dependency.version),
            })
    }

    fn child(&self, chart: LoadedChart) -> Chart {
        Chart::new(chart, self.location.clone(), Arc::clone(&self.engine))
    }

    fn local_dir(&self) -> Result<&Path> {
        self.chart
            .path
            .as_deref()
            .filter(|p| p.is_dir())
            .ok_or_else(|| HelmError::DependencyUnsatisfied {
                chart: self.name().to_string(),
                missing: self
                    .chart
                    .missing_dependencies()
                    .iter()
                    .map(|d| d.name.clone())
                    .collect(),
            })
    }
}

impl fmt::Debug for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chart")
            .field("name", &self.chart.metadata.name)
            .field("version", &self.chart.metadata.version)
            .field("location", &self.location.path())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCall, MockEngine};
    use crate::test_support::{chart_dir, chart_with_dependency, redis_archive, write};
    use helmkit_kube::MemoryStorage;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_local_chart() {
        let chart = chart_dir();
        let client = ChartClient::new(Arc::new(MockEngine::new(MemoryStorage::new())));

        let chart = client.get(&chart.path().to_string_lossy()).await.unwrap();
        assert_eq!(chart.name(), "web");
        assert_eq!(chart.version(), "1.0.0");
        assert_eq!(chart.metadata().app_version.as_deref(), Some("2.0"));
        assert_eq!(chart.values().get("image.tag"), Some(json!("stable")));
    }

    #[tokio::test]
    async fn test_get_from_repository() {
        let dir = chart_dir();
        let engine = MockEngine::new(MemoryStorage::new()).with_chart("stable/web", dir.path());
        let client = ChartClient::new(Arc::new(engine.clone()));

        let chart = client.get("stable/web").await.unwrap();
        assert_eq!(chart.name(), "web");
        assert!(matches!(engine.calls()[0], EngineCall::Pull { .. }));
    }

    #[tokio::test]
    async fn test_sub_chart_fetches_dependencies() {
        let dir = chart_with_dependency();
        let engine = MockEngine::new(MemoryStorage::new())
            .with_dependency_archive("redis-17.0.0.tgz", redis_archive());
        let client = ChartClient::new(Arc::new(engine.clone()));

        let chart = client.get(&dir.path().to_string_lossy()).await.unwrap();
        let redis = chart.sub_chart("redis").await.unwrap();
        assert_eq!(redis.name(), "redis");
        assert_eq!(redis.values().get("port"), Some(json!(6379)));
        assert_eq!(engine.calls().len(), 1);

        let all = chart.sub_charts().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_vendored_sub_chart() {
        let dir = chart_with_dependency();
        write(dir.path(), "charts/redis/Chart.yaml", "name: redis\nversion: 17.0.0\n");
        write(dir.path(), "charts/redis/values.yaml", "port: 6380\n");
        let engine = MockEngine::new(MemoryStorage::new());
        let client = ChartClient::new(Arc::new(engine.clone()));

        let chart = client.get(&dir.path().to_string_lossy()).await.unwrap();
        let redis = chart.sub_chart("redis").await.unwrap();
        assert_eq!(redis.values().get("port"), Some(json!(6380)));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_undeclared_sub_chart() {
        let dir = chart_dir();
        let client = ChartClient::new(Arc::new(MockEngine::new(MemoryStorage::new())));
        let chart = client.get(&dir.path().to_string_lossy()).await.unwrap();

        assert!(matches!(
            chart.sub_chart("redis").await,
            Err(HelmError::ChartNotFound { .. })
        ));
        assert!(matches!(
            chart.sub_charts().await,
            Err(HelmError::ChartNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_dependency_update_without_archive() {
        let dir = chart_with_dependency();
        let client = ChartClient::new(Arc::new(MockEngine::new(MemoryStorage::new())));
        let chart = client.get(&dir.path().to_string_lossy()).await.unwrap();

        assert!(matches!(
            chart.sub_chart("redis").await,
            Err(HelmError::ChartNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pulled_chart_kept_while_loaded() {
        use crate::test_support::{cache_entries, fake_cli_config};

        let tmp = tempfile::TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let config = fake_cli_config(tmp.path());
        let client = ChartClient::new(Arc::clone(&config.engine));

        let chart = client.get("example/web").await.unwrap();
        assert_eq!(chart.name(), "web");
        assert_eq!(cache_entries(&cache), 1);

        drop(chart);
        assert_eq!(cache_entries(&cache), 0);
    }
}
