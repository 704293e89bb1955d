//! In-memory engine for testing
//!
//! Applies release operations to a [`MemoryStorage`] the way Helm applies
//! them to its release Secrets, without rendering or touching a cluster.

use async_trait::async_trait;
use chrono::Utc;
use helmkit_core::{HelmRelease, LoadedChart, ReleaseChart, ReleaseStatus, ValueMap};
use helmkit_kube::storage::ReleaseStorage;
use helmkit_kube::{KubeError, MemoryStorage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::{
    ChartSource, HelmEngine, InstallOptions, PulledChart, RollbackOptions, UninstallOptions,
    UpgradeOptions,
};
use crate::error::{HelmError, Result};

/// A recorded engine invocation
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Pull {
        chart: String,
        source: ChartSource,
    },
    Install {
        name: String,
        chart: PathBuf,
        values: ValueMap,
        options: InstallOptions,
    },
    Upgrade {
        name: String,
        chart: PathBuf,
        values: ValueMap,
        options: UpgradeOptions,
    },
    Rollback {
        name: String,
        options: RollbackOptions,
    },
    Uninstall {
        name: String,
        options: UninstallOptions,
    },
    DependencyUpdate {
        chart: PathBuf,
    },
}

/// Engine keeping releases in memory
#[derive(Clone, Default)]
pub struct MockEngine {
    storage: MemoryStorage,
    manifest: String,
    charts: HashMap<String, PathBuf>,
    dependency_archives: Vec<(String, Vec<u8>)>,
    calls: Arc<RwLock<Vec<EngineCall>>>,
}

impl MockEngine {
    pub fn new(storage: MemoryStorage) -> Self {
        Self {
            storage,
            ..Default::default()
        }
    }

    /// Manifest attached to every installed or upgraded revision
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    /// Serve `pull` of a chart reference from a local directory
    pub fn with_chart(mut self, reference: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.charts.insert(reference.into(), path.into());
        self
    }

    /// Archive written into `charts/` by `dependency_update`
    pub fn with_dependency_archive(mut self, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        self.dependency_archives.push((file_name.into(), data));
        self
    }

    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: EngineCall) {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    async fn latest(&self, namespace: &str, name: &str) -> Result<Option<HelmRelease>> {
        match self.storage.history(namespace, name).await {
            Ok(mut history) => Ok(history.pop()),
            Err(KubeError::ReleaseNotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn supersede(&self, mut release: HelmRelease) {
        release.info.status = ReleaseStatus::Superseded;
        self.storage.insert(release);
    }

    fn build_release(
        &self,
        name: &str,
        namespace: &str,
        version: u32,
        chart: &Path,
        values: &ValueMap,
    ) -> Result<HelmRelease> {
        let loaded = LoadedChart::load(chart)?;
        let now = Utc::now();
        let mut release = HelmRelease {
            name: name.to_string(),
            namespace: namespace.to_string(),
            version,
            chart: Some(ReleaseChart {
                metadata: loaded.metadata,
                values: Some(loaded.values.into_map()),
            }),
            config: Some(values.clone()),
            manifest: self.manifest.clone(),
            ..Default::default()
        };
        release.info.first_deployed = Some(now);
        release.info.last_deployed = Some(now);
        Ok(release)
    }
}

fn engine_error(command: &str, message: impl Into<String>) -> HelmError {
    HelmError::Engine {
        command: command.to_string(),
        message: message.into(),
    }
}

#[async_trait]
impl HelmEngine for MockEngine {
    async fn pull(&self, chart: &str, source: &ChartSource) -> Result<PulledChart> {
        self.record(EngineCall::Pull {
            chart: chart.to_string(),
            source: source.clone(),
        });
        self.charts
            .get(chart)
            .map(|path| PulledChart::local(path.clone()))
            .ok_or_else(|| HelmError::ChartNotFound {
                name: chart.to_string(),
            })
    }

    async fn install(
        &self,
        name: &str,
        chart: &Path,
        values: &ValueMap,
        options: &InstallOptions,
    ) -> Result<HelmRelease> {
        self.record(EngineCall::Install {
            name: name.to_string(),
            chart: chart.to_path_buf(),
            values: values.clone(),
            options: options.clone(),
        });

        let previous = self.latest(&options.namespace, name).await?;
        let version = match &previous {
            None => 1,
            Some(prev) if options.replace && prev.info.status == ReleaseStatus::Uninstalled => {
                prev.version + 1
            }
            Some(_) => {
                return Err(engine_error(
                    "install",
                    "cannot re-use a name that is still in use",
                ));
            }
        };

        let mut release = self.build_release(name, &options.namespace, version, chart, values)?;
        if options.dry_run {
            release.info.status = ReleaseStatus::PendingInstall;
            release.info.description = "Dry run complete".to_string();
            return Ok(release);
        }

        release.info.status = ReleaseStatus::Deployed;
        release.info.description = "Install complete".to_string();
        self.storage.insert(release.clone());
        Ok(release)
    }

    async fn upgrade(
        &self,
        name: &str,
        chart: &Path,
        values: &ValueMap,
        options: &UpgradeOptions,
    ) -> Result<HelmRelease> {
        self.record(EngineCall::Upgrade {
            name: name.to_string(),
            chart: chart.to_path_buf(),
            values: values.clone(),
            options: options.clone(),
        });

        let previous = self
            .latest(&options.namespace, name)
            .await?
            .ok_or_else(|| engine_error("upgrade", format!("\"{}\" has no deployed releases", name)))?;

        let mut release =
            self.build_release(name, &options.namespace, previous.version + 1, chart, values)?;
        release.info.first_deployed = previous.info.first_deployed;
        if options.dry_run {
            release.info.status = ReleaseStatus::PendingUpgrade;
            release.info.description = "Dry run complete".to_string();
            return Ok(release);
        }

        release.info.status = ReleaseStatus::Deployed;
        release.info.description = "Upgrade complete".to_string();
        self.supersede(previous);
        self.storage.insert(release.clone());
        Ok(release)
    }

    async fn rollback(&self, name: &str, options: &RollbackOptions) -> Result<()> {
        self.record(EngineCall::Rollback {
            name: name.to_string(),
            options: options.clone(),
        });

        let history = self.storage.history(&options.namespace, name).await?;
        let Some(latest) = history.last().cloned() else {
            return Err(HelmError::ReleaseNotFound {
                name: name.to_string(),
                namespace: options.namespace.clone(),
            });
        };

        let target_version = options.revision.unwrap_or(latest.version.saturating_sub(1));
        let target = history
            .iter()
            .find(|r| r.version == target_version)
            .cloned()
            .ok_or_else(|| {
                engine_error(
                    "rollback",
                    format!("release has no {} version", target_version),
                )
            })?;

        let mut release = target;
        release.version = latest.version + 1;
        release.info.status = ReleaseStatus::Deployed;
        release.info.description = format!("Rollback to {}", target_version);
        release.info.last_deployed = Some(Utc::now());
        release.info.deleted = None;

        self.supersede(latest);
        self.storage.insert(release);
        Ok(())
    }

    async fn uninstall(&self, name: &str, options: &UninstallOptions) -> Result<()> {
        self.record(EngineCall::Uninstall {
            name: name.to_string(),
            options: options.clone(),
        });

        let Some(mut latest) = self.latest(&options.namespace, name).await? else {
            return Err(HelmError::ReleaseNotFound {
                name: name.to_string(),
                namespace: options.namespace.clone(),
            });
        };

        if options.keep_history {
            latest.info.status = ReleaseStatus::Uninstalled;
            latest.info.deleted = Some(Utc::now());
            latest.info.description = "Uninstallation complete".to_string();
            self.storage.insert(latest);
        } else {
            self.storage.remove(&options.namespace, name);
        }
        Ok(())
    }

    async fn dependency_update(&self, chart: &Path) -> Result<()> {
        self.record(EngineCall::DependencyUpdate {
            chart: chart.to_path_buf(),
        });

        let charts_dir = chart.join(helmkit_core::chart::CHARTS_DIR);
        std::fs::create_dir_all(&charts_dir)?;
        for (file_name, data) in &self.dependency_archives {
            std::fs::write(charts_dir.join(file_name), data)?;
        }
        Ok(())
    }
}
