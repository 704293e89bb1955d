//! Helm engine
//!
//! Chart rendering, hooks and applying manifests belong to Helm itself.
//! [`HelmEngine`] is the seam between the release client and whatever
//! carries those out: [`HelmCli`] drives the `helm` binary, [`MockEngine`]
//! keeps releases in memory for tests.

mod cli;
mod mock;

pub use cli::HelmCli;
pub use mock::{EngineCall, MockEngine};

use async_trait::async_trait;
use helmkit_core::{HelmRelease, ValueMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::error::Result;

/// A chart directory on disk
///
/// A chart pulled from a repository lives in a scratch directory under the
/// repository cache. The directory is deleted once the last clone of the
/// handle is dropped. Local charts are never touched.
#[derive(Debug, Clone)]
pub struct PulledChart {
    path: PathBuf,
    scratch: Option<Arc<TempDir>>,
}

impl PulledChart {
    /// A chart the caller owns
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scratch: None,
        }
    }

    /// A chart unpacked somewhere inside `scratch`
    pub fn in_scratch(scratch: TempDir, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scratch: Some(Arc::new(scratch)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the chart is removed from disk on drop
    pub fn is_scratch(&self) -> bool {
        self.scratch.is_some()
    }
}

/// Where to fetch a chart from when it is not a local path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSource {
    /// Repository URL
    pub repo: Option<String>,
    /// Version constraint, latest when unset
    pub version: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

impl ChartSource {
    /// Whether the chart comes from a repository rather than the filesystem
    pub fn is_remote(&self) -> bool {
        self.repo.as_deref().is_some_and(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub namespace: String,
    pub skip_crds: bool,
    /// Passed to engines that render manifests; `helm install` has no flag for it
    pub include_crds: bool,
    pub disable_hooks: bool,
    pub disable_openapi_validation: bool,
    pub dry_run: bool,
    /// Reuse the name of a release that was uninstalled with history kept
    pub replace: bool,
    pub atomic: bool,
    pub wait: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeOptions {
    pub namespace: String,
    pub disable_hooks: bool,
    pub dry_run: bool,
    pub atomic: bool,
    pub wait: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackOptions {
    pub namespace: String,
    /// Target revision, the previous one when unset
    pub revision: Option<u32>,
    pub wait: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallOptions {
    pub namespace: String,
    pub keep_history: bool,
    pub timeout: Option<Duration>,
}

/// Executes release operations
#[async_trait]
pub trait HelmEngine: Send + Sync {
    /// Download a chart from a repository, returning the unpacked chart directory
    async fn pull(&self, chart: &str, source: &ChartSource) -> Result<PulledChart>;

    /// Install a chart, returning the new release record
    async fn install(
        &self,
        name: &str,
        chart: &Path,
        values: &ValueMap,
        options: &InstallOptions,
    ) -> Result<HelmRelease>;

    /// Upgrade a release to a chart, returning the new release record
    async fn upgrade(
        &self,
        name: &str,
        chart: &Path,
        values: &ValueMap,
        options: &UpgradeOptions,
    ) -> Result<HelmRelease>;

    async fn rollback(&self, name: &str, options: &RollbackOptions) -> Result<()>;

    async fn uninstall(&self, name: &str, options: &UninstallOptions) -> Result<()>;

    /// Fetch the declared dependencies of a local chart into its `charts/` directory
    async fn dependency_update(&self, chart: &Path) -> Result<()>;
}
