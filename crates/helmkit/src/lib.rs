//! helmkit - Helm client library
//!
//! Install, upgrade, roll back and uninstall Helm releases, load charts and
//! manage chart repositories. Every release carries a Kubernetes client that
//! only sees the objects belonging to that release.
//!
//! ```ignore
//! use helmkit::{ConfigCache, Helm};
//!
//! let cache = ConfigCache::from_env();
//! let helm = Helm::new(&cache).await?;
//! let release = helm.releases().get("web").await?;
//! for pod in release.client().core_v1().pods().list().await? {
//!     println!("{}", pod.name());
//! }
//! ```

pub mod chart;
pub mod config;
pub mod engine;
pub mod error;
pub mod helm;
pub mod release;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use chart::{Chart, ChartClient};
pub use config::{ConfigCache, HelmConfig};
pub use engine::{ChartSource, HelmCli, HelmEngine, MockEngine, PulledChart};
pub use error::{HelmError, Result};
pub use helm::Helm;
pub use release::{
    InstallRequest, Release, ReleaseClient, RollbackRequest, UninstallRequest, UpgradeRequest,
};
pub use settings::HelmSettings;

pub use helmkit_core::{HelmContext, ImmutableValues, ReleaseStatus, StatusReport, Values};
pub use helmkit_kube::KubernetesClient;
pub use helmkit_repo::RepoClient;
