//! Error types for the Helm client

use helmkit_core::CoreError;
use helmkit_kube::KubeError;
use helmkit_repo::RepoError;
use thiserror::Error;

/// Result type for Helm client operations
pub type Result<T> = std::result::Result<T, HelmError>;

/// Errors returned by the Helm client
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HelmError {
    /// No release record with that name
    #[error("release '{name}' not found in namespace '{namespace}'")]
    ReleaseNotFound { name: String, namespace: String },

    /// Several records claim to be the latest revision
    #[error(
        "release '{name}' is ambiguous in namespace '{namespace}': {count} records for revision {revision}"
    )]
    AmbiguousRelease {
        name: String,
        namespace: String,
        revision: u32,
        count: usize,
    },

    /// Chart or sub-chart could not be located
    #[error("chart not found: {name}")]
    ChartNotFound { name: String },

    /// Declared dependencies are not present under `charts/`
    #[error(
        "chart '{chart}' has dependencies found in Chart.yaml, but missing in charts/ directory: {}",
        .missing.join(", ")
    )]
    DependencyUnsatisfied { chart: String, missing: Vec<String> },

    /// The Helm engine reported a failure
    #[error("helm {command} failed: {message}")]
    Engine { command: String, message: String },

    /// The Helm binary could not be started
    #[error("failed to run '{binary}': {source}")]
    EngineUnavailable {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Kube(#[from] KubeError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl HelmError {
    /// Whether the release (or object) does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ReleaseNotFound { .. } | Self::ChartNotFound { .. } => true,
            Self::Kube(KubeError::ReleaseNotFound { .. }) => true,
            Self::Kube(e) => e.is_not_found(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for HelmError {
    fn from(err: serde_json::Error) -> Self {
        HelmError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for HelmError {
    fn from(err: serde_yaml::Error) -> Self {
        HelmError::Serialization(err.to_string())
    }
}
