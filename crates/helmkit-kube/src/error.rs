//! Error types for helmkit-kube

use thiserror::Error;

/// Result type for helmkit-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while talking to the cluster or reading release storage
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Object absent, or hidden by the client's filter
    #[error("{resource} \"{name}\" not found")]
    NotFound { resource: String, name: String },

    /// No release records for the name
    #[error("release '{name}' not found in namespace '{namespace}'")]
    ReleaseNotFound { name: String, namespace: String },

    /// Cluster connection could not be configured
    #[error("Kubernetes configuration error: {0}")]
    Config(String),

    /// Request did not complete in time
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Unknown storage driver name
    #[error("unsupported storage driver '{0}' (expected secret, configmap or memory)")]
    UnsupportedDriver(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Compression error
    #[error("compression error: {0}")]
    Compression(String),

    /// Manifest could not be parsed
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

impl KubeError {
    /// Whether the error means the object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for KubeError {
    fn from(err: serde_json::Error) -> Self {
        KubeError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(err: serde_yaml::Error) -> Self {
        KubeError::InvalidManifest(err.to_string())
    }
}
