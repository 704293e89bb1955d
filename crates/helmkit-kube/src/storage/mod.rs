//! Release storage (read side)
//!
//! Helm persists every revision of a release as a Secret (default) or a
//! ConfigMap named `sh.helm.release.v1.<name>.v<revision>`, labelled
//! `owner=helm`. The record itself is gzipped JSON, base64 encoded.
//! Writing records is left to the Helm engine; this module only reads them.

mod configmap;
mod memory;
mod secrets;

pub use configmap::ConfigMapStorage;
pub use memory::MemoryStorage;
pub use secrets::SecretsStorage;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use helmkit_core::HelmRelease;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::warn;

use crate::error::{KubeError, Result};

/// Label selector matching every Helm release record
pub const OWNER_SELECTOR: &str = "owner=helm";

/// Key of the record inside the Secret or ConfigMap data
pub const RELEASE_KEY: &str = "release";

const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

/// Read access to Helm release records
#[async_trait]
pub trait ReleaseStorage: Send + Sync {
    /// Every record in a namespace, all namespaces when empty
    async fn list(&self, namespace: &str) -> Result<Vec<HelmRelease>>;

    /// Every revision of a release
    ///
    /// Returns `KubeError::ReleaseNotFound` when there is none.
    async fn history(&self, namespace: &str, name: &str) -> Result<Vec<HelmRelease>>;
}

/// Storage backend selected by `HELM_DRIVER`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageDriver {
    #[default]
    Secrets,
    ConfigMaps,
    Memory,
}

impl StorageDriver {
    /// Parse a driver name the way Helm does; empty selects Secrets
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "" | "secret" | "secrets" => Ok(Self::Secrets),
            "configmap" | "configmaps" => Ok(Self::ConfigMaps),
            "memory" => Ok(Self::Memory),
            other => Err(KubeError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Open the backend over a cluster connection
    pub fn open(self, client: kube::Client) -> Arc<dyn ReleaseStorage> {
        match self {
            Self::Secrets => Arc::new(SecretsStorage::new(client)),
            Self::ConfigMaps => Arc::new(ConfigMapStorage::new(client)),
            Self::Memory => Arc::new(MemoryStorage::new()),
        }
    }
}

/// Decode a stored record: base64, then gzip when compressed, then JSON
pub fn decode_release(encoded: &str) -> Result<HelmRelease> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| KubeError::Serialization(format!("invalid base64 release data: {}", e)))?;

    let json = if raw.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut decoded)
            .map_err(|e| KubeError::Compression(e.to_string()))?;
        decoded
    } else {
        raw
    };

    Ok(serde_json::from_slice(&json)?)
}

/// Encode a record the way Helm stores it
pub fn encode_release(release: &HelmRelease) -> Result<String> {
    let json = serde_json::to_vec(release)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| KubeError::Compression(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| KubeError::Compression(e.to_string()))?;
    Ok(STANDARD.encode(compressed))
}

/// Decode the records found on storage objects, skipping the unreadable ones
pub(crate) fn decode_records<I>(records: I) -> Vec<HelmRelease>
where
    I: IntoIterator<Item = (String, Option<String>)>,
{
    records
        .into_iter()
        .filter_map(|(object, data)| {
            let Some(data) = data else {
                warn!(object = %object, "release record without data, skipping");
                return None;
            };
            match decode_release(&data) {
                Ok(release) => Some(release),
                Err(e) => {
                    warn!(object = %object, error = %e, "failed to decode release, skipping");
                    None
                }
            }
        })
        .collect()
}

/// Label selector for one release's records
pub(crate) fn release_selector(name: &str) -> String {
    format!("{},name={}", OWNER_SELECTOR, name)
}

/// History result: records sorted by revision, not found when empty
pub(crate) fn into_history(
    mut releases: Vec<HelmRelease>,
    namespace: &str,
    name: &str,
) -> Result<Vec<HelmRelease>> {
    if releases.is_empty() {
        return Err(KubeError::ReleaseNotFound {
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
    }
    releases.sort_by_key(|r| r.version);
    Ok(releases)
}
