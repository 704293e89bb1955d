//! helmkit-kube - Kubernetes side of helmkit
//!
//! This crate provides:
//! - **Resource descriptors**: one static [`ResourceKind`] per supported kind
//! - **Readers**: typed `get`/`list` over any descriptor, scoped to a namespace
//! - **Group clients**: `client.apps_v1().deployments()` style accessors
//! - **Release filter**: restricts a client to the objects owned by a release
//! - **Release storage**: reads Helm's release Secrets and ConfigMaps
//!
//! # Example
//!
//! ```ignore
//! use helmkit_kube::KubernetesClient;
//!
//! let client = KubernetesClient::new().await?;
//! for pod in client.core_v1().pods().list().await? {
//!     println!("{}", pod.name());
//! }
//! ```

pub mod client;
pub mod error;
pub mod filter;
pub mod groups;
pub mod kinds;
pub mod manifest;
pub mod namespace;
pub mod reader;
pub mod source;
pub mod storage;

pub use client::KubernetesClient;
pub use error::{KubeError, Result};
pub use filter::{Filter, NoFilter, OwnerTable, OwnerUidFilter, ReleaseFilter, ResourceFilter};
pub use kinds::ResourceKind;
pub use manifest::{ResourceId, ResourceList};
pub use namespace::{namespace_from_env, namespace_from_lookup};
pub use reader::{Reader, Resource};
pub use source::{ClusterSource, MemorySource, ObjectSource};
pub use storage::{
    ConfigMapStorage, MemoryStorage, ReleaseStorage, SecretsStorage, StorageDriver,
};
