//! Object access
//!
//! An [`ObjectSource`] fetches raw objects for a descriptor. Readers decode
//! and filter on top of it, so the same reader code runs against a live
//! cluster ([`ClusterSource`]) or an in-memory store ([`MemorySource`]).

mod cluster;
mod memory;

pub use cluster::{ClusterSource, REQUEST_TIMEOUT};
pub use memory::{MemorySource, OperationCounts};

use async_trait::async_trait;
use kube::api::DynamicObject;

use crate::error::Result;
use crate::kinds::ResourceKind;

/// Raw object access keyed by descriptor
///
/// `namespace` is `None` for cluster-scoped kinds and for listing across
/// every namespace.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Fetch one object, `KubeError::NotFound` when absent
    async fn get(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject>;

    /// List objects of a kind
    async fn list(&self, kind: &ResourceKind, namespace: Option<&str>)
    -> Result<Vec<DynamicObject>>;

    /// Delete one object
    async fn delete(&self, kind: &ResourceKind, namespace: Option<&str>, name: &str)
    -> Result<()>;
}

/// The namespace to send for a kind: only scoped kinds get one, and an empty
/// namespace means all namespaces
pub fn scoped_namespace<'a>(kind: &ResourceKind, namespace: &'a str) -> Option<&'a str> {
    (kind.scoped && !namespace.is_empty()).then_some(namespace)
}
