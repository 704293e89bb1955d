//! Object filters
//!
//! Every reader carries a filter that decides which objects it exposes.
//! Filters are asynchronous since deciding may mean reading other objects.

mod owners;
mod release;

pub use owners::OwnerTable;
pub use release::{INSTANCE_LABEL, INSTANCE_PAIRS, ReleaseFilter};

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::sync::Arc;

use crate::error::Result;
use crate::kinds::ResourceKind;

/// Decides whether an object is visible through a client
#[async_trait]
pub trait ResourceFilter: Send + Sync {
    async fn matches(&self, kind: &ResourceKind, meta: &ObjectMeta) -> Result<bool>;
}

/// Shared filter handle
pub type Filter = Arc<dyn ResourceFilter>;

/// Accepts every object
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

#[async_trait]
impl ResourceFilter for NoFilter {
    async fn matches(&self, _kind: &ResourceKind, _meta: &ObjectMeta) -> Result<bool> {
        Ok(true)
    }
}

pub fn no_filter() -> Filter {
    Arc::new(NoFilter)
}

/// Accepts objects with an owner reference to a UID
#[derive(Debug, Clone)]
pub struct OwnerUidFilter {
    uid: String,
}

impl OwnerUidFilter {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

#[async_trait]
impl ResourceFilter for OwnerUidFilter {
    async fn matches(&self, _kind: &ResourceKind, meta: &ObjectMeta) -> Result<bool> {
        Ok(meta
            .owner_references
            .iter()
            .flatten()
            .any(|owner| owner.uid == self.uid))
    }
}
