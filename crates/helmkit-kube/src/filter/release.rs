//! Release ownership filter
//!
//! An object belongs to a release when it was rendered by the release, when
//! one of its owners (transitively) belongs to it, or when its
//! `app.kubernetes.io/instance` label names a workload that belongs to it.

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::DynamicObject;
use std::sync::Arc;
use tracing::debug;

use super::{OwnerTable, ResourceFilter};
use crate::error::Result;
use crate::kinds::{ResourceKind, apps_v1, apps_v1beta1, core_v1};
use crate::manifest::ResourceList;
use crate::source::{ObjectSource, scoped_namespace};

/// Label naming the workload an object was created for
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";

/// `(child, parent)` pairs tried, in order, by the instance label heuristic
pub static INSTANCE_PAIRS: &[(ResourceKind, ResourceKind)] = &[
    (core_v1::POD, apps_v1::DAEMON_SET),
    (apps_v1::REPLICA_SET, apps_v1::DEPLOYMENT),
    (core_v1::POD, apps_v1::REPLICA_SET),
    (core_v1::POD, apps_v1::STATEFUL_SET),
    (apps_v1::REPLICA_SET, apps_v1beta1::DEPLOYMENT),
    (core_v1::POD, apps_v1beta1::DEPLOYMENT),
    (apps_v1::REPLICA_SET, apps_v1beta1::STATEFUL_SET),
    (core_v1::POD, apps_v1beta1::STATEFUL_SET),
    (core_v1::ENDPOINTS, core_v1::SERVICE),
];

/// Accepts objects belonging to a release
///
/// Owners are read unfiltered from the source. Owner chains are assumed to be
/// acyclic; a self-referencing owner chain is followed without end.
#[derive(Clone)]
pub struct ReleaseFilter {
    source: Arc<dyn ObjectSource>,
    namespace: String,
    resources: ResourceList,
    owners: OwnerTable,
}

impl ReleaseFilter {
    /// Filter for the objects of `resources`, looking up owners in
    /// `namespace` when a candidate has none
    pub fn new(
        source: Arc<dyn ObjectSource>,
        namespace: impl Into<String>,
        resources: ResourceList,
    ) -> Self {
        Self {
            source,
            namespace: namespace.into(),
            resources,
            owners: OwnerTable::default(),
        }
    }

    pub fn with_owner_table(mut self, owners: OwnerTable) -> Self {
        self.owners = owners;
        self
    }

    pub fn resources(&self) -> &ResourceList {
        &self.resources
    }

    fn evaluate<'a>(
        &'a self,
        kind: &'a ResourceKind,
        meta: &'a ObjectMeta,
    ) -> BoxFuture<'a, Result<bool>> {
        async move {
            let namespace = meta.namespace.as_deref().unwrap_or_default();
            let name = meta.name.as_deref().unwrap_or_default();
            if self.resources.contains(kind, namespace, name) {
                return Ok(true);
            }

            for owner in meta.owner_references.iter().flatten() {
                if self.owner_belongs(meta, owner).await? {
                    return Ok(true);
                }
            }

            self.instance_belongs(kind, meta).await
        }
        .boxed()
    }

    async fn owner_belongs(&self, meta: &ObjectMeta, owner: &OwnerReference) -> Result<bool> {
        if self
            .resources
            .contains_owner(&owner.api_version, &owner.kind, &owner.name)
        {
            return Ok(true);
        }

        let Some(kind) = self.owners.resolve(&owner.api_version, &owner.kind) else {
            debug!(
                api_version = %owner.api_version,
                kind = %owner.kind,
                "owner kind not supported, skipping"
            );
            return Ok(false);
        };

        match self.fetch(kind, meta, &owner.name).await? {
            Some(parent) => self.evaluate(kind, &parent.metadata).await,
            None => Ok(false),
        }
    }

    async fn instance_belongs(&self, kind: &ResourceKind, meta: &ObjectMeta) -> Result<bool> {
        let Some(instance) = meta
            .labels
            .as_ref()
            .and_then(|labels| labels.get(INSTANCE_LABEL))
        else {
            return Ok(false);
        };

        for (child, parent) in INSTANCE_PAIRS {
            if child != kind {
                continue;
            }
            if let Some(object) = self.fetch(parent, meta, instance).await? {
                return self.evaluate(parent, &object.metadata).await;
            }
        }

        Ok(false)
    }

    /// Read a related object next to `meta`; absence is `None`
    async fn fetch(
        &self,
        kind: &ResourceKind,
        meta: &ObjectMeta,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        let namespace = meta
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(&self.namespace);

        match self
            .source
            .get(kind, scoped_namespace(kind, namespace), name)
            .await
        {
            Ok(object) => Ok(Some(object)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ResourceFilter for ReleaseFilter {
    async fn matches(&self, kind: &ResourceKind, meta: &ObjectMeta) -> Result<bool> {
        self.evaluate(kind, meta).await
    }
}
