//! In-memory object source for testing
//!
//! Objects live in a map keyed by kind, namespace and name, so readers and
//! filters can be exercised without a Kubernetes cluster.

use async_trait::async_trait;
use kube::api::DynamicObject;
use kube::core::ErrorResponse;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use super::ObjectSource;
use crate::error::{KubeError, Result};
use crate::kinds::ResourceKind;

type ObjectKey = (ResourceKind, String, String);

/// In-memory object source
#[derive(Clone, Default)]
pub struct MemorySource {
    objects: Arc<RwLock<HashMap<ObjectKey, DynamicObject>>>,
    /// Names whose `get` fails with a server error
    failing: Arc<RwLock<HashSet<(ResourceKind, String)>>>,
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub deletes: usize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an empty object of `kind`
    pub fn object(kind: &ResourceKind, namespace: &str, name: &str) -> DynamicObject {
        let object = DynamicObject::new(name, &kind.api_resource());
        if kind.scoped {
            object.within(namespace)
        } else {
            object
        }
    }

    /// Store an object, replacing any previous one with the same identity
    pub fn insert(&self, kind: &ResourceKind, object: DynamicObject) {
        let key = (
            *kind,
            object.metadata.namespace.clone().unwrap_or_default(),
            object.metadata.name.clone().unwrap_or_default(),
        );
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, object);
    }

    pub fn with_object(self, kind: &ResourceKind, object: DynamicObject) -> Self {
        self.insert(kind, object);
        self
    }

    /// Make `get` of a name fail with an internal server error
    pub fn fail_get(&self, kind: &ResourceKind, name: &str) {
        self.failing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((*kind, name.to_string()));
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Count stored objects
    pub fn object_count(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn count(&self, op: impl FnOnce(&mut OperationCounts)) {
        op(&mut self.operations.write().unwrap_or_else(PoisonError::into_inner));
    }
}

fn key(kind: &ResourceKind, namespace: Option<&str>, name: &str) -> ObjectKey {
    (
        *kind,
        namespace.unwrap_or_default().to_string(),
        name.to_string(),
    )
}

fn not_found(kind: &ResourceKind, name: &str) -> KubeError {
    KubeError::NotFound {
        resource: kind.resource_name(),
        name: name.to_string(),
    }
}

#[async_trait]
impl ObjectSource for MemorySource {
    async fn get(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        self.count(|ops| ops.gets += 1);

        let failing = self
            .failing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(*kind, name.to_string()));
        if failing {
            return Err(KubeError::Api(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: format!("internal error reading {} {}", kind.resource_name(), name),
                reason: "InternalError".to_string(),
                code: 500,
            })));
        }

        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key(kind, namespace, name))
            .cloned()
            .ok_or_else(|| not_found(kind, name))
    }

    async fn list(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        self.count(|ops| ops.lists += 1);

        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<(&ObjectKey, &DynamicObject)> = objects
            .iter()
            .filter(|((k, ns, _), _)| k == kind && namespace.is_none_or(|wanted| wanted == ns))
            .collect();
        matching.sort_by(|(a, _), (b, _)| (&a.1, &a.2).cmp(&(&b.1, &b.2)));

        Ok(matching.into_iter().map(|(_, o)| o.clone()).collect())
    }

    async fn delete(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()> {
        self.count(|ops| ops.deletes += 1);

        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key(kind, namespace, name))
            .map(|_| ())
            .ok_or_else(|| not_found(kind, name))
    }
}
