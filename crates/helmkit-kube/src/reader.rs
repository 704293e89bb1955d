//! Typed resource readers

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{KubeError, Result};
use crate::filter::{Filter, OwnerUidFilter};
use crate::kinds::ResourceKind;
use crate::source::{ObjectSource, scoped_namespace};

/// Reads objects of one kind, decoded into `T` and passed through a filter
pub struct Reader<T> {
    kind: &'static ResourceKind,
    source: Arc<dyn ObjectSource>,
    namespace: String,
    filter: Filter,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Reader<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            source: self.source.clone(),
            namespace: self.namespace.clone(),
            filter: self.filter.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Reader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("kind", self.kind)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned> Reader<T> {
    pub fn new(
        kind: &'static ResourceKind,
        source: Arc<dyn ObjectSource>,
        namespace: impl Into<String>,
        filter: Filter,
    ) -> Self {
        Self {
            kind,
            source,
            namespace: namespace.into(),
            filter,
            _marker: PhantomData,
        }
    }

    pub fn kind(&self) -> &'static ResourceKind {
        self.kind
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fetch one object
    ///
    /// An object rejected by the filter is reported as not found.
    pub async fn get(&self, name: &str) -> Result<Resource<T>> {
        let object = self
            .source
            .get(
                self.kind,
                scoped_namespace(self.kind, &self.namespace),
                name,
            )
            .await?;

        if !self.filter.matches(self.kind, &object.metadata).await? {
            return Err(KubeError::NotFound {
                resource: self.kind.resource_name(),
                name: name.to_string(),
            });
        }

        self.resource(object)
    }

    /// List the objects accepted by the filter
    ///
    /// A filter error fails the whole list.
    pub async fn list(&self) -> Result<Vec<Resource<T>>> {
        let objects = self
            .source
            .list(self.kind, scoped_namespace(self.kind, &self.namespace))
            .await?;

        let mut resources = Vec::with_capacity(objects.len());
        for object in objects {
            if self.filter.matches(self.kind, &object.metadata).await? {
                resources.push(self.resource(object)?);
            }
        }
        Ok(resources)
    }

    fn resource(&self, object: DynamicObject) -> Result<Resource<T>> {
        let decoded = decode(self.kind, &object)?;
        Ok(Resource {
            kind: self.kind,
            meta: object.metadata,
            object: decoded,
            source: self.source.clone(),
            namespace: self.namespace.clone(),
        })
    }
}

/// Decode a dynamic object into its typed form
fn decode<T: DeserializeOwned>(kind: &ResourceKind, object: &DynamicObject) -> Result<T> {
    let mut value = serde_json::to_value(object)?;
    if let JsonValue::Object(map) = &mut value {
        map.insert(
            "apiVersion".to_string(),
            JsonValue::String(kind.api_version()),
        );
        map.insert("kind".to_string(), JsonValue::String(kind.kind.to_string()));
    }
    serde_json::from_value(value)
        .map_err(|e| KubeError::Serialization(format!("cannot decode {}: {}", kind, e)))
}

/// An object read through a [`Reader`]
pub struct Resource<T> {
    kind: &'static ResourceKind,
    pub meta: ObjectMeta,
    pub object: T,
    source: Arc<dyn ObjectSource>,
    namespace: String,
}

impl<T: fmt::Debug> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("kind", self.kind)
            .field("meta", &self.meta)
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}

impl<T> Resource<T> {
    pub fn kind(&self) -> &'static ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or_default()
    }

    /// The object's namespace, or the reader's for objects without one
    pub fn namespace(&self) -> &str {
        self.meta
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(&self.namespace)
    }

    pub fn uid(&self) -> Option<&str> {
        self.meta.uid.as_deref()
    }

    /// Delete this object from the cluster
    pub async fn delete(&self) -> Result<()> {
        self.source
            .delete(
                self.kind,
                scoped_namespace(self.kind, self.namespace()),
                self.name(),
            )
            .await
    }

    /// Reader over objects of `kind` owned by this object
    pub fn references<U: DeserializeOwned>(&self, kind: &'static ResourceKind) -> Reader<U> {
        Reader::new(
            kind,
            self.source.clone(),
            self.namespace(),
            Arc::new(OwnerUidFilter::new(self.uid().unwrap_or_default())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ReleaseFilter, no_filter};
    use crate::kinds::{apps_v1, core_v1};
    use crate::manifest::ResourceList;
    use crate::source::MemorySource;
    use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
    use k8s_openapi::api::core::v1::Pod;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use serde_json::json;

    fn deployment(name: &str, replicas: i32) -> DynamicObject {
        let mut object = MemorySource::object(&apps_v1::DEPLOYMENT, "apps", name);
        object.metadata.uid = Some(format!("{}-uid", name));
        object.data = json!({"spec": {"replicas": replicas, "selector": {}, "template": {}}});
        object
    }

    fn replica_set(name: &str, owner: &str) -> DynamicObject {
        let mut object = MemorySource::object(&apps_v1::REPLICA_SET, "apps", name);
        object.metadata.uid = Some(format!("{}-uid", name));
        object.metadata.owner_references = Some(vec![OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: owner.to_string(),
            uid: format!("{}-uid", owner),
            ..Default::default()
        }]);
        object
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_object(&apps_v1::DEPLOYMENT, deployment("web", 3))
            .with_object(&apps_v1::DEPLOYMENT, deployment("db", 1))
            .with_object(&apps_v1::REPLICA_SET, replica_set("web-rs", "web"))
            .with_object(&apps_v1::REPLICA_SET, replica_set("db-rs", "db"))
    }

    fn release_filter(source: &MemorySource) -> Filter {
        let resources = ResourceList::from_manifest(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n",
            "apps",
        )
        .unwrap();
        Arc::new(ReleaseFilter::new(Arc::new(source.clone()), "apps", resources))
    }

    #[tokio::test]
    async fn test_get_decodes_typed_object() {
        let source = source();
        let reader: Reader<Deployment> =
            Reader::new(&apps_v1::DEPLOYMENT, Arc::new(source), "apps", no_filter());

        let web = reader.get("web").await.unwrap();
        assert_eq!(web.name(), "web");
        assert_eq!(web.namespace(), "apps");
        assert_eq!(web.object.spec.as_ref().and_then(|s| s.replicas), Some(3));
    }

    #[tokio::test]
    async fn test_get_filtered_is_not_found() {
        let source = source();
        let filter = release_filter(&source);
        let reader: Reader<Deployment> =
            Reader::new(&apps_v1::DEPLOYMENT, Arc::new(source), "apps", filter);

        assert!(reader.get("web").await.is_ok());
        let err = reader.get("db").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "deployments.apps \"db\" not found");
    }

    #[tokio::test]
    async fn test_list_drops_rejected() {
        let source = source();
        let filter = release_filter(&source);
        let reader: Reader<ReplicaSet> =
            Reader::new(&apps_v1::REPLICA_SET, Arc::new(source), "apps", filter);

        let sets = reader.list().await.unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name(), "web-rs");
    }

    #[tokio::test]
    async fn test_list_filter_error_aborts() {
        let source = MemorySource::new().with_object(&core_v1::POD, {
            let mut pod = MemorySource::object(&core_v1::POD, "apps", "web-0");
            pod.metadata.owner_references = Some(vec![OwnerReference {
                api_version: "apps/v1".to_string(),
                kind: "ReplicaSet".to_string(),
                name: "web-rs".to_string(),
                uid: "web-rs-uid".to_string(),
                ..Default::default()
            }]);
            pod
        });
        source.fail_get(&apps_v1::REPLICA_SET, "web-rs");
        let filter = release_filter(&source);
        let reader: Reader<Pod> = Reader::new(&core_v1::POD, Arc::new(source), "apps", filter);

        assert!(reader.list().await.is_err());
    }

    #[tokio::test]
    async fn test_references() {
        let source = source();
        let reader: Reader<Deployment> =
            Reader::new(&apps_v1::DEPLOYMENT, Arc::new(source), "apps", no_filter());

        let web = reader.get("web").await.unwrap();
        let sets = web
            .references::<ReplicaSet>(&apps_v1::REPLICA_SET)
            .list()
            .await
            .unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name(), "web-rs");
    }

    #[tokio::test]
    async fn test_delete() {
        let source = source();
        let reader: Reader<DynamicObject> = Reader::new(
            &apps_v1::DEPLOYMENT,
            Arc::new(source.clone()),
            "apps",
            no_filter(),
        );

        let db = reader.get("db").await.unwrap();
        db.delete().await.unwrap();
        assert!(reader.get("db").await.unwrap_err().is_not_found());
        assert_eq!(reader.list().await.unwrap().len(), 1);
    }
}
