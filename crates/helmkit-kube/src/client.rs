//! Kubernetes client bound to a namespace and a filter

use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::filter::{Filter, no_filter};
use crate::groups::*;
use crate::kinds::ResourceKind;
use crate::namespace::namespace_from_env;
use crate::reader::Reader;
use crate::source::{ClusterSource, ObjectSource};

/// Entry point for reading cluster objects
///
/// Every reader created from a client shares its source, namespace and
/// filter. A client filtered by a release only ever shows that release's
/// objects.
#[derive(Clone)]
pub struct KubernetesClient {
    source: Arc<dyn ObjectSource>,
    namespace: String,
    filter: Filter,
}

impl KubernetesClient {
    /// Connect to the cluster, using the namespace from the environment
    pub async fn new() -> Result<Self> {
        Self::for_namespace(namespace_from_env()).await
    }

    /// Connect to the cluster for a namespace
    pub async fn for_namespace(namespace: impl Into<String>) -> Result<Self> {
        let source = ClusterSource::try_default().await?;
        Ok(Self::with_source(Arc::new(source), namespace))
    }

    /// Connect to the cluster for a namespace, exposing only what `filter` accepts
    pub async fn filtered(namespace: impl Into<String>, filter: Filter) -> Result<Self> {
        Ok(Self::for_namespace(namespace).await?.with_filter(filter))
    }

    /// Client over an existing source, unfiltered
    pub fn with_source(source: Arc<dyn ObjectSource>, namespace: impl Into<String>) -> Self {
        Self {
            source,
            namespace: namespace.into(),
            filter: no_filter(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn source(&self) -> Arc<dyn ObjectSource> {
        self.source.clone()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Reader for any descriptor
    pub fn reader<T: DeserializeOwned>(&self, kind: &'static ResourceKind) -> Reader<T> {
        Reader::new(
            kind,
            self.source.clone(),
            self.namespace.clone(),
            self.filter.clone(),
        )
    }

    // ========== Group clients ==========

    pub fn admissionregistration_v1(&self) -> AdmissionregistrationV1 {
        AdmissionregistrationV1::new(self.clone())
    }

    pub fn apiextensions_v1(&self) -> ApiextensionsV1 {
        ApiextensionsV1::new(self.clone())
    }

    pub fn apiextensions_v1beta1(&self) -> ApiextensionsV1beta1 {
        ApiextensionsV1beta1::new(self.clone())
    }

    pub fn apps_v1(&self) -> AppsV1 {
        AppsV1::new(self.clone())
    }

    pub fn apps_v1beta1(&self) -> AppsV1beta1 {
        AppsV1beta1::new(self.clone())
    }

    pub fn batch_v1(&self) -> BatchV1 {
        BatchV1::new(self.clone())
    }

    pub fn batch_v1beta1(&self) -> BatchV1beta1 {
        BatchV1beta1::new(self.clone())
    }

    pub fn batch_v2alpha1(&self) -> BatchV2alpha1 {
        BatchV2alpha1::new(self.clone())
    }

    pub fn extensions_v1beta1(&self) -> ExtensionsV1beta1 {
        ExtensionsV1beta1::new(self.clone())
    }

    pub fn networking_v1(&self) -> NetworkingV1 {
        NetworkingV1::new(self.clone())
    }

    pub fn networking_v1beta1(&self) -> NetworkingV1beta1 {
        NetworkingV1beta1::new(self.clone())
    }

    pub fn policy_v1(&self) -> PolicyV1 {
        PolicyV1::new(self.clone())
    }

    pub fn policy_v1beta1(&self) -> PolicyV1beta1 {
        PolicyV1beta1::new(self.clone())
    }

    pub fn rbac_v1(&self) -> RbacV1 {
        RbacV1::new(self.clone())
    }

    pub fn storage_v1(&self) -> StorageV1 {
        StorageV1::new(self.clone())
    }

    pub fn core_v1(&self) -> CoreV1 {
        CoreV1::new(self.clone())
    }
}

impl fmt::Debug for KubernetesClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubernetesClient")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
