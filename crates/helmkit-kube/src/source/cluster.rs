//! Live cluster access through `kube::Client`

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams};
use kube::config::KubeConfigOptions;
use kube::core::TypeMeta;
use kube::{Client, Config};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::ObjectSource;
use crate::error::{KubeError, Result};
use crate::kinds::ResourceKind;

/// Upper bound for a single API request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Object source backed by the Kubernetes API server
#[derive(Clone)]
pub struct ClusterSource {
    client: Client,
}

impl ClusterSource {
    /// Connect using the inferred configuration (kubeconfig or in-cluster)
    pub async fn try_default() -> Result<Self> {
        Self::for_context(None).await
    }

    /// Connect using a named kubeconfig context, or the inferred configuration
    pub async fn for_context(context: Option<&str>) -> Result<Self> {
        let config = match context {
            Some(context) => {
                let options = KubeConfigOptions {
                    context: Some(context.to_string()),
                    ..Default::default()
                };
                Config::from_kubeconfig(&options)
                    .await
                    .map_err(|e| KubeError::Config(e.to_string()))?
            }
            None => Config::infer()
                .await
                .map_err(|e| KubeError::Config(e.to_string()))?,
        };

        debug!(cluster = %config.cluster_url, "connecting to cluster");
        let client = Client::try_from(config)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn api(&self, kind: &ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let resource = kind.api_resource();
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        }
    }
}

async fn bounded<T, F>(request: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, kube::Error>>,
{
    match tokio::time::timeout(REQUEST_TIMEOUT, request).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(KubeError::Timeout(REQUEST_TIMEOUT)),
    }
}

fn not_found(kind: &ResourceKind, name: &str, err: KubeError) -> KubeError {
    if err.is_not_found() {
        KubeError::NotFound {
            resource: kind.resource_name(),
            name: name.to_string(),
        }
    } else {
        err
    }
}

fn type_meta(kind: &ResourceKind) -> TypeMeta {
    TypeMeta {
        api_version: kind.api_version(),
        kind: kind.kind.to_string(),
    }
}

#[async_trait]
impl ObjectSource for ClusterSource {
    async fn get(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        debug!(%kind, namespace = namespace.unwrap_or(""), name, "get");
        let api = self.api(kind, namespace);
        let mut object = bounded(api.get(name))
            .await
            .map_err(|e| not_found(kind, name, e))?;
        object.types.get_or_insert_with(|| type_meta(kind));
        Ok(object)
    }

    async fn list(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        debug!(%kind, namespace = namespace.unwrap_or(""), "list");
        let api = self.api(kind, namespace);
        let list = bounded(api.list(&ListParams::default())).await?;

        // list items come back without apiVersion/kind
        Ok(list
            .items
            .into_iter()
            .map(|mut object| {
                object.types = Some(type_meta(kind));
                object
            })
            .collect())
    }

    async fn delete(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()> {
        debug!(%kind, namespace = namespace.unwrap_or(""), name, "delete");
        let api = self.api(kind, namespace);
        bounded(api.delete(name, &DeleteParams::default()))
            .await
            .map_err(|e| not_found(kind, name, e))?;
        Ok(())
    }
}
