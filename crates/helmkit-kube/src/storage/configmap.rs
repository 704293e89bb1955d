//! ConfigMap storage driver

use async_trait::async_trait;
use helmkit_core::HelmRelease;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::Client;
use kube::api::{Api, ListParams};
use tracing::debug;

use super::{
    OWNER_SELECTOR, RELEASE_KEY, ReleaseStorage, decode_records, into_history, release_selector,
};
use crate::error::Result;

/// Reads release records from ConfigMaps
#[derive(Clone)]
pub struct ConfigMapStorage {
    client: Client,
}

impl ConfigMapStorage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn read(&self, namespace: &str, selector: &str) -> Result<Vec<HelmRelease>> {
        debug!(namespace, selector, "listing release configmaps");
        let api: Api<ConfigMap> = if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        };
        let maps = api.list(&ListParams::default().labels(selector)).await?;

        Ok(decode_records(maps.items.into_iter().map(|map| {
            let data = map.data.and_then(|mut data| data.remove(RELEASE_KEY));
            (map.metadata.name.unwrap_or_default(), data)
        })))
    }
}

#[async_trait]
impl ReleaseStorage for ConfigMapStorage {
    async fn list(&self, namespace: &str) -> Result<Vec<HelmRelease>> {
        self.read(namespace, OWNER_SELECTOR).await
    }

    async fn history(&self, namespace: &str, name: &str) -> Result<Vec<HelmRelease>> {
        let releases = self.read(namespace, &release_selector(name)).await?;
        into_history(releases, namespace, name)
    }
}
