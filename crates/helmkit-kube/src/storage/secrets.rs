//! Secrets storage driver (Helm's default)

use async_trait::async_trait;
use helmkit_core::HelmRelease;
use k8s_openapi::api::core::v1::Secret;
use kube::Client;
use kube::api::{Api, ListParams};
use tracing::debug;

use super::{RELEASE_KEY, ReleaseStorage, decode_records, into_history, release_selector};
use crate::error::Result;

/// Reads release records from Secrets
#[derive(Clone)]
pub struct SecretsStorage {
    client: Client,
}

impl SecretsStorage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        }
    }

    async fn read(&self, namespace: &str, selector: &str) -> Result<Vec<HelmRelease>> {
        debug!(namespace, selector, "listing release secrets");
        let secrets = self
            .api(namespace)
            .list(&ListParams::default().labels(selector))
            .await?;

        Ok(decode_records(secrets.items.into_iter().map(|secret| {
            let data = secret
                .data
                .and_then(|mut data| data.remove(RELEASE_KEY))
                .map(|bytes| String::from_utf8_lossy(&bytes.0).into_owned());
            (secret.metadata.name.unwrap_or_default(), data)
        })))
    }
}

#[async_trait]
impl ReleaseStorage for SecretsStorage {
    async fn list(&self, namespace: &str) -> Result<Vec<HelmRelease>> {
        self.read(namespace, super::OWNER_SELECTOR).await
    }

    async fn history(&self, namespace: &str, name: &str) -> Result<Vec<HelmRelease>> {
        let releases = self.read(namespace, &release_selector(name)).await?;
        into_history(releases, namespace, name)
    }
}
