use std::time::Duration;
use tracing::{debug, info};

use super::ReleaseClient;
use crate::engine::UninstallOptions;
use crate::error::Result;

/// Remove a release and its resources
#[derive(Debug)]
#[must_use = "requests do nothing until `run` is called"]
pub struct UninstallRequest {
    client: ReleaseClient,
    name: String,
    options: UninstallOptions,
}

impl UninstallRequest {
    pub(super) fn new(client: ReleaseClient, name: String) -> Self {
        let options = UninstallOptions {
            namespace: client.namespace().to_string(),
            ..Default::default()
        };
        Self {
            client,
            name,
            options,
        }
    }

    /// Keep the release records, marked uninstalled
    pub fn keep_history(mut self) -> Self {
        self.options.keep_history = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub async fn run(self) -> Result<()> {
        debug!(release = %self.name, keep_history = self.options.keep_history, "uninstalling release");
        self.client
            .engine()
            .uninstall(&self.name, &self.options)
            .await?;
        info!(release = %self.name, "release uninstalled");
        Ok(())
    }
}
