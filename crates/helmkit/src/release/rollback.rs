use std::time::Duration;
use tracing::{debug, info};

use super::ReleaseClient;
use crate::engine::RollbackOptions;
use crate::error::Result;

/// Roll a release back to an earlier revision
#[derive(Debug)]
#[must_use = "requests do nothing until `run` is called"]
pub struct RollbackRequest {
    client: ReleaseClient,
    name: String,
    options: RollbackOptions,
}

impl RollbackRequest {
    pub(super) fn new(client: ReleaseClient, name: String) -> Self {
        let options = RollbackOptions {
            namespace: client.namespace().to_string(),
            ..Default::default()
        };
        Self {
            client,
            name,
            options,
        }
    }

    /// Revision to roll back to, the previous one by default
    pub fn revision(mut self, revision: u32) -> Self {
        self.options.revision = Some(revision);
        self
    }

    pub fn wait(mut self) -> Self {
        self.options.wait = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub async fn run(self) -> Result<()> {
        debug!(release = %self.name, revision = ?self.options.revision, "rolling back release");
        self.client
            .engine()
            .rollback(&self.name, &self.options)
            .await?;
        info!(release = %self.name, "release rolled back");
        Ok(())
    }
}
