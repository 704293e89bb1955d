use helmkit_core::Values;
use helmkit_kube::KubeError;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    InstallRequest, Release, ReleaseClient, chart_source_methods, load_chart, locate_chart,
};
use crate::engine::{ChartSource, UpgradeOptions};
use crate::error::{HelmError, Result};

/// Upgrade a release to a new chart or new values
#[derive(Debug)]
#[must_use = "requests do nothing until `run` is called"]
pub struct UpgradeRequest {
    client: ReleaseClient,
    name: String,
    chart: String,
    source: ChartSource,
    values: Values,
    invalid: Option<HelmError>,
    options: UpgradeOptions,
    install: bool,
}

impl UpgradeRequest {
    pub(super) fn new(client: ReleaseClient, name: String, chart: String) -> Self {
        let options = UpgradeOptions {
            namespace: client.namespace().to_string(),
            ..Default::default()
        };
        Self {
            client,
            name,
            chart,
            source: ChartSource::default(),
            values: Values::new(),
            invalid: None,
            options,
            install: false,
        }
    }

    chart_source_methods!();

    pub fn disable_hooks(mut self) -> Self {
        self.options.disable_hooks = true;
        self
    }

    /// Render without upgrading anything
    pub fn dry_run(mut self) -> Self {
        self.options.dry_run = true;
        self
    }

    /// Roll back to the previous revision if the upgrade fails
    pub fn atomic(mut self) -> Self {
        self.options.atomic = true;
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

    /// Install the release if it does not exist yet
    pub fn install(mut self) -> Self {
        self.install = true;
        self
    }

    /// Execute the upgrade
    pub async fn run(mut self) -> Result<Release> {
        if let Some(err) = self.invalid.take() {
            return Err(err);
        }

        if self.install {
            let history = self
                .client
                .config
                .storage
                .history(self.client.namespace(), &self.name)
                .await;
            match history {
                Ok(_) => {}
                Err(KubeError::ReleaseNotFound { .. }) => {
                    debug!(release = %self.name, "release not found, installing");
                    return self.into_install().run().await;
                }
                Err(e) => {
                    warn!(
                        release = %self.name,
                        error = %e,
                        "failed to read release history, upgrading anyway"
                    );
                }
            }
        }

        let engine = self.client.engine();
        let located = locate_chart(engine, &self.chart, &self.source).await?;
        let path = located.path();
        let chart = load_chart(engine, path, false).await?;

        let pinned = self.client.context.release(&self.name).to_values();
        let values = self.values.override_with(&pinned);

        debug!(
            release = %self.name,
            chart = %chart.name(),
            version = %chart.version(),
            namespace = %self.options.namespace,
            "upgrading release"
        );
        let record = engine
            .upgrade(&self.name, path, values.as_map(), &self.options)
            .await?;
        info!(release = %record.name, revision = record.version, "release upgraded");

        Release::from_record(&self.client.config, record)
    }

    /// The install carried out when the release is absent
    fn into_install(self) -> InstallRequest {
        let mut request = InstallRequest::new(self.client, self.name, self.chart);
        request.source = self.source;
        request.values = self.values;
        request.options.dry_run = self.options.dry_run;
        request.options.disable_hooks = self.options.disable_hooks;
        request.options.atomic = self.options.atomic;
        request.options.wait = self.options.wait;
        request.options.timeout = self.options.timeout;
        request
    }
}
