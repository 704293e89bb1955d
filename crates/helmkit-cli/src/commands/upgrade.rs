//! Upgrade command

use helmkit::{HelmSettings, UpgradeRequest};
use std::time::Duration;

use super::{connect, load_values, print_release};
use crate::error::Result;
use crate::{ChartArgs, ValuesArgs};

/// Upgrade switches
#[derive(Debug, Default)]
pub struct UpgradeFlags {
    pub install: bool,
    pub no_hooks: bool,
    pub dry_run: bool,
    pub atomic: bool,
    pub wait: bool,
    pub timeout: Option<u64>,
}

pub async fn run(
    settings: HelmSettings,
    name: &str,
    chart: &str,
    chart_args: &ChartArgs,
    values: &ValuesArgs,
    flags: &UpgradeFlags,
    json: bool,
) -> Result<()> {
    let values = load_values(values)?;
    let helm = connect(settings).await?;

    let mut request = helm.upgrade(name, chart).values(&values);
    request = with_chart_args(request, chart_args);
    if flags.install {
        request = request.install();
    }
    if flags.no_hooks {
        request = request.disable_hooks();
    }
    if flags.dry_run {
        request = request.dry_run();
    }
    if flags.atomic {
        request = request.atomic();
    }
    if flags.wait {
        request = request.wait();
    }
    if let Some(seconds) = flags.timeout {
        request = request.timeout(Duration::from_secs(seconds));
    }

    let release = request.run().await?;
    print_release(&release, json)
}

fn with_chart_args(mut request: UpgradeRequest, args: &ChartArgs) -> UpgradeRequest {
    if let Some(repo) = &args.repo {
        request = request.repo(repo);
    }
    if let Some(version) = &args.version {
        request = request.version(version);
    }
    if let Some(username) = &args.username {
        request = request.username(username);
    }
    if let Some(password) = &args.password {
        request = request.password(password);
    }
    if let Some(path) = &args.ca_file {
        request = request.ca_file(path);
    }
    if let Some(path) = &args.cert_file {
        request = request.cert_file(path);
    }
    if let Some(path) = &args.key_file {
        request = request.key_file(path);
    }
    request
}
