//! Install command

use helmkit::{HelmSettings, InstallRequest};
use std::time::Duration;

use super::{connect, load_values, print_release};
use crate::error::Result;
use crate::{ChartArgs, ValuesArgs};

/// Install switches
#[derive(Debug, Default)]
pub struct InstallFlags {
    pub skip_crds: bool,
    pub include_crds: bool,
    pub no_hooks: bool,
    pub disable_openapi_validation: bool,
    pub dry_run: bool,
    pub replace: bool,
    pub atomic: bool,
    pub wait: bool,
    pub timeout: Option<u64>,
    pub dependency_update: bool,
}

pub async fn run(
    settings: HelmSettings,
    name: &str,
    chart: &str,
    chart_args: &ChartArgs,
    values: &ValuesArgs,
    flags: &InstallFlags,
    json: bool,
) -> Result<()> {
    let values = load_values(values)?;
    let helm = connect(settings).await?;

    let request = with_chart_args(helm.install(name, chart), chart_args).values(&values);
    let release = with_flags(request, flags).run().await?;

    print_release(&release, json)
}

fn with_chart_args(mut request: InstallRequest, args: &ChartArgs) -> InstallRequest {
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

fn with_flags(mut request: InstallRequest, flags: &InstallFlags) -> InstallRequest {
    if flags.skip_crds {
        request = request.skip_crds();
    }
    if flags.include_crds {
        request = request.include_crds();
    }
    if flags.no_hooks {
        request = request.disable_hooks();
    }
    if flags.disable_openapi_validation {
        request = request.disable_openapi_validation();
    }
    if flags.dry_run {
        request = request.dry_run();
    }
    if flags.replace {
        request = request.replace();
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
    if flags.dependency_update {
        request = request.dependency_update();
    }
    request
}
