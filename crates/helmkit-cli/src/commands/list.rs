//! List command

use console::style;
use helmkit::HelmSettings;

use super::{connect, release_json};
use crate::error::Result;

pub async fn run(settings: HelmSettings, json: bool) -> Result<()> {
    let helm = connect(settings).await?;
    let releases = helm.releases().list().await?;

    if json {
        let view: Vec<_> = releases.iter().map(release_json).collect();
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if releases.is_empty() {
        println!("No releases found in namespace {}", style(helm.namespace()).yellow());
        return Ok(());
    }

    println!(
        "{:<24} {:<16} {:<9} {:<16} {:<28} {}",
        style("NAME").bold(),
        style("NAMESPACE").bold(),
        style("REVISION").bold(),
        style("STATUS").bold(),
        style("CHART").bold(),
        style("APP VERSION").bold()
    );
    for release in &releases {
        let (chart, app_version) = match release.chart() {
            Some(c) => (
                format!("{}-{}", c.name, c.version),
                c.app_version.clone().unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        println!(
            "{:<24} {:<16} {:<9} {:<16} {:<28} {}",
            release.name(),
            release.namespace(),
            release.revision(),
            release.status().to_string(),
            chart,
            app_version
        );
    }
    Ok(())
}
