//! CLI commands

pub mod install;
pub mod list;
pub mod repo;
pub mod resources;
pub mod rollback;
pub mod status;
pub mod uninstall;
pub mod upgrade;

use console::style;
use helmkit::{ConfigCache, Helm, HelmSettings, Release};
use helmkit_core::{Values, parse_set_value};
use serde_json::json;

use crate::ValuesArgs;
use crate::error::Result;

/// Connect to the namespace selected by the settings
pub async fn connect(settings: HelmSettings) -> Result<Helm> {
    let namespace = settings.namespace.clone();
    let cache = ConfigCache::new(settings);
    Ok(Helm::for_namespace(&cache, &namespace).await?)
}

/// Merge `-f` files in order, then every `--set`
pub fn load_values(args: &ValuesArgs) -> Result<Values> {
    let mut values = Values::new();
    for file in &args.values {
        values.merge(&Values::from_file(file)?);
    }
    for assignment in &args.set {
        let (path, value) = parse_set_value(assignment)?;
        values.set(&path, &value)?;
    }
    Ok(values)
}

/// Machine readable view of a release
pub fn release_json(release: &Release) -> serde_json::Value {
    let report = release.status_report();
    json!({
        "name": release.name(),
        "namespace": release.namespace(),
        "revision": release.revision(),
        "status": report.status.as_str(),
        "firstDeployed": report.first_deployed,
        "lastDeployed": report.last_deployed,
        "description": release.description(),
        "chart": release.chart().map(|c| format!("{}-{}", c.name, c.version)),
        "appVersion": release.chart().and_then(|c| c.app_version.clone()),
    })
}

pub fn print_release(release: &Release, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&release_json(release))?);
        return Ok(());
    }

    let status = release.status();
    let status_style = match status.as_str() {
        "deployed" => style(status.to_string()).green(),
        "failed" => style(status.to_string()).red(),
        _ if status.is_pending() => style(status.to_string()).yellow(),
        _ => style(status.to_string()).dim(),
    };

    println!("NAME: {}", style(release.name()).cyan());
    println!("NAMESPACE: {}", style(release.namespace()).yellow());
    println!("REVISION: {}", release.revision());
    println!("STATUS: {}", status_style);
    if let Some(deployed) = release.status_report().last_deployed {
        println!("LAST DEPLOYED: {}", deployed.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(chart) = release.chart() {
        println!("CHART: {}-{}", chart.name, chart.version);
    }
    if !release.description().is_empty() {
        println!("DESCRIPTION: {}", release.description());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_values_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let base = tmp.path().join("base.yaml");
        let prod = tmp.path().join("prod.yaml");
        std::fs::write(&base, "replicas: 1\nimage:\n  tag: stable\n").unwrap();
        std::fs::write(&prod, "replicas: 3\n").unwrap();

        let args = ValuesArgs {
            values: vec![base, prod],
            set: vec!["image.tag=latest".to_string()],
        };
        let values = load_values(&args).unwrap();
        assert_eq!(values.get("replicas"), Some(&json!(3)));
        assert_eq!(values.get("image.tag"), Some(&json!("latest")));
    }

    #[test]
    fn test_load_values_rejects_bad_path() {
        let args = ValuesArgs {
            values: vec![],
            set: vec!["image.t\"ag=1".to_string()],
        };
        assert!(load_values(&args).is_err());
    }
}
