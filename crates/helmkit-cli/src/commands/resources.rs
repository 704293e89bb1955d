//! Resources command: objects owned by a release

use console::style;
use helmkit::HelmSettings;
use helmkit_kube::ResourceKind;
use helmkit_kube::kinds::ALL;
use kube::api::DynamicObject;

use super::connect;
use crate::error::{CliError, Result};

pub async fn run(settings: HelmSettings, name: &str, resource: &str) -> Result<()> {
    let kind = find_kind(resource)?;
    let helm = connect(settings).await?;
    let release = helm.releases().get(name).await?;

    let objects = release
        .client()
        .reader::<DynamicObject>(kind)
        .list()
        .await?;

    if objects.is_empty() {
        println!(
            "No {} found for release {}",
            kind.plural,
            style(release.name()).cyan()
        );
        return Ok(());
    }

    println!("{:<24} {}", style("NAMESPACE").bold(), style("NAME").bold());
    for object in &objects {
        println!("{:<24} {}", object.namespace(), object.name());
    }
    Ok(())
}

/// Resolve `plural` or `plural.group`
///
/// The first descriptor in table order wins when only the plural is given.
fn find_kind(resource: &str) -> Result<&'static ResourceKind> {
    let resource = resource.to_ascii_lowercase();
    ALL.iter()
        .find(|k| k.resource_name() == resource)
        .or_else(|| ALL.iter().find(|k| k.plural == resource))
        .ok_or_else(|| CliError::Input {
            message: format!("unknown resource type '{}'", resource),
            help: Some("use the plural form, for example 'pods' or 'deployments.apps'".into()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_kind_by_plural() {
        let kind = find_kind("pods").unwrap();
        assert_eq!(kind.kind, "Pod");
        assert_eq!(kind.group, "");
    }

    #[test]
    fn test_find_kind_with_group() {
        let kind = find_kind("deployments.apps").unwrap();
        assert_eq!(kind.kind, "Deployment");
        assert_eq!(kind.group, "apps");
    }

    #[test]
    fn test_find_kind_unknown() {
        let err = find_kind("widgets").unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::USAGE_ERROR);
    }
}
