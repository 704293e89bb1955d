//! Release records and status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chart::ChartMetadata;
use crate::values::{ImmutableValues, ValueMap, Values};

/// Release status
///
/// Note: This enum is non-exhaustive - new variants may be added in future versions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ReleaseStatus {
    Deployed,
    Uninstalled,
    Superseded,
    Failed,
    Uninstalling,
    PendingInstall,
    PendingUpgrade,
    PendingRollback,
    /// Anything Helm reports that is not listed above
    #[default]
    #[serde(other)]
    Unknown,
}

impl ReleaseStatus {
    /// Status name as stored by Helm
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Deployed => "deployed",
            Self::Uninstalled => "uninstalled",
            Self::Superseded => "superseded",
            Self::Failed => "failed",
            Self::Uninstalling => "uninstalling",
            Self::PendingInstall => "pending-install",
            Self::PendingUpgrade => "pending-upgrade",
            Self::PendingRollback => "pending-rollback",
        }
    }

    /// Whether an operation is still running against the release
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::PendingInstall | Self::PendingUpgrade | Self::PendingRollback | Self::Uninstalling
        )
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release status report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: ReleaseStatus,
    pub first_deployed: Option<DateTime<Utc>>,
    pub last_deployed: Option<DateTime<Utc>>,
}

/// A release record in Helm's storage format
///
/// This is what Helm serializes (as gzipped, base64 encoded JSON) into its
/// release Secrets and ConfigMaps, and what `helm install -o json` prints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelmRelease {
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    /// Revision number
    #[serde(default)]
    pub version: u32,

    #[serde(default)]
    pub info: ReleaseInfo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ReleaseChart>,

    /// User supplied values for this revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ValueMap>,

    #[serde(default)]
    pub manifest: String,
}

/// Release lifecycle information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseInfo {
    #[serde(
        default,
        deserialize_with = "helm_time::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_deployed: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "helm_time::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_deployed: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "helm_time::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted: Option<DateTime<Utc>>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: ReleaseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The chart a release was installed from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseChart {
    #[serde(default)]
    pub metadata: ChartMetadata,

    /// Chart default values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ValueMap>,
}

impl HelmRelease {
    /// Status report for this revision
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            status: self.info.status,
            first_deployed: self.info.first_deployed,
            last_deployed: self.info.last_deployed,
        }
    }

    /// Effective values: chart defaults overridden by the supplied config
    pub fn values(&self) -> ImmutableValues {
        let defaults = self
            .chart
            .as_ref()
            .and_then(|c| c.values.clone())
            .map(Values::from_map)
            .unwrap_or_default();
        let config = self.config.clone().map(Values::from_map).unwrap_or_default();
        defaults.override_with(&config).into_immutable()
    }

    /// Name of the storage object holding this revision
    pub fn storage_key(&self) -> String {
        format!("sh.helm.release.v1.{}.v{}", self.name, self.version)
    }
}

/// Helm writes unset timestamps as empty strings
mod helm_time {
    use chrono::{DateTime, Datelike, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => {
                let parsed = DateTime::parse_from_rfc3339(s)
                    .map_err(D::Error::custom)?
                    .with_timezone(&Utc);
                Ok((parsed.year() > 1).then_some(parsed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RELEASE_JSON: &str = r#"{
        "name": "web",
        "namespace": "apps",
        "version": 2,
        "info": {
            "first_deployed": "2024-03-01T10:00:00Z",
            "last_deployed": "2024-03-02T11:30:00Z",
            "deleted": "",
            "description": "Upgrade complete",
            "status": "deployed"
        },
        "chart": {
            "metadata": {"name": "nginx", "version": "1.2.3", "appVersion": "1.25", "apiVersion": "v2"},
            "values": {"replicas": 1, "image": {"tag": "1.24", "pullPolicy": "IfNotPresent"}}
        },
        "config": {"image": {"tag": "1.25"}},
        "manifest": "---\napiVersion: v1\nkind: Service\nmetadata:\n  name: web\n"
    }"#;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(ReleaseStatus::PendingUpgrade).unwrap(),
            json!("pending-upgrade")
        );
        let status: ReleaseStatus = serde_json::from_value(json!("superseded")).unwrap();
        assert_eq!(status, ReleaseStatus::Superseded);

        let status: ReleaseStatus = serde_json::from_value(json!("mystery")).unwrap();
        assert_eq!(status, ReleaseStatus::Unknown);
        assert_eq!(ReleaseStatus::default(), ReleaseStatus::Unknown);
        let status: ReleaseStatus = serde_json::from_value(json!("something-new")).unwrap();
        assert_eq!(status, ReleaseStatus::Unknown);
        assert_eq!(ReleaseStatus::PendingRollback.to_string(), "pending-rollback");
    }

    #[test]
    fn test_is_pending() {
        assert!(ReleaseStatus::PendingInstall.is_pending());
        assert!(!ReleaseStatus::Deployed.is_pending());
    }

    #[test]
    fn test_parse_helm_release() {
        let release: HelmRelease = serde_json::from_str(RELEASE_JSON).unwrap();
        assert_eq!(release.name, "web");
        assert_eq!(release.version, 2);
        assert_eq!(release.storage_key(), "sh.helm.release.v1.web.v2");

        let report = release.status_report();
        assert_eq!(report.status, ReleaseStatus::Deployed);
        assert_eq!(
            report.first_deployed.map(|t| t.to_rfc3339()),
            Some("2024-03-01T10:00:00+00:00".to_string())
        );
        assert_eq!(release.chart.unwrap().metadata.app_version.as_deref(), Some("1.25"));
    }

    #[test]
    fn test_release_values_prefer_config() {
        let release: HelmRelease = serde_json::from_str(RELEASE_JSON).unwrap();
        let values = release.values();
        assert_eq!(values.get("image.tag"), Some(json!("1.25")));
        assert_eq!(values.get("image.pullPolicy"), Some(json!("IfNotPresent")));
        assert_eq!(values.get("replicas"), Some(json!(1)));
    }
}
