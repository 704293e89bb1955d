//! Repository `index.yaml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{RepoError, Result};

/// Repository index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub generated: Option<String>,

    /// Chart name -> published versions
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartVersion>>,
}

/// One published chart version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartVersion {
    pub name: String,

    pub version: String,

    #[serde(default)]
    pub app_version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub urls: Vec<String>,

    #[serde(default)]
    pub digest: Option<String>,

    #[serde(default)]
    pub deprecated: bool,
}

impl IndexFile {
    /// Parse an index; an index without `apiVersion` is rejected
    pub fn parse(data: &[u8]) -> Result<Self> {
        let index: Self = serde_yaml::from_slice(data).map_err(|e| RepoError::InvalidIndex {
            message: e.to_string(),
        })?;

        if index.api_version.is_empty() {
            return Err(RepoError::InvalidIndex {
                message: "no API version specified".to_string(),
            });
        }
        Ok(index)
    }

    /// Chart names, sorted
    pub fn chart_names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"apiVersion: v1
entries:
  redis:
    - name: redis
      version: 17.0.0
      appVersion: "7.0"
      urls: [https://charts.example.com/redis-17.0.0.tgz]
  nginx:
    - name: nginx
      version: 1.2.3
      urls: [https://charts.example.com/nginx-1.2.3.tgz]
    - name: nginx
      version: 1.2.2
generated: "2024-01-01T00:00:00Z"
"#;

    #[test]
    fn test_parse_index() {
        let index = IndexFile::parse(INDEX.as_bytes()).unwrap();
        assert_eq!(index.chart_names(), vec!["nginx", "redis"]);
        assert_eq!(index.entries["nginx"].len(), 2);
        assert_eq!(
            index.entries["redis"][0].app_version.as_deref(),
            Some("7.0")
        );
    }

    #[test]
    fn test_missing_api_version() {
        let err = IndexFile::parse(b"entries: {}\n").unwrap_err();
        assert!(matches!(err, RepoError::InvalidIndex { .. }));
    }

    #[test]
    fn test_not_yaml() {
        assert!(IndexFile::parse(b"<html>oops</html>").is_err());
    }
}
