//! Chart loading
//!
//! A chart is either a directory containing `Chart.yaml` or a `.tgz`
//! archive of such a directory. Sub-charts live under `charts/`, unpacked
//! or archived.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::archive::{ChartFiles, read_archive, read_archive_file};
use crate::error::{CoreError, Result};
use crate::values::Values;

pub const CHART_FILE: &str = "Chart.yaml";
pub const VALUES_FILE: &str = "values.yaml";
pub const REQUIREMENTS_FILE: &str = "requirements.yaml";
pub const CHARTS_DIR: &str = "charts";

/// Chart metadata (`Chart.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,

    /// `application` or `library`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ChartDependency>,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A sub-chart dependency declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartDependency {
    pub name: String,

    /// Version constraint
    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Requirements {
    #[serde(default)]
    dependencies: Vec<ChartDependency>,
}

/// A chart loaded into memory
#[derive(Debug, Clone)]
pub struct LoadedChart {
    /// Where the chart was loaded from, when it came from disk
    pub path: Option<PathBuf>,

    pub metadata: ChartMetadata,

    /// Default values (`values.yaml`)
    pub values: Values,

    /// Sub-charts found under `charts/`
    pub sub_charts: Vec<LoadedChart>,
}

impl LoadedChart {
    /// Load a chart from a directory or a `.tgz` archive
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::load_dir(path)
        } else if path.is_file() {
            let files = read_archive_file(path)?;
            Self::from_files(&files, Some(path.to_path_buf()))
        } else {
            Err(CoreError::ChartNotFound {
                path: path.display().to_string(),
            })
        }
    }

    /// Load an unpacked chart directory
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut files = ChartFiles::new();
        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = entry.map_err(|e| CoreError::InvalidChart {
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            files.insert(relative, std::fs::read(entry.path())?);
        }
        Self::from_files(&files, Some(dir.to_path_buf()))
    }

    /// Build a chart from its files
    pub fn from_files(files: &ChartFiles, path: Option<PathBuf>) -> Result<Self> {
        let chart_yaml = files.get(CHART_FILE).ok_or_else(|| CoreError::InvalidChart {
            message: "Chart.yaml file is missing".to_string(),
        })?;
        let mut metadata: ChartMetadata = serde_yaml::from_slice(chart_yaml)?;
        validate_metadata(&metadata)?;

        if metadata.api_version.is_empty() {
            metadata.api_version = "v1".to_string();
        }

        if metadata.api_version == "v1" && metadata.dependencies.is_empty() {
            if let Some(requirements) = files.get(REQUIREMENTS_FILE) {
                let requirements: Requirements = serde_yaml::from_slice(requirements)?;
                metadata.dependencies = requirements.dependencies;
            }
        }

        let values = match files.get(VALUES_FILE) {
            Some(content) => Values::from_yaml(&String::from_utf8_lossy(content))?,
            None => Values::new(),
        };

        let sub_charts = load_sub_charts(files, path.as_deref())?;

        Ok(Self {
            path,
            metadata,
            values,
            sub_charts,
        })
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// Declared dependencies without a loaded sub-chart of the same name
    pub fn missing_dependencies(&self) -> Vec<&ChartDependency> {
        self.metadata
            .dependencies
            .iter()
            .filter(|dep| !self.sub_charts.iter().any(|c| c.name() == dep.name))
            .collect()
    }

    /// Fail if any declared dependency is missing from `charts/`
    pub fn check_dependencies(&self) -> Result<()> {
        let missing = self.missing_dependencies();
        if missing.is_empty() {
            return Ok(());
        }
        Err(CoreError::MissingDependencies {
            chart: self.name().to_string(),
            missing: missing.iter().map(|d| d.name.clone()).collect(),
        })
    }

    /// Find a loaded sub-chart by name
    pub fn sub_chart(&self, name: &str) -> Option<&LoadedChart> {
        self.sub_charts.iter().find(|c| c.name() == name)
    }

    /// Path of the packaged archive for a dependency (`charts/<name>-<version>.tgz`)
    pub fn dependency_archive(&self, dependency: &ChartDependency) -> Option<PathBuf> {
        let root = self.path.as_ref().filter(|p| p.is_dir())?;
        Some(
            root.join(CHARTS_DIR)
                .join(format!("{}-{}.tgz", dependency.name, dependency.version)),
        )
    }
}

fn validate_metadata(metadata: &ChartMetadata) -> Result<()> {
    if metadata.name.is_empty() {
        return Err(CoreError::InvalidChart {
            message: "chart.metadata.name is required".to_string(),
        });
    }
    if metadata.version.is_empty() {
        return Err(CoreError::InvalidChart {
            message: "chart.metadata.version is required".to_string(),
        });
    }
    semver::Version::parse(&metadata.version).map_err(|e| CoreError::InvalidChart {
        message: format!(
            "chart.metadata.version {:?} is invalid: {}",
            metadata.version, e
        ),
    })?;
    Ok(())
}

fn load_sub_charts(files: &ChartFiles, parent: Option<&Path>) -> Result<Vec<LoadedChart>> {
    let mut unpacked: BTreeMap<&str, ChartFiles> = BTreeMap::new();
    let mut charts = Vec::new();

    let prefix = format!("{}/", CHARTS_DIR);
    for (path, content) in files {
        let Some(rest) = path.strip_prefix(&prefix) else {
            continue;
        };
        if rest.starts_with('.') || rest.starts_with('_') {
            continue;
        }

        match rest.split_once('/') {
            Some((dir, file)) => {
                unpacked
                    .entry(dir)
                    .or_default()
                    .insert(file.to_string(), content.clone());
            }
            None if rest.ends_with(".tgz") => {
                let sub_files = read_archive(content).map_err(|e| CoreError::InvalidChart {
                    message: format!("error unpacking {}: {}", rest, e),
                })?;
                charts.push(LoadedChart::from_files(&sub_files, None)?);
            }
            None => {}
        }
    }

    for (dir, sub_files) in unpacked {
        let sub_path = parent
            .filter(|p| p.is_dir())
            .map(|p| p.join(CHARTS_DIR).join(dir));
        charts.push(LoadedChart::from_files(&sub_files, sub_path)?);
    }

    Ok(charts)
}
