//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    #[error("chart not found: {path}")]
    ChartNotFound { path: String },

    #[error("invalid chart: {message}")]
    InvalidChart { message: String },

    #[error(
        "chart '{chart}' has dependencies found in Chart.yaml, but missing in charts/ directory: {}",
        .missing.join(", ")
    )]
    MissingDependencies { chart: String, missing: Vec<String> },

    #[error("invalid values path {path:?}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("values error: {message}")]
    Values { message: String },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
