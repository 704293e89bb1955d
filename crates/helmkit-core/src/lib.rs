//! helmkit core - shared types for the helmkit Helm and Kubernetes client
//!
//! This crate provides:
//! - `Values` / `ImmutableValues`: chart values with dotted paths and override merging
//! - `ReleaseStatus` / `StatusReport` / `HelmRelease`: Helm release records
//! - `HelmContext`: per-release values supplied by the caller
//! - `LoadedChart`: chart loading from directories and `.tgz` archives

pub mod archive;
pub mod chart;
pub mod context;
pub mod error;
pub mod normalize;
pub mod release;
pub mod values;

pub use chart::{ChartDependency, ChartMetadata, LoadedChart};
pub use context::HelmContext;
pub use error::{CoreError, Result};
pub use normalize::normalize;
pub use release::{HelmRelease, ReleaseChart, ReleaseInfo, ReleaseStatus, StatusReport};
pub use values::{ImmutableValues, ValueMap, Values, parse_set_value, split_path};
