//! helmkit-repo - Helm chart repository management
//!
//! Reads and writes Helm's `repositories.yaml` and keeps the repository
//! index cache up to date:
//!
//! ```ignore
//! use helmkit_repo::RepoClient;
//!
//! let repos = RepoClient::new("repositories.yaml", "cache");
//! repos.add("bitnami").url("https://charts.bitnami.com/bitnami").run().await?;
//! repos.remove("bitnami").run().await?;
//! ```

pub mod client;
pub mod download;
pub mod error;
pub mod file;
pub mod index;
pub mod lock;

pub use client::{AddRequest, RemoveRequest, RepoClient, Repository};
pub use error::{RepoError, Result};
pub use file::{RepoEntry, RepoFile};
pub use index::{ChartVersion, IndexFile};
pub use lock::FileLock;
