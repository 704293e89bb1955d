//! Repository errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepoError {
    #[error("repository \"{name}\" already exists")]
    RepositoryAlreadyExists { name: String },

    #[error("no repo named \"{name}\" found")]
    RepositoryNotFound { name: String },

    #[error("repositories file {} does not exist", .path.display())]
    RepositoryFileMissing { path: PathBuf },

    #[error("invalid repository URL {url:?}: {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    #[error("malformed repositories file: {message}")]
    InvalidConfig { message: String },

    /// Another process holds the repositories file
    #[error("could not lock {} within {seconds}s", .path.display())]
    LockTimeout { path: PathBuf, seconds: u64 },

    #[error("index download failed with status {status}: {message}")]
    IndexDownload { status: u16, message: String },

    #[error("cannot reach repository: {message}")]
    Unreachable { message: String },

    #[error("index download timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Unreadable CA bundle or client certificate
    #[error("TLS setup failed: {message}")]
    Tls { message: String },

    #[error("invalid index: {message}")]
    InvalidIndex { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, RepoError>;

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return RepoError::Timeout {
                seconds: crate::download::REQUEST_TIMEOUT.as_secs(),
            };
        }
        match e.status() {
            Some(status) => RepoError::IndexDownload {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => RepoError::Unreachable {
                message: e.to_string(),
            },
        }
    }
}
