//! Repository add/remove/list

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::download::{charts_cache_file, download_index, index_cache_file};
use crate::error::{RepoError, Result};
use crate::file::{RepoEntry, RepoFile};
use crate::lock::FileLock;

/// Manages the repositories file and its index cache
#[derive(Debug, Clone)]
pub struct RepoClient {
    repository_config: PathBuf,
    repository_cache: PathBuf,
}

/// A repository that was added
#[derive(Debug, Clone)]
pub struct Repository {
    pub name: String,
    pub url: String,
    /// Cached `index.yaml`
    pub index_file: PathBuf,
    /// Charts published by the repository
    pub charts: Vec<String>,
}

impl RepoClient {
    /// Client over a repositories file and a cache directory
    pub fn new(repository_config: impl Into<PathBuf>, repository_cache: impl Into<PathBuf>) -> Self {
        Self {
            repository_config: repository_config.into(),
            repository_cache: repository_cache.into(),
        }
    }

    pub fn repository_config(&self) -> &Path {
        &self.repository_config
    }

    pub fn repository_cache(&self) -> &Path {
        &self.repository_cache
    }

    pub fn add(&self, name: impl Into<String>) -> AddRequest<'_> {
        AddRequest {
            client: self,
            entry: RepoEntry {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn remove(&self, name: impl Into<String>) -> RemoveRequest<'_> {
        RemoveRequest {
            client: self,
            name: name.into(),
        }
    }

    /// Configured repositories; none when the file does not exist
    pub fn list(&self) -> Result<Vec<RepoEntry>> {
        Ok(RepoFile::load_or_default(&self.repository_config)?.repositories)
    }
}

/// Builder for adding a repository
#[derive(Debug)]
pub struct AddRequest<'a> {
    client: &'a RepoClient,
    entry: RepoEntry,
}

impl AddRequest<'_> {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.entry.url = url.into();
        self
    }

    pub fn ca_file(mut self, path: impl Into<String>) -> Self {
        self.entry.ca_file = path.into();
        self
    }

    pub fn key_file(mut self, path: impl Into<String>) -> Self {
        self.entry.key_file = path.into();
        self
    }

    pub fn cert_file(mut self, path: impl Into<String>) -> Self {
        self.entry.cert_file = path.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.entry.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.entry.password = password.into();
        self
    }

    pub fn insecure_skip_tls_verify(mut self, skip: bool) -> Self {
        self.entry.insecure_skip_tls_verify = skip;
        self
    }

    /// Add the repository
    ///
    /// The repositories file is locked for the whole operation and left
    /// untouched when the name is taken or the index cannot be fetched.
    pub async fn run(self) -> Result<Repository> {
        let config = &self.client.repository_config;
        if self.entry.url.is_empty() {
            return Err(RepoError::InvalidRepositoryUrl {
                url: String::new(),
                reason: "a repository URL is required".to_string(),
            });
        }

        if let Some(parent) = config.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let _lock = FileLock::acquire(&FileLock::path_for(config)).await?;

        let mut file = RepoFile::load_or_default(config)?;
        if file.has(&self.entry.name) {
            return Err(RepoError::RepositoryAlreadyExists {
                name: self.entry.name,
            });
        }

        let cache = &self.client.repository_cache;
        let index = download_index(&self.entry, cache).await?;
        let charts = index.chart_names().into_iter().map(str::to_string).collect();

        let repository = Repository {
            name: self.entry.name.clone(),
            url: self.entry.url.clone(),
            index_file: index_cache_file(cache, &self.entry.name),
            charts,
        };

        file.update(self.entry);
        file.write(config)?;
        info!(repo = %repository.name, url = %repository.url, "repository added");

        Ok(repository)
    }
}

/// Builder for removing a repository
#[derive(Debug)]
pub struct RemoveRequest<'a> {
    client: &'a RepoClient,
    name: String,
}

impl RemoveRequest<'_> {
    /// Remove the repository and its cached index
    pub async fn run(self) -> Result<()> {
        let config = &self.client.repository_config;

        let mut file = RepoFile::load(config)?;
        if !file.remove(&self.name) {
            return Err(RepoError::RepositoryNotFound { name: self.name });
        }
        file.write(config)?;

        let cache = &self.client.repository_cache;
        for path in [
            charts_cache_file(cache, &self.name),
            index_cache_file(cache, &self.name),
        ] {
            remove_if_exists(&path)?;
        }

        info!(repo = %self.name, "repository removed");
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed cache file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
