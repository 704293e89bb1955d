//! Helm `repositories.yaml`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::error::{RepoError, Result};

/// Repositories file, as read and written by Helm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoFile {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub generated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub repositories: Vec<RepoEntry>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for RepoFile {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            generated: Some(Utc::now()),
            repositories: Vec::new(),
        }
    }
}

/// One configured repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    pub name: String,

    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(rename = "certFile", default)]
    pub cert_file: String,

    #[serde(rename = "keyFile", default)]
    pub key_file: String,

    #[serde(rename = "caFile", default)]
    pub ca_file: String,

    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    #[serde(default)]
    pub pass_credentials_all: bool,
}

impl RepoFile {
    /// Load the file; a missing file is an error
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RepoError::RepositoryFileMissing {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load the file, starting empty when it does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(RepoError::RepositoryFileMissing { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&RepoEntry> {
        self.repositories.iter().find(|r| r.name == name)
    }

    /// Replace the entry with the same name, or append it
    pub fn update(&mut self, entry: RepoEntry) {
        match self.repositories.iter_mut().find(|r| r.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.repositories.push(entry),
        }
    }

    /// Remove an entry, returning whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.repositories.len();
        self.repositories.retain(|r| r.name != name);
        self.repositories.len() != before
    }

    /// Write the file with mode 0644
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;

        let mut file = std::fs::File::create(path)?;
        file.write_all(content.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))?;
        }
        Ok(())
    }
}
