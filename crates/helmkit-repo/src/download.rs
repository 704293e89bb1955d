//! Index download
//!
//! Fetches `<url>/index.yaml` with the entry's TLS material and credentials,
//! then stores the raw index and the chart name list in the cache directory.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::AUTHORIZATION;
use reqwest::{Certificate, Client, Identity};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{RepoError, Result};
use crate::file::RepoEntry;
use crate::index::IndexFile;

/// Timeout for a whole index request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cache file holding a repository's raw index
pub fn index_cache_file(cache: &Path, name: &str) -> PathBuf {
    cache.join(format!("{}-index.yaml", name))
}

/// Cache file holding a repository's chart names, one per line
pub fn charts_cache_file(cache: &Path, name: &str) -> PathBuf {
    cache.join(format!("{}-charts.txt", name))
}

/// `index.yaml` location for a repository URL, keeping any query string
pub fn index_url(repo_url: &str) -> Result<Url> {
    let mut url = Url::parse(repo_url).map_err(|e| RepoError::InvalidRepositoryUrl {
        url: repo_url.to_string(),
        reason: e.to_string(),
    })?;
    let path = format!("{}/index.yaml", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

/// Authorization header value for an entry's credentials
pub fn basic_auth_header(username: &str, password: &str) -> Option<String> {
    if username.is_empty() && password.is_empty() {
        return None;
    }
    let encoded = STANDARD.encode(format!("{}:{}", username, password));
    Some(format!("Basic {}", encoded))
}

fn http_client(entry: &RepoEntry) -> Result<Client> {
    let mut builder = Client::builder().timeout(REQUEST_TIMEOUT);

    if !entry.ca_file.is_empty() {
        let pem = std::fs::read(&entry.ca_file)?;
        let ca = Certificate::from_pem(&pem).map_err(|e| RepoError::Tls {
            message: format!("invalid CA file {}: {}", entry.ca_file, e),
        })?;
        builder = builder.add_root_certificate(ca);
    }

    match (entry.cert_file.is_empty(), entry.key_file.is_empty()) {
        (true, true) => {}
        (false, false) => {
            let mut pem = std::fs::read(&entry.cert_file)?;
            pem.push(b'\n');
            pem.extend(std::fs::read(&entry.key_file)?);
            let identity = Identity::from_pem(&pem).map_err(|e| RepoError::Tls {
                message: format!("invalid client certificate: {}", e),
            })?;
            builder = builder.identity(identity);
        }
        _ => {
            return Err(RepoError::InvalidConfig {
                message: "a client certificate needs both a cert file and a key file".to_string(),
            });
        }
    }

    if entry.insecure_skip_tls_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().map_err(|e| RepoError::Tls {
        message: e.to_string(),
    })
}

/// Download and validate the index of `entry`, writing both cache files
pub async fn download_index(entry: &RepoEntry, cache: &Path) -> Result<IndexFile> {
    let url = index_url(&entry.url)?;
    let client = http_client(entry)?;

    debug!(repo = %entry.name, url = %url, "downloading index");
    let mut request = client.get(url.clone());
    if let Some(auth) = basic_auth_header(&entry.username, &entry.password) {
        request = request.header(AUTHORIZATION, auth);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(RepoError::IndexDownload {
            status: status.as_u16(),
            message: format!(
                "looks like {} is not a valid chart repository or cannot be reached",
                entry.url
            ),
        });
    }

    let body = response.bytes().await?;
    let index = IndexFile::parse(&body)?;

    std::fs::create_dir_all(cache)?;
    let mut names = String::new();
    for name in index.chart_names() {
        names.push_str(name);
        names.push('\n');
    }
    std::fs::write(charts_cache_file(cache, &entry.name), names)?;
    std::fs::write(index_cache_file(cache, &entry.name), &body)?;

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_url() {
        assert_eq!(
            index_url("https://charts.example.com").unwrap().as_str(),
            "https://charts.example.com/index.yaml"
        );
        assert_eq!(
            index_url("https://charts.example.com/stable/").unwrap().as_str(),
            "https://charts.example.com/stable/index.yaml"
        );
        assert_eq!(
            index_url("https://charts.example.com/repo?token=abc").unwrap().as_str(),
            "https://charts.example.com/repo/index.yaml?token=abc"
        );
        assert!(index_url("not a url").is_err());
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(
            basic_auth_header("user", "pass").as_deref(),
            Some("Basic dXNlcjpwYXNz")
        );
        assert!(basic_auth_header("", "").is_none());
    }

    #[test]
    fn test_half_client_certificate() {
        let entry = RepoEntry {
            name: "private".to_string(),
            url: "https://charts.example.com".to_string(),
            cert_file: "/tmp/cert.pem".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            http_client(&entry),
            Err(RepoError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_cache_files() {
        let cache = Path::new("/cache");
        assert_eq!(
            index_cache_file(cache, "stable"),
            PathBuf::from("/cache/stable-index.yaml")
        );
        assert_eq!(
            charts_cache_file(cache, "stable"),
            PathBuf::from("/cache/stable-charts.txt")
        );
    }
}
