//! Repository commands

use console::style;
use helmkit::HelmSettings;
use helmkit_repo::RepoClient;
use serde_json::json;

use crate::error::Result;

/// Connection options for `repo add`
#[derive(Debug, Default)]
pub struct AddOptions {
    pub username: Option<String>,
    pub password: Option<String>,
    pub ca_file: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub insecure_skip_tls_verify: bool,
}

fn client(settings: &HelmSettings) -> RepoClient {
    RepoClient::new(
        settings.repository_config.clone(),
        settings.repository_cache.clone(),
    )
}

pub async fn add(settings: &HelmSettings, name: &str, url: &str, options: AddOptions) -> Result<()> {
    let client = client(settings);

    let mut request = client
        .add(name)
        .url(url)
        .insecure_skip_tls_verify(options.insecure_skip_tls_verify);
    if let Some(username) = options.username {
        request = request.username(username);
    }
    if let Some(password) = options.password {
        request = request.password(password);
    }
    if let Some(path) = options.ca_file {
        request = request.ca_file(path);
    }
    if let Some(path) = options.cert_file {
        request = request.cert_file(path);
    }
    if let Some(path) = options.key_file {
        request = request.key_file(path);
    }

    let repository = request.run().await?;
    println!(
        "{} \"{}\" has been added to your repositories",
        style("✓").green(),
        repository.name
    );
    tracing::debug!(charts = repository.charts.len(), index = %repository.index_file.display(), "cached index");
    Ok(())
}

pub async fn remove(settings: &HelmSettings, name: &str) -> Result<()> {
    client(settings).remove(name).run().await?;
    println!(
        "{} \"{}\" has been removed from your repositories",
        style("✓").green(),
        name
    );
    Ok(())
}

pub fn list(settings: &HelmSettings, json: bool) -> Result<()> {
    let repos = client(settings).list()?;

    if json {
        let view: Vec<_> = repos
            .iter()
            .map(|r| json!({ "name": r.name, "url": r.url }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if repos.is_empty() {
        println!("no repositories to show");
        return Ok(());
    }

    println!("{:<20} {}", style("NAME").bold(), style("URL").bold());
    for repo in &repos {
        println!("{:<20} {}", repo.name, repo.url);
    }
    Ok(())
}
