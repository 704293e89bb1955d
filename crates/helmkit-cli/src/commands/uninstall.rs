//! Uninstall command

use console::style;
use helmkit::HelmSettings;
use std::time::Duration;

use super::connect;
use crate::error::Result;

pub async fn run(
    settings: HelmSettings,
    name: &str,
    keep_history: bool,
    timeout: Option<u64>,
) -> Result<()> {
    let helm = connect(settings).await?;

    let mut request = helm.uninstall(name);
    if keep_history {
        request = request.keep_history();
    }
    if let Some(seconds) = timeout {
        request = request.timeout(Duration::from_secs(seconds));
    }
    request.run().await?;

    println!("release \"{}\" uninstalled", style(name).cyan());
    Ok(())
}
