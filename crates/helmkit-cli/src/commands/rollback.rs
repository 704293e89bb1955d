//! Rollback command

use console::style;
use helmkit::HelmSettings;
use std::time::Duration;

use super::connect;
use crate::error::Result;

pub async fn run(
    settings: HelmSettings,
    name: &str,
    revision: Option<u32>,
    wait: bool,
    timeout: Option<u64>,
) -> Result<()> {
    let helm = connect(settings).await?;

    let mut request = helm.rollback(name);
    if let Some(revision) = revision {
        request = request.revision(revision);
    }
    if wait {
        request = request.wait();
    }
    if let Some(seconds) = timeout {
        request = request.timeout(Duration::from_secs(seconds));
    }
    request.run().await?;

    println!("{} Rollback was a success! Happy Helming!", style("✓").green());
    Ok(())
}
