//! Status command

use console::style;
use helmkit::HelmSettings;
use serde_json::json;

use super::{connect, print_release, release_json};
use crate::error::Result;

pub async fn run(settings: HelmSettings, name: &str, show_values: bool, json: bool) -> Result<()> {
    let helm = connect(settings).await?;
    let release = helm.releases().get(name).await?;

    if json {
        let mut view = release_json(&release);
        if show_values {
            view["values"] = json!(release.values().values());
        }
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_release(&release, false)?;

    if show_values {
        println!();
        println!("{}", style("USER-SUPPLIED VALUES:").bold());
        let values = release.values();
        if values.is_empty() {
            println!("null");
        } else {
            print!("{}", serde_yaml::to_string(&values.values())?);
        }
    }
    Ok(())
}
