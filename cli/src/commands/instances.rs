//! Instances command - show the WSL distributions that would be scanned.

use anyhow::Result;
use wslports_core::ports::InstanceEnumeratorPort;
use wslports_core::{Settings, WslEnumerator};

pub async fn run(json: bool) -> Result<()> {
    let settings = Settings::load_default().await?;
    let instances = WslEnumerator::new(&settings).list_instances().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
        return Ok(());
    }

    if instances.is_empty() {
        println!("No WSL instances found.");
        return Ok(());
    }

    for instance in &instances {
        println!("{}", instance);
    }

    println!("\nTotal: {} instances", instances.len());
    Ok(())
}
