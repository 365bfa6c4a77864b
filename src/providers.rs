//! `listings providers`: configured providers and their connectivity.

use anyhow::Result;

use crate::adapter::ProbeStatus;
use crate::config::Config;
use crate::registry::AdapterRegistry;

pub async fn list_providers(config: &Config) -> Result<()> {
    let registry = AdapterRegistry::from_config(config)?;

    println!("{:<16} {:<10} {:<10} ENDPOINT", "PROVIDER", "KIND", "HEALTH");
    for (name, adapter) in registry.iter() {
        let Some(provider) = adapter.provider() else {
            let health = format!("{} listings", adapter.samples().len());
            println!("{:<16} {:<10} {:<10} -", name, "samples", health);
            continue;
        };

        let health = match adapter.probe().await {
            Ok(ProbeStatus::Healthy) => "OK".to_string(),
            Ok(ProbeStatus::Unchecked) => "UNCHECKED".to_string(),
            Err(e) => {
                tracing::debug!(provider = name, error = %e, "Probe failed");
                format!("FAIL ({})", e.kind())
            }
        };
        let marker = if name == registry.default_name() { "*" } else { "" };
        println!(
            "{:<16} {:<10} {:<10} {}",
            format!("{}{}", name, marker),
            provider.kind().as_str(),
            health,
            provider.endpoint()
        );
    }
    Ok(())
}
