//! `listings search` and `listings samples`.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use listing_search_core::form::controls;
use listing_search_core::phase::SearchControl;

use crate::config::Config;
use crate::registry::{load_samples, AdapterRegistry};
use crate::render::render_text;

/// Shows the progress label on stderr while a search runs.
pub struct TerminalControl {
    quiet: bool,
}

impl TerminalControl {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl SearchControl for TerminalControl {
    fn disable(&self, progress_label: &str) {
        if !self.quiet {
            eprintln!("{}", progress_label);
        }
    }

    fn enable(&self) {}
}

/// Run a search with `form` holding raw control values keyed by control id.
pub async fn run_search(
    config: &Config,
    provider: Option<&str>,
    form: BTreeMap<String, String>,
    json: bool,
    inquire: Option<&str>,
) -> Result<()> {
    for key in form.keys() {
        if !controls::ALL.contains(&key.as_str()) {
            bail!(
                "Unknown form control: {}. Known controls: {}",
                key,
                controls::ALL.join(", ")
            );
        }
    }

    let registry = AdapterRegistry::from_config(config)?;
    let adapter = registry.get(provider)?;

    let control = TerminalControl::new(json);
    let outcome = adapter.search_form(&form, &control).await;

    if let Some(id) = inquire {
        let Some(prefill) = adapter.request_info_in(outcome.generation, id) else {
            bail!("Listing {} is not among the current results", id);
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&prefill)?);
        } else {
            println!("{}", prefill.message);
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_text(&outcome.view));
    }
    Ok(())
}

/// Print the sample set the fallback path filters.
pub fn list_samples(config: &Config, json: bool) -> Result<()> {
    let samples = load_samples(&config.fallback)?;
    if json {
        println!("{}", serde_json::to_string_pretty(samples.listings())?);
        return Ok(());
    }

    if samples.is_empty() {
        println!("No sample listings (fallback disabled).");
        return Ok(());
    }

    println!(
        "{:<10} {:<14} {:<6} {:>12} {:>5} {:>6}",
        "ID", "CITY", "STATE", "PRICE", "BEDS", "BATHS"
    );
    for l in samples.listings() {
        println!(
            "{:<10} {:<14} {:<6} {:>12} {:>5} {:>6}",
            l.id,
            l.city,
            l.state,
            listing_search_core::present::format_price(l.price),
            l.bedrooms,
            listing_search_core::models::format_bathrooms(l.bathrooms)
        );
    }
    Ok(())
}
