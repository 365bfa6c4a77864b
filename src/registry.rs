//! Adapter registry.
//!
//! Builds one [`ListingSearch`] per configured provider plus a fallback-only
//! adapter named [`SAMPLES_ADAPTER`], all sharing one HTTP transport. The
//! CLI and the HTTP server resolve adapters by name through here.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use listing_search_core::fallback::SampleSet;
use listing_search_core::present::Presenter;

use crate::adapter::ListingSearch;
use crate::config::{Config, FallbackConfig, SAMPLES_ADAPTER};
use crate::fetch::{HttpTransport, Transport};
use crate::provider::Provider;

pub struct AdapterRegistry {
    adapters: BTreeMap<String, Arc<ListingSearch>>,
    default: String,
}

impl AdapterRegistry {
    /// Build every adapter named in `config`, using [`HttpTransport`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new()?);
        Self::with_transport(config, transport)
    }

    /// Build every adapter named in `config` on top of `transport`.
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let samples = load_samples(&config.fallback)?;
        let mut adapters = BTreeMap::new();

        for (name, provider_cfg) in &config.providers {
            let provider = Provider::from_config(name, provider_cfg, config.search.limit)?;
            let fallback_label = config
                .fallback
                .source_label
                .clone()
                .unwrap_or_else(|| format!("{} (Demo)", provider.source_label()));
            let presenter = Presenter {
                title: provider.kind().results_title().to_string(),
                contact_phone: config.contact.phone.clone(),
            };
            let adapter = ListingSearch::new(
                Some(provider),
                transport.clone(),
                samples.clone().with_source_label(&fallback_label),
                presenter,
            );
            adapters.insert(name.clone(), Arc::new(configure(adapter, config)));
        }

        let sample_only = {
            let samples = match &config.fallback.source_label {
                Some(label) => samples.with_source_label(label),
                None => samples,
            };
            let presenter = Presenter {
                contact_phone: config.contact.phone.clone(),
                ..Presenter::default()
            };
            ListingSearch::new(None, transport, samples, presenter)
        };
        adapters.insert(
            SAMPLES_ADAPTER.to_string(),
            Arc::new(configure(sample_only, config)),
        );

        let default = config
            .search
            .default_provider
            .clone()
            .or_else(|| config.providers.keys().next().cloned())
            .unwrap_or_else(|| SAMPLES_ADAPTER.to_string());
        debug!(adapters = adapters.len(), default = %default, "Adapter registry ready");

        Ok(Self { adapters, default })
    }

    /// Look up an adapter; `None` selects the default.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<ListingSearch>> {
        let name = name.unwrap_or(&self.default);
        self.adapters.get(name).cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown provider '{}'. Available: {}",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            )
        })
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<ListingSearch>)> {
        self.adapters.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn configure(adapter: ListingSearch, config: &Config) -> ListingSearch {
    adapter
        .with_default_status(config.search.default_status.clone())
        .with_progress_label(config.search.progress_label.clone())
}

/// The sample set named by `[fallback]`: empty when disabled, the file at
/// `samples_path` when set, the built-in set otherwise.
pub fn load_samples(cfg: &FallbackConfig) -> Result<SampleSet> {
    if !cfg.enabled {
        return Ok(SampleSet::default());
    }
    match &cfg.samples_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read samples file: {}", path.display()))?;
            SampleSet::from_json_str(&json)
                .with_context(|| format!("Invalid samples file: {}", path.display()))
        }
        None => Ok(SampleSet::builtin()),
    }
}
