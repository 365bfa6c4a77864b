//! TOML configuration.
//!
//! ```toml
//! [search]
//! default_provider = "bridge"
//! limit = 50
//! default_status = "Active"
//!
//! [fallback]
//! enabled = true
//! samples_path = "./config/samples.json"
//!
//! [contact]
//! phone = "(571) 454-3438"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//!
//! [providers.bridge]
//! kind = "bridge"
//! endpoint = "https://api.bridgedataoutput.com/api/v2"
//! token_env = "BRIDGE_ACCESS_TOKEN"
//!
//! [providers.bridge.headers]
//! X-API-Key = "server-token"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::provider::ProviderKind;

/// Name reserved for the fallback-only adapter.
pub const SAMPLES_ADAPTER: &str = "samples";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Provider used when a search names none.
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Maximum records requested from a provider.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Status applied when the user leaves it unset.
    #[serde(default)]
    pub default_status: Option<String>,
    /// Label shown on the search control while a search runs.
    #[serde(default = "default_progress_label")]
    pub progress_label: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            limit: default_limit(),
            default_status: None,
            progress_label: default_progress_label(),
        }
    }
}

fn default_limit() -> usize {
    50
}
fn default_progress_label() -> String {
    "Searching MLS...".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// When false, a failed remote search yields the no-results state.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// JSON array of canonical listings; the built-in set is used when unset.
    #[serde(default)]
    pub samples_path: Option<PathBuf>,
    /// Overrides the `source_label` of fallback results.
    #[serde(default)]
    pub source_label: Option<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            samples_path: None,
            source_label: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ContactConfig {
    /// Phone number offered when a search finds nothing.
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Base URL of the provider API.
    pub endpoint: String,
    /// Bearer token given inline.
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable holding the bearer token.
    #[serde(default)]
    pub token_env: Option<String>,
    /// Extra request headers (e.g. `X-API-Key`).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Agent identifier sent by agent-scoped providers.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Overrides the provider's default `source_label`.
    #[serde(default)]
    pub source_label: Option<String>,
    /// Request timeout; no timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Configuration with no providers: every search answers from samples.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.search.limit == 0 {
        anyhow::bail!("search.limit must be >= 1");
    }

    if config.providers.contains_key(SAMPLES_ADAPTER) {
        anyhow::bail!("provider name '{}' is reserved", SAMPLES_ADAPTER);
    }

    if let Some(name) = &config.search.default_provider {
        if name != SAMPLES_ADAPTER && !config.providers.contains_key(name) {
            anyhow::bail!(
                "search.default_provider '{}' is not defined under [providers]",
                name
            );
        }
    }

    for (name, provider) in &config.providers {
        reqwest::Url::parse(&provider.endpoint).with_context(|| {
            format!(
                "providers.{}.endpoint is not a valid URL: {}",
                name, provider.endpoint
            )
        })?;
        if provider.timeout_secs == Some(0) {
            anyhow::bail!("providers.{}.timeout_secs must be > 0", name);
        }
        if provider.token.is_some() && provider.token_env.is_some() {
            anyhow::bail!(
                "providers.{}: set either token or token_env, not both",
                name
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.search.limit, 50);
        assert!(cfg.fallback.enabled);
        assert!(cfg.providers.is_empty());
        assert_eq!(cfg.server.bind, "127.0.0.1:7340");
    }

    #[test]
    fn test_provider_section() {
        let cfg = parse(
            r#"
[search]
default_provider = "rs"

[providers.rs]
kind = "rentspree"
endpoint = "https://sandbox-api.rentspree.com/v1"
token = "abc"
agent_id = "agent-1"
timeout_secs = 5

[providers.rs.headers]
X-Trace = "1"
"#,
        )
        .unwrap();
        let p = &cfg.providers["rs"];
        assert_eq!(p.kind, ProviderKind::RentSpree);
        assert_eq!(p.agent_id.as_deref(), Some("agent-1"));
        assert_eq!(p.headers["X-Trace"], "1");
    }

    #[test]
    fn test_rejects_unknown_default_provider() {
        let err = parse("[search]\ndefault_provider = \"nope\"\n").unwrap_err();
        assert!(err.to_string().contains("not defined"));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let err = parse("[providers.b]\nkind = \"bridge\"\nendpoint = \"not a url\"\n").unwrap_err();
        assert!(err.to_string().contains("not a valid URL"));
    }

    #[test]
    fn test_rejects_reserved_name_and_zero_limit() {
        assert!(parse("[providers.samples]\nkind = \"bridge\"\nendpoint = \"http://x\"\n").is_err());
        assert!(parse("[search]\nlimit = 0\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_kind() {
        assert!(parse("[providers.z]\nkind = \"zillow\"\nendpoint = \"http://x\"\n").is_err());
    }

    #[test]
    fn test_load_config_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("listings.toml");
        std::fs::write(&path, "[contact]\nphone = \"555-0100\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.contact.phone.as_deref(), Some("555-0100"));
        assert!(load_config(&tmp.path().join("missing.toml")).is_err());
    }
}
