//! Provider wiring.
//!
//! A [`Provider`] bundles everything needed to talk to one configured MLS
//! API: the query encoder, the response mapper, resolved endpoint URLs, and
//! auth headers. It performs no I/O itself; [`crate::fetch::Transport`]
//! executes the [`ProviderRequest`]s it builds.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use listing_search_core::models::SearchFilter;
use listing_search_core::normalize::{Normalized, RentSpreeMapper, ResoMapper, ResponseMapper};
use listing_search_core::query::{
    FlatJsonEncoder, ODataEncoder, ProviderQuery, QueryEncoder, ResoJsonEncoder,
};

use crate::config::ProviderConfig;
use crate::fetch::ProviderRequest;

/// The provider API families this adapter speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Bridge Interactive RESO Web API (OData `GET`).
    Bridge,
    /// MLS Grid style RESO JSON `POST`.
    MlsGrid,
    /// RentSpree flat JSON `POST`.
    RentSpree,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Bridge => "bridge",
            ProviderKind::MlsGrid => "mlsgrid",
            ProviderKind::RentSpree => "rentspree",
        }
    }

    /// Path appended to the endpoint for searches.
    fn search_path(self) -> &'static str {
        match self {
            ProviderKind::Bridge => "OData/Property",
            ProviderKind::MlsGrid => "listings",
            ProviderKind::RentSpree => "listings/search",
        }
    }

    /// Connectivity check path, for APIs that expose one.
    fn probe_path(self) -> Option<&'static str> {
        match self {
            ProviderKind::Bridge => Some("test"),
            _ => None,
        }
    }

    fn default_source_label(self) -> &'static str {
        match self {
            ProviderKind::Bridge => "MLS Direct (Bridge)",
            ProviderKind::MlsGrid => "MLS Grid",
            ProviderKind::RentSpree => "RentSpree",
        }
    }

    pub fn results_title(self) -> &'static str {
        match self {
            ProviderKind::Bridge | ProviderKind::MlsGrid => "MLS Search Results",
            ProviderKind::RentSpree => "RentSpree Search Results",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider '{provider}': environment variable {var} is not set")]
    MissingCredential { provider: String, var: String },
    #[error("provider '{provider}': invalid endpoint {endpoint}")]
    InvalidEndpoint { provider: String, endpoint: String },
    #[error("provider '{provider}': invalid header {name}")]
    InvalidHeader { provider: String, name: String },
}

/// One configured provider, ready to build requests and map responses.
pub struct Provider {
    name: String,
    kind: ProviderKind,
    source_label: String,
    endpoint: String,
    search_url: Url,
    probe_url: Option<Url>,
    headers: HeaderMap,
    timeout: Option<Duration>,
    encoder: Box<dyn QueryEncoder>,
    mapper: Box<dyn ResponseMapper>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("search_url", &self.search_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Provider {
    /// Build a provider from its config section.
    ///
    /// The bearer token comes from `token` or from the variable named by
    /// `token_env`; a provider with neither sends no `Authorization` header.
    pub fn from_config(name: &str, cfg: &ProviderConfig, limit: usize) -> Result<Self, ProviderError> {
        let invalid_endpoint = || ProviderError::InvalidEndpoint {
            provider: name.to_string(),
            endpoint: cfg.endpoint.clone(),
        };
        let base = Url::parse(&with_trailing_slash(&cfg.endpoint)).map_err(|_| invalid_endpoint())?;
        let search_url = base
            .join(cfg.kind.search_path())
            .map_err(|_| invalid_endpoint())?;
        let probe_url = match cfg.kind.probe_path() {
            Some(path) => Some(base.join(path).map_err(|_| invalid_endpoint())?),
            None => None,
        };

        let token = match (&cfg.token, &cfg.token_env) {
            (Some(token), _) => Some(token.clone()),
            (None, Some(var)) => Some(std::env::var(var).map_err(|_| {
                ProviderError::MissingCredential {
                    provider: name.to_string(),
                    var: var.clone(),
                }
            })?),
            (None, None) => None,
        };

        let headers = build_headers(name, cfg, token.as_deref())?;

        let encoder: Box<dyn QueryEncoder> = match cfg.kind {
            ProviderKind::Bridge => Box::new(ODataEncoder { top: limit }),
            ProviderKind::MlsGrid => Box::new(ResoJsonEncoder { limit }),
            ProviderKind::RentSpree => Box::new(FlatJsonEncoder {
                agent_id: cfg.agent_id.clone(),
                limit,
            }),
        };
        let mapper: Box<dyn ResponseMapper> = match cfg.kind {
            ProviderKind::Bridge | ProviderKind::MlsGrid => Box::new(ResoMapper),
            ProviderKind::RentSpree => Box::new(RentSpreeMapper),
        };

        Ok(Self {
            name: name.to_string(),
            kind: cfg.kind,
            source_label: cfg
                .source_label
                .clone()
                .unwrap_or_else(|| cfg.kind.default_source_label().to_string()),
            endpoint: cfg.endpoint.clone(),
            search_url,
            probe_url,
            headers,
            timeout: cfg.timeout_secs.map(Duration::from_secs),
            encoder,
            mapper,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Label stamped on listings this provider returns.
    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    /// The search request for `filter`.
    pub fn search_request(&self, filter: &SearchFilter) -> ProviderRequest {
        ProviderRequest {
            provider: self.name.clone(),
            url: self.search_url.clone(),
            headers: self.headers.clone(),
            query: self.encoder.encode(filter),
            timeout: self.timeout,
        }
    }

    /// The connectivity check request, when the API has one.
    pub fn probe_request(&self) -> Option<ProviderRequest> {
        self.probe_url.as_ref().map(|url| ProviderRequest {
            provider: self.name.clone(),
            url: url.clone(),
            headers: self.headers.clone(),
            query: ProviderQuery::Params(Vec::new()),
            timeout: self.timeout,
        })
    }

    /// Map a response body to canonical listings.
    pub fn normalize(&self, body: &serde_json::Value) -> Normalized {
        self.mapper.map_response(body, &self.source_label)
    }
}

fn with_trailing_slash(endpoint: &str) -> String {
    if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{}/", endpoint)
    }
}

fn build_headers(
    name: &str,
    cfg: &ProviderConfig,
    token: Option<&str>,
) -> Result<HeaderMap, ProviderError> {
    let invalid = |header: &str| ProviderError::InvalidHeader {
        provider: name.to_string(),
        name: header.to_string(),
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| invalid("Authorization"))?;
        headers.insert(AUTHORIZATION, value);
    }

    if cfg.kind == ProviderKind::RentSpree {
        if let Some(agent) = &cfg.agent_id {
            let value = HeaderValue::from_str(agent).map_err(|_| invalid("X-Agent-ID"))?;
            headers.insert(HeaderName::from_static("x-agent-id"), value);
        }
    }

    for (key, value) in &cfg.headers {
        let header = HeaderName::from_bytes(key.as_bytes()).map_err(|_| invalid(key))?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid(key))?;
        headers.insert(header, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn cfg(kind: ProviderKind, endpoint: &str) -> ProviderConfig {
        ProviderConfig {
            kind,
            endpoint: endpoint.to_string(),
            token: Some("tok".to_string()),
            token_env: None,
            headers: BTreeMap::new(),
            agent_id: None,
            source_label: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn test_bridge_urls_and_headers() {
        let mut c = cfg(ProviderKind::Bridge, "https://api.example.com/api/v2");
        c.headers.insert("X-API-Key".into(), "server".into());
        let p = Provider::from_config("bridge", &c, 25).unwrap();

        let req = p.search_request(&SearchFilter::default());
        assert_eq!(req.url.as_str(), "https://api.example.com/api/v2/OData/Property");
        assert_eq!(req.headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(req.headers["x-api-key"], "server");
        match req.query {
            ProviderQuery::Params(params) => {
                assert!(params.iter().any(|(k, v)| k == "$top" && v == "25"));
            }
            other => panic!("expected params, got {:?}", other),
        }

        let probe = p.probe_request().unwrap();
        assert_eq!(probe.url.as_str(), "https://api.example.com/api/v2/test");
        assert_eq!(p.source_label(), "MLS Direct (Bridge)");
    }

    #[test]
    fn test_rentspree_posts_json_with_agent_header() {
        let mut c = cfg(ProviderKind::RentSpree, "https://sandbox-api.example.com/v1/");
        c.agent_id = Some("agent-7".into());
        c.source_label = Some("Rentals".into());
        let p = Provider::from_config("rs", &c, 50).unwrap();

        let req = p.search_request(&SearchFilter::default());
        assert_eq!(req.url.as_str(), "https://sandbox-api.example.com/v1/listings/search");
        assert_eq!(req.headers["x-agent-id"], "agent-7");
        match req.query {
            ProviderQuery::Json(body) => assert_eq!(body["agent_id"], "agent-7"),
            other => panic!("expected json, got {:?}", other),
        }
        assert!(p.probe_request().is_none());
        assert_eq!(p.source_label(), "Rentals");
    }

    #[test]
    fn test_missing_token_env_is_an_error() {
        let mut c = cfg(ProviderKind::MlsGrid, "https://api.example.com");
        c.token = None;
        c.token_env = Some("LISTING_SEARCH_TEST_UNSET_TOKEN_VAR".into());
        let err = Provider::from_config("grid", &c, 10).unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { .. }));
    }

    #[test]
    fn test_no_token_sends_no_authorization() {
        let mut c = cfg(ProviderKind::MlsGrid, "https://api.example.com");
        c.token = None;
        let p = Provider::from_config("grid", &c, 10).unwrap();
        let req = p.search_request(&SearchFilter::default());
        assert!(req.headers.get(AUTHORIZATION).is_none());
        assert_eq!(req.url.as_str(), "https://api.example.com/listings");
    }

    #[test]
    fn test_invalid_header_name() {
        let mut c = cfg(ProviderKind::Bridge, "https://api.example.com");
        c.headers.insert("bad header".into(), "x".into());
        assert!(matches!(
            Provider::from_config("b", &c, 10),
            Err(ProviderError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_normalize_stamps_source_label() {
        let p = Provider::from_config("b", &cfg(ProviderKind::Bridge, "https://x.test"), 10).unwrap();
        let body = serde_json::json!({"value": [{"ListingId": "A1", "City": "Vienna", "ListPrice": 500000}]});
        let n = p.normalize(&body);
        assert_eq!(n.listings.len(), 1);
        assert_eq!(n.listings[0].source_label, "MLS Direct (Bridge)");
    }
}
