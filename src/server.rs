//! HTTP search service.
//!
//! Exposes each configured adapter over a small JSON API so a web front end
//! can post its search form and render the returned view.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/providers` | Configured adapters |
//! | `GET`  | `/search/{provider}` | Search with form control ids as query parameters |
//! | `POST` | `/search/{provider}` | Search with a JSON filter body |
//! | `GET`  | `/inquiry/{provider}/{listing_id}?generation=N` | Contact-form prefill for a listing shown by search `N` |
//!
//! Every search response carries its `generation`. Inquiries name it, so
//! each client follows up against the listings it was shown even while
//! other clients search the same provider.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Unknown provider 'x'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404).
//!
//! A failing provider is not an error: searches fall back to samples and
//! still answer `200`, with `"origin": "fallback"`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use listing_search_core::form::controls;
use listing_search_core::inquiry::ContactPrefill;
use listing_search_core::models::SearchFilter;
use listing_search_core::phase::NoopControl;

use crate::adapter::{ListingSearch, SearchOutcome};
use crate::config::Config;
use crate::registry::AdapterRegistry;

#[derive(Clone)]
struct AppState {
    registry: Arc<AdapterRegistry>,
}

/// Start the service on `[server].bind`. Runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let registry = Arc::new(AdapterRegistry::from_config(config)?);
    let bind_addr = config.server.bind.clone();

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, default = registry.default_name(), "Listing search service listening");
    eprintln!("Listing search service listening on http://{}", bind_addr);

    axum::serve(listener, router(registry)).await?;
    Ok(())
}

/// The service routes over `registry`.
pub fn router(registry: Arc<AdapterRegistry>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/providers", get(handle_providers))
        .route(
            "/search/{provider}",
            get(handle_search_form).post(handle_search_filter),
        )
        .route("/inquiry/{provider}/{listing_id}", get(handle_inquiry))
        .layer(cors)
        .with_state(AppState { registry })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn adapter(state: &AppState, provider: &str) -> Result<Arc<ListingSearch>, AppError> {
    state
        .registry
        .get(Some(provider))
        .map_err(|e| not_found(e.to_string()))
}

// ============ Handlers ============

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderSummary {
    name: String,
    kind: String,
    endpoint: Option<String>,
    is_default: bool,
    sample_count: usize,
}

async fn handle_providers(State(state): State<AppState>) -> Json<Vec<ProviderSummary>> {
    let summaries = state
        .registry
        .iter()
        .map(|(name, adapter)| ProviderSummary {
            name: name.to_string(),
            kind: adapter
                .provider()
                .map(|p| p.kind().as_str())
                .unwrap_or("samples")
                .to_string(),
            endpoint: adapter.provider().map(|p| p.endpoint().to_string()),
            is_default: name == state.registry.default_name(),
            sample_count: adapter.samples().len(),
        })
        .collect();
    Json(summaries)
}

async fn handle_search_form(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(form): Query<HashMap<String, String>>,
) -> Result<Json<SearchOutcome>, AppError> {
    let adapter = adapter(&state, &provider)?;
    if let Some(unknown) = form.keys().find(|k| !controls::ALL.contains(&k.as_str())) {
        return Err(bad_request(format!(
            "Unknown form control '{}' (expected one of: {})",
            unknown,
            controls::ALL.join(", ")
        )));
    }
    Ok(Json(adapter.search_form(&form, &NoopControl).await))
}

async fn handle_search_filter(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    body: Result<Json<SearchFilter>, JsonRejection>,
) -> Result<Json<SearchOutcome>, AppError> {
    let adapter = adapter(&state, &provider)?;
    let Json(filter) = body.map_err(|e| bad_request(e.body_text()))?;
    Ok(Json(adapter.search(filter, &NoopControl).await))
}

#[derive(Deserialize)]
struct InquiryParams {
    generation: u64,
}

async fn handle_inquiry(
    State(state): State<AppState>,
    Path((provider, listing_id)): Path<(String, String)>,
    params: Result<Query<InquiryParams>, QueryRejection>,
) -> Result<Json<ContactPrefill>, AppError> {
    let adapter = adapter(&state, &provider)?;
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    if adapter.result_set(params.generation).is_none() {
        return Err(not_found(format!(
            "Search {} on {} has expired or never ran",
            params.generation, provider
        )));
    }
    adapter
        .request_info_in(params.generation, &listing_id)
        .map(Json)
        .ok_or_else(|| {
            not_found(format!(
                "Listing {} is not among the results of search {}",
                listing_id, params.generation
            ))
        })
}
