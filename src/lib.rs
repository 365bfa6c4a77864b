//! # Listing Search
//!
//! A property-search adapter for real-estate sites. It reads a search form,
//! queries an MLS provider API, normalizes the response into canonical
//! listings, and falls back to a local sample set whenever the provider
//! cannot answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Search form│──▶│ ListingSearch│──▶│ MLS provider │
//! │  controls  │   │   adapter    │   │ Bridge/Grid/ │
//! └────────────┘   └──────┬───────┘   │  RentSpree   │
//!                         │ failure   └──────────────┘
//!                         ▼
//!                  ┌─────────────┐     ┌─────────────┐
//!                  │ Sample set  │────▶│ ResultsView │
//!                  └─────────────┘     └─────────────┘
//! ```
//!
//! Pure pieces (filter model, query encoding, normalization, fallback
//! filtering, view-models) live in `listing-search-core`; this crate adds
//! configuration, HTTP transport, the adapter, the CLI, and the service.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`provider`] | Provider kinds, endpoints, auth headers |
//! | [`fetch`] | Transport trait, HTTP transport, retrieval errors |
//! | [`adapter`] | The search adapter and its result state |
//! | [`registry`] | Adapters by name, sample set loading |
//! | [`render`] | Terminal rendering of result views |
//! | [`search`] | `search` and `samples` commands |
//! | [`providers`] | `providers` command |
//! | [`server`] | HTTP search service |
//! | [`logging`] | Log subscriber setup |

pub mod adapter;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod render;
pub mod search;
pub mod server;
