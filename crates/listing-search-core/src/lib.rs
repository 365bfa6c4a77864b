//! # Listing Search Core
//!
//! Pure logic for listing search: the normalized filter and canonical
//! listing models, form extraction, provider query encoding, response
//! normalization, fallback filtering, and result view-models.
//!
//! This crate performs no network or filesystem I/O and has no async
//! runtime dependency; the `listing-search` crate wires it to HTTP.

pub mod fallback;
pub mod form;
pub mod inquiry;
pub mod models;
pub mod normalize;
pub mod phase;
pub mod present;
pub mod query;
