//! Log setup.
//!
//! Logs go to stderr so `listings search --json` output stays clean on
//! stdout. `RUST_LOG` overrides the default filter.
//!
//! One-shot commands default to `error`: a provider failure is answered from
//! the samples and the terminal shows only the result. The service keeps the
//! `warn` fallback records for operators.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for one-shot CLI commands.
pub const CLI_FILTER: &str = "error";
/// Default filter for `listings serve`.
pub const SERVER_FILTER: &str = "info,listing_search=debug";

pub fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();
}
