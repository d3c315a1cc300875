//! Secure Headers - HTTP security headers built from a mutable default policy
//!
//! Builds Content-Security-Policy, Strict-Transport-Security, Public-Key-Pins
//! and the `X-*` hardening headers from a default policy combined with
//! per-call overrides, validates every value against a fixed schema, and
//! attaches the result to responses through a Tower layer.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use secure_headers::{HeaderKind, Overrides, PolicyStore, ValueMap};
//!
//! let mut store = PolicyStore::new();
//! store
//!     .update(&Overrides::new().with(
//!         HeaderKind::Csp,
//!         ValueMap::new().with("script-src", vec!["self", "https://cdn.example.com"]),
//!     ))
//!     .unwrap();
//!
//! for header in store.build(None).unwrap() {
//!     println!("{header}");
//! }
//! ```
//!
//! # Attaching to an Axum router
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use secure_headers::{PolicyStore, SecureHeadersConfig, build_secure_headers_layer};
//!
//! let store = PolicyStore::new();
//! let config = SecureHeadersConfig::from_env().unwrap();
//!
//! let mut app: Router = Router::new().route("/", get(|| async { "ok" }));
//! if let Some(layer) = build_secure_headers_layer(&store, &config).unwrap() {
//!     app = app.layer(layer);
//! }
//! ```

mod error;
pub mod headers;
pub mod security;
mod store;
pub mod utils;

// Re-exports for public API
pub use error::{HeaderError, Result};
pub use headers::{
    FieldValue, HeaderKind, MergeMode, Overrides, Pin, SecurityHeader, ValueMap,
};
pub use security::{
    SecureHeadersApplied, SecureHeadersConfig, SecureHeadersConfigBuilder, SecureHeadersLayer,
    build_secure_headers_layer,
};
pub use store::{PolicyStore, REPORT_ONLY_FIELD};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "secure_headers=debug")
/// - `SECURE_HEADERS_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::env_flag("HEADERS_LOG_JSON").unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
