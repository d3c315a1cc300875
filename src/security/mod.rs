//! Security headers middleware.
//!
//! Attaches the headers built by a [`PolicyStore`](crate::PolicyStore) to
//! HTTP responses, at most once per response.

mod config;
mod layer;

pub use config::{SecureHeadersConfig, SecureHeadersConfigBuilder};
pub use layer::{
    build_secure_headers_layer, SecureHeadersApplied, SecureHeadersLayer, SecureHeadersService,
};
