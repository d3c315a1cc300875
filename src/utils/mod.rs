//! Utility functions and helpers.

pub mod env;

pub use env::{env_flag, get_env_with_prefix};
