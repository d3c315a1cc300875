use crate::error::Result;
use crate::headers::{HeaderKind, Overrides, ValueMap};
use crate::utils::{env_flag, get_env_with_prefix};
use serde::{Deserialize, Serialize};

/// Configuration for the secure headers layer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecureHeadersConfig {
    /// Whether security headers are attached at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Overrides applied on top of the store when the layer is built
    /// Example: {"X-Frame-Options": {"value": "deny"}, "HPKP": null}
    #[serde(default)]
    pub overrides: Overrides,
}

impl Default for SecureHeadersConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            overrides: Overrides::default(),
        }
    }
}

impl SecureHeadersConfig {
    /// Create a new SecureHeadersConfig builder
    pub fn builder() -> SecureHeadersConfigBuilder {
        SecureHeadersConfigBuilder::new()
    }

    /// Load configuration from environment variables
    ///
    /// Reads `SECURE_HEADERS_ENABLED` and `SECURE_HEADERS_OVERRIDES` (a JSON
    /// object of overrides), falling back to `HEADERS_ENABLED` and
    /// `HEADERS_OVERRIDES`. Malformed overrides are an error rather than
    /// silently ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(enabled) = env_flag("HEADERS_ENABLED") {
            config.enabled = enabled;
        }

        if let Some(overrides) = get_env_with_prefix("HEADERS_OVERRIDES") {
            config.overrides = Overrides::from_json(&overrides)?;
        }

        Ok(config)
    }
}

/// Builder for SecureHeadersConfig
#[must_use = "builder does nothing until you call build()"]
pub struct SecureHeadersConfigBuilder {
    config: SecureHeadersConfig,
}

impl SecureHeadersConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SecureHeadersConfig::default(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.config.overrides = overrides;
        self
    }

    pub fn override_header(mut self, kind: HeaderKind, values: ValueMap) -> Self {
        self.config.overrides = self.config.overrides.with(kind, values);
        self
    }

    pub fn disable_header(mut self, kind: HeaderKind) -> Self {
        self.config.overrides = self.config.overrides.disable(kind);
        self
    }

    pub fn deny_framing(self) -> Self {
        self.override_header(HeaderKind::XFrameOptions, ValueMap::new().with("value", "deny"))
    }

    pub fn build(self) -> SecureHeadersConfig {
        self.config
    }
}

impl Default for SecureHeadersConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SecureHeadersConfig::default();
        assert!(config.enabled);
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = SecureHeadersConfig::builder()
            .deny_framing()
            .disable_header(HeaderKind::Hpkp)
            .build();

        assert!(config.enabled);
        assert_eq!(config.overrides.len(), 2);
        assert_eq!(config.overrides.get(HeaderKind::Hpkp), Some(None));
    }

    #[test]
    fn test_deserialize_config() {
        let config: SecureHeadersConfig = serde_json::from_str(
            r#"{"overrides": {"x-frame-options": {"value": "deny"}}}"#,
        )
        .unwrap();

        assert!(config.enabled);
        assert!(config.overrides.contains(HeaderKind::XFrameOptions));
    }

    #[test]
    fn test_from_env() {
        unsafe {
            std::env::set_var("SECURE_HEADERS_ENABLED", "false");
            std::env::set_var("SECURE_HEADERS_OVERRIDES", r#"{"HSTS": {"preload": true}}"#);
        }
        let config = SecureHeadersConfig::from_env().unwrap();
        unsafe {
            std::env::remove_var("SECURE_HEADERS_ENABLED");
            std::env::remove_var("SECURE_HEADERS_OVERRIDES");
        }

        assert!(!config.enabled);
        assert!(config.overrides.contains(HeaderKind::Hsts));
    }
}
