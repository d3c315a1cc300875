use crate::error::{HeaderError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The fixed set of security headers this crate knows how to build.
///
/// Declaration order is the order headers are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderKind {
    /// Content-Security-Policy
    Csp,
    /// Strict-Transport-Security
    Hsts,
    /// Public-Key-Pins
    Hpkp,
    XFrameOptions,
    XXssProtection,
    XContentTypeOptions,
    XDownloadOptions,
    XPermittedCrossDomainPolicies,
}

impl HeaderKind {
    pub const ALL: [HeaderKind; 8] = [
        HeaderKind::Csp,
        HeaderKind::Hsts,
        HeaderKind::Hpkp,
        HeaderKind::XFrameOptions,
        HeaderKind::XXssProtection,
        HeaderKind::XContentTypeOptions,
        HeaderKind::XDownloadOptions,
        HeaderKind::XPermittedCrossDomainPolicies,
    ];

    /// Wire name of the header, without any report-only suffix
    pub fn header_name(self) -> &'static str {
        match self {
            Self::Csp => "Content-Security-Policy",
            Self::Hsts => "Strict-Transport-Security",
            Self::Hpkp => "Public-Key-Pins",
            Self::XFrameOptions => "X-Frame-Options",
            Self::XXssProtection => "X-XSS-Protection",
            Self::XContentTypeOptions => "X-Content-Type-Options",
            Self::XDownloadOptions => "X-Download-Options",
            Self::XPermittedCrossDomainPolicies => "X-Permitted-Cross-Domain-Policies",
        }
    }

    /// Canonical override key (underscore form)
    pub fn key(self) -> &'static str {
        match self {
            Self::Csp => "CSP",
            Self::Hsts => "HSTS",
            Self::Hpkp => "HPKP",
            Self::XFrameOptions => "X_Frame_Options",
            Self::XXssProtection => "X_XSS_Protection",
            Self::XContentTypeOptions => "X_Content_Type_Options",
            Self::XDownloadOptions => "X_Download_Options",
            Self::XPermittedCrossDomainPolicies => "X_Permitted_Cross_Domain_Policies",
        }
    }

    /// Whether the header has a `-Report-Only` variant
    pub fn supports_report_only(self) -> bool {
        matches!(self, Self::Csp | Self::Hpkp)
    }

    /// Resolve an override key.
    ///
    /// Hyphens and underscores are interchangeable and case is ignored, so
    /// `X-Frame-Options`, `x_frame_options` and `X_Frame_Options` all resolve
    /// to [`HeaderKind::XFrameOptions`]. The full header name is accepted for
    /// the abbreviated kinds too (`Strict-Transport-Security` for `HSTS`).
    pub fn from_key(key: &str) -> Result<Self> {
        let normalized = normalize_key(key);
        Self::ALL
            .into_iter()
            .find(|kind| {
                normalize_key(kind.key()) == normalized
                    || normalize_key(kind.header_name()) == normalized
            })
            .ok_or_else(|| HeaderError::UnknownHeader {
                key: key.to_string(),
                allowed: Self::ALL.iter().map(|k| k.key().to_string()).collect(),
            })
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().replace('-', "_").to_ascii_lowercase()
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_name())
    }
}

impl FromStr for HeaderKind {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_key(s)
    }
}

impl Serialize for HeaderKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for HeaderKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Self::from_key(&key).map_err(serde::de::Error::custom)
    }
}
