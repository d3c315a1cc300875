//! Static schema registry for the supported headers.
//!
//! Every [`HeaderKind`] maps to a [`HeaderSchema`]: the fields it accepts, the
//! alternatives each field may match, and the built-in default policy.

use super::kind::HeaderKind;
use super::value::{FieldValue, ValueMap};
use std::fmt;

/// One allowed alternative for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Case-insensitive match against the value's string form
    Exact(&'static str),
    /// Regular expression matched at the start of the value's string form
    Pattern(&'static str),
    /// Any boolean
    Boolean,
    /// Any list
    List,
    /// A list of pins; an empty list clears them
    Pins,
    /// Any value at all
    Any,
}

impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => write!(f, "'{value}'"),
            Self::Pattern(pattern) => write!(f, "'{pattern}'"),
            Self::Boolean => f.write_str("true, false"),
            Self::List => f.write_str("[...]"),
            Self::Pins => f.write_str("[{tag: digest}, ...]"),
            Self::Any => f.write_str("*"),
        }
    }
}

/// Allowed alternatives for one field, tried in order
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub name: &'static str,
    pub rules: &'static [FieldRule],
}

/// Schema for a single header kind
#[derive(Debug)]
pub struct HeaderSchema {
    pub kind: HeaderKind,
    /// Fields in serialization order
    pub fields: &'static [FieldSchema],
}

impl HeaderSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

const fn field(name: &'static str, rules: &'static [FieldRule]) -> FieldSchema {
    FieldSchema { name, rules }
}

const SOURCE_LIST: &[FieldRule] = &[FieldRule::List];
const MAX_AGE: &[FieldRule] = &[FieldRule::Pattern("[0-9]+")];
const FLAG: &[FieldRule] = &[FieldRule::Boolean];

/// CSP directive names, in serialization order
pub const CSP_DIRECTIVES: &[&str] = &[
    "default-src",
    "script-src",
    "img-src",
    "object-src",
    "plugin-src",
    "style-src",
    "media-src",
    "child-src",
    "connect-src",
    "base-uri",
    "font-src",
    "form-action",
    "frame-ancestors",
    "plugin-types",
    "referrer",
    "reflected-xss",
    "sandbox",
    "report-uri",
];

static CSP: HeaderSchema = HeaderSchema {
    kind: HeaderKind::Csp,
    fields: &[
        field("default-src", SOURCE_LIST),
        field("script-src", SOURCE_LIST),
        field("img-src", SOURCE_LIST),
        field("object-src", SOURCE_LIST),
        field("plugin-src", SOURCE_LIST),
        field("style-src", SOURCE_LIST),
        field("media-src", SOURCE_LIST),
        field("child-src", SOURCE_LIST),
        field("connect-src", SOURCE_LIST),
        field("base-uri", SOURCE_LIST),
        field("font-src", SOURCE_LIST),
        field("form-action", SOURCE_LIST),
        field("frame-ancestors", SOURCE_LIST),
        field("plugin-types", SOURCE_LIST),
        field("referrer", SOURCE_LIST),
        field("reflected-xss", SOURCE_LIST),
        field("sandbox", SOURCE_LIST),
        field("report-uri", SOURCE_LIST),
    ],
};

static HSTS: HeaderSchema = HeaderSchema {
    kind: HeaderKind::Hsts,
    fields: &[
        field("max-age", MAX_AGE),
        field("includeSubDomains", FLAG),
        field("preload", FLAG),
    ],
};

static HPKP: HeaderSchema = HeaderSchema {
    kind: HeaderKind::Hpkp,
    fields: &[
        field("max-age", MAX_AGE),
        field("includeSubDomains", FLAG),
        field("report-uri", &[FieldRule::Any]),
        field("pins", &[FieldRule::Pins]),
    ],
};

static X_FRAME_OPTIONS: HeaderSchema = HeaderSchema {
    kind: HeaderKind::XFrameOptions,
    fields: &[field(
        "value",
        &[
            FieldRule::Exact("deny"),
            FieldRule::Exact("sameorigin"),
            FieldRule::Pattern("allow-from .+"),
        ],
    )],
};

static X_XSS_PROTECTION: HeaderSchema = HeaderSchema {
    kind: HeaderKind::XXssProtection,
    fields: &[
        field("value", &[FieldRule::Exact("0"), FieldRule::Exact("1")]),
        field("mode", &[FieldRule::Exact("block"), FieldRule::Boolean]),
    ],
};

static X_CONTENT_TYPE_OPTIONS: HeaderSchema = HeaderSchema {
    kind: HeaderKind::XContentTypeOptions,
    fields: &[field("value", &[FieldRule::Exact("nosniff")])],
};

static X_DOWNLOAD_OPTIONS: HeaderSchema = HeaderSchema {
    kind: HeaderKind::XDownloadOptions,
    fields: &[field("value", &[FieldRule::Exact("noopen")])],
};

static X_PERMITTED_CROSS_DOMAIN_POLICIES: HeaderSchema = HeaderSchema {
    kind: HeaderKind::XPermittedCrossDomainPolicies,
    fields: &[field(
        "value",
        &[
            FieldRule::Exact("all"),
            FieldRule::Exact("none"),
            FieldRule::Exact("master-only"),
            FieldRule::Exact("by-content-type"),
            FieldRule::Exact("by-ftp-filename"),
        ],
    )],
};

/// Look up the schema for a header kind
pub fn schema(kind: HeaderKind) -> &'static HeaderSchema {
    match kind {
        HeaderKind::Csp => &CSP,
        HeaderKind::Hsts => &HSTS,
        HeaderKind::Hpkp => &HPKP,
        HeaderKind::XFrameOptions => &X_FRAME_OPTIONS,
        HeaderKind::XXssProtection => &X_XSS_PROTECTION,
        HeaderKind::XContentTypeOptions => &X_CONTENT_TYPE_OPTIONS,
        HeaderKind::XDownloadOptions => &X_DOWNLOAD_OPTIONS,
        HeaderKind::XPermittedCrossDomainPolicies => &X_PERMITTED_CROSS_DOMAIN_POLICIES,
    }
}

/// CSP policy with every directive set to an empty source list
pub fn empty_csp() -> ValueMap {
    CSP_DIRECTIVES
        .iter()
        .map(|directive| (*directive, FieldValue::List(Vec::new())))
        .collect()
}

/// Built-in default policy for a header kind
pub fn default_policy(kind: HeaderKind) -> ValueMap {
    match kind {
        HeaderKind::Csp => empty_csp().with("report-uri", vec!["/csp_report"]),
        HeaderKind::Hsts => ValueMap::new()
            .with("max-age", 31_536_000)
            .with("includeSubDomains", true)
            .with("preload", false),
        HeaderKind::Hpkp => ValueMap::new()
            .with("max-age", 5_184_000)
            .with("includeSubDomains", true)
            .with("report-uri", "/hpkp_report")
            .with("pins", FieldValue::Pins(Vec::new())),
        HeaderKind::XFrameOptions => ValueMap::new().with("value", "sameorigin"),
        HeaderKind::XXssProtection => ValueMap::new().with("value", 1).with("mode", "block"),
        HeaderKind::XContentTypeOptions => ValueMap::new().with("value", "nosniff"),
        HeaderKind::XDownloadOptions => ValueMap::new().with("value", "noopen"),
        HeaderKind::XPermittedCrossDomainPolicies => ValueMap::new().with("value", "none"),
    }
}
