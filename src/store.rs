//! Process-wide table of default header policies.
//!
//! A [`PolicyStore`] starts out holding the built-in defaults. `update` and
//! `rewrite` change those defaults for every later `build`; `build` itself
//! never mutates the store.
//!
//! `update` and `rewrite` take `&mut self`, so sharing a store across threads
//! needs a lock owned by the caller. Configure the store once at startup, or
//! hand readers a [`PolicyStore::snapshot`] taken under the lock.

use crate::error::{HeaderError, Result};
use crate::headers::{
    default_policy, merge, schema, serialize, validate, FieldRule, FieldValue, HeaderKind,
    MergeMode, Overrides, SecurityHeader, ValueMap,
};
use std::collections::BTreeMap;

/// Override field that switches CSP and HPKP to their report-only header
pub const REPORT_ONLY_FIELD: &str = "report-only";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct StoredPolicy {
    /// `None` disables the header
    values: Option<ValueMap>,
    report_only: bool,
}

/// Current default policy for every header kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStore {
    policies: BTreeMap<HeaderKind, StoredPolicy>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore {
    /// Create a store holding the built-in defaults
    pub fn new() -> Self {
        let policies = HeaderKind::ALL
            .into_iter()
            .map(|kind| {
                let policy = StoredPolicy {
                    values: Some(default_policy(kind)),
                    report_only: false,
                };
                (kind, policy)
            })
            .collect();

        Self { policies }
    }

    /// Stored policy for a header, `None` if the header is disabled
    pub fn get(&self, kind: HeaderKind) -> Option<&ValueMap> {
        self.policies.get(&kind).and_then(|p| p.values.as_ref())
    }

    /// Whether later builds emit the `-Report-Only` variant of this header
    pub fn is_report_only(&self, kind: HeaderKind) -> bool {
        self.policies.get(&kind).is_some_and(|p| p.report_only)
    }

    /// Immutable copy for readers that must not observe later mutations
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Build the header list for one response.
    ///
    /// Headers named in `overrides` are merged additively against the stored
    /// policy for this call only. Disabled headers and headers with a null
    /// field are left out of the result.
    pub fn build(&self, overrides: Option<&Overrides>) -> Result<Vec<SecurityHeader>> {
        let mut headers = Vec::with_capacity(HeaderKind::ALL.len());

        for kind in HeaderKind::ALL {
            let resolved;
            let (values, report_only) = match overrides.and_then(|o| o.get(kind)) {
                Some(values) => {
                    resolved = self.resolve(kind, values.cloned(), MergeMode::Update)?;
                    (resolved.values.as_ref(), resolved.report_only)
                }
                None => (self.get(kind), self.is_report_only(kind)),
            };

            let Some(values) = values else {
                continue;
            };

            if let (name, Some(value)) = serialize(kind, values, report_only) {
                headers.push(SecurityHeader { name, value });
            }
        }

        Ok(headers)
    }

    /// Merge overrides into the stored defaults, keeping unmentioned fields
    pub fn update(&mut self, overrides: &Overrides) -> Result<()> {
        self.apply(overrides, MergeMode::Update)
    }

    /// Replace the stored defaults with the overrides
    pub fn rewrite(&mut self, overrides: &Overrides) -> Result<()> {
        self.apply(overrides, MergeMode::Rewrite)
    }

    /// Every kind is resolved before any is written, so a rejected override
    /// leaves the store untouched
    fn apply(&mut self, overrides: &Overrides, mode: MergeMode) -> Result<()> {
        let mut resolved = Vec::with_capacity(overrides.len());
        for (kind, values) in overrides.iter() {
            let policy = self
                .resolve(kind, values.cloned(), mode)
                .inspect_err(|e| {
                    tracing::warn!(kind = %kind, mode = ?mode, error = %e, "Rejected security header override");
                })?;
            resolved.push((kind, policy));
        }

        for (kind, policy) in resolved {
            tracing::debug!(
                kind = %kind,
                mode = ?mode,
                enabled = policy.values.is_some(),
                report_only = policy.report_only,
                "Security header policy changed"
            );
            self.policies.insert(kind, policy);
        }

        Ok(())
    }

    fn resolve(
        &self,
        kind: HeaderKind,
        mut overrides: Option<ValueMap>,
        mode: MergeMode,
    ) -> Result<StoredPolicy> {
        let requested = match overrides.as_mut() {
            Some(values) => take_report_only(kind, values)?,
            None => None,
        };
        let report_only = requested.unwrap_or(match mode {
            MergeMode::Update => self.is_report_only(kind),
            MergeMode::Rewrite => false,
        });

        if let Some(values) = &overrides {
            validate(kind, values)?;
        }

        let merged = merge(mode, kind, overrides, self.get(kind));
        if let Some(values) = &merged {
            validate(kind, values)?;
        }

        Ok(StoredPolicy {
            values: merged,
            report_only,
        })
    }
}

/// Remove the `report-only` flag from an override.
///
/// Only CSP and HPKP have a report-only header; anywhere else the field is
/// unknown.
fn take_report_only(kind: HeaderKind, values: &mut ValueMap) -> Result<Option<bool>> {
    let Some(flag) = values.remove(REPORT_ONLY_FIELD) else {
        return Ok(None);
    };

    if !kind.supports_report_only() {
        return Err(HeaderError::UnknownField {
            kind,
            field: REPORT_ONLY_FIELD.to_string(),
            allowed: schema(kind).field_names().map(|f| format!("'{f}'")).collect(),
        });
    }

    match flag {
        FieldValue::Bool(report_only) => Ok(Some(report_only)),
        FieldValue::Null => Ok(None),
        other => Err(HeaderError::InvalidValue {
            kind,
            field: REPORT_ONLY_FIELD.to_string(),
            value: other.to_string(),
            allowed: vec![FieldRule::Boolean.to_string()],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::Pin;

    fn header<'a>(headers: &'a [SecurityHeader], name: &str) -> Option<&'a str> {
        headers.iter().find(|h| h.name == name).map(|h| h.value.as_str())
    }

    #[test]
    fn test_build_does_not_mutate_store() {
        let store = PolicyStore::new();
        let overrides = Overrides::new().with(HeaderKind::XFrameOptions, ValueMap::new().with("value", "deny"));

        let headers = store.build(Some(&overrides)).unwrap();
        assert_eq!(header(&headers, "X-Frame-Options"), Some("deny"));
        assert_eq!(store, PolicyStore::new());
    }

    #[test]
    fn test_failed_update_leaves_store_untouched() {
        let mut store = PolicyStore::new();
        let overrides = Overrides::new()
            .with(HeaderKind::XFrameOptions, ValueMap::new().with("value", "deny"))
            .with(HeaderKind::Hsts, ValueMap::new().with("max-age", "soon"));

        assert!(store.update(&overrides).is_err());
        assert_eq!(store, PolicyStore::new());
    }

    #[test]
    fn test_report_only_outside_csp_and_hpkp() {
        let mut store = PolicyStore::new();
        let overrides = Overrides::new().with(HeaderKind::Hsts, ValueMap::new().with(REPORT_ONLY_FIELD, true));

        let err = store.update(&overrides).unwrap_err();
        assert!(matches!(err, HeaderError::UnknownField { kind: HeaderKind::Hsts, .. }));
    }

    #[test]
    fn test_report_only_must_be_boolean() {
        let store = PolicyStore::new();
        let overrides = Overrides::new().with(HeaderKind::Csp, ValueMap::new().with(REPORT_ONLY_FIELD, "yes"));

        assert!(matches!(
            store.build(Some(&overrides)),
            Err(HeaderError::InvalidValue { kind: HeaderKind::Csp, .. })
        ));
    }

    #[test]
    fn test_report_only_in_build_is_per_call() {
        let store = PolicyStore::new();
        let overrides = Overrides::new().with(HeaderKind::Hpkp, ValueMap::new().with(REPORT_ONLY_FIELD, true));

        let headers = store.build(Some(&overrides)).unwrap();
        assert!(header(&headers, "Public-Key-Pins-Report-Only").is_some());
        assert!(header(&headers, "Public-Key-Pins").is_none());
        assert!(!store.is_report_only(HeaderKind::Hpkp));
    }

    #[test]
    fn test_rewrite_clears_report_only() {
        let mut store = PolicyStore::new();
        store
            .update(&Overrides::new().with(HeaderKind::Csp, ValueMap::new().with(REPORT_ONLY_FIELD, true)))
            .unwrap();
        assert!(store.is_report_only(HeaderKind::Csp));

        store
            .rewrite(&Overrides::new().with(HeaderKind::Csp, ValueMap::new().with("default-src", vec!["self"])))
            .unwrap();
        assert!(!store.is_report_only(HeaderKind::Csp));
    }

    #[test]
    fn test_disable_then_update() {
        let mut store = PolicyStore::new();
        store.update(&Overrides::new().disable(HeaderKind::Hpkp)).unwrap();
        assert!(store.get(HeaderKind::Hpkp).is_none());

        let headers = store.build(None).unwrap();
        assert!(header(&headers, "Public-Key-Pins").is_none());

        store
            .update(&Overrides::new().with(
                HeaderKind::Hpkp,
                ValueMap::new().with("max-age", 60).with("pins", vec![Pin::sha256("AAA=")]),
            ))
            .unwrap();
        let headers = store.build(None).unwrap();
        assert_eq!(header(&headers, "Public-Key-Pins"), Some("max-age=60; pin-sha256=AAA="));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut store = PolicyStore::new();
        let snapshot = store.snapshot();
        store
            .update(&Overrides::new().with(HeaderKind::XFrameOptions, ValueMap::new().with("value", "deny")))
            .unwrap();

        assert_eq!(header(&snapshot.build(None).unwrap(), "X-Frame-Options"), Some("sameorigin"));
        assert_eq!(header(&store.build(None).unwrap(), "X-Frame-Options"), Some("deny"));
    }
}
