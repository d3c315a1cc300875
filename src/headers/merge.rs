//! Merge strategies for combining overrides with a stored policy.

use super::kind::HeaderKind;
use super::schema::{empty_csp, CSP_DIRECTIVES};
use super::value::{FieldValue, Pin, ValueMap};

/// How overrides combine with the stored policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Overrides win per field, the stored policy fills the gaps and list
    /// fields accumulate
    Update,
    /// Overrides replace the stored policy
    Rewrite,
}

/// Merge `overrides` into `current` for one header kind.
///
/// A `None` override disables the header and always yields `None`. A `None`
/// current policy is treated as empty.
pub fn merge(
    mode: MergeMode,
    kind: HeaderKind,
    overrides: Option<ValueMap>,
    current: Option<&ValueMap>,
) -> Option<ValueMap> {
    let overrides = overrides?;

    let merged = match (mode, kind) {
        (MergeMode::Update, HeaderKind::Csp) => update_csp(overrides, current),
        (MergeMode::Update, HeaderKind::Hpkp) => update_hpkp(overrides, current),
        (MergeMode::Update, _) => fill_gaps(overrides, current),
        (MergeMode::Rewrite, HeaderKind::Csp) => rewrite_csp(overrides),
        (MergeMode::Rewrite, _) => overrides,
    };

    Some(merged)
}

fn fill_gaps(mut overrides: ValueMap, current: Option<&ValueMap>) -> ValueMap {
    if let Some(current) = current {
        for (field, value) in current.iter() {
            if !overrides.contains_key(field) {
                overrides.insert(field, value.clone());
            }
        }
    }
    overrides
}

/// Stored sources first, then any new override sources in the order given
fn update_csp(overrides: ValueMap, current: Option<&ValueMap>) -> ValueMap {
    let mut merged = current.cloned().unwrap_or_else(empty_csp);

    for (directive, value) in overrides.iter() {
        let Some(additions) = value.as_list() else {
            merged.insert(directive, value.clone());
            continue;
        };

        let mut sources: Vec<String> = merged
            .get(directive)
            .and_then(FieldValue::as_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        for source in additions {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }
        merged.insert(directive, sources);
    }

    merged
}

/// Generic gap fill, but override pins are prepended to the stored pins
fn update_hpkp(overrides: ValueMap, current: Option<&ValueMap>) -> ValueMap {
    let stored_pins = current
        .and_then(|c| c.get("pins"))
        .and_then(FieldValue::as_pins)
        .map(<[Pin]>::to_vec);
    let override_pins = overrides
        .get("pins")
        .and_then(FieldValue::as_pins)
        .map(<[Pin]>::to_vec);

    let mut merged = fill_gaps(overrides, current);
    if let (Some(mut pins), Some(stored)) = (override_pins, stored_pins) {
        pins.extend(stored);
        merged.insert("pins", pins);
    }
    merged
}

/// Every schema directive is reset unless the override names it
fn rewrite_csp(overrides: ValueMap) -> ValueMap {
    CSP_DIRECTIVES
        .iter()
        .map(|directive| {
            let value = overrides
                .get(directive)
                .cloned()
                .unwrap_or_else(|| FieldValue::List(Vec::new()));
            (*directive, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::schema::default_policy;

    fn sources(map: &ValueMap, directive: &str) -> Vec<String> {
        map.get(directive).and_then(FieldValue::as_list).unwrap().to_vec()
    }

    #[test]
    fn test_generic_update_fills_gaps() {
        let current = default_policy(HeaderKind::Hsts);
        let overrides = ValueMap::new().with("max-age", 600);
        let merged = merge(MergeMode::Update, HeaderKind::Hsts, Some(overrides), Some(&current)).unwrap();

        assert_eq!(merged.get("max-age"), Some(&FieldValue::Int(600)));
        assert_eq!(merged.get("includeSubDomains"), Some(&FieldValue::Bool(true)));
        assert_eq!(merged.get("preload"), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn test_generic_rewrite_drops_unmentioned_fields() {
        let current = default_policy(HeaderKind::Hsts);
        let overrides = ValueMap::new().with("max-age", 600);
        let merged = merge(MergeMode::Rewrite, HeaderKind::Hsts, Some(overrides), Some(&current)).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("max-age"), Some(&FieldValue::Int(600)));
    }

    #[test]
    fn test_none_override_disables() {
        let current = default_policy(HeaderKind::XFrameOptions);
        assert!(merge(MergeMode::Update, HeaderKind::XFrameOptions, None, Some(&current)).is_none());
        assert!(merge(MergeMode::Rewrite, HeaderKind::Csp, None, Some(&current)).is_none());
    }

    #[test]
    fn test_csp_update_unions_in_default_first_order() {
        let current = default_policy(HeaderKind::Csp)
            .with("script-src", vec!["self", "https://a.example.com"]);
        let overrides = ValueMap::new().with(
            "script-src",
            vec!["https://b.example.com", "self", "https://b.example.com"],
        );
        let merged = merge(MergeMode::Update, HeaderKind::Csp, Some(overrides), Some(&current)).unwrap();

        assert_eq!(
            sources(&merged, "script-src"),
            vec!["self", "https://a.example.com", "https://b.example.com"]
        );
        assert_eq!(sources(&merged, "report-uri"), vec!["/csp_report"]);
        assert_eq!(merged.len(), CSP_DIRECTIVES.len());
    }

    #[test]
    fn test_csp_rewrite_is_schema_anchored() {
        let current = default_policy(HeaderKind::Csp);
        let overrides = ValueMap::new().with("default-src", vec!["none"]);
        let merged = merge(MergeMode::Rewrite, HeaderKind::Csp, Some(overrides), Some(&current)).unwrap();

        assert_eq!(merged.len(), CSP_DIRECTIVES.len());
        assert_eq!(sources(&merged, "default-src"), vec!["none"]);
        assert!(sources(&merged, "report-uri").is_empty());
    }

    #[test]
    fn test_hpkp_update_prepends_pins() {
        let current = default_policy(HeaderKind::Hpkp).with("pins", vec![Pin::sha256("OLD=")]);
        let overrides = ValueMap::new().with("pins", vec![Pin::sha256("NEW=")]);
        let merged = merge(MergeMode::Update, HeaderKind::Hpkp, Some(overrides), Some(&current)).unwrap();

        assert_eq!(
            merged.get("pins"),
            Some(&FieldValue::Pins(vec![Pin::sha256("NEW="), Pin::sha256("OLD=")]))
        );
        assert_eq!(merged.get("report-uri"), Some(&FieldValue::from("/hpkp_report")));
    }

    #[test]
    fn test_hpkp_update_without_pins_keeps_stored_pins() {
        let current = default_policy(HeaderKind::Hpkp).with("pins", vec![Pin::sha256("OLD=")]);
        let overrides = ValueMap::new().with("max-age", 60);
        let merged = merge(MergeMode::Update, HeaderKind::Hpkp, Some(overrides), Some(&current)).unwrap();

        assert_eq!(merged.get("pins"), Some(&FieldValue::Pins(vec![Pin::sha256("OLD=")])));
    }

    #[test]
    fn test_update_against_disabled_policy() {
        let overrides = ValueMap::new().with("value", "deny");
        let merged = merge(MergeMode::Update, HeaderKind::XFrameOptions, Some(overrides.clone()), None).unwrap();
        assert_eq!(merged, overrides);

        let overrides = ValueMap::new().with("img-src", vec!["self"]);
        let merged = merge(MergeMode::Update, HeaderKind::Csp, Some(overrides), None).unwrap();
        assert_eq!(sources(&merged, "img-src"), vec!["self"]);
        assert!(sources(&merged, "report-uri").is_empty());
    }
}
