use super::kind::HeaderKind;
use super::schema::{schema, FieldRule, CSP_DIRECTIVES};
use super::value::{FieldValue, ValueMap};
use crate::error::{HeaderError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Every schema pattern, compiled once and anchored at the start
static SCHEMA_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    HeaderKind::ALL
        .into_iter()
        .flat_map(|kind| schema(kind).fields)
        .flat_map(|field| field.rules)
        .filter_map(|rule| match rule {
            FieldRule::Pattern(pattern) => Some(*pattern),
            _ => None,
        })
        .map(|pattern| {
            let regex = Regex::new(&format!("^(?:{pattern})")).expect("schema patterns are valid");
            (pattern, regex)
        })
        .collect()
});

/// Check a policy against the schema for `kind`.
///
/// Every field must be declared by the schema and its value must satisfy at
/// least one of the field's alternatives. CSP is checked against its fixed
/// directive set instead.
pub fn validate(kind: HeaderKind, values: &ValueMap) -> Result<()> {
    if kind == HeaderKind::Csp {
        return validate_csp(values);
    }

    let schema = schema(kind);
    for (field, value) in values.iter() {
        let Some(field_schema) = schema.field(field) else {
            return Err(HeaderError::UnknownField {
                kind,
                field: field.to_string(),
                allowed: schema.field_names().map(|f| format!("'{f}'")).collect(),
            });
        };

        if !field_schema.rules.iter().any(|rule| rule_matches(*rule, value)) {
            return Err(HeaderError::InvalidValue {
                kind,
                field: field.to_string(),
                value: value.to_string(),
                allowed: field_schema.rules.iter().map(ToString::to_string).collect(),
            });
        }
    }

    Ok(())
}

/// CSP directives are a closed set; sources must be lists
fn validate_csp(values: &ValueMap) -> Result<()> {
    for (directive, sources) in values.iter() {
        if !CSP_DIRECTIVES.contains(&directive) {
            return Err(HeaderError::UnknownDirective {
                directive: directive.to_string(),
                allowed: CSP_DIRECTIVES.iter().map(|d| format!("'{d}'")).collect(),
            });
        }

        if !sources.is_null() && sources.as_list().is_none() {
            return Err(HeaderError::InvalidValue {
                kind: HeaderKind::Csp,
                field: directive.to_string(),
                value: sources.to_string(),
                allowed: vec![FieldRule::List.to_string()],
            });
        }
    }

    Ok(())
}

fn rule_matches(rule: FieldRule, value: &FieldValue) -> bool {
    if value.is_null() {
        return true;
    }

    match rule {
        FieldRule::Any => true,
        FieldRule::Boolean => matches!(value, FieldValue::Bool(_)),
        FieldRule::List => value.is_list(),
        FieldRule::Pins => value.as_pins().is_some(),
        FieldRule::Pattern(pattern) => match (scalar(value), SCHEMA_PATTERNS.get(pattern)) {
            (Some(text), Some(regex)) => regex.is_match(&text),
            _ => false,
        },
        FieldRule::Exact(expected) => {
            scalar(value).is_some_and(|text| text.eq_ignore_ascii_case(expected))
        }
    }
}

/// String form of a scalar value; lists never match textual alternatives
fn scalar(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Bool(_) | FieldValue::Int(_) | FieldValue::Str(_) => Some(value.to_string()),
        _ => None,
    }
}
