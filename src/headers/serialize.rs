use super::kind::HeaderKind;
use super::schema::{schema, CSP_DIRECTIVES};
use super::value::{FieldValue, ValueMap};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// CSP sources that must be wrapped in single quotes on the wire
static QUOTED_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:self|none|unsafe-inline|unsafe-eval|sha[0-9]+-[\w=-]+|nonce-[\w=-]+)")
        .expect("quoted source pattern is valid")
});

const REPORT_ONLY_SUFFIX: &str = "-Report-Only";

/// A serialized header ready to attach to a response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecurityHeader {
    pub name: String,
    pub value: String,
}

impl fmt::Display for SecurityHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Header name, with `-Report-Only` appended for CSP and HPKP when requested
pub fn header_name(kind: HeaderKind, report_only: bool) -> String {
    if report_only && kind.supports_report_only() {
        format!("{}{}", kind.header_name(), REPORT_ONLY_SUFFIX)
    } else {
        kind.header_name().to_string()
    }
}

/// Render a validated policy into its header name and wire value.
///
/// Returns `None` for the value when any field is null, meaning the header
/// must not be emitted.
pub fn serialize(kind: HeaderKind, values: &ValueMap, report_only: bool) -> (String, Option<String>) {
    let name = header_name(kind, report_only);
    if values.has_null() {
        return (name, None);
    }

    let value = match kind {
        HeaderKind::Csp => serialize_csp(values),
        _ => serialize_fields(kind, values),
    };

    (name, Some(value))
}

fn serialize_fields(kind: HeaderKind, values: &ValueMap) -> String {
    let mut tokens: Vec<String> = Vec::new();

    for field in schema(kind).field_names() {
        let Some(value) = values.get(field) else {
            continue;
        };

        match value {
            _ if field == "value" => tokens.insert(0, value.to_string()),
            FieldValue::Bool(true) => tokens.push(field.to_string()),
            FieldValue::Bool(false) => {}
            FieldValue::Pins(pins) => {
                // one token per tag so consecutive pins stay delimited
                for pin in pins {
                    tokens.extend(pin.iter().map(|(tag, digest)| format!("pin-{tag}={digest}")));
                }
            }
            // only an empty pin list validates as a plain list
            FieldValue::List(_) => {}
            _ => tokens.push(format!("{field}={value}")),
        }
    }

    tokens.join("; ")
}

fn serialize_csp(values: &ValueMap) -> String {
    let directives: Vec<String> = CSP_DIRECTIVES
        .iter()
        .filter_map(|directive| {
            let sources = values.get(directive)?.as_list()?;
            let joined = sources
                .iter()
                .map(|source| {
                    if QUOTED_SOURCE.is_match(source) {
                        format!("'{source}'")
                    } else {
                        source.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then(|| format!("{directive} {joined}"))
        })
        .collect();

    directives.join("; ")
}
