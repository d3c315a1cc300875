use super::kind::HeaderKind;
use super::value::ValueMap;
use crate::error::{HeaderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-header overrides passed to `build`, `update` and `rewrite`.
///
/// A `None` entry disables that header. Keys are resolved through
/// [`HeaderKind::from_key`] when deserializing, so `"X-Frame-Options"` and
/// `"X_Frame_Options"` are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(
    try_from = "BTreeMap<String, Option<ValueMap>>",
    into = "BTreeMap<String, Option<ValueMap>>"
)]
pub struct Overrides {
    entries: BTreeMap<HeaderKind, Option<ValueMap>>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse overrides from a JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override fields of one header
    pub fn with(mut self, kind: HeaderKind, values: ValueMap) -> Self {
        self.entries.insert(kind, Some(values));
        self
    }

    /// Disable one header entirely
    pub fn disable(mut self, kind: HeaderKind) -> Self {
        self.entries.insert(kind, None);
        self
    }

    /// Insert an entry by its string key
    pub fn insert_key(&mut self, key: &str, values: Option<ValueMap>) -> Result<()> {
        let kind = HeaderKind::from_key(key)?;
        self.entries.insert(kind, values);
        Ok(())
    }

    pub fn contains(&self, kind: HeaderKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// `Some(None)` means the header is disabled by this override
    pub fn get(&self, kind: HeaderKind) -> Option<Option<&ValueMap>> {
        self.entries.get(&kind).map(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HeaderKind, Option<&ValueMap>)> {
        self.entries.iter().map(|(kind, values)| (*kind, values.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<BTreeMap<String, Option<ValueMap>>> for Overrides {
    type Error = HeaderError;

    fn try_from(raw: BTreeMap<String, Option<ValueMap>>) -> Result<Self> {
        let mut overrides = Self::new();
        for (key, values) in raw {
            overrides.insert_key(&key, values)?;
        }
        Ok(overrides)
    }
}

impl From<Overrides> for BTreeMap<String, Option<ValueMap>> {
    fn from(overrides: Overrides) -> Self {
        overrides
            .entries
            .into_iter()
            .map(|(kind, values)| (kind.key().to_string(), values))
            .collect()
    }
}
