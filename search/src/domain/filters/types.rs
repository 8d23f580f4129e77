//! Filter value and filter set types
//!
//! A filter set is the object built by the advisor search form. Keys are
//! filter names, values are one of a small closed set of shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Value of a single search filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// JSON `null`
    Null,
    /// Free text or a range token such as `10000000-50000000`
    Text(String),
    /// Multi-select values
    List(Vec<String>),
    /// Yes/no toggle
    Flag(bool),
}

impl FilterValue {
    /// Empty values are skipped by every filter pass.
    ///
    /// `Flag(false)` is a real answer and is not empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Flag(_) => false,
        }
    }

    /// Name of the value shape, as used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "string",
            Self::List(_) => "array",
            Self::Flag(_) => "boolean",
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Error raised when a JSON document does not describe a filter set
#[derive(Debug, thiserror::Error)]
pub enum FilterParseError {
    #[error("Invalid filter JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Filters must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("Filter '{name}' has unsupported value: {value}")]
    UnsupportedValue { name: String, value: String },
}

/// Insertion-ordered mapping of filter name to value
///
/// Key order is significant: the optimizer emits filters in the order the
/// query builder should add clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    entries: Vec<(String, FilterValue)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter. An existing key keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FilterValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterValue> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries whose value is not empty, in insertion order
    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.iter().filter(|(_, v)| !v.is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalize user input before validation.
    ///
    /// Text is trimmed, list elements are trimmed and de-duplicated (first
    /// occurrence wins) and entries left empty are dropped.
    pub fn sanitized(&self) -> Self {
        let mut out = Self::new();
        for (name, value) in self.iter() {
            let cleaned = match value {
                FilterValue::Text(s) => FilterValue::Text(s.trim().to_string()),
                FilterValue::List(items) => {
                    let mut seen: Vec<String> = Vec::with_capacity(items.len());
                    for item in items {
                        let item = item.trim();
                        if !item.is_empty() && !seen.iter().any(|s| s == item) {
                            seen.push(item.to_string());
                        }
                    }
                    FilterValue::List(seen)
                }
                other => other.clone(),
            };
            if !cleaned.is_empty() {
                out.entries.push((name.to_string(), cleaned));
            }
        }
        out
    }

    /// Parse a JSON object into a filter set, keeping key order
    pub fn from_json_str(json: &str) -> Result<Self, FilterParseError> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: JsonValue) -> Result<Self, FilterParseError> {
        let map = match value {
            JsonValue::Object(map) => map,
            other => return Err(FilterParseError::NotAnObject(json_type_name(&other))),
        };

        let mut set = Self::new();
        for (name, raw) in map {
            let parsed = serde_json::from_value::<FilterValue>(raw.clone()).map_err(|_| {
                FilterParseError::UnsupportedValue {
                    name: name.clone(),
                    value: raw.to_string(),
                }
            })?;
            set.entries.push((name, parsed));
        }
        Ok(set)
    }

    pub fn to_json_value(&self) -> JsonValue {
        let map = self
            .entries
            .iter()
            .map(|(k, v)| {
                let value = serde_json::to_value(v).unwrap_or(JsonValue::Null);
                (k.clone(), value)
            })
            .collect();
        JsonValue::Object(map)
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl Serialize for FilterSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json_value(value).map_err(serde::de::Error::custom)
    }
}

impl<K, V> FromIterator<(K, V)> for FilterSet
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Typed form state for the advisor search
///
/// Field names serialize to the filter names used in the rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvisorFilters {
    pub principal_office_city: Option<String>,
    /// AUM range token, e.g. `10000000-50000000` or `500000000+`
    pub assets_under_management: Option<String>,
    pub account_minimum: Option<String>,
    pub custodians: Vec<String>,
    pub discretionary_authority: Option<bool>,
    pub fees: Vec<String>,
    pub performance_fees: Option<bool>,
    pub professional_designations: Vec<String>,
}

impl From<&AdvisorFilters> for FilterSet {
    fn from(f: &AdvisorFilters) -> Self {
        FilterSet::new()
            .with("principalOfficeCity", f.principal_office_city.clone())
            .with("assetsUnderManagement", f.assets_under_management.clone())
            .with("accountMinimum", f.account_minimum.clone())
            .with("custodians", f.custodians.clone())
            .with("discretionaryAuthority", f.discretionary_authority)
            .with("fees", f.fees.clone())
            .with("performanceFees", f.performance_fees)
            .with("professionalDesignations", f.professional_designations.clone())
    }
}
