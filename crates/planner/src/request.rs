//! Typed JSON-API query parameters.
//!
//! A request arrives as a nested mapping with the canonical keys `filter`,
//! `fields`, `sort` and `include`. Every key is optional. Parsing checks the
//! structure only; values are never coerced into a different shape.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Sparse fieldsets: resource type → comma-separated field names.
pub type Fields = BTreeMap<String, String>;

/// A filter value: a scalar for attributes, a nested mapping for relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(String),
    Nested(FilterMap),
}

impl FilterValue {
    /// The scalar value, if this is one.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FilterValue::Scalar(s) => Some(s),
            FilterValue::Nested(_) => None,
        }
    }

    /// The nested mapping, if this is one.
    pub fn as_nested(&self) -> Option<&FilterMap> {
        match self {
            FilterValue::Nested(map) => Some(map),
            FilterValue::Scalar(_) => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<FilterMap> for FilterValue {
    fn from(value: FilterMap) -> Self {
        FilterValue::Nested(value)
    }
}

/// Filter entries in the order they were supplied.
///
/// Inserting an existing key replaces its value in place, so iteration order
/// stays the order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterMap {
    entries: Vec<(String, FilterValue)>,
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn parse(param: &str, value: &Value) -> Result<Self> {
        let Value::Object(object) = value else {
            return Err(Error::shape(param, "expected a mapping"));
        };

        let mut map = FilterMap::new();
        for (key, value) in object {
            let value = match value {
                Value::String(s) => FilterValue::Scalar(s.clone()),
                Value::Object(_) => {
                    FilterValue::Nested(FilterMap::parse(&format!("{param}[{key}]"), value)?)
                }
                _ => {
                    return Err(Error::shape(
                        format!("{param}[{key}]"),
                        "expected a string or a mapping",
                    ));
                }
            };
            map.insert(key.clone(), value);
        }
        Ok(map)
    }
}

impl FromIterator<(String, FilterValue)> for FilterMap {
    fn from_iter<I: IntoIterator<Item = (String, FilterValue)>>(iter: I) -> Self {
        let mut map = FilterMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for FilterMap {
    type Item = (String, FilterValue);
    type IntoIter = std::vec::IntoIter<(String, FilterValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for FilterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Parsed query parameters for one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Request {
    /// Filters; an empty mapping means no filtering.
    #[serde(skip_serializing_if = "FilterMap::is_empty")]
    pub filter: FilterMap,

    /// Sparse fieldsets keyed by resource type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Fields>,

    /// Comma-separated sort terms, `-` prefix for descending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Comma-separated dotted relationship paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a request from a JSON value.
    ///
    /// Unrecognized top-level parameters (e.g. `page`) are ignored.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(params) = value else {
            return Err(Error::shape("request", "expected a mapping"));
        };

        let mut request = Request::new();
        for (key, value) in params {
            match key.as_str() {
                "filter" => request.filter = FilterMap::parse("filter", value)?,
                "fields" => request.fields = Some(parse_fields(value)?),
                "sort" => request.sort = Some(expect_string("sort", value)?),
                "include" => request.include = Some(expect_string("include", value)?),
                other => tracing::trace!(param = other, "ignoring unrecognized request parameter"),
            }
        }
        Ok(request)
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filter.insert(key, value);
        self
    }

    pub fn with_fields(mut self, resource_type: &str, fields: &str) -> Self {
        self.fields
            .get_or_insert_with(Fields::new)
            .insert(resource_type.to_string(), fields.to_string());
        self
    }

    pub fn with_sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    pub fn with_include(mut self, include: &str) -> Self {
        self.include = Some(include.to_string());
        self
    }

    /// A request carrying only `filter`, the shape handed to join callbacks.
    pub fn filter_only(filter: FilterMap) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

impl FromStr for Request {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)
            .map_err(|e| Error::shape("request", format!("invalid JSON: {e}")))?;
        Request::from_value(&value)
    }
}

impl TryFrom<Value> for Request {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Request::from_value(&value)
    }
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Request::from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn expect_string(param: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::shape(param, "expected a string"))
}

fn parse_fields(value: &Value) -> Result<Fields> {
    let Value::Object(object) = value else {
        return Err(Error::shape("fields", "expected a mapping"));
    };
    object
        .iter()
        .map(|(resource_type, list)| {
            expect_string(&format!("fields[{resource_type}]"), list)
                .map(|list| (resource_type.clone(), list))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_canonical_keys() {
        let request = Request::from_value(&json!({
            "filter": {"tag": "animals", "comments": {"body": "Great"}},
            "fields": {"articles": "title,body"},
            "sort": "-published",
            "include": "comments.user"
        }))
        .unwrap();

        assert_eq!(request.filter.len(), 2);
        assert_eq!(
            request.filter.get("tag").and_then(FilterValue::as_scalar),
            Some("animals")
        );
        let nested = request.filter.get("comments").and_then(FilterValue::as_nested);
        assert_eq!(
            nested.and_then(|m| m.get("body")),
            Some(&FilterValue::from("Great"))
        );
        assert_eq!(
            request.fields.unwrap().get("articles").map(String::as_str),
            Some("title,body")
        );
        assert_eq!(request.sort.as_deref(), Some("-published"));
        assert_eq!(request.include.as_deref(), Some("comments.user"));
    }

    #[test]
    fn absent_keys_are_empty() {
        let request = Request::from_value(&json!({})).unwrap();
        assert_eq!(request, Request::new());
    }

    #[test]
    fn filter_order_is_preserved() {
        let request: Request = r#"{"filter": {"z": "1", "a": "2", "m": "3"}}"#.parse().unwrap();
        let keys: Vec<&str> = request.filter.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn fields_must_be_a_mapping() {
        let err = Request::from_value(&json!({"fields": "title"})).unwrap_err();
        assert!(matches!(err, Error::Shape { ref param, .. } if param == "fields"));
    }

    #[test]
    fn numeric_filter_value_is_rejected() {
        let err = Request::from_value(&json!({"filter": {"author": {"age": 3}}})).unwrap_err();
        match err {
            Error::Shape { param, .. } => assert_eq!(param, "filter[author][age]"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sort_must_be_a_string() {
        let err = Request::from_value(&json!({"sort": ["a"]})).unwrap_err();
        assert!(matches!(err, Error::Shape { ref param, .. } if param == "sort"));
    }

    #[test]
    fn insert_replaces_in_place() {
        let map = FilterMap::new().with("a", "1").with("b", "2").with("a", "3");
        let entries: Vec<(&str, &FilterValue)> = map.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("a", &FilterValue::from("3")));
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let request = Request::new()
            .with_filter("title", "Rust")
            .with_include("author");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"filter": {"title": "Rust"}, "include": "author"})
        );
    }

    #[test]
    fn deserializes_through_serde() {
        let request: Request = serde_json::from_value(json!({"sort": "title"})).unwrap();
        assert_eq!(request.sort.as_deref(), Some("title"));
    }
}
