//! Query string assembly for API requests.
//!
//! Parameters are only recorded when they carry a value: empty strings, zero
//! counts and false flags are left out rather than sent empty. Keys are
//! emitted in sorted order so URLs are stable.

use std::collections::BTreeMap;
use std::fmt::Display;

use url::form_urlencoded;

/// An ordered set of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: BTreeMap<String, Vec<String>>,
}

impl Query {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing earlier values. Always recorded.
    pub fn set(mut self, key: &str, value: impl Display) -> Self {
        self.params.insert(key.to_string(), vec![value.to_string()]);
        self
    }

    /// Append a value for `key`, keeping earlier values. Always recorded.
    pub fn add(mut self, key: &str, value: impl Display) -> Self {
        self.params
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    /// Set a string parameter when it is non-empty.
    pub fn string(self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.set(key, value)
        }
    }

    /// Set an optional string parameter when present and non-empty.
    pub fn opt_string(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.string(key, v),
            None => self,
        }
    }

    /// Set an integer parameter when it is greater than zero.
    pub fn int(self, key: &str, value: impl Into<i64>) -> Self {
        let value = value.into();
        if value > 0 {
            self.set(key, value)
        } else {
            self
        }
    }

    /// Set an optional integer parameter when present, including zero.
    pub fn opt_int(self, key: &str, value: Option<impl Into<i64>>) -> Self {
        match value {
            Some(v) => self.set(key, v.into()),
            None => self,
        }
    }

    /// Set a flag to `true` when it is set; false flags are left out.
    pub fn flag(self, key: &str, value: bool) -> Self {
        if value {
            self.set(key, true)
        } else {
            self
        }
    }

    /// Set a tri-state flag: absent when `None`, otherwise sent as given.
    pub fn opt_bool(self, key: &str, value: Option<bool>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    /// Set a list parameter as a single comma-joined value when non-empty.
    pub fn joined<S: AsRef<str>>(self, key: &str, values: &[S]) -> Self {
        if values.is_empty() {
            return self;
        }
        let joined = values
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        self.set(key, joined)
    }

    /// Add every value of a list as a repeated key.
    pub fn repeated<V: Display>(mut self, key: &str, values: &[V]) -> Self {
        for value in values {
            self = self.add(key, value);
        }
        self
    }

    /// Check if no parameters were recorded.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get the values recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(Vec::as_slice)
    }

    /// Encode as `application/x-www-form-urlencoded`, sorted by key.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.params {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    /// Append the encoded query to `path`, or return `path` unchanged when empty.
    pub fn apply(&self, path: impl Into<String>) -> String {
        let mut path = path.into();
        if !self.is_empty() {
            path.push('?');
            path.push_str(&self.encode());
        }
        path
    }
}
