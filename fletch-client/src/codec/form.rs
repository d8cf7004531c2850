//! URL-encoded form codec.
//!
//! Sequences are written by repeating the key (`age=1&age=3`), never with a
//! `key[]` suffix. The same encoding is used for query strings.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{pooled_body, unsupported};
use crate::{HttpClientError, Payload, Result};

/// Key-ordered multi-valued form data.
///
/// Keys are kept sorted; values for one key keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues {
    inner: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    /// Create empty form values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` string.
    pub fn parse(input: &[u8]) -> Self {
        url::form_urlencoded::parse(input)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Append a value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// Replace every value for `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), vec![value.into()]);
    }

    /// Append a value, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values for `key`.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Remove `key` and its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.inner.remove(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Encode as `application/x-www-form-urlencoded`.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Flatten a serializable record into form values.
    ///
    /// Field names (after `#[serde(rename)]`) become keys, sequences repeat
    /// the key, nested records use dotted keys and null fields are skipped.
    pub fn from_record<T: Serialize + ?Sized>(record: &T) -> Result<Self> {
        let value = serde_json::to_value(record).map_err(|e| HttpClientError::encode("form", e))?;
        Self::from_value(value)
    }

    pub(crate) fn from_value(value: Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(HttpClientError::UnsupportedData {
                codec: "form",
                payload: "non-record value",
            });
        };
        let mut values = Self::new();
        for (key, field) in fields {
            values.flatten(key, field);
        }
        Ok(values)
    }

    fn flatten(&mut self, key: String, value: Value) {
        match value {
            Value::Null => {}
            Value::Bool(b) => self.append(key, b.to_string()),
            Value::Number(n) => self.append(key, n.to_string()),
            Value::String(s) => self.append(key, s),
            Value::Array(items) => {
                for item in items {
                    self.flatten(key.clone(), item);
                }
            }
            Value::Object(fields) => {
                for (child, field) in fields {
                    let mut nested = String::with_capacity(key.len() + child.len() + 1);
                    let _ = write!(nested, "{key}.{child}");
                    self.flatten(nested, field);
                }
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.append(k, v);
        }
        values
    }
}

pub(crate) fn encode(payload: Payload<'_>) -> Result<Option<reqwest::Body>> {
    let encoded = match payload {
        Payload::Form(values) => values.encode(),
        Payload::Record(record) => FormValues::from_value(record.to_value()?)?.encode(),
        Payload::Text(text) => text.into_owned(),
        other => return Err(unsupported("form", &other)),
    };
    pooled_body(|buf| {
        buf.extend_from_slice(encoded.as_bytes());
        Ok(())
    })
}

/// Encode a payload as a query string.
pub(crate) fn query_string(payload: Payload<'_>) -> Result<String> {
    match payload {
        Payload::Empty => Ok(String::new()),
        Payload::Form(values) => Ok(values.encode()),
        Payload::Record(record) => Ok(FormValues::from_value(record.to_value()?)?.encode()),
        Payload::Text(text) => Ok(text.into_owned()),
        other => Err(unsupported("form", &other)),
    }
}

/// Decode a form body into [`FormValues`].
pub fn decode_values(body: &[u8]) -> Result<FormValues> {
    Ok(FormValues::parse(body))
}

/// Decode a form body into a flat record.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_urlencoded::from_bytes(body).map_err(|e| HttpClientError::decode("form", e))
}
