//! Data models for visitor identity and tracked properties

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How a visitor is identified.
///
/// The set is closed: a visitor is identified either by email address
/// (hashed into a pseudonymous identifier before it goes on the wire) or by
/// a caller-chosen opaque unique id (used verbatim). There is no third
/// state, so no invalid-mode handling exists anywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    /// Identify by email address. The visitor identifier is derived from a
    /// hash of the address; the address itself is stored as the `email`
    /// visitor property.
    Email(String),

    /// Identify by an opaque unique id, used as the visitor identifier
    /// without any transformation.
    UniqueId(String),
}

impl Identity {
    /// Email identity.
    pub fn email(value: impl Into<String>) -> Self {
        Identity::Email(value.into())
    }

    /// Unique-id identity.
    pub fn unique_id(value: impl Into<String>) -> Self {
        Identity::UniqueId(value.into())
    }
}

/// A scalar property value.
///
/// The wire format only carries strings, numbers and booleans, so that is
/// all this type admits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(value) => f.write_str(value),
            PropertyValue::Int(value) => write!(f, "{value}"),
            PropertyValue::Float(value) => write!(f, "{value}"),
            PropertyValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// String-keyed map of scalar properties.
///
/// Used both for visitor properties (reported with the `cv_` prefix) and
/// event properties (reported with the `ce_` prefix). Keys are unique;
/// setting a key again replaces the previous value. Iteration order is the
/// key order, so a given map always serializes the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    /// An empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a property by key.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    /// Remove a property, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Properties(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
