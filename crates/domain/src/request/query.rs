//! Query parameter types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// An ordered collection of query parameters.
///
/// Values are JSON scalars or arrays of scalars. Flattening follows the
/// Service's conventions: strings verbatim, numbers in decimal, booleans as
/// `true`/`false`, nulls omitted, and arrays repeat the key once per element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams {
    items: Vec<(String, Value)>,
}

impl QueryParams {
    /// Creates an empty query parameter collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends a parameter, keeping insertion order.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.items.push((key.into(), value.into()));
    }

    /// Returns all parameters in insertion order.
    #[must_use]
    pub fn all(&self) -> &[(String, Value)] {
        &self.items
    }

    /// Flattens the parameters into string pairs ready for URL encoding.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQueryParam` when a value is an object or an array
    /// containing something other than scalars.
    pub fn to_pairs(&self) -> DomainResult<Vec<(String, String)>> {
        let mut pairs = Vec::with_capacity(self.items.len());
        for (key, value) in &self.items {
            match value {
                Value::Array(elements) => {
                    for element in elements {
                        if let Some(text) = scalar_to_string(key, element)? {
                            pairs.push((key.clone(), text));
                        }
                    }
                }
                other => {
                    if let Some(text) = scalar_to_string(key, other)? {
                        pairs.push((key.clone(), text));
                    }
                }
            }
        }
        Ok(pairs)
    }

    /// Returns the number of parameters.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn scalar_to_string(key: &str, value: &Value) -> DomainResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(DomainError::InvalidQueryParam {
            key: key.to_string(),
            reason: "nested values cannot be encoded".to_string(),
        }),
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
