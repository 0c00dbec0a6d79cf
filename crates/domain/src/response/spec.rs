//! Response types returned by a transport

use serde::{Deserialize, Serialize};

use crate::status;

/// Response headers, each name mapped to every value it was sent with.
///
/// Lookups are case-insensitive; the original spelling of names is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseHeaders {
    items: Vec<(String, Vec<String>)>,
}

impl ResponseHeaders {
    /// Creates an empty header set.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends a value, grouping it with earlier values of the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .items
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some((_, values)) => values.push(value),
            None => self.items.push((name, vec![value])),
        }
    }

    /// Returns every value sent for the named header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.items
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map_or(&[], |(_, values)| values.as_slice())
    }

    /// Returns the first value of the named header.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Returns true if the named header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }

    /// Iterates over `(name, values)` pairs in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.items
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns the number of distinct header names.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for ResponseHeaders {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// A raw HTTP response as handed back by a transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: ResponseHeaders,
    /// Undecoded response body
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, headers: ResponseHeaders, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Creates a response with no headers.
    #[must_use]
    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, ResponseHeaders::new(), body)
    }

    /// Returns true if the status code is below 300.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status < status::MULTIPLE_CHOICES
    }

    /// Returns the `Retry-After` delay in whole seconds when it is a positive integer.
    ///
    /// HTTP-date values are not interpreted and yield `None`.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.headers
            .first(status::RETRY_AFTER_HEADER)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
    }
}
