//! OData query-string building and response envelopes.
//!
//! The Sync API is OData-flavored: collections come back wrapped in a
//! `value` array, list endpoints accept `$filter`/`$top`-style parameters,
//! and `/$count` endpoints return a bare integer body.

use serde::{Deserialize, Serialize};

/// Query options forwarded to OData list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ODataQuery {
    #[serde(rename = "$filter", skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(rename = "$select", skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    #[serde(rename = "$orderby", skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,
    #[serde(rename = "$top", skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,
    #[serde(rename = "$skip", skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn orderby(mut self, orderby: impl Into<String>) -> Self {
        self.orderby = Some(orderby.into());
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.select.is_none()
            && self.orderby.is_none()
            && self.top.is_none()
            && self.skip.is_none()
    }
}

/// The `{"value": [...]}` envelope wrapping every collection response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ODataList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

impl<T> ODataList<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.value
    }
}

/// Parse a `/$count` response body.
///
/// Older Sync builds quote the integer, newer ones do not.
pub fn parse_count(body: &str) -> Option<u64> {
    body.trim().trim_matches('"').parse().ok()
}

/// Escape and percent-encode an OData key value for use inside quotes.
///
/// Embedded single quotes double per the OData key rules.
pub fn key_value(key: &str) -> String {
    let escaped = key.replace('\'', "''");
    let mut encoded = String::with_capacity(escaped.len());
    for b in escaped.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'\'' => {
                encoded.push(b as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", b)),
        }
    }
    encoded
}

/// Build a single-quoted OData key segment, e.g. `jobs('Name')`.
pub fn key_segment(key: &str) -> String {
    format!("('{}')", key_value(key))
}
