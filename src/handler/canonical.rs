//! Loggable rendering of request headers.

use crate::exchange::{canonical_name, Exchange, HeaderSet};
use crate::handler::Handler;

/// Render headers as `Name: value, Name: value` in insertion order.
///
/// A field with several values appears once per value; a field without
/// values renders with an empty value.
pub fn loggable_headers(headers: &HeaderSet) -> String {
    let mut parts = Vec::with_capacity(headers.len());
    for (name, values) in headers.iter() {
        let name = canonical_name(name);
        if values.is_empty() {
            parts.push(format!("{}: ", name));
        }
        for value in values {
            parts.push(format!("{}: {}", name, value));
        }
    }
    parts.join(", ")
}

impl Handler {
    /// Request headers of `ex` in a stable form for diagnostics.
    pub fn loggable_request_headers(&self, ex: &Exchange) -> String {
        loggable_headers(ex.request_headers())
    }
}
