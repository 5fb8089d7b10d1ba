//! `If-Modified-Since` evaluation.
//!
//! # Design Decisions
//! - A malformed validator is treated exactly like an absent one
//! - RFC 1123 dates with a one-digit day are accepted alongside IMF-fixdate
//! - RFC 850 and asctime forms are accepted as well

use std::time::SystemTime;

use axum::http::header::IF_MODIFIED_SINCE;

use crate::exchange::Exchange;
use crate::handler::Handler;

/// Parse an HTTP-date. Second resolution; `None` if unparsable.
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    let value = value.trim();
    if let Ok(time) = httpdate::parse_http_date(value) {
        return Some(time);
    }
    pad_single_digit_day(value).and_then(|padded| httpdate::parse_http_date(&padded).ok())
}

/// `Thu, 1 Jan 1970 ...` → `Thu, 01 Jan 1970 ...`
fn pad_single_digit_day(value: &str) -> Option<String> {
    let (weekday, rest) = value.split_once(", ")?;
    let (day, rest) = rest.split_once(' ')?;
    if day.len() == 1 && day.as_bytes()[0].is_ascii_digit() {
        Some(format!("{}, 0{} {}", weekday, day, rest))
    } else {
        None
    }
}

impl Handler {
    /// Instant carried by `If-Modified-Since`, or `None` when absent or malformed.
    pub fn if_modified_since(&self, ex: &Exchange) -> Option<SystemTime> {
        let value = ex.request_headers().get_first(IF_MODIFIED_SINCE.as_str())?;
        let parsed = parse_http_date(value);
        if parsed.is_none() {
            tracing::debug!(value = %value, "Ignoring malformed If-Modified-Since");
        }
        parsed
    }
}
