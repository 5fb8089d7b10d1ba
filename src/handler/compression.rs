//! Gzip negotiation from `Accept-Encoding`.
//!
//! Only token presence matters: quality values are ignored, so
//! `gzip;q=0` still counts as advertised.

use std::io::{self, Write};

use axum::http::header::ACCEPT_ENCODING;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::exchange::{Exchange, ExchangeError};
use crate::handler::Handler;

/// True when any comma-separated token of `value` is exactly `gzip`.
pub fn accepts_gzip(value: &str) -> bool {
    value.split(',').any(|token| {
        let coding = token.split(';').next().unwrap_or_default().trim();
        coding.eq_ignore_ascii_case("gzip")
    })
}

/// Gzip `bytes` in one shot.
pub fn gzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

impl Handler {
    /// Switch the response to gzip if the client advertised it.
    ///
    /// Must run before commit; afterwards it fails with [`ExchangeError::Committed`]
    /// and leaves the exchange untouched. Returns whether gzip was enabled.
    pub fn enable_compression_if_supported(&self, ex: &mut Exchange) -> Result<bool, ExchangeError> {
        let supported = ex
            .request_headers()
            .get_all(ACCEPT_ENCODING.as_str())
            .iter()
            .any(|value| accepts_gzip(value));
        if ex.is_committed() {
            return Err(ExchangeError::Committed);
        }
        if supported {
            ex.enable_gzip()?;
        }
        Ok(supported)
    }
}
