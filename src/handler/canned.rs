//! Complete fixed-content responses.

use std::io;

use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};

use crate::exchange::{BodyLength, Exchange, ExchangeError};
use crate::handler::compression::gzip;
use crate::handler::Handler;

impl Handler {
    /// Write `body` as the whole response and close the exchange.
    ///
    /// `Content-Length` is that of the bytes on the wire, compressed if gzip
    /// was negotiated. A `HEAD` request gets identical headers and no body.
    pub fn canned_respond(
        &self,
        ex: &mut Exchange,
        status: StatusCode,
        content_type: Option<&str>,
        body: &str,
    ) -> Result<(), ExchangeError> {
        if ex.is_committed() {
            return Err(ExchangeError::Committed);
        }
        if let Some(content_type) = content_type {
            ex.set_response_header_str(CONTENT_TYPE, content_type)?;
        }

        let mut payload = self.text_encoding.encode(body);
        if ex.is_gzip() {
            payload = gzip(&payload)?;
        }

        let length = u64::try_from(payload.len())
            .map_err(|_| io::Error::other("canned body length overflows u64"))?;
        ex.send_encoded_response_headers(status, BodyLength::Fixed(length))?;
        if ex.method() != Method::HEAD {
            ex.write_body(&payload)?;
        }
        ex.close()
    }
}
