//! Reconstruction of the absolute URI a client addressed.
//!
//! HTTP/1.0 clients may omit `Host`; the handler's fallback host stands in.
//! The path is used verbatim and no port is ever added.

use axum::http::header::HOST;
use axum::http::Uri;

use crate::exchange::Exchange;
use crate::handler::Handler;

impl Handler {
    /// Absolute URI for `ex`: transport scheme, `Host` or fallback host, raw path.
    ///
    /// Fails only when the client sent a `Host` value that is not a valid authority.
    pub fn request_uri(&self, ex: &Exchange) -> Result<Uri, axum::http::Error> {
        let authority = ex
            .request_headers()
            .get_first(HOST.as_str())
            .unwrap_or(self.fallback_hostname.as_str());
        Uri::builder()
            .scheme(ex.scheme().clone())
            .authority(authority)
            .path_and_query(ex.path())
            .build()
    }
}
