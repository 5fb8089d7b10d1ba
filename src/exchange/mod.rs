//! Exchange: one request/response pair and its transmission state.
//!
//! # State Machine
//! ```text
//! Uncommitted ──send_response_headers──▶ Committed(body open) ──close──▶ Committed(closed)
//!      │                                        ▲
//!      └──────── send_response_headers(Empty) ──┘ (closed immediately)
//! ```
//!
//! # Design Decisions
//! - Commit is an explicit state, never inferred from buffering
//! - Status and headers are frozen at commit; later mutation is an error
//! - Gzip is a property of the body writer chosen at commit time

pub mod headers;
pub mod sink;

use std::io::{self, Write};

use axum::http::header::{CONTENT_ENCODING, CONTENT_LENGTH};
use axum::http::uri::Scheme;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version};
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

pub use headers::{canonical_name, HeaderSet};
pub use sink::{BufferedResponse, BufferedSink, ResponseSink};

/// Errors raised by misuse of an exchange or by its sink.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Status or headers changed after bytes were handed to the transport.
    #[error("response already committed")]
    Committed,

    /// Body written before the status line was sent.
    #[error("response not committed yet")]
    NotCommitted,

    /// Body written after it was closed, or to a response declared bodiless.
    #[error("response body is closed")]
    Closed,

    /// A header value could not be represented on the wire.
    #[error("invalid header value for {0}")]
    InvalidHeader(HeaderName),

    #[error("response I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Declared body framing at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLength {
    /// No body follows; the exchange closes on commit.
    Empty,
    /// Exactly this many bytes follow, as they appear on the wire.
    Fixed(u64),
    /// Length unknown; the transport chunks or closes to delimit.
    Streaming,
}

/// Adapts a sink to `io::Write` so the gzip encoder can sit on top of it.
struct SinkWriter(Box<dyn ResponseSink>);

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Output {
    Pending(Box<dyn ResponseSink>),
    Identity(SinkWriter),
    Gzip(GzEncoder<SinkWriter>),
    Closed,
}

/// One inbound request and the response being produced for it.
pub struct Exchange {
    method: Method,
    path: String,
    version: Version,
    scheme: Scheme,
    request_headers: HeaderSet,
    status: Option<StatusCode>,
    response_headers: HeaderMap,
    gzip: bool,
    output: Output,
}

impl Exchange {
    /// Create an HTTP/1.1 exchange over plain `http`.
    pub fn new(method: Method, path: impl Into<String>, sink: impl ResponseSink + 'static) -> Self {
        Self {
            method,
            path: path.into(),
            version: Version::HTTP_11,
            scheme: Scheme::HTTP,
            request_headers: HeaderSet::new(),
            status: None,
            response_headers: HeaderMap::new(),
            gzip: false,
            output: Output::Pending(Box::new(sink)),
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_request_headers(mut self, headers: HeaderSet) -> Self {
        self.request_headers = headers;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request target, including any query, exactly as received.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn request_headers(&self) -> &HeaderSet {
        &self.request_headers
    }

    pub fn request_headers_mut(&mut self) -> &mut HeaderSet {
        &mut self.request_headers
    }

    /// Status sent at commit, `None` while uncommitted.
    pub fn response_code(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// True once any part of the response has been handed to the sink.
    pub fn is_committed(&self) -> bool {
        !matches!(self.output, Output::Pending(_))
    }

    /// True when body writes pass through a gzip encoder.
    pub fn is_gzip(&self) -> bool {
        self.gzip
    }

    pub fn set_response_header(
        &mut self,
        name: HeaderName,
        value: HeaderValue,
    ) -> Result<(), ExchangeError> {
        self.ensure_uncommitted()?;
        self.response_headers.insert(name, value);
        Ok(())
    }

    /// Parse `value` and set it, rejecting bytes not allowed in a header.
    pub fn set_response_header_str(
        &mut self,
        name: HeaderName,
        value: &str,
    ) -> Result<(), ExchangeError> {
        let value =
            HeaderValue::from_str(value).map_err(|_| ExchangeError::InvalidHeader(name.clone()))?;
        self.set_response_header(name, value)
    }

    /// Drop every response header and the gzip flag set so far.
    pub fn reset_response(&mut self) -> Result<(), ExchangeError> {
        self.ensure_uncommitted()?;
        self.response_headers.clear();
        self.gzip = false;
        Ok(())
    }

    /// Mark the response gzip-encoded; body writes after commit are compressed.
    pub fn enable_gzip(&mut self) -> Result<(), ExchangeError> {
        self.set_response_header(CONTENT_ENCODING, HeaderValue::from_static("gzip"))?;
        self.gzip = true;
        Ok(())
    }

    /// Commit status and headers. `length` counts uncompressed bytes, so a
    /// gzip response drops `Content-Length` and streams.
    pub fn send_response_headers(
        &mut self,
        status: StatusCode,
        length: BodyLength,
    ) -> Result<(), ExchangeError> {
        let length = match length {
            BodyLength::Fixed(_) if self.gzip => BodyLength::Streaming,
            other => other,
        };
        self.commit(status, length, self.gzip)
    }

    /// Commit for a body the caller has already content-encoded. `length`
    /// is the exact wire length and writes bypass the gzip encoder.
    pub fn send_encoded_response_headers(
        &mut self,
        status: StatusCode,
        length: BodyLength,
    ) -> Result<(), ExchangeError> {
        self.commit(status, length, false)
    }

    /// Write body bytes through the encoder chosen at commit.
    pub fn write_body(&mut self, bytes: &[u8]) -> Result<(), ExchangeError> {
        match &mut self.output {
            Output::Pending(_) => Err(ExchangeError::NotCommitted),
            Output::Identity(writer) => Ok(writer.write_all(bytes)?),
            Output::Gzip(encoder) => Ok(encoder.write_all(bytes)?),
            Output::Closed => Err(ExchangeError::Closed),
        }
    }

    /// Finish the body. Closing twice is a no-op; closing before commit is an error.
    pub fn close(&mut self) -> Result<(), ExchangeError> {
        match std::mem::replace(&mut self.output, Output::Closed) {
            Output::Pending(sink) => {
                self.output = Output::Pending(sink);
                Err(ExchangeError::NotCommitted)
            }
            Output::Identity(mut writer) => Ok(writer.0.finish()?),
            Output::Gzip(encoder) => {
                let mut writer = encoder.finish()?;
                Ok(writer.0.finish()?)
            }
            Output::Closed => Ok(()),
        }
    }

    fn commit(
        &mut self,
        status: StatusCode,
        length: BodyLength,
        encode: bool,
    ) -> Result<(), ExchangeError> {
        self.ensure_uncommitted()?;
        let Output::Pending(mut sink) = std::mem::replace(&mut self.output, Output::Closed) else {
            unreachable!("uncommitted exchange always holds a pending sink");
        };
        match length {
            BodyLength::Fixed(len) => {
                self.response_headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
            }
            BodyLength::Streaming => {
                self.response_headers.remove(CONTENT_LENGTH);
            }
            BodyLength::Empty => {}
        }
        self.status = Some(status);

        // From here on the exchange counts as committed even if the sink fails
        // part way, since some bytes may already be on the wire.
        sink.send_head(status, &self.response_headers)?;
        self.output = match length {
            BodyLength::Empty => {
                sink.finish()?;
                Output::Closed
            }
            _ if encode => Output::Gzip(GzEncoder::new(SinkWriter(sink), Compression::default())),
            _ => Output::Identity(SinkWriter(sink)),
        };
        Ok(())
    }

    fn ensure_uncommitted(&self) -> Result<(), ExchangeError> {
        if self.is_committed() {
            Err(ExchangeError::Committed)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("version", &self.version)
            .field("status", &self.status)
            .field("committed", &self.is_committed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn exchange() -> (Exchange, BufferedSink) {
        let sink = BufferedSink::new();
        (Exchange::new(Method::GET, "/", sink.clone()), sink)
    }

    #[test]
    fn commit_freezes_headers() {
        let (mut ex, sink) = exchange();
        assert!(!ex.is_committed());
        ex.set_response_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .unwrap();
        ex.send_response_headers(StatusCode::OK, BodyLength::Fixed(2))
            .unwrap();
        assert!(ex.is_committed());
        assert_eq!(ex.response_code(), Some(StatusCode::OK));

        let err = ex
            .set_response_header(CONTENT_TYPE, HeaderValue::from_static("text/html"))
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Committed));
        assert!(matches!(
            ex.send_response_headers(StatusCode::OK, BodyLength::Empty),
            Err(ExchangeError::Committed)
        ));

        ex.write_body(b"hi").unwrap();
        ex.close().unwrap();
        ex.close().unwrap();

        let seen = sink.snapshot();
        assert_eq!(seen.headers[CONTENT_LENGTH], "2");
        assert_eq!(seen.headers[CONTENT_TYPE], "text/plain");
        assert_eq!(seen.body, b"hi");
        assert!(seen.finished);
    }

    #[test]
    fn reset_clears_pending_response() {
        let (mut ex, sink) = exchange();
        ex.set_response_header(CONTENT_TYPE, HeaderValue::from_static("text/html"))
            .unwrap();
        ex.enable_gzip().unwrap();
        ex.reset_response().unwrap();
        assert!(ex.response_headers().is_empty());
        assert!(!ex.is_gzip());

        ex.send_response_headers(StatusCode::OK, BodyLength::Fixed(2))
            .unwrap();
        ex.write_body(b"ok").unwrap();
        ex.close().unwrap();
        let seen = sink.snapshot();
        assert!(!seen.headers.contains_key(CONTENT_TYPE));
        assert!(!seen.headers.contains_key(CONTENT_ENCODING));
        assert_eq!(seen.body, b"ok");

        assert!(matches!(ex.reset_response(), Err(ExchangeError::Committed)));
    }

    #[test]
    fn write_requires_commit() {
        let (mut ex, _sink) = exchange();
        assert!(matches!(ex.write_body(b"x"), Err(ExchangeError::NotCommitted)));
        assert!(matches!(ex.close(), Err(ExchangeError::NotCommitted)));
        assert!(!ex.is_committed());
    }

    #[test]
    fn empty_body_closes_on_commit() {
        let (mut ex, sink) = exchange();
        ex.send_response_headers(StatusCode::NOT_MODIFIED, BodyLength::Empty)
            .unwrap();
        assert!(matches!(ex.write_body(b"x"), Err(ExchangeError::Closed)));
        let seen = sink.snapshot();
        assert!(seen.finished);
        assert!(seen.headers.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn gzip_body_streams_compressed() {
        let (mut ex, sink) = exchange();
        ex.enable_gzip().unwrap();
        ex.send_response_headers(StatusCode::OK, BodyLength::Fixed(11))
            .unwrap();
        ex.write_body(b"hello ").unwrap();
        ex.write_body(b"world").unwrap();
        ex.close().unwrap();

        let seen = sink.snapshot();
        assert_eq!(seen.headers[CONTENT_ENCODING], "gzip");
        assert!(seen.headers.get(CONTENT_LENGTH).is_none());

        let mut text = String::new();
        GzDecoder::new(seen.body.as_slice())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn encoded_commit_bypasses_encoder() {
        let (mut ex, sink) = exchange();
        ex.enable_gzip().unwrap();
        ex.send_encoded_response_headers(StatusCode::OK, BodyLength::Fixed(3))
            .unwrap();
        ex.write_body(b"raw").unwrap();
        ex.close().unwrap();
        assert_eq!(sink.snapshot().body, b"raw");
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let (mut ex, _sink) = exchange();
        let err = ex
            .set_response_header_str(CONTENT_TYPE, "text/plain\r\nX-Evil: 1")
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidHeader(_)));
    }
}
