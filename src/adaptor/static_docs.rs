//! Adaptor serving a fixed set of configured documents.
//!
//! # Behavior
//! - `GET`/`HEAD` of a configured path → 200 with the document
//! - `If-Modified-Since` at or after `last_modified` → 304, no body
//! - Unknown path → 404, other methods → 405 with `Allow`

use std::collections::HashMap;
use std::time::SystemTime;

use axum::http::header::{ALLOW, LAST_MODIFIED};
use axum::http::{HeaderValue, Method, StatusCode};

use crate::config::loader::ConfigError;
use crate::config::schema::DocumentConfig;
use crate::config::validation::validate_documents;
use crate::exchange::{BodyLength, Exchange};
use crate::handler::conditional::parse_http_date;
use crate::handler::{AdaptorError, AdaptorStep, Handler};

#[derive(Debug, Clone)]
struct Document {
    content_type: String,
    body: String,
    last_modified: Option<SystemTime>,
}

/// In-memory document store keyed by request path.
#[derive(Debug, Clone, Default)]
pub struct StaticDocuments {
    documents: HashMap<String, Document>,
}

impl StaticDocuments {
    pub fn from_config(documents: &[DocumentConfig]) -> Result<Self, ConfigError> {
        validate_documents(documents).map_err(ConfigError::Validation)?;
        let documents = documents
            .iter()
            .map(|doc| {
                let document = Document {
                    content_type: doc.content_type.clone(),
                    body: doc.body.clone(),
                    last_modified: doc.last_modified.as_deref().and_then(parse_http_date),
                };
                (doc.path.clone(), document)
            })
            .collect();
        Ok(Self { documents })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl AdaptorStep for StaticDocuments {
    fn handle(&self, handler: &Handler, ex: &mut Exchange) -> Result<(), AdaptorError> {
        let text = handler.text_encoding().content_type("text/plain");

        if ex.method() != Method::GET && ex.method() != Method::HEAD {
            ex.set_response_header(ALLOW, HeaderValue::from_static("GET, HEAD"))?;
            handler.canned_respond(ex, StatusCode::METHOD_NOT_ALLOWED, Some(text.as_str()), "Method Not Allowed")?;
            return Ok(());
        }

        let path = ex.path().split('?').next().unwrap_or_default();
        let Some(document) = self.documents.get(path) else {
            tracing::debug!(path = %path, "Unknown document");
            handler.canned_respond(ex, StatusCode::NOT_FOUND, Some(text.as_str()), "Not Found")?;
            return Ok(());
        };

        if let Some(last_modified) = document.last_modified {
            ex.set_response_header_str(LAST_MODIFIED, &httpdate::fmt_http_date(last_modified))?;
            if let Some(since) = handler.if_modified_since(ex) {
                if last_modified <= since {
                    ex.send_response_headers(StatusCode::NOT_MODIFIED, BodyLength::Empty)?;
                    return Ok(());
                }
            }
        }

        handler.enable_compression_if_supported(ex)?;
        handler.canned_respond(ex, StatusCode::OK, Some(document.content_type.as_str()), &document.body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::HandlerConfig;
    use crate::exchange::{BufferedResponse, BufferedSink};
    use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};

    fn handler() -> Handler {
        let docs = StaticDocuments::from_config(&[
            DocumentConfig {
                path: "/doc/1".to_string(),
                content_type: "text/html".to_string(),
                body: "<p>one</p>".to_string(),
                last_modified: Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
            },
            DocumentConfig {
                path: "/doc/2".to_string(),
                content_type: "text/plain".to_string(),
                body: "two".to_string(),
                last_modified: None,
            },
        ])
        .unwrap();
        Handler::new(HandlerConfig::default(), docs).unwrap()
    }

    fn run(method: Method, path: &str, headers: &[(&str, &str)]) -> BufferedResponse {
        let sink = BufferedSink::new();
        let mut ex = Exchange::new(method, path, sink.clone());
        for (name, value) in headers {
            ex.request_headers_mut().add(*name, *value);
        }
        handler().handle(&mut ex).unwrap();
        sink.snapshot()
    }

    #[test]
    fn serves_document() {
        let res = run(Method::GET, "/doc/1?x=y", &[]);
        assert_eq!(res.status, Some(StatusCode::OK));
        assert_eq!(res.headers[CONTENT_TYPE], "text/html");
        assert_eq!(res.headers[LAST_MODIFIED], "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(res.body, b"<p>one</p>");
    }

    #[test]
    fn not_modified() {
        let res = run(
            Method::GET,
            "/doc/1",
            &[("If-Modified-Since", "Sun, 06 Nov 1994 08:49:37 GMT")],
        );
        assert_eq!(res.status, Some(StatusCode::NOT_MODIFIED));
        assert!(res.body.is_empty());
        assert!(res.finished);
    }

    #[test]
    fn modified_since_older_date() {
        let res = run(
            Method::GET,
            "/doc/1",
            &[("If-Modified-Since", "Thu, 1 Jan 1970 00:00:01 GMT")],
        );
        assert_eq!(res.status, Some(StatusCode::OK));
    }

    #[test]
    fn malformed_validator_serves_fresh() {
        let res = run(
            Method::GET,
            "/doc/1",
            &[("If-Modified-Since", "Thu, 1 Jan 1970 00:0001 GMT")],
        );
        assert_eq!(res.status, Some(StatusCode::OK));
        assert_eq!(res.body, b"<p>one</p>");
    }

    #[test]
    fn gzip_when_advertised() {
        let res = run(Method::GET, "/doc/2", &[("Accept-Encoding", "deflate, gzip")]);
        assert_eq!(res.headers[CONTENT_ENCODING], "gzip");
        assert_ne!(res.body, b"two");
    }

    #[test]
    fn head_has_no_body() {
        let res = run(Method::HEAD, "/doc/2", &[]);
        assert_eq!(res.status, Some(StatusCode::OK));
        assert!(res.body.is_empty());
    }

    #[test]
    fn unknown_and_disallowed() {
        let res = run(Method::GET, "/missing", &[]);
        assert_eq!(res.status, Some(StatusCode::NOT_FOUND));

        let res = run(Method::POST, "/doc/1", &[]);
        assert_eq!(res.status, Some(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(res.headers[ALLOW], "GET, HEAD");
    }

    #[test]
    fn rejects_invalid_documents() {
        let err = StaticDocuments::from_config(&[DocumentConfig {
            path: "relative".to_string(),
            content_type: "text/plain".to_string(),
            body: String::new(),
            last_modified: None,
        }])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
