//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, timeouts and the fallback host
//! - Check document paths are unique and dates parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the parsed config
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::{AdaptorConfig, DocumentConfig, HandlerConfig};
use crate::handler::conditional::parse_http_date;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("handler.fallback_hostname must not be empty")]
    MissingFallbackHost,

    #[error("handler.fallback_hostname {0:?} is not a valid authority")]
    InvalidFallbackHost(String),

    #[error("server.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("document path {0:?} must start with '/'")]
    RelativeDocumentPath(String),

    #[error("document path {0:?} is configured more than once")]
    DuplicateDocument(String),

    #[error("document {path:?} has unparsable last_modified {value:?}")]
    InvalidLastModified { path: String, value: String },
}

/// Validate the whole configuration.
pub fn validate_config(config: &AdaptorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(handler_errors) = validate_handler_config(&config.handler) {
        errors.extend(handler_errors);
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.server.bind_address.clone(),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if let Err(document_errors) = validate_documents(&config.documents) {
        errors.extend(document_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the settings a `Handler` is built from.
pub fn validate_handler_config(config: &HandlerConfig) -> Result<(), Vec<ValidationError>> {
    let host = config.fallback_hostname.trim();
    if host.is_empty() {
        return Err(vec![ValidationError::MissingFallbackHost]);
    }
    if host.parse::<Authority>().is_err() {
        return Err(vec![ValidationError::InvalidFallbackHost(
            config.fallback_hostname.clone(),
        )]);
    }
    Ok(())
}

/// Validate static documents.
pub fn validate_documents(documents: &[DocumentConfig]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for doc in documents {
        if !doc.path.starts_with('/') {
            errors.push(ValidationError::RelativeDocumentPath(doc.path.clone()));
        }
        if !seen.insert(doc.path.as_str()) {
            errors.push(ValidationError::DuplicateDocument(doc.path.clone()));
        }
        if let Some(value) = &doc.last_modified {
            if parse_http_date(value).is_none() {
                errors.push(ValidationError::InvalidLastModified {
                    path: doc.path.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str) -> DocumentConfig {
        DocumentConfig {
            path: path.to_string(),
            content_type: "text/plain".to_string(),
            body: "x".to_string(),
            last_modified: None,
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&AdaptorConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = AdaptorConfig::default();
        config.handler.fallback_hostname = " ".to_string();
        config.server.bind_address = "nowhere".to_string();
        config.server.request_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingFallbackHost,
                ValidationError::InvalidBindAddress("nowhere".to_string()),
                ValidationError::ZeroTimeout,
            ]
        );
    }

    #[test]
    fn fallback_host_must_be_an_authority() {
        let config = HandlerConfig {
            fallback_hostname: "two words".to_string(),
            ..HandlerConfig::default()
        };
        assert!(matches!(
            validate_handler_config(&config).unwrap_err()[..],
            [ValidationError::InvalidFallbackHost(_)]
        ));

        let config = HandlerConfig {
            fallback_hostname: "search.example.com:8080".to_string(),
            ..HandlerConfig::default()
        };
        assert!(validate_handler_config(&config).is_ok());
    }

    #[test]
    fn document_checks() {
        let mut dated = doc("/a");
        dated.last_modified = Some("not a date".to_string());
        let errors = validate_documents(&[dated, doc("/a"), doc("b")]).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidLastModified {
                    path: "/a".to_string(),
                    value: "not a date".to_string(),
                },
                ValidationError::DuplicateDocument("/a".to_string()),
                ValidationError::RelativeDocumentPath("b".to_string()),
            ]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = AdaptorConfig::default();
        config.observability.metrics_address = "bogus".to_string();
        assert!(validate_config(&config).is_ok());
        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
