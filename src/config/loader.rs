//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AdaptorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AdaptorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AdaptorConfig, ConfigError> {
    let config: AdaptorConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::TextEncoding;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.handler.fallback_hostname, "localhost");
        assert_eq!(config.handler.text_encoding, TextEncoding::Utf8);
        assert!(config.documents.is_empty());
    }

    #[test]
    fn full_file() {
        let config = parse_config(
            r#"
            [server]
            bind_address = "127.0.0.1:6000"

            [handler]
            fallback_hostname = "adaptor.internal"
            text_encoding = "iso-8859-1"

            [[documents]]
            path = "/doc/1"
            body = "hello"
            last_modified = "Thu, 1 Jan 1970 00:00:01 GMT"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:6000");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.handler.fallback_hostname, "adaptor.internal");
        assert_eq!(config.handler.text_encoding, TextEncoding::Latin1);
        assert_eq!(config.documents[0].content_type, "text/plain");
    }

    #[test]
    fn unknown_encoding_is_a_parse_error() {
        let err = parse_config("[handler]\ntext_encoding = \"ebcdic\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_fallback_host_is_rejected() {
        let err = parse_config("[handler]\nfallback_hostname = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("fallback_hostname"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
