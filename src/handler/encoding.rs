//! Text encodings for generated bodies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unsupported text encoding: {0}")]
pub struct UnknownEncoding(pub String);

/// Character set used to turn generated text into body bytes.
///
/// Characters the set cannot represent become `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "UTF-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "iso-8859-1", alias = "ISO-8859-1", alias = "latin1")]
    Latin1,
    #[serde(rename = "us-ascii", alias = "US-ASCII", alias = "ascii")]
    UsAscii,
}

impl TextEncoding {
    /// IANA charset name.
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Latin1 => "ISO-8859-1",
            TextEncoding::UsAscii => "US-ASCII",
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Latin1 => narrow(text, 0xFF),
            TextEncoding::UsAscii => narrow(text, 0x7F),
        }
    }

    /// `mime` with this encoding's charset parameter appended.
    pub fn content_type(&self, mime: &str) -> String {
        format!("{}; charset={}", mime, self.label())
    }
}

fn narrow(text: &str, max: u32) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = u32::from(c);
            if code <= max {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

impl FromStr for TextEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "iso-8859-1" | "latin1" => Ok(TextEncoding::Latin1),
            "us-ascii" | "ascii" => Ok(TextEncoding::UsAscii),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
