//! Byte/string conversion for `encodeString` and `decodeString`.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Text encoding understood by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8. Invalid sequences decode to U+FFFD.
    #[default]
    Utf8,
    /// 7-bit ASCII.
    Ascii,
    /// ISO-8859-1, one byte per code point.
    Latin1,
    /// Standard padded base64.
    Base64,
    /// Lowercase hex when rendering bytes, either case when parsing text.
    Hex,
}

/// Failures of [`Encoding`] parsing and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Name outside the supported set.
    #[error("unknown encoding: {0}")]
    Unknown(String),

    /// Input is not valid for the encoding.
    #[error("invalid {encoding} input: {message}")]
    Invalid {
        /// Encoding that rejected the input.
        encoding: Encoding,
        /// Decoder message.
        message: String,
    },
}

impl Encoding {
    /// Parse an optional name. `None` and the empty string mean UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Unknown`] for unsupported names.
    pub fn from_name(name: Option<&str>) -> Result<Self, EncodingError> {
        match name {
            None | Some("") => Ok(Self::Utf8),
            Some(n) => n.parse(),
        }
    }

    /// Canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin1",
            Self::Base64 => "base64",
            Self::Hex => "hex",
        }
    }

    /// Encode `text` into bytes.
    ///
    /// For `base64` and `hex` the text is the encoded form and the raw
    /// bytes it spells are returned; surrounding ASCII whitespace is
    /// ignored. ASCII and Latin-1 replace code points they cannot hold with
    /// `?`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Invalid`] for malformed base64 or hex text.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodingError> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Ascii => Ok(narrow(text, 0x7f)),
            Self::Latin1 => Ok(narrow(text, 0xff)),
            Self::Base64 => STANDARD.decode(text.trim_ascii()).map_err(|e| self.invalid(e)),
            Self::Hex => hex::decode(text.trim_ascii()).map_err(|e| self.invalid(e)),
        }
    }

    /// Decode `bytes` into a string.
    ///
    /// `base64` and `hex` render the raw bytes in that form, so any binary
    /// payload survives. UTF-8 replaces invalid sequences and ASCII replaces
    /// bytes above 0x7f, both with U+FFFD.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { char::REPLACEMENT_CHARACTER })
                .collect(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Base64 => STANDARD.encode(bytes),
            Self::Hex => hex::encode(bytes),
        }
    }

    fn invalid(self, err: impl fmt::Display) -> EncodingError {
        EncodingError::Invalid {
            encoding: self,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Self::Utf8,
            "ascii" => Self::Ascii,
            "latin1" | "binary" => Self::Latin1,
            "base64" => Self::Base64,
            "hex" => Self::Hex,
            _ => return Err(EncodingError::Unknown(s.to_owned())),
        })
    }
}

fn narrow(text: &str, max: u32) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok().filter(|&b| u32::from(b) <= max).unwrap_or(b'?'))
        .collect()
}
