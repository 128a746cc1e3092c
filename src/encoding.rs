//! Source text normalization
//!
//! Callers may hand over source in any declared text encoding; it is converted to
//! Unicode before it reaches a backend. Bytes that are not valid under the declared
//! encoding are rejected instead of being replaced.

use crate::error::{Error, Result};
use encoding_rs::Encoding;
use std::borrow::Cow;

/// JavaScript source as supplied by a caller
#[derive(Debug, Clone)]
pub enum Source<'a> {
    /// Already Unicode
    Text(Cow<'a, str>),
    /// Bytes in a declared encoding
    Encoded {
        bytes: Cow<'a, [u8]>,
        encoding: &'static Encoding,
    },
    /// Bytes declared as US-ASCII; any byte above 0x7F is rejected
    Ascii(Cow<'a, [u8]>),
    /// Bytes declared as ISO-8859-1; each byte is the code point of the same value
    Latin1(Cow<'a, [u8]>),
    /// Bytes with no text encoding; only the ASCII subset converts
    Binary(Cow<'a, [u8]>),
}

// WHATWG folds these into windows-1252, which accepts every byte
const ASCII_LABELS: &[&str] = &[
    "us-ascii",
    "ascii",
    "ansi_x3.4-1968",
    "iso646-us",
    "us",
    "cp367",
    "ibm367",
];

const LATIN1_LABELS: &[&str] = &[
    "iso-8859-1",
    "iso8859-1",
    "iso_8859-1",
    "iso_8859-1:1987",
    "latin1",
    "l1",
    "cp819",
    "ibm819",
    "iso-ir-100",
    "csisolatin1",
];

impl<'a> Source<'a> {
    /// Source bytes declared to be in `encoding`
    pub fn encoded(bytes: impl Into<Cow<'a, [u8]>>, encoding: &'static Encoding) -> Self {
        Source::Encoded {
            bytes: bytes.into(),
            encoding,
        }
    }

    /// Source bytes declared by encoding label (`"ISO-8859-15"`, `"us-ascii"`, `"utf-8"`).
    pub fn with_label(bytes: impl Into<Cow<'a, [u8]>>, label: &str) -> Result<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        if ASCII_LABELS.contains(&normalized.as_str()) {
            return Ok(Source::Ascii(bytes.into()));
        }
        if LATIN1_LABELS.contains(&normalized.as_str()) {
            return Ok(Source::Latin1(bytes.into()));
        }
        let encoding = Encoding::for_label(normalized.as_bytes())
            .ok_or_else(|| Error::encoding_error(format!("unknown encoding label '{}'", label)))?;
        Ok(Source::encoded(bytes, encoding))
    }

    /// Source bytes with no usable text encoding; only the ASCII subset converts.
    pub fn binary(bytes: impl Into<Cow<'a, [u8]>>) -> Self {
        Source::Binary(bytes.into())
    }

    /// Convert to Unicode text
    pub fn into_text(self) -> Result<Cow<'a, str>> {
        match self {
            Source::Text(text) => Ok(text),
            Source::Ascii(bytes) => ascii_only(bytes, "US-ASCII"),
            Source::Latin1(bytes) => {
                Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()))
            }
            Source::Binary(bytes) => ascii_only(bytes, "binary"),
            Source::Encoded { bytes, encoding } => {
                match encoding.decode_without_bom_handling_and_without_replacement(&bytes) {
                    Some(text) => Ok(Cow::Owned(text.into_owned())),
                    None => Err(Error::encoding_error(format!(
                        "source is not valid {}",
                        encoding.name()
                    ))),
                }
            }
        }
    }
}

fn ascii_only<'a>(bytes: Cow<'a, [u8]>, origin: &str) -> Result<Cow<'a, str>> {
    match bytes.iter().position(|b| !b.is_ascii()) {
        Some(offset) => Err(Error::encoding_error(format!(
            "\"\\x{:02X}\" at byte {} from {} source has no Unicode equivalent",
            bytes[offset], offset, origin
        ))),
        None => Ok(Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())),
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(s: &'a str) -> Self {
        Source::Text(Cow::Borrowed(s))
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(s: &'a String) -> Self {
        Source::Text(Cow::Borrowed(s.as_str()))
    }
}

impl From<String> for Source<'static> {
    fn from(s: String) -> Self {
        Source::Text(Cow::Owned(s))
    }
}

/// Raw bytes are taken to be UTF-8
impl<'a> From<&'a [u8]> for Source<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Source::encoded(bytes, encoding_rs::UTF_8)
    }
}
