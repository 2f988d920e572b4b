//! Input acquisition and byte decoding

use std::io::Read;

use encoding_rs::{Encoding, UTF_8};

use crate::cursor::Cursor;
use crate::error::TextResult;

/// Decoded input text
#[derive(Debug, Clone)]
pub struct TextSource {
    text: String,
    encoding: &'static Encoding,
}

impl TextSource {
    /// Wrap already decoded text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            encoding: UTF_8,
        }
    }

    /// Decode raw bytes.
    ///
    /// A UTF-8, UTF-16LE or UTF-16BE byte order mark selects the encoding and
    /// is stripped; anything else is read as UTF-8. Malformed sequences become
    /// U+FFFD.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((UTF_8, 0));
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            log::debug!("Replaced malformed {} sequences in input", encoding.name());
        }
        Self {
            text: text.into_owned(),
            encoding,
        }
    }

    /// Read a stream to its end and decode it
    pub fn from_reader<R: Read>(mut reader: R) -> TextResult<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        log::debug!("Read {} bytes of input", bytes.len());
        Ok(Self::from_bytes(&bytes))
    }

    /// The encoding the text was decoded from
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// A cursor positioned at the start of the text
    pub fn cursor(&self) -> Cursor {
        Cursor::new(&self.text)
    }
}

impl From<&str> for TextSource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextSource {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
