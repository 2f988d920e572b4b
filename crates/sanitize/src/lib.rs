//! Scour HTML sanitizer
//!
//! Filters an HTML token stream against allow-lists of tags, attributes,
//! URL schemes and CSS. The whole pipeline is a chain of iterators, so
//! output is produced as input is read.
//!
//! ```
//! use scour_sanitize::{sanitize, SanitizeSettings};
//!
//! let html = sanitize("<p onclick=\"x()\">hi<script>x()</script></p>", SanitizeSettings::shared());
//! assert_eq!(html, "<p>hi</p>");
//! ```

mod css;
mod engine;
mod settings;
mod url;

use std::fmt;
use std::io::{self, Read};

use scour_html::{to_html, HtmlNode, HtmlWriter, Tokenizer};
use scour_text::{TextError, TextSource};
use thiserror::Error;

pub use css::{sanitize_css, CssContext};
pub use engine::Sanitize;
pub use settings::{SanitizeSettings, SettingsBuilder, SettingsError, SettingsResult, TagBehavior, UriPolicy};
pub use url::sanitize_url;

/// Sanitize result type
pub type SanitizeResult<T> = Result<T, SanitizeError>;

/// Errors from the streaming entry points
#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("Failed to write sanitized output")]
    Write(#[from] fmt::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Text(#[from] TextError),
}

/// Sanitize an HTML fragment
pub fn sanitize(html: &str, settings: &SanitizeSettings) -> String {
    to_html(sanitize_nodes(Tokenizer::new(html), settings))
}

/// Sanitize an HTML fragment into a formatter sink
pub fn sanitize_to<W: fmt::Write>(html: &str, settings: &SanitizeSettings, out: &mut W) -> SanitizeResult<()> {
    let mut writer = HtmlWriter::new(out);
    for node in sanitize_nodes(Tokenizer::new(html), settings) {
        writer.write_node(&node)?;
    }
    Ok(())
}

/// Sanitize a byte stream, detecting its encoding, into a byte sink
pub fn sanitize_reader<R: Read, W: io::Write>(reader: R, settings: &SanitizeSettings, mut out: W) -> SanitizeResult<()> {
    let source = TextSource::from_reader(reader)?;
    log::debug!("Sanitizing input decoded as {}", source.encoding().name());

    let mut writer = HtmlWriter::new(String::new());
    for node in sanitize_nodes(Tokenizer::with_cursor(source.cursor()), settings) {
        writer.write_node(&node)?;
        let buffer = writer.get_mut();
        out.write_all(buffer.as_bytes())?;
        buffer.clear();
    }
    out.flush()?;
    Ok(())
}

/// Sanitize an already tokenized node stream
pub fn sanitize_nodes<I>(nodes: I, settings: &SanitizeSettings) -> Sanitize<'_, I::IntoIter>
where
    I: IntoIterator<Item = HtmlNode>,
{
    Sanitize::new(nodes.into_iter(), settings)
}
