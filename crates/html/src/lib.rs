//! Scour HTML
//!
//! Flat HTML5 fragment tokenizer and serializer.

mod entities;
mod node;
mod tokenizer;
mod writer;

pub use entities::{decode_entity, decode_numeric};
pub use node::{is_rcdata_element, is_raw_text_element, is_void_element, Attributes, HtmlNode, NodeKind};
pub use tokenizer::Tokenizer;
pub use writer::{to_html, HtmlWriter};

/// Tokenize an HTML fragment
pub fn tokenize(html: &str) -> Tokenizer {
    Tokenizer::new(html)
}
