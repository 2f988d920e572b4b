//! Scour CSS tokenizer
//!
//! CSS Syntax Level 3 tokenization with error recovery, plus a
//! normalization pass that resolves escapes and comments and groups tokens
//! into declarations and at-rules for allow-list checks.

mod error;
mod normalize;
mod serialize;
mod token;
mod tokenizer;

pub use error::CssError;
pub use normalize::Normalize;
pub use token::{AtRule, CssNode, CssToken, Declaration, Matcher};
pub use tokenizer::{tokenize, Tokenizer, MAX_NESTING};
