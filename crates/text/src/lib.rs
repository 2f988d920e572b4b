//! Scour text input
//!
//! Decoded source text and a character cursor with line/column tracking,
//! shared by the HTML and CSS tokenizers.

mod cursor;
mod error;
mod source;

pub use cursor::Cursor;
pub use error::{Position, TextError, TextResult};
pub use source::TextSource;
