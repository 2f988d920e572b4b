//! CSS token model

use scour_text::Position;

/// CSS Token types
#[derive(Debug, Clone, PartialEq)]
pub enum CssToken {
    /// Identifier (e.g., property names, keywords), escapes resolved
    Ident(String),
    /// At-keyword (e.g., @media, @import)
    AtKeyword(String),
    /// Hash token (e.g., #id)
    Hash(String),
    /// Inline hex color, only produced in value mode
    Color(String),
    /// Quoted string. `bad` is set when a raw line break cut it short
    String { value: String, quote: char, bad: bool },
    /// `url(...)` with either quoted or unquoted data
    Url { function: String, data: String, bad: bool },
    /// Function call owning its argument tokens, closing paren excluded
    Function { name: String, args: Vec<CssNode>, bad: bool },
    /// Number, source representation kept verbatim
    Number(String),
    /// Percentage, number representation without the `%`
    Percentage(String),
    /// Number with unit
    Dimension { value: String, unit: String },
    /// Unicode range after `U+`
    Range { start: String, end: Option<String> },
    /// Any other single character
    Delim(char),
    /// `/* ... */`, `bad` when unterminated
    Comment { text: String, bad: bool },
    /// Run of whitespace
    Whitespace(String),
    /// Attribute matcher or column combinator
    Match(Matcher),
    Colon,
    Semicolon,
    Comma,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    /// `<!--`
    Cdo,
    /// `-->`
    Cdc,
    /// `property: value`, only produced by normalization
    Declaration(Declaration),
    /// `@name prelude;` or `@name prelude { ... }`, only produced by normalization
    AtRule(AtRule),
    /// End of file
    Eof,
}

/// A token and the position where it started
#[derive(Debug, Clone, PartialEq)]
pub struct CssNode {
    pub position: Position,
    pub token: CssToken,
}

impl CssNode {
    pub fn new(token: CssToken, position: Position) -> Self {
        Self { position, token }
    }

    pub fn is_bad(&self) -> bool {
        self.token.is_bad()
    }

    pub fn is_whitespace(&self) -> bool {
        self.token.is_whitespace()
    }
}

/// Attribute matchers and the column combinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// `~=`
    Include,
    /// `|=`
    Dash,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
    /// `!=`
    Not,
    /// `||`
    Column,
}

impl Matcher {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Include => "~=",
            Self::Dash => "|=",
            Self::Prefix => "^=",
            Self::Suffix => "$=",
            Self::Substring => "*=",
            Self::Not => "!=",
            Self::Column => "||",
        }
    }
}

/// A grouped declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    /// Value tokens after the colon, whitespace included
    pub value: Vec<CssNode>,
    /// Whether a `;` ended the declaration
    pub terminated: bool,
}

/// A grouped at-rule
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    pub name: String,
    pub prelude: Vec<CssNode>,
    /// Normalized block contents, if the rule has a `{ ... }` block
    pub block: Option<Vec<CssNode>>,
    /// Whether the closing `;` or `}` was present
    pub terminated: bool,
}

impl CssToken {
    /// Whether this token was produced by error recovery
    pub fn is_bad(&self) -> bool {
        match self {
            Self::String { bad, .. }
            | Self::Url { bad, .. }
            | Self::Function { bad, .. }
            | Self::Comment { bad, .. } => *bad,
            _ => false,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace(_))
    }
}
