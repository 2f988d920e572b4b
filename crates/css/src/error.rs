//! CSS tokenization error types

use scour_text::Position;
use thiserror::Error;

/// Recoverable CSS tokenization anomalies.
///
/// These are notifications, never failures: the tokenizer always continues
/// with a flagged recovery token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssError {
    #[error("Unexpected end of file at {location}")]
    Eof { location: Position },

    #[error("Unexpected line break at {location}")]
    UnexpectedLineBreak { location: Position },

    #[error("Invalid character '{character}' at {location}")]
    InvalidCharacter { character: char, location: Position },

    #[error("Nesting deeper than {limit} levels at {location}")]
    NestingTooDeep { limit: usize, location: Position },
}

impl CssError {
    /// Get the source location of this error
    pub fn location(&self) -> Position {
        match self {
            Self::Eof { location } => *location,
            Self::UnexpectedLineBreak { location } => *location,
            Self::InvalidCharacter { location, .. } => *location,
            Self::NestingTooDeep { location, .. } => *location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CssError::InvalidCharacter {
            character: '(',
            location: Position::new(1, 10, 9),
        };
        assert_eq!(format!("{}", err), "Invalid character '(' at 1:10");
    }

    #[test]
    fn test_error_location() {
        let loc = Position::new(3, 2, 40);
        let err = CssError::NestingTooDeep { limit: 32, location: loc };
        assert_eq!(err.location(), loc);
        assert_eq!(err.to_string(), "Nesting deeper than 32 levels at 3:2");
    }
}
