//! Character cursor with lookahead, pushback and position tracking

use crate::error::Position;

/// Forward cursor over line-ending-normalized characters.
///
/// CR and CRLF are folded to LF when the cursor is built, so consumers only
/// ever see `'\n'` and offsets count normalized characters.
#[derive(Debug, Clone)]
pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    pub fn new(input: &str) -> Self {
        let mut chars = Vec::with_capacity(input.len());
        let mut iter = input.chars().peekable();
        while let Some(c) = iter.next() {
            if c == '\r' {
                if iter.peek() == Some(&'\n') {
                    iter.next();
                }
                chars.push('\n');
            } else {
                chars.push(c);
            }
        }
        Self {
            chars,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Position of the next character to be consumed
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.pos)
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Peek at the next character without consuming
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Peek `n` characters past the next one (`peek_nth(0) == peek()`)
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    /// Consume the next character
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume `n` characters, stopping early at end of input
    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            if self.advance().is_none() {
                break;
            }
        }
    }

    /// Push back up to `n` already consumed characters
    pub fn back(&mut self, n: usize) {
        for _ in 0..n.min(self.pos) {
            self.pos -= 1;
            if self.chars[self.pos] == '\n' {
                self.line -= 1;
                let line_start = self.chars[..self.pos]
                    .iter()
                    .rposition(|&c| c == '\n')
                    .map_or(0, |i| i + 1);
                self.column = self.pos - line_start + 1;
            } else {
                self.column -= 1;
            }
        }
    }

    /// Whether the upcoming characters match `s`, ignoring ASCII case
    pub fn at_ignore_case(&self, s: &str) -> bool {
        let mut n = 0;
        for expected in s.chars() {
            match self.peek_nth(n) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => n += 1,
                _ => return false,
            }
        }
        true
    }

    /// Consume characters while `pred` holds and return them
    pub fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }
}
