//! CSS Tokenizer
//!
//! Tokenizes CSS input according to CSS Syntax Module Level 3. Malformed
//! input never stops tokenization: strings, urls, comments and functions
//! come back flagged `bad` and the anomaly is reported as a [`CssError`].

use scour_text::{Cursor, Position};

use crate::error::CssError;
use crate::normalize::Normalize;
use crate::token::{CssNode, CssToken, Matcher};

/// Maximum depth of nested functions and at-rule blocks
pub const MAX_NESTING: usize = 32;

type ErrorHandler = Box<dyn FnMut(&CssError)>;

/// Tokenize a CSS source
pub fn tokenize(css: &str) -> Tokenizer {
    Tokenizer::new(css)
}

/// CSS Tokenizer
pub struct Tokenizer {
    cursor: Cursor,
    /// Start of the most recent token
    start: Position,
    value_mode: bool,
    depth: usize,
    on_error: Option<ErrorHandler>,
}

impl Tokenizer {
    /// Create a new tokenizer
    pub fn new(css: &str) -> Self {
        Self {
            cursor: Cursor::new(css),
            start: Position::start(),
            value_mode: false,
            depth: 0,
            on_error: None,
        }
    }

    /// Install a callback for recoverable anomalies
    pub fn on_error(mut self, handler: impl FnMut(&CssError) + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// In value mode `#` followed by hex digits yields [`CssToken::Color`]
    pub fn set_value_mode(&mut self, on: bool) {
        self.value_mode = on;
    }

    /// Start position of the most recently returned token
    pub fn position(&self) -> Position {
        self.start
    }

    /// Resolve escapes and comments, then group declarations and at-rules.
    ///
    /// Errors are reported for the remaining original source only; the
    /// rewritten passes just log.
    pub fn normalize(self) -> Normalize {
        Normalize::new(self)
    }

    /// Get the next token with its start position
    pub fn next_node(&mut self) -> CssNode {
        let token = self.next_token();
        CssNode::new(token, self.start)
    }

    /// Get the next token; [`CssToken::Eof`] once input is exhausted
    pub fn next_token(&mut self) -> CssToken {
        self.start = self.cursor.position();
        let Some(c) = self.cursor.advance() else {
            return CssToken::Eof;
        };

        match c {
            c if is_whitespace(c) => {
                let mut run = String::from(c);
                run.push_str(&self.cursor.take_while(is_whitespace));
                CssToken::Whitespace(run)
            }
            '"' | '\'' => self.consume_string(c),
            '#' => {
                if self.cursor.peek().is_some_and(is_name_char) || self.at_escape() {
                    let name = self.consume_name();
                    if self.value_mode && name.chars().all(|c| c.is_ascii_hexdigit()) {
                        CssToken::Color(name)
                    } else {
                        CssToken::Hash(name)
                    }
                } else {
                    CssToken::Delim('#')
                }
            }
            '(' => CssToken::LeftParen,
            ')' => CssToken::RightParen,
            '[' => CssToken::LeftBracket,
            ']' => CssToken::RightBracket,
            '{' => CssToken::LeftBrace,
            '}' => CssToken::RightBrace,
            ',' => CssToken::Comma,
            ':' => CssToken::Colon,
            ';' => CssToken::Semicolon,
            '~' | '|' | '^' | '$' | '*' | '!' => self.consume_match(c),
            '+' | '.' => {
                if starts_number(Some(c), self.cursor.peek(), self.cursor.peek_nth(1)) {
                    self.cursor.back(1);
                    self.consume_numeric()
                } else {
                    CssToken::Delim(c)
                }
            }
            '-' => {
                let (next, after) = (self.cursor.peek(), self.cursor.peek_nth(1));
                if starts_number(Some('-'), next, after) {
                    self.cursor.back(1);
                    self.consume_numeric()
                } else if next == Some('-') && after == Some('>') {
                    self.cursor.skip(2);
                    CssToken::Cdc
                } else if would_start_ident(Some('-'), next, after) {
                    self.cursor.back(1);
                    self.consume_ident_like()
                } else {
                    CssToken::Delim('-')
                }
            }
            '<' => {
                if self.cursor.at_ignore_case("!--") {
                    self.cursor.skip(3);
                    CssToken::Cdo
                } else {
                    CssToken::Delim('<')
                }
            }
            '/' => {
                if self.cursor.peek() == Some('*') {
                    self.cursor.advance();
                    self.consume_comment()
                } else {
                    CssToken::Delim('/')
                }
            }
            '@' => {
                let (a, b, c) = (self.cursor.peek(), self.cursor.peek_nth(1), self.cursor.peek_nth(2));
                if would_start_ident(a, b, c) {
                    CssToken::AtKeyword(self.consume_name())
                } else {
                    CssToken::Delim('@')
                }
            }
            '\\' => {
                if self.cursor.peek().is_some_and(|c| !is_newline(c)) {
                    self.cursor.back(1);
                    self.consume_ident_like()
                } else {
                    self.report(CssError::InvalidCharacter {
                        character: '\\',
                        location: self.start,
                    });
                    CssToken::Delim('\\')
                }
            }
            'u' | 'U'
                if self.cursor.peek() == Some('+')
                    && self
                        .cursor
                        .peek_nth(1)
                        .is_some_and(|c| c.is_ascii_hexdigit() || c == '?') =>
            {
                self.cursor.advance();
                self.consume_range()
            }
            '0'..='9' => {
                self.cursor.back(1);
                self.consume_numeric()
            }
            c if is_name_start(c) => {
                self.cursor.back(1);
                self.consume_ident_like()
            }
            c => CssToken::Delim(c),
        }
    }

    fn report(&mut self, error: CssError) {
        log::debug!("CSS tokenizer: {}", error);
        if let Some(handler) = self.on_error.as_mut() {
            handler(&error);
        }
    }

    fn report_eof(&mut self) {
        let location = self.cursor.position();
        self.report(CssError::Eof { location });
    }

    /// Whether the next two characters form a valid escape
    fn at_escape(&self) -> bool {
        self.cursor.peek() == Some('\\') && self.cursor.peek_nth(1).is_some_and(|c| !is_newline(c))
    }

    /// Consume an escape; the backslash has already been consumed
    fn consume_escape(&mut self) -> char {
        let Some(first) = self.cursor.advance() else {
            self.report_eof();
            return char::REPLACEMENT_CHARACTER;
        };
        let Some(mut value) = first.to_digit(16) else {
            return first;
        };

        let mut digits = 1;
        while digits < 6 {
            match self.cursor.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    value = value * 16 + d;
                    self.cursor.advance();
                    digits += 1;
                }
                None => break,
            }
        }
        if self.cursor.peek().is_some_and(is_whitespace) {
            self.cursor.advance();
        }

        match value {
            0 | 0xD800..=0xDFFF => char::REPLACEMENT_CHARACTER,
            v => char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER),
        }
    }

    /// Consume an identifier name, resolving escapes
    fn consume_name(&mut self) -> String {
        let mut name = String::new();
        loop {
            match self.cursor.peek() {
                Some(c) if is_name_char(c) => {
                    name.push(c);
                    self.cursor.advance();
                }
                Some('\\') if self.at_escape() => {
                    self.cursor.advance();
                    name.push(self.consume_escape());
                }
                _ => return name,
            }
        }
    }

    fn consume_match(&mut self, c: char) -> CssToken {
        match (c, self.cursor.peek()) {
            ('|', Some('|')) => {
                self.cursor.advance();
                CssToken::Match(Matcher::Column)
            }
            (_, Some('=')) => {
                self.cursor.advance();
                CssToken::Match(match c {
                    '~' => Matcher::Include,
                    '|' => Matcher::Dash,
                    '^' => Matcher::Prefix,
                    '$' => Matcher::Suffix,
                    '*' => Matcher::Substring,
                    _ => Matcher::Not,
                })
            }
            _ => CssToken::Delim(c),
        }
    }

    /// Consume a string token; the opening quote has been consumed
    fn consume_string(&mut self, quote: char) -> CssToken {
        let mut value = String::new();
        loop {
            match self.cursor.peek() {
                None => {
                    self.report_eof();
                    return CssToken::String { value, quote, bad: false };
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    return CssToken::String { value, quote, bad: false };
                }
                Some(c) if is_newline(c) => {
                    let location = self.cursor.position();
                    self.report(CssError::UnexpectedLineBreak { location });
                    return CssToken::String { value, quote, bad: true };
                }
                Some('\\') => {
                    self.cursor.advance();
                    match self.cursor.peek() {
                        None => {
                            self.report_eof();
                            return CssToken::String { value, quote, bad: true };
                        }
                        Some(c) if is_newline(c) => {
                            self.cursor.advance();
                        }
                        Some(_) => value.push(self.consume_escape()),
                    }
                }
                Some(c) => {
                    self.cursor.advance();
                    value.push(c);
                }
            }
        }
    }

    fn consume_numeric(&mut self) -> CssToken {
        let mut repr = String::new();

        if let Some(sign @ ('+' | '-')) = self.cursor.peek() {
            repr.push(sign);
            self.cursor.advance();
        }
        repr.push_str(&self.cursor.take_while(|c| c.is_ascii_digit()));

        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            repr.push('.');
            self.cursor.advance();
            repr.push_str(&self.cursor.take_while(|c| c.is_ascii_digit()));
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let digit_at = if matches!(self.cursor.peek_nth(1), Some('+' | '-')) { 2 } else { 1 };
            if self.cursor.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.cursor.advance() {
                        repr.push(c);
                    }
                }
                repr.push_str(&self.cursor.take_while(|c| c.is_ascii_digit()));
            }
        }

        if self.cursor.peek() == Some('%') {
            self.cursor.advance();
            return CssToken::Percentage(repr);
        }

        let (a, b, c) = (self.cursor.peek(), self.cursor.peek_nth(1), self.cursor.peek_nth(2));
        if would_start_ident(a, b, c) {
            let unit = self.consume_name();
            return CssToken::Dimension { value: repr, unit };
        }

        CssToken::Number(repr)
    }

    /// Consume an identifier-like token (ident, function, or url)
    fn consume_ident_like(&mut self) -> CssToken {
        let name = self.consume_name();
        if self.cursor.peek() != Some('(') {
            return CssToken::Ident(name);
        }
        self.cursor.advance();

        if name.eq_ignore_ascii_case("url") {
            self.consume_url(name)
        } else {
            self.consume_function(name)
        }
    }

    /// Collect function arguments up to the matching `)`
    fn consume_function(&mut self, name: String) -> CssToken {
        let start = self.start;
        if self.depth >= MAX_NESTING {
            self.report(CssError::NestingTooDeep {
                limit: MAX_NESTING,
                location: start,
            });
            self.skip_balanced();
            return CssToken::Function { name, args: Vec::new(), bad: true };
        }

        self.depth += 1;
        let mut args = Vec::new();
        let mut parens = 0usize;
        let bad = loop {
            let node = self.next_node();
            match node.token {
                CssToken::Eof => {
                    self.report_eof();
                    break true;
                }
                CssToken::RightParen if parens == 0 => break false,
                CssToken::LeftParen => parens += 1,
                CssToken::RightParen => parens -= 1,
                _ => {}
            }
            args.push(node);
        };
        self.depth -= 1;
        self.start = start;

        CssToken::Function { name, args, bad }
    }

    /// Skip raw input up to the `)` balancing an already consumed `(`
    fn skip_balanced(&mut self) {
        let mut depth = 1usize;
        while let Some(c) = self.cursor.advance() {
            match c {
                '\\' => {
                    self.cursor.advance();
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// URL state; `url(` has been consumed
    fn consume_url(&mut self, function: String) -> CssToken {
        self.cursor.take_while(is_whitespace);
        match self.cursor.peek() {
            None => {
                self.report_eof();
                CssToken::Url { function, data: String::new(), bad: true }
            }
            Some(')') => {
                self.cursor.advance();
                CssToken::Url { function, data: String::new(), bad: false }
            }
            Some(quote @ ('"' | '\'')) => {
                self.cursor.advance();
                self.consume_quoted_url(function, quote)
            }
            Some(_) => self.consume_unquoted_url(function),
        }
    }

    fn consume_quoted_url(&mut self, function: String, quote: char) -> CssToken {
        let mut data = String::new();
        loop {
            match self.cursor.peek() {
                None => {
                    self.report_eof();
                    return CssToken::Url { function, data, bad: false };
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    return self.finish_url(function, data);
                }
                Some(c) if is_newline(c) => {
                    let location = self.cursor.position();
                    self.report(CssError::UnexpectedLineBreak { location });
                    return self.consume_bad_url(function, data);
                }
                Some('\\') => {
                    self.cursor.advance();
                    match self.cursor.peek() {
                        None => {
                            self.report_eof();
                            return CssToken::Url { function, data, bad: true };
                        }
                        Some(c) if is_newline(c) => {
                            self.cursor.advance();
                        }
                        Some(_) => data.push(self.consume_escape()),
                    }
                }
                Some(c) => {
                    self.cursor.advance();
                    data.push(c);
                }
            }
        }
    }

    fn consume_unquoted_url(&mut self, function: String) -> CssToken {
        let mut data = String::new();
        loop {
            match self.cursor.peek() {
                None => {
                    self.report_eof();
                    return CssToken::Url { function, data, bad: false };
                }
                Some(')') => {
                    self.cursor.advance();
                    return CssToken::Url { function, data, bad: false };
                }
                Some(c) if is_whitespace(c) => return self.finish_url(function, data),
                Some(c) if matches!(c, '"' | '\'' | '(') || is_non_printable(c) => {
                    let location = self.cursor.position();
                    self.report(CssError::InvalidCharacter { character: c, location });
                    return self.consume_bad_url(function, data);
                }
                Some('\\') => {
                    if self.at_escape() {
                        self.cursor.advance();
                        data.push(self.consume_escape());
                    } else {
                        let location = self.cursor.position();
                        self.report(CssError::InvalidCharacter { character: '\\', location });
                        return self.consume_bad_url(function, data);
                    }
                }
                Some(c) => {
                    self.cursor.advance();
                    data.push(c);
                }
            }
        }
    }

    /// Only whitespace may separate the url data from its `)`
    fn finish_url(&mut self, function: String, data: String) -> CssToken {
        self.cursor.take_while(is_whitespace);
        match self.cursor.peek() {
            Some(')') => {
                self.cursor.advance();
                CssToken::Url { function, data, bad: false }
            }
            None => {
                self.report_eof();
                CssToken::Url { function, data, bad: false }
            }
            Some(c) => {
                let location = self.cursor.position();
                self.report(CssError::InvalidCharacter { character: c, location });
                self.consume_bad_url(function, data)
            }
        }
    }

    /// Bad-url recovery: skip to `;`, an unmatched `}`, or the balancing `)`
    fn consume_bad_url(&mut self, function: String, mut data: String) -> CssToken {
        let mut round = 1usize;
        let mut curly = 0usize;
        loop {
            match self.cursor.peek() {
                None => {
                    self.report_eof();
                    break;
                }
                Some(';') => break,
                Some('}') if curly == 0 => break,
                Some(')') => {
                    self.cursor.advance();
                    round -= 1;
                    if round == 0 {
                        break;
                    }
                    data.push(')');
                }
                Some('\\') if self.at_escape() => {
                    self.cursor.advance();
                    data.push(self.consume_escape());
                }
                Some(c) => {
                    self.cursor.advance();
                    match c {
                        '(' => round += 1,
                        '{' => curly += 1,
                        '}' => curly -= 1,
                        _ => {}
                    }
                    data.push(c);
                }
            }
        }
        CssToken::Url { function, data, bad: true }
    }

    /// Comment body; `/*` has been consumed
    fn consume_comment(&mut self) -> CssToken {
        let mut text = String::new();
        loop {
            match self.cursor.advance() {
                None => {
                    self.report_eof();
                    return CssToken::Comment { text, bad: true };
                }
                Some('*') if self.cursor.peek() == Some('/') => {
                    self.cursor.advance();
                    return CssToken::Comment { text, bad: false };
                }
                Some(c) => text.push(c),
            }
        }
    }

    /// Unicode range; `U+` has been consumed
    fn consume_range(&mut self) -> CssToken {
        let mut start = String::new();
        while start.len() < 6 {
            match self.cursor.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    start.push(c);
                    self.cursor.advance();
                }
                _ => break,
            }
        }
        while start.len() < 6 && self.cursor.peek() == Some('?') {
            start.push('?');
            self.cursor.advance();
        }

        let end = if !start.contains('?')
            && self.cursor.peek() == Some('-')
            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.cursor.advance();
            let mut end = String::new();
            while end.len() < 6 {
                match self.cursor.peek() {
                    Some(c) if c.is_ascii_hexdigit() => {
                        end.push(c);
                        self.cursor.advance();
                    }
                    _ => break,
                }
            }
            Some(end)
        } else {
            None
        };

        CssToken::Range { start, end }
    }
}

impl Iterator for Tokenizer {
    type Item = CssNode;

    fn next(&mut self) -> Option<CssNode> {
        let node = self.next_node();
        match node.token {
            CssToken::Eof => None,
            _ => Some(node),
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C')
}

fn is_newline(c: char) -> bool {
    c == '\n' || c == '\x0C'
}

fn is_non_printable(c: char) -> bool {
    matches!(c, '\0'..='\x08' | '\x0B' | '\x0E'..='\x1F' | '\x7F')
}

/// Check if character can start an identifier
pub(crate) fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// Check if character can be part of an identifier
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

fn is_escape_pair(first: Option<char>, second: Option<char>) -> bool {
    first == Some('\\') && second.is_some_and(|c| !is_newline(c))
}

fn would_start_ident(first: Option<char>, second: Option<char>, third: Option<char>) -> bool {
    match first {
        Some('-') => second.is_some_and(|c| is_name_start(c) || c == '-') || is_escape_pair(second, third),
        Some('\\') => is_escape_pair(first, second),
        Some(c) => is_name_start(c),
        None => false,
    }
}

fn starts_number(first: Option<char>, second: Option<char>, third: Option<char>) -> bool {
    let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
    match first {
        Some('+' | '-') => digit(second) || (second == Some('.') && digit(third)),
        Some('.') => digit(second),
        c => digit(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tokens(input: &str) -> Vec<CssToken> {
        Tokenizer::new(input).map(|node| node.token).collect()
    }

    fn collecting(input: &str) -> (Tokenizer, Rc<RefCell<Vec<CssError>>>) {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        let tokenizer = Tokenizer::new(input).on_error(move |e| sink.borrow_mut().push(e.clone()));
        (tokenizer, errors)
    }

    #[test]
    fn test_simple_rule() {
        let tokens = tokens("p { color: red; }");
        assert!(matches!(tokens[0], CssToken::Ident(ref s) if s == "p"));
        assert!(matches!(tokens[1], CssToken::Whitespace(ref s) if s == " "));
        assert!(matches!(tokens[2], CssToken::LeftBrace));
        assert!(matches!(tokens[4], CssToken::Ident(ref s) if s == "color"));
        assert!(matches!(tokens[5], CssToken::Colon));
        assert!(matches!(tokens[7], CssToken::Ident(ref s) if s == "red"));
        assert!(matches!(tokens[8], CssToken::Semicolon));
        assert!(matches!(tokens[10], CssToken::RightBrace));
    }

    #[test]
    fn test_first_token_kinds() {
        let first = Tokenizer::new("h1 { background: blue; }").next_token();
        assert_eq!(first, CssToken::Ident("h1".into()));
        let first = Tokenizer::new("@media { h1 { color: red } }").next_token();
        assert_eq!(first, CssToken::AtKeyword("media".into()));
    }

    #[test]
    fn test_url_forms() {
        for input in ["url(http://someurl)", "url(\"http://someurl\")", "url('http://someurl')"] {
            let tokens = tokens(input);
            assert_eq!(tokens.len(), 1, "{}", input);
            assert!(
                matches!(tokens[0], CssToken::Url { ref data, bad: false, .. } if data == "http://someurl"),
                "{}",
                input
            );
        }
    }

    #[test]
    fn test_url_padding_and_empty() {
        let tokens = tokens("url(  x.png  ) url()");
        assert!(matches!(tokens[0], CssToken::Url { ref data, bad: false, .. } if data == "x.png"));
        assert!(matches!(tokens[2], CssToken::Url { ref data, bad: false, .. } if data.is_empty()));
    }

    #[test]
    fn test_line_endings_are_whitespace() {
        for input in ["\r", "\r\n", "\n"] {
            let token = Tokenizer::new(input).next_token();
            assert_eq!(token, CssToken::Whitespace("\n".into()));
        }
    }

    #[test]
    fn test_hash_and_color() {
        assert_eq!(tokens("#main")[0], CssToken::Hash("main".into()));
        assert_eq!(tokens("#fff")[0], CssToken::Hash("fff".into()));

        let mut tokenizer = Tokenizer::new("#fff #main");
        tokenizer.set_value_mode(true);
        assert_eq!(tokenizer.next_token(), CssToken::Color("fff".into()));
        tokenizer.next_token();
        assert_eq!(tokenizer.next_token(), CssToken::Hash("main".into()));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens("42")[0], CssToken::Number("42".into()));
        assert_eq!(tokens("3.14")[0], CssToken::Number("3.14".into()));
        assert_eq!(tokens("+.5")[0], CssToken::Number("+.5".into()));
        assert_eq!(tokens("1e3")[0], CssToken::Number("1e3".into()));
        assert_eq!(tokens("2E-2")[0], CssToken::Number("2E-2".into()));
        assert_eq!(tokens("50%")[0], CssToken::Percentage("50".into()));
        assert_eq!(
            tokens("-10px")[0],
            CssToken::Dimension { value: "-10".into(), unit: "px".into() }
        );
        assert_eq!(
            tokens("1.5em")[0],
            CssToken::Dimension { value: "1.5".into(), unit: "em".into() }
        );
        assert_eq!(
            tokens("3-x")[0],
            CssToken::Dimension { value: "3".into(), unit: "-x".into() }
        );
    }

    #[test]
    fn test_dot_without_digit_is_delim() {
        let tokens = tokens(".container");
        assert_eq!(tokens[0], CssToken::Delim('.'));
        assert_eq!(tokens[1], CssToken::Ident("container".into()));
    }

    #[test]
    fn test_escapes_in_ident() {
        assert_eq!(tokens("\\41 bc")[0], CssToken::Ident("Abc".into()));
        assert_eq!(tokens("\\0 x")[0], CssToken::Ident("\u{FFFD}x".into()));
        assert_eq!(tokens("\\110000")[0], CssToken::Ident("\u{FFFD}".into()));
        assert_eq!(tokens("\\D800")[0], CssToken::Ident("\u{FFFD}".into()));
        assert_eq!(tokens("a\\:b")[0], CssToken::Ident("a:b".into()));
    }

    #[test]
    fn test_escaped_ident_becomes_function() {
        let tokens = tokens("\\65 xpression(x)");
        assert!(matches!(tokens[0], CssToken::Function { ref name, .. } if name == "expression"));
    }

    #[test]
    fn test_backslash_before_newline_is_delim() {
        let (mut tokenizer, errors) = collecting("\\\nx");
        assert_eq!(tokenizer.next_token(), CssToken::Delim('\\'));
        assert_eq!(tokenizer.next_token(), CssToken::Whitespace("\n".into()));
        assert!(matches!(errors.borrow()[0], CssError::InvalidCharacter { character: '\\', .. }));
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokens("\"hello world\"")[0],
            CssToken::String { value: "hello world".into(), quote: '"', bad: false }
        );
        assert_eq!(
            tokens("'it\\'s'")[0],
            CssToken::String { value: "it's".into(), quote: '\'', bad: false }
        );
        assert_eq!(
            tokens("'a\\\nb'")[0],
            CssToken::String { value: "ab".into(), quote: '\'', bad: false }
        );
    }

    #[test]
    fn test_string_line_break_is_bad() {
        let (mut tokenizer, errors) = collecting("'abc\ndef");
        assert_eq!(
            tokenizer.next_token(),
            CssToken::String { value: "abc".into(), quote: '\'', bad: true }
        );
        assert_eq!(tokenizer.next_token(), CssToken::Whitespace("\n".into()));
        assert!(matches!(errors.borrow()[0], CssError::UnexpectedLineBreak { .. }));
    }

    #[test]
    fn test_string_escape_at_eof_is_bad() {
        let (mut tokenizer, errors) = collecting("'abc\\");
        assert_eq!(
            tokenizer.next_token(),
            CssToken::String { value: "abc".into(), quote: '\'', bad: true }
        );
        assert!(matches!(errors.borrow()[0], CssError::Eof { .. }));
        assert_eq!(self::tokens("'abc")[0], CssToken::String { value: "abc".into(), quote: '\'', bad: false });
    }

    #[test]
    fn test_bad_url_recovery() {
        let tokens = tokens("url(javascript:alert('XSS'))");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], CssToken::Url { ref data, bad: true, .. } if data == "javascript:alert('XSS')"));

        let tokens = self::tokens("url(a\"b) x;");
        assert!(matches!(tokens[0], CssToken::Url { bad: true, .. }));
        assert_eq!(tokens[1], CssToken::Whitespace(" ".into()));
        assert_eq!(tokens[2], CssToken::Ident("x".into()));
    }

    #[test]
    fn test_bad_url_stops_at_semicolon_and_brace() {
        let tokens = tokens("url(a b;c)");
        assert!(matches!(tokens[0], CssToken::Url { bad: true, .. }));
        assert_eq!(tokens[1], CssToken::Semicolon);

        let tokens = self::tokens("{url(a'b}");
        assert!(matches!(tokens[1], CssToken::Url { bad: true, .. }));
        assert_eq!(tokens[2], CssToken::RightBrace);
    }

    #[test]
    fn test_function_collects_arguments() {
        let tokens = tokens("rgb(255, 0, 0) x");
        match &tokens[0] {
            CssToken::Function { name, args, bad } => {
                assert_eq!(name, "rgb");
                assert!(!bad);
                assert_eq!(args[0].token, CssToken::Number("255".into()));
                assert_eq!(args[1].token, CssToken::Comma);
                assert_eq!(args.len(), 7);
            }
            other => panic!("Expected Function, got {:?}", other),
        }
        assert_eq!(tokens[2], CssToken::Ident("x".into()));
    }

    #[test]
    fn test_function_keeps_inner_parens() {
        let tokens = tokens("calc((1px + 2px) * 2)");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], CssToken::Function { ref args, bad: false, .. } if args.len() == 11));
    }

    #[test]
    fn test_unterminated_function_is_bad() {
        let tokens = tokens("var(--x");
        assert!(matches!(tokens[0], CssToken::Function { ref args, bad: true, .. }
            if args[0].token == CssToken::Ident("--x".into())));
    }

    #[test]
    fn test_nesting_limit() {
        let input = format!("{}{}", "f(".repeat(40), ")".repeat(40));
        let (tokenizer, errors) = collecting(&input);
        let tokens: Vec<_> = tokenizer.collect();
        assert_eq!(tokens.len(), 1);
        assert!(errors
            .borrow()
            .iter()
            .any(|e| matches!(e, CssError::NestingTooDeep { limit: MAX_NESTING, .. })));

        let mut depth = 0;
        let mut current = &tokens[0].token;
        while let CssToken::Function { args, bad, .. } = current {
            if *bad {
                break;
            }
            depth += 1;
            current = &args[0].token;
        }
        assert_eq!(depth, MAX_NESTING);
        assert!(current.is_bad());
    }

    #[test]
    fn test_tokens_carry_positions() {
        let nodes: Vec<CssNode> = Tokenizer::new("p {\n  color: rgb(1, 2)\n}").collect();
        assert_eq!(nodes[0].position, Position::new(1, 1, 0));
        assert_eq!(nodes[4].token, CssToken::Ident("color".into()));
        assert_eq!(nodes[4].position, Position::new(2, 3, 6));
        assert_eq!(nodes[7].position, Position::new(2, 10, 13));
        match &nodes[7].token {
            CssToken::Function { args, .. } => {
                assert_eq!(args[0].position, Position::new(2, 14, 17));
                assert_eq!(args[3].token, CssToken::Number("2".into()));
                assert_eq!(args[3].position, Position::new(2, 17, 20));
            }
            other => panic!("Expected Function, got {:?}", other),
        }
        assert_eq!(nodes[9].token, CssToken::RightBrace);
        assert_eq!(nodes[9].position, Position::new(3, 1, 23));
    }

    #[test]
    fn test_comments() {
        let tokens = tokens("/* note */p");
        assert_eq!(tokens[0], CssToken::Comment { text: " note ".into(), bad: false });
        assert_eq!(tokens[1], CssToken::Ident("p".into()));

        let (mut tokenizer, errors) = collecting("/* open");
        assert_eq!(tokenizer.next_token(), CssToken::Comment { text: " open".into(), bad: true });
        assert!(matches!(errors.borrow()[0], CssError::Eof { .. }));
    }

    #[test]
    fn test_match_tokens() {
        let tokens = tokens("[a~=b][c|=d][e^=f][g$=h][i*=j]k||l!=");
        let matchers: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t {
                CssToken::Match(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(
            matchers,
            vec![
                Matcher::Include,
                Matcher::Dash,
                Matcher::Prefix,
                Matcher::Suffix,
                Matcher::Substring,
                Matcher::Column,
                Matcher::Not,
            ]
        );
        assert_eq!(self::tokens("|x")[0], CssToken::Delim('|'));
    }

    #[test]
    fn test_cdo_cdc() {
        let tokens = tokens("<!-- -->");
        assert_eq!(tokens, vec![CssToken::Cdo, CssToken::Whitespace(" ".into()), CssToken::Cdc]);
    }

    #[test]
    fn test_unicode_range() {
        assert_eq!(
            tokens("U+0025-00FF")[0],
            CssToken::Range { start: "0025".into(), end: Some("00FF".into()) }
        );
        assert_eq!(tokens("u+4??")[0], CssToken::Range { start: "4??".into(), end: None });
    }

    #[test]
    fn test_token_positions() {
        let mut tokenizer = Tokenizer::new("a  b\nc");
        tokenizer.next_token();
        assert_eq!(tokenizer.position(), Position::new(1, 1, 0));
        tokenizer.next_token();
        assert_eq!(tokenizer.position(), Position::new(1, 2, 1));
        tokenizer.next_token();
        assert_eq!(tokenizer.position(), Position::new(1, 4, 3));
        tokenizer.next_token();
        tokenizer.next_token();
        assert_eq!(tokenizer.position(), Position::new(2, 1, 5));
    }

    #[test]
    fn test_function_position_is_its_start() {
        let mut tokenizer = Tokenizer::new("  rgb(1, 2)");
        tokenizer.next_token();
        tokenizer.next_token();
        assert_eq!(tokenizer.position().offset, 2);
    }
}
