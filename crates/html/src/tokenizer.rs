//! HTML5 fragment tokenizer
//!
//! Converts HTML text into a flat stream of nodes. This is the tokenization
//! stage of the HTML5 parsing algorithm without tree construction: no
//! implied tags, no insertion modes. Malformed input never fails; every
//! construct has a defined fallback.

use std::collections::VecDeque;
use std::mem;

use scour_text::{Cursor, Position};

use crate::entities::{allows_missing_semicolon, decode_entity, decode_numeric, MAX_NAME_LEN};
use crate::node::{is_raw_text_element, is_rcdata_element, Attributes, HtmlNode, NodeKind};

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Tokenizer state machine states
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Data,
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValueQuoted,
    SelfClosingStartTag,
    BogusComment,
    MarkupDeclarationOpen,
    CommentStart,
    CommentStartDash,
    Comment,
    CommentEndDash,
    CommentEnd,
    CData,
    Doctype,
    RawText,
}

/// HTML5 tokenizer producing [`HtmlNode`]s on demand
pub struct Tokenizer {
    cursor: Cursor,
    state: State,
    nodes: VecDeque<HtmlNode>,
    finished: bool,

    // Pending text run
    text: String,
    text_start: Position,
    // Start of the markup construct being read
    node_start: Position,

    // Current token being built
    current_tag_name: String,
    current_tag_is_end: bool,
    current_tag_self_closing: bool,
    current_attributes: Attributes,
    current_attribute: Option<(String, String)>,
    current_comment: String,

    // Element whose end tag closes the current raw text run
    raw_text_end: String,
    raw_text_decodes: bool,
}

impl Tokenizer {
    /// Create a new tokenizer for the given input
    pub fn new(html: &str) -> Self {
        Self::with_cursor(Cursor::new(html))
    }

    pub fn with_cursor(cursor: Cursor) -> Self {
        Self {
            cursor,
            state: State::Data,
            nodes: VecDeque::new(),
            finished: false,

            text: String::new(),
            text_start: Position::start(),
            node_start: Position::start(),

            current_tag_name: String::new(),
            current_tag_is_end: false,
            current_tag_self_closing: false,
            current_attributes: Attributes::new(),
            current_attribute: None,
            current_comment: String::new(),

            raw_text_end: String::new(),
            raw_text_decodes: false,
        }
    }

    fn push_char(&mut self, c: char, at: Position) {
        if self.text.is_empty() {
            self.text_start = at;
        }
        self.text.push(c);
    }

    fn push_str(&mut self, s: &str, at: Position) {
        if self.text.is_empty() {
            self.text_start = at;
        }
        self.text.push_str(s);
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = mem::take(&mut self.text);
            self.nodes.push_back(HtmlNode::new(NodeKind::Text(text), self.text_start));
        }
    }

    /// Emit a markup node, closing any pending text run first
    fn emit(&mut self, kind: NodeKind) {
        self.flush_text();
        self.nodes.push_back(HtmlNode::new(kind, self.node_start));
    }

    fn start_tag(&mut self, is_end: bool) {
        self.current_tag_name.clear();
        self.current_tag_is_end = is_end;
        self.current_tag_self_closing = false;
        self.current_attributes.clear();
        self.current_attribute = None;
    }

    /// Emit the current tag and pick the state its content is read in
    fn emit_current_tag(&mut self) {
        self.commit_attribute();
        let name = mem::take(&mut self.current_tag_name);
        self.state = State::Data;

        if self.current_tag_is_end {
            self.emit(NodeKind::EndTag { name });
            return;
        }

        if is_raw_text_element(&name) || is_rcdata_element(&name) {
            self.raw_text_end = name.clone();
            self.raw_text_decodes = is_rcdata_element(&name);
            self.state = State::RawText;
        }
        let attributes = mem::take(&mut self.current_attributes);
        let self_closing = self.current_tag_self_closing;
        self.emit(NodeKind::StartTag { name, attributes, self_closing });
    }

    /// A tag cut off by the end of input is discarded
    fn drop_tag(&mut self) {
        log::debug!(
            "Dropping tag <{}{}> cut off at end of input ({})",
            if self.current_tag_is_end { "/" } else { "" },
            self.current_tag_name,
            self.node_start
        );
        self.start_tag(false);
        self.state = State::Data;
    }

    fn start_attribute(&mut self) {
        self.commit_attribute();
        self.current_attribute = Some((String::new(), String::new()));
    }

    fn commit_attribute(&mut self) {
        if let Some(attribute) = self.current_attribute.take() {
            if !attribute.0.is_empty() {
                self.current_attributes.push(attribute);
            }
        }
    }

    fn push_attribute_name(&mut self, c: char) {
        if let Some((name, _)) = &mut self.current_attribute {
            name.push(c);
        }
    }

    fn push_attribute_value(&mut self, s: &str) {
        if let Some((_, value)) = &mut self.current_attribute {
            value.push_str(s);
        }
    }

    fn emit_comment(&mut self) {
        let value = mem::take(&mut self.current_comment);
        let conditional = is_conditional(&value);
        self.emit(NodeKind::Comment { value, conditional });
        self.state = State::Data;
    }

    /// Execute one step of the state machine
    fn step(&mut self) {
        match self.state {
            State::Data => self.data_state(),
            State::TagOpen => self.tag_open_state(),
            State::EndTagOpen => self.end_tag_open_state(),
            State::TagName => self.tag_name_state(),
            State::BeforeAttributeName => self.before_attribute_name_state(),
            State::AttributeName => self.attribute_name_state(),
            State::AfterAttributeName => self.after_attribute_name_state(),
            State::BeforeAttributeValue => self.before_attribute_value_state(),
            State::AttributeValueDoubleQuoted => self.attribute_value_quoted_state('"'),
            State::AttributeValueSingleQuoted => self.attribute_value_quoted_state('\''),
            State::AttributeValueUnquoted => self.attribute_value_unquoted_state(),
            State::AfterAttributeValueQuoted => self.after_attribute_value_quoted_state(),
            State::SelfClosingStartTag => self.self_closing_start_tag_state(),
            State::BogusComment => self.bogus_comment_state(),
            State::MarkupDeclarationOpen => self.markup_declaration_open_state(),
            State::CommentStart => self.comment_start_state(),
            State::CommentStartDash => self.comment_start_dash_state(),
            State::Comment => self.comment_state(),
            State::CommentEndDash => self.comment_end_dash_state(),
            State::CommentEnd => self.comment_end_state(),
            State::CData => self.cdata_state(),
            State::Doctype => self.doctype_state(),
            State::RawText => self.raw_text_state(),
        }
    }

    // State implementations

    fn data_state(&mut self) {
        let at = self.cursor.position();
        match self.cursor.advance() {
            Some('<') => {
                self.node_start = at;
                self.state = State::TagOpen;
            }
            Some('&') => {
                let decoded = self.consume_char_ref(false);
                self.push_str(decoded.as_deref().unwrap_or("&"), at);
            }
            Some('\0') => self.push_char(REPLACEMENT, at),
            Some(c) => self.push_char(c, at),
            None => {
                self.flush_text();
                self.finished = true;
            }
        }
    }

    fn tag_open_state(&mut self) {
        match self.cursor.peek() {
            Some('!') => {
                self.cursor.advance();
                self.state = State::MarkupDeclarationOpen;
            }
            Some('/') => {
                self.cursor.advance();
                self.state = State::EndTagOpen;
            }
            Some(c) if c.is_ascii_alphabetic() => {
                self.start_tag(false);
                self.state = State::TagName;
            }
            Some('?') => {
                self.current_comment.clear();
                self.state = State::BogusComment;
            }
            _ => {
                self.push_char('<', self.node_start);
                self.state = State::Data;
            }
        }
    }

    fn end_tag_open_state(&mut self) {
        match self.cursor.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.start_tag(true);
                self.state = State::TagName;
            }
            Some('>') => {
                self.cursor.advance();
                self.state = State::Data;
            }
            None => {
                self.push_str("</", self.node_start);
                self.state = State::Data;
            }
            _ => {
                self.current_comment.clear();
                self.state = State::BogusComment;
            }
        }
    }

    fn tag_name_state(&mut self) {
        match self.cursor.advance() {
            Some(c) if is_space(c) => self.state = State::BeforeAttributeName,
            Some('/') => self.state = State::SelfClosingStartTag,
            Some('>') => self.emit_current_tag(),
            Some('\0') => self.current_tag_name.push(REPLACEMENT),
            Some(c) => self.current_tag_name.push(c.to_ascii_lowercase()),
            None => self.drop_tag(),
        }
    }

    fn before_attribute_name_state(&mut self) {
        match self.cursor.peek() {
            Some(c) if is_space(c) => {
                self.cursor.advance();
            }
            Some('/') | Some('>') | None => self.state = State::AfterAttributeName,
            Some('=') => {
                self.cursor.advance();
                self.start_attribute();
                self.push_attribute_name('=');
                self.state = State::AttributeName;
            }
            _ => {
                self.start_attribute();
                self.state = State::AttributeName;
            }
        }
    }

    fn attribute_name_state(&mut self) {
        match self.cursor.peek() {
            Some(c) if is_space(c) => self.state = State::AfterAttributeName,
            Some('/') | Some('>') | None => self.state = State::AfterAttributeName,
            Some('=') => {
                self.cursor.advance();
                self.state = State::BeforeAttributeValue;
            }
            Some('\0') => {
                self.cursor.advance();
                self.push_attribute_name(REPLACEMENT);
            }
            Some(c) => {
                self.cursor.advance();
                self.push_attribute_name(c.to_ascii_lowercase());
            }
        }
    }

    fn after_attribute_name_state(&mut self) {
        match self.cursor.peek() {
            Some(c) if is_space(c) => {
                self.cursor.advance();
            }
            Some('/') => {
                self.cursor.advance();
                self.state = State::SelfClosingStartTag;
            }
            Some('=') => {
                self.cursor.advance();
                self.state = State::BeforeAttributeValue;
            }
            Some('>') => {
                self.cursor.advance();
                self.emit_current_tag();
            }
            None => self.drop_tag(),
            _ => {
                self.start_attribute();
                self.state = State::AttributeName;
            }
        }
    }

    fn before_attribute_value_state(&mut self) {
        match self.cursor.peek() {
            Some(c) if is_space(c) => {
                self.cursor.advance();
            }
            Some('"') => {
                self.cursor.advance();
                self.state = State::AttributeValueDoubleQuoted;
            }
            Some('\'') => {
                self.cursor.advance();
                self.state = State::AttributeValueSingleQuoted;
            }
            Some('>') => {
                self.cursor.advance();
                self.emit_current_tag();
            }
            _ => self.state = State::AttributeValueUnquoted,
        }
    }

    fn attribute_value_quoted_state(&mut self, quote: char) {
        match self.cursor.advance() {
            Some(c) if c == quote => {
                self.commit_attribute();
                self.state = State::AfterAttributeValueQuoted;
            }
            Some('&') => {
                let decoded = self.consume_char_ref(true);
                self.push_attribute_value(decoded.as_deref().unwrap_or("&"));
            }
            Some('\0') => self.push_attribute_value("\u{FFFD}"),
            Some(c) => self.push_attribute_value(c.encode_utf8(&mut [0; 4])),
            None => self.drop_tag(),
        }
    }

    fn attribute_value_unquoted_state(&mut self) {
        match self.cursor.advance() {
            Some(c) if is_space(c) => {
                self.commit_attribute();
                self.state = State::BeforeAttributeName;
            }
            Some('&') => {
                let decoded = self.consume_char_ref(true);
                self.push_attribute_value(decoded.as_deref().unwrap_or("&"));
            }
            Some('>') => self.emit_current_tag(),
            Some('\0') => self.push_attribute_value("\u{FFFD}"),
            Some(c) => self.push_attribute_value(c.encode_utf8(&mut [0; 4])),
            None => self.drop_tag(),
        }
    }

    fn after_attribute_value_quoted_state(&mut self) {
        match self.cursor.peek() {
            Some(c) if is_space(c) => {
                self.cursor.advance();
                self.state = State::BeforeAttributeName;
            }
            Some('/') => {
                self.cursor.advance();
                self.state = State::SelfClosingStartTag;
            }
            Some('>') => {
                self.cursor.advance();
                self.emit_current_tag();
            }
            None => self.drop_tag(),
            _ => self.state = State::BeforeAttributeName,
        }
    }

    fn self_closing_start_tag_state(&mut self) {
        match self.cursor.peek() {
            Some('>') => {
                self.cursor.advance();
                self.current_tag_self_closing = true;
                self.emit_current_tag();
            }
            None => self.drop_tag(),
            _ => self.state = State::BeforeAttributeName,
        }
    }

    fn bogus_comment_state(&mut self) {
        match self.cursor.advance() {
            Some('>') | None => self.emit_comment(),
            Some('\0') => self.current_comment.push(REPLACEMENT),
            Some(c) => self.current_comment.push(c),
        }
    }

    fn markup_declaration_open_state(&mut self) {
        self.current_comment.clear();
        if self.cursor.at_ignore_case("--") {
            self.cursor.skip(2);
            self.state = State::CommentStart;
        } else if self.cursor.at_ignore_case("DOCTYPE") {
            self.cursor.skip(7);
            self.state = State::Doctype;
        } else if self.cursor.at_ignore_case("[CDATA[") {
            self.cursor.skip(7);
            self.state = State::CData;
        } else {
            self.state = State::BogusComment;
        }
    }

    fn comment_start_state(&mut self) {
        match self.cursor.peek() {
            Some('-') => {
                self.cursor.advance();
                self.state = State::CommentStartDash;
            }
            Some('>') => {
                self.cursor.advance();
                self.emit_comment();
            }
            _ => self.state = State::Comment,
        }
    }

    fn comment_start_dash_state(&mut self) {
        match self.cursor.peek() {
            Some('-') => {
                self.cursor.advance();
                self.state = State::CommentEnd;
            }
            Some('>') => {
                self.cursor.advance();
                self.emit_comment();
            }
            None => self.emit_comment(),
            _ => {
                self.current_comment.push('-');
                self.state = State::Comment;
            }
        }
    }

    fn comment_state(&mut self) {
        match self.cursor.advance() {
            Some('-') => self.state = State::CommentEndDash,
            Some('\0') => self.current_comment.push(REPLACEMENT),
            Some(c) => self.current_comment.push(c),
            None => self.emit_comment(),
        }
    }

    fn comment_end_dash_state(&mut self) {
        match self.cursor.peek() {
            Some('-') => {
                self.cursor.advance();
                self.state = State::CommentEnd;
            }
            None => self.emit_comment(),
            _ => {
                self.current_comment.push('-');
                self.state = State::Comment;
            }
        }
    }

    fn comment_end_state(&mut self) {
        match self.cursor.peek() {
            Some('>') => {
                self.cursor.advance();
                self.emit_comment();
            }
            Some('-') => {
                self.cursor.advance();
                self.current_comment.push('-');
            }
            None => self.emit_comment(),
            _ => {
                self.current_comment.push_str("--");
                self.state = State::Comment;
            }
        }
    }

    fn cdata_state(&mut self) {
        if self.cursor.at_ignore_case("]]>") {
            self.cursor.skip(3);
            self.emit_comment();
            return;
        }
        match self.cursor.advance() {
            Some('\0') => self.current_comment.push(REPLACEMENT),
            Some(c) => self.current_comment.push(c),
            None => self.emit_comment(),
        }
    }

    fn doctype_state(&mut self) {
        let raw = self.cursor.take_while(|c| c != '>');
        self.cursor.advance();
        let doctype = parse_doctype(&raw);
        self.emit(doctype);
        self.state = State::Data;
    }

    fn raw_text_state(&mut self) {
        let at = self.cursor.position();
        if self.at_raw_text_end() {
            self.node_start = at;
            self.cursor.skip(2);
            self.start_tag(true);
            self.state = State::TagName;
            return;
        }
        match self.cursor.advance() {
            Some('&') if self.raw_text_decodes => {
                let decoded = self.consume_char_ref(false);
                self.push_str(decoded.as_deref().unwrap_or("&"), at);
            }
            Some('\0') => self.push_char(REPLACEMENT, at),
            Some(c) => self.push_char(c, at),
            None => self.state = State::Data,
        }
    }

    /// Whether the input continues with the end tag of the raw text element
    fn at_raw_text_end(&self) -> bool {
        if self.cursor.peek() != Some('<') || self.cursor.peek_nth(1) != Some('/') {
            return false;
        }
        let len = self.raw_text_end.len();
        let name_matches = self
            .raw_text_end
            .chars()
            .enumerate()
            .all(|(i, c)| self.cursor.peek_nth(i + 2).is_some_and(|p| p.eq_ignore_ascii_case(&c)));
        name_matches
            && matches!(self.cursor.peek_nth(len + 2), Some(c) if is_space(c) || c == '/' || c == '>')
    }

    /// Try to consume a character reference after `&`.
    ///
    /// `None` means the `&` stays literal and nothing was consumed.
    fn consume_char_ref(&mut self, in_attribute: bool) -> Option<String> {
        match self.cursor.peek() {
            Some('#') => self.consume_numeric_ref().map(String::from),
            Some(c) if c.is_ascii_alphanumeric() => {
                self.consume_named_ref(in_attribute).map(str::to_string)
            }
            _ => None,
        }
    }

    fn consume_numeric_ref(&mut self) -> Option<char> {
        let hex = matches!(self.cursor.peek_nth(1), Some('x') | Some('X'));
        let prefix = if hex { 2 } else { 1 };
        let radix = if hex { 16 } else { 10 };
        if !self.cursor.peek_nth(prefix).is_some_and(|c| c.is_digit(radix)) {
            return None;
        }
        self.cursor.skip(prefix);

        let mut value = 0u32;
        while let Some(digit) = self.cursor.peek().and_then(|c| c.to_digit(radix)) {
            self.cursor.advance();
            value = value.saturating_mul(radix).saturating_add(digit);
        }
        if self.cursor.peek() == Some(';') {
            self.cursor.advance();
        }
        Some(decode_numeric(value))
    }

    fn consume_named_ref(&mut self, in_attribute: bool) -> Option<&'static str> {
        let mut name = String::new();
        while name.len() < MAX_NAME_LEN {
            match self.cursor.peek_nth(name.len()) {
                Some(c) if c.is_ascii_alphanumeric() => name.push(c),
                _ => break,
            }
        }

        if self.cursor.peek_nth(name.len()) == Some(';') {
            if let Some(value) = decode_entity(&name) {
                self.cursor.skip(name.len() + 1);
                return Some(value);
            }
        }

        // Legacy references without `;`, longest match first
        let len = (1..=name.len())
            .rev()
            .find(|&len| allows_missing_semicolon(&name[..len]))?;
        let next = self.cursor.peek_nth(len);
        if in_attribute && next.is_some_and(|c| c == '=' || c.is_ascii_alphanumeric()) {
            return None;
        }
        self.cursor.skip(len);
        decode_entity(&name[..len])
    }
}

impl Iterator for Tokenizer {
    type Item = HtmlNode;

    fn next(&mut self) -> Option<HtmlNode> {
        while self.nodes.is_empty() && !self.finished {
            self.step();
        }
        self.nodes.pop_front()
    }
}

fn is_space(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0C' | ' ')
}

/// Internet Explorer conditional comment bodies
fn is_conditional(value: &str) -> bool {
    ["[if", "[endif", "<![endif"].iter().any(|prefix| {
        value
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Parse the text between `<!DOCTYPE` and `>`
fn parse_doctype(raw: &str) -> NodeKind {
    let rest = raw.trim_start_matches(is_space);
    let name_end = rest.find(is_space).unwrap_or(rest.len());
    let name = rest[..name_end].replace('\0', "\u{FFFD}").to_ascii_lowercase();
    let rest = rest[name_end..].trim_start_matches(is_space);

    let (public_id, system_id) = if let Some(rest) = strip_keyword(rest, "public") {
        match quoted(rest) {
            Some((public_id, rest)) => (Some(public_id), quoted(rest).map(|(id, _)| id)),
            None => (None, None),
        }
    } else if let Some(rest) = strip_keyword(rest, "system") {
        (None, quoted(rest).map(|(id, _)| id))
    } else {
        (None, None)
    };

    NodeKind::Doctype {
        name,
        public_id,
        system_id,
    }
}

fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let head = s.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword).then(|| &s[keyword.len()..])
}

/// A quoted identifier after optional whitespace, and the text following it
fn quoted(s: &str) -> Option<(String, &str)> {
    let s = s.trim_start_matches(is_space);
    let quote = s.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let body = &s[1..];
    let end = body.find(quote)?;
    Some((body[..end].to_string(), &body[end + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(html: &str) -> Vec<NodeKind> {
        Tokenizer::new(html).map(|node| node.kind).collect()
    }

    fn text(value: &str) -> NodeKind {
        NodeKind::Text(value.into())
    }

    fn start(html: &str) -> (String, Attributes, bool) {
        match Tokenizer::new(html).next().map(|node| node.kind) {
            Some(NodeKind::StartTag { name, attributes, self_closing }) => (name, attributes, self_closing),
            other => panic!("Expected StartTag, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_element() {
        let tokens = tokens("<div>hello</div>");
        assert_eq!(tokens.len(), 3);
        assert!(matches!(&tokens[0], NodeKind::StartTag { name, .. } if name == "div"));
        assert_eq!(tokens[1], text("hello"));
        assert!(matches!(&tokens[2], NodeKind::EndTag { name } if name == "div"));
    }

    #[test]
    fn test_attributes() {
        let (name, attributes, _) = start(r#"<A HREF="test" class='foo' id=bar hidden>"#);
        assert_eq!(name, "a");
        assert_eq!(
            attributes.to_vec(),
            vec![
                ("href".to_string(), "test".to_string()),
                ("class".to_string(), "foo".to_string()),
                ("id".to_string(), "bar".to_string()),
                ("hidden".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_valueless_attribute_followed_by_value() {
        let (_, attributes, _) = start("<input disabled value = x>");
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0], ("disabled".to_string(), String::new()));
        assert_eq!(attributes[1], ("value".to_string(), "x".to_string()));
    }

    #[test]
    fn test_duplicate_attributes_kept() {
        let (_, attributes, _) = start("<a href=1 href=2>");
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn test_self_closing() {
        let (name, _, self_closing) = start("<br/>");
        assert_eq!(name, "br");
        assert!(self_closing);
        let (_, _, self_closing) = start("<img src=x />");
        assert!(self_closing);
    }

    #[test]
    fn test_doctype() {
        assert_eq!(
            tokens("<!DOCTYPE html>"),
            vec![NodeKind::Doctype { name: "html".into(), public_id: None, system_id: None }]
        );
        assert_eq!(
            tokens(r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" 'http://www.w3.org/TR/html4/strict.dtd'>"#),
            vec![NodeKind::Doctype {
                name: "html".into(),
                public_id: Some("-//W3C//DTD HTML 4.01//EN".into()),
                system_id: Some("http://www.w3.org/TR/html4/strict.dtd".into()),
            }]
        );
        assert_eq!(
            tokens(r#"<!doctype svg system "svg.dtd">"#),
            vec![NodeKind::Doctype { name: "svg".into(), public_id: None, system_id: Some("svg.dtd".into()) }]
        );
        assert_eq!(
            tokens("<!DOCTYPE html garbage>"),
            vec![NodeKind::Doctype { name: "html".into(), public_id: None, system_id: None }]
        );
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            tokens("<!-- this is a comment -->"),
            vec![NodeKind::Comment { value: " this is a comment ".into(), conditional: false }]
        );
        assert_eq!(tokens("<!---->"), vec![NodeKind::Comment { value: String::new(), conditional: false }]);
        assert_eq!(tokens("<!--a--b-->"), vec![NodeKind::Comment { value: "a--b".into(), conditional: false }]);
    }

    #[test]
    fn test_conditional_comments() {
        let tokens = tokens("<!--[if gte IE 4]><SCRIPT>alert('XSS');</SCRIPT><![endif]-->");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(&tokens[0], NodeKind::Comment { conditional: true, .. }));

        let tokens = self::tokens("<![if !IE]>x<![endif]>");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], NodeKind::Comment { value: "[if !IE]".into(), conditional: true });
        assert_eq!(tokens[1], text("x"));
        assert!(matches!(&tokens[2], NodeKind::Comment { conditional: true, .. }));
    }

    #[test]
    fn test_cdata_and_processing_instruction() {
        assert_eq!(
            tokens("<![CDATA[a<b]]>c"),
            vec![NodeKind::Comment { value: "a<b".into(), conditional: false }, text("c")]
        );
        assert_eq!(
            tokens(r#"<?xml version="1.0"?>"#),
            vec![NodeKind::Comment { value: r#"?xml version="1.0"?"#.into(), conditional: false }]
        );
    }

    #[test]
    fn test_stray_less_than_is_text() {
        assert_eq!(tokens("a < b <3"), vec![text("a < b <3")]);
        assert_eq!(tokens("<<p>").len(), 2);
        assert_eq!(tokens("<<p>")[0], text("<"));
    }

    #[test]
    fn test_malformed_end_tags() {
        assert_eq!(tokens("a</>b"), vec![text("ab")]);
        assert_eq!(tokens("a</"), vec![text("a</")]);
        assert_eq!(
            tokens("</3>"),
            vec![NodeKind::Comment { value: "3".into(), conditional: false }]
        );
    }

    #[test]
    fn test_tag_cut_off_by_eof_is_dropped() {
        assert_eq!(tokens("a<div class=\"x"), vec![text("a")]);
        assert_eq!(tokens("<p><img src=x"), tokens("<p>"));
        assert_eq!(tokens("<p><img src=\"javascript:alert('XSS')\"</p>").len(), 2);
    }

    #[test]
    fn test_null_bytes_never_split() {
        let (_, attributes, _) = start("<img src=\"java\0script:alert(1)\">");
        assert_eq!(attributes[0].1, "java\u{FFFD}script:alert(1)");
        assert_eq!(tokens("a\0b"), vec![text("a\u{FFFD}b")]);
        let (name, _, _) = start("<scr\0ipt>");
        assert_eq!(name, "scr\u{FFFD}ipt");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(tokens("&#65;&#x42;&#X43&#0000068"), vec![text("ABCD")]);
        assert_eq!(tokens("&#;&#x;"), vec![text("&#;&#x;")]);
        assert_eq!(tokens("&#0;&#xD800;&#99999999999;"), vec![text("\u{FFFD}\u{FFFD}\u{FFFD}")]);
        assert_eq!(tokens("&#x80;&#150;"), vec![text("€\u{2013}")]);
    }

    #[test]
    fn test_named_references() {
        assert_eq!(tokens("&lt;&amp;&gt;&hellip;"), vec![text("<&>\u{2026}")]);
        assert_eq!(tokens("&copy 2024"), vec![text("\u{A9} 2024")]);
        assert_eq!(tokens("&notit;"), vec![text("\u{AC}it;")]);
        assert_eq!(tokens("&bogus; &hellip"), vec![text("&bogus; &hellip")]);
    }

    #[test]
    fn test_html5_named_references() {
        assert_eq!(tokens("a&colon;b&lpar;1&rpar;&Tab;&NewLine;"), vec![text("a:b(1)\t\n")]);
        assert_eq!(tokens("&colon &lpar"), vec![text("&colon &lpar")]);
        let (_, attributes, _) = start("<a href=\"&#x6A;avascript&colon;alert&lpar;1&rpar;\">");
        assert_eq!(attributes[0].1, "javascript:alert(1)");
    }

    #[test]
    fn test_attribute_legacy_references() {
        let (_, attributes, _) = start("<a href=\"?a=1&copy=2&amp;b&lt\">");
        assert_eq!(attributes[0].1, "?a=1&copy=2&b<");
        let (_, attributes, _) = start("<a title=&quot;x&quot;>");
        assert_eq!(attributes[0].1, "\"x\"");
    }

    #[test]
    fn test_multiline_tag() {
        let (name, attributes, _) = start("<IMG\nSRC\n=\n\"\nj\na\n\"\n>");
        assert_eq!(name, "img");
        assert_eq!(attributes[0], ("src".to_string(), "\nj\na\n".to_string()));
    }

    #[test]
    fn test_quote_garbage() {
        let tokens = tokens(r#"<IMG """"""><SCRIPT>alert("XSS")</SCRIPT>">"#);
        assert!(matches!(&tokens[0], NodeKind::StartTag { name, attributes, .. }
            if name == "img" && attributes[0].0 == "\"\"\"\"\"\""));
        assert!(matches!(&tokens[1], NodeKind::StartTag { name, .. } if name == "script"));
        assert_eq!(tokens[2], text("alert(\"XSS\")"));
        assert!(matches!(&tokens[3], NodeKind::EndTag { name } if name == "script"));
        assert_eq!(tokens[4], text("\">"));
    }

    #[test]
    fn test_raw_text() {
        let tokens = tokens("<script>if (a < b && c) { x = '</div>'; }</SCRIPT >after");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1], text("if (a < b && c) { x = '</div>'; }"));
        assert!(matches!(&tokens[2], NodeKind::EndTag { name } if name == "script"));
        assert_eq!(tokens[3], text("after"));

        let tokens = self::tokens("<style>p{}</styles></style>");
        assert_eq!(tokens[1], text("p{}</styles>"));
    }

    #[test]
    fn test_raw_text_after_self_closing_tag() {
        let tokens = tokens("<script/><b>x</b></script>");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1], text("<b>x</b>"));
    }

    #[test]
    fn test_raw_text_unterminated() {
        let tokens = tokens("<iframe src=x <</p>");
        assert_eq!(tokens.len(), 1);
        let tokens = self::tokens("<xmp><b></xmp");
        assert_eq!(tokens[1], text("<b></xmp"));
    }

    #[test]
    fn test_rcdata_decodes_references() {
        let tokens = tokens("<title>a &amp; <b></title>");
        assert_eq!(tokens[1], text("a & <b>"));
        let tokens = self::tokens("<script>&amp;</script>");
        assert_eq!(tokens[1], text("&amp;"));
    }

    #[test]
    fn test_line_endings_and_positions() {
        let nodes: Vec<HtmlNode> = Tokenizer::new("a\r\n<b>\rc").collect();
        assert_eq!(nodes[0].kind, text("a\n"));
        assert_eq!(nodes[0].position, Position::new(1, 1, 0));
        assert_eq!(nodes[1].position, Position::new(2, 1, 2));
        assert_eq!(nodes[2].kind, text("\nc"));
        assert_eq!(nodes[2].position, Position::new(2, 4, 5));
    }
}
