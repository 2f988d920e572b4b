//! Escape/comment normalization and declaration grouping
//!
//! Obfuscated CSS such as `expr/*x*/ession(` or `\75 rl(` only matters once
//! it is read the way a browser reads it. Normalization rewrites the source
//! with every escape resolved and every comment elided, repeating until the
//! text stops changing, and then re-tokenizes the result into declarations,
//! at-rules and loose tokens. After this, plain case-insensitive name
//! comparison is enough for allow-list checks.
//!
//! Positions on normalized items point into the rewritten text. That text
//! matches the source wherever no escape or comment was removed before it.

use std::collections::VecDeque;
use std::mem;

use scour_text::Position;

use crate::token::{AtRule, CssNode, CssToken, Declaration};
use crate::tokenizer::{Tokenizer, MAX_NESTING};

/// Upper bound on rewrite passes
const MAX_ROUNDS: usize = 8;

/// Normalized token sequence; see [`Tokenizer::normalize`]
pub struct Normalize {
    tokenizer: Tokenizer,
    lookahead: VecDeque<CssNode>,
    depth: usize,
}

impl Normalize {
    pub(crate) fn new(mut raw: Tokenizer) -> Self {
        let mut text = resolve(&mut raw);
        for round in 1..MAX_ROUNDS {
            let next = resolve(&mut Tokenizer::new(&text));
            if next == text {
                break;
            }
            log::trace!("CSS normalization round {} rewrote input", round);
            text = next;
        }

        Self {
            tokenizer: Tokenizer::new(&text),
            lookahead: VecDeque::new(),
            depth: 0,
        }
    }

    /// Next token with comments dropped, lookahead first
    fn next_raw(&mut self) -> Option<CssNode> {
        if let Some(node) = self.lookahead.pop_front() {
            return Some(node);
        }
        loop {
            let mut node = self.tokenizer.next_node();
            match node.token {
                CssToken::Eof => return None,
                CssToken::Comment { .. } => continue,
                _ => {
                    propagate_bad(&mut node.token);
                    return Some(node);
                }
            }
        }
    }

    fn unread(&mut self, nodes: Vec<CssNode>) {
        for node in nodes.into_iter().rev() {
            self.lookahead.push_front(node);
        }
    }

    /// An identifier followed by optional whitespace and `:` opens a declaration
    fn after_ident(&mut self, property: String, position: Position) -> CssNode {
        let mut gap = Vec::new();
        loop {
            match self.next_raw() {
                Some(colon) if colon.token == CssToken::Colon => {
                    return self.declaration(property, position, gap, colon);
                }
                Some(ws) if ws.is_whitespace() => gap.push(ws),
                other => {
                    gap.extend(other);
                    self.unread(gap);
                    return CssNode::new(CssToken::Ident(property), position);
                }
            }
        }
    }

    fn declaration(&mut self, property: String, position: Position, gap: Vec<CssNode>, colon: CssNode) -> CssNode {
        self.tokenizer.set_value_mode(true);
        let mut value = Vec::new();
        let mut terminated = false;
        while let Some(node) = self.next_raw() {
            match node.token {
                CssToken::Semicolon => {
                    terminated = true;
                    break;
                }
                CssToken::RightBrace => {
                    self.lookahead.push_front(node);
                    break;
                }
                CssToken::LeftBrace => {
                    // `a:hover {` was a selector
                    self.tokenizer.set_value_mode(false);
                    let mut replay = gap;
                    replay.push(colon);
                    replay.extend(value);
                    replay.push(node);
                    self.unread(replay);
                    return CssNode::new(CssToken::Ident(property), position);
                }
                _ => value.push(node),
            }
        }
        self.tokenizer.set_value_mode(false);

        let declaration = Declaration {
            property,
            value,
            terminated,
        };
        CssNode::new(CssToken::Declaration(declaration), position)
    }

    fn at_rule(&mut self, name: String, position: Position) -> CssNode {
        let mut prelude = Vec::new();
        loop {
            let Some(node) = self.next_raw() else {
                return at_rule(name, position, prelude, None, false);
            };
            match node.token {
                CssToken::Semicolon => return at_rule(name, position, prelude, None, true),
                CssToken::RightBrace => {
                    self.lookahead.push_front(node);
                    return at_rule(name, position, prelude, None, false);
                }
                CssToken::LeftBrace => break,
                _ => prelude.push(node),
            }
        }

        if self.depth >= MAX_NESTING {
            log::debug!("Dropping @{} block nested deeper than {} levels", name, MAX_NESTING);
            let terminated = self.skip_block();
            return at_rule(name, position, prelude, Some(Vec::new()), terminated);
        }

        self.depth += 1;
        let mut block = Vec::new();
        let mut braces = 0usize;
        let terminated = loop {
            let Some(node) = self.next() else {
                break false;
            };
            match node.token {
                CssToken::RightBrace if braces == 0 => break true,
                CssToken::LeftBrace => braces += 1,
                CssToken::RightBrace => braces -= 1,
                _ => {}
            }
            block.push(node);
        };
        self.depth -= 1;

        at_rule(name, position, prelude, Some(block), terminated)
    }

    /// Skip to the `}` closing an already consumed `{`
    fn skip_block(&mut self) -> bool {
        let mut braces = 1usize;
        while let Some(node) = self.next_raw() {
            match node.token {
                CssToken::LeftBrace => braces += 1,
                CssToken::RightBrace => {
                    braces -= 1;
                    if braces == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }
}

impl Iterator for Normalize {
    type Item = CssNode;

    fn next(&mut self) -> Option<CssNode> {
        let CssNode { position, token } = self.next_raw()?;
        match token {
            CssToken::Ident(name) => Some(self.after_ident(name, position)),
            CssToken::AtKeyword(name) => Some(self.at_rule(name, position)),
            token => Some(CssNode::new(token, position)),
        }
    }
}

fn at_rule(
    name: String,
    position: Position,
    prelude: Vec<CssNode>,
    block: Option<Vec<CssNode>>,
    terminated: bool,
) -> CssNode {
    let rule = AtRule {
        name,
        prelude,
        block,
        terminated,
    };
    CssNode::new(CssToken::AtRule(rule), position)
}

/// Rewrite the remaining source with escapes resolved and comments elided.
///
/// Tokens flagged bad are written in a form that reads back as bad.
fn resolve(tokenizer: &mut Tokenizer) -> String {
    let mut rewrite = Rewrite::default();
    for node in tokenizer {
        rewrite.token(&node.token);
    }
    rewrite.finish()
}

#[derive(Default)]
struct Rewrite {
    out: String,
    /// A bad string was written and still needs its line break
    open_string: bool,
}

impl Rewrite {
    fn finish(mut self) -> String {
        self.close_string();
        self.out
    }

    fn close_string(&mut self) {
        if mem::take(&mut self.open_string) {
            self.out.push('\n');
        }
    }

    fn token(&mut self, token: &CssToken) {
        match token {
            CssToken::Comment { .. } | CssToken::Eof => return,
            CssToken::Whitespace(ws) if ws.starts_with(['\n', '\x0C']) => self.open_string = false,
            _ => self.close_string(),
        }

        match token {
            CssToken::Ident(name) => self.out.push_str(name),
            CssToken::AtKeyword(name) => {
                self.out.push('@');
                self.out.push_str(name);
            }
            CssToken::Hash(name) | CssToken::Color(name) => {
                self.out.push('#');
                self.out.push_str(name);
            }
            CssToken::String { value, quote, bad } => {
                self.out.push(*quote);
                quote_into(value, *quote, &mut self.out);
                if *bad {
                    self.open_string = true;
                } else {
                    self.out.push(*quote);
                }
            }
            CssToken::Url { function, data, bad } => {
                self.out.push_str(function);
                self.out.push_str("(\"");
                quote_into(data, '"', &mut self.out);
                // A line break in quoted url data starts bad-url recovery
                self.out.push_str(if *bad { "\n)" } else { "\")" });
            }
            CssToken::Function { name, args, bad } => {
                self.out.push_str(name);
                self.out.push('(');
                for arg in args {
                    self.token(&arg.token);
                }
                if *bad && !args.iter().any(|arg| reads_back_bad(&arg.token)) {
                    self.out.push('"');
                    self.open_string = true;
                }
                self.close_string();
                self.out.push(')');
            }
            CssToken::Dimension { value, unit } => {
                self.out.push_str(value);
                self.out.push_str(unit);
            }
            CssToken::Delim(c) => self.out.push(*c),
            other => self.out.push_str(&other.to_string()),
        }
    }
}

/// Comments are elided, so their flag does not survive a rewrite
fn reads_back_bad(token: &CssToken) -> bool {
    token.is_bad() && !matches!(token, CssToken::Comment { .. })
}

/// Functions holding recovered input are bad themselves
fn propagate_bad(token: &mut CssToken) -> bool {
    if let CssToken::Function { args, bad, .. } = token {
        let mut inner = false;
        for arg in args.iter_mut() {
            inner |= propagate_bad(&mut arg.token);
        }
        *bad |= inner;
    }
    token.is_bad()
}

/// String body with only the characters that would end it escaped
fn quote_into(value: &str, quote: char, out: &mut String) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            '\x0C' => out.push_str("\\c "),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(css: &str) -> Vec<CssToken> {
        Tokenizer::new(css).normalize().map(|node| node.token).collect()
    }

    fn declaration(token: &CssToken) -> &Declaration {
        match token {
            CssToken::Declaration(decl) => decl,
            other => panic!("Expected Declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_escaped_url_forms_group_equally() {
        let plain = normalize(r"background-image:url(javascript:alert('XSS'))");
        assert_eq!(plain.len(), 1);

        let quoted = normalize(r"background-image:\0075\0072\006C\0028'\006a\0061\0076\0061\0073\0063\0072\0069\0070\0074\003a\0061\006c\0065\0072\0074\0028\0027\0058\0053\0053\0027\0029'\0029");
        assert_eq!(plain.len(), quoted.len());

        let unquoted = normalize(r"background-image:\0075\0072\006C\0028\006a\0061\0076\0061\0073\0063\0072\0069\0070\0074\003a\0061\006c\0065\0072\0074\0028\0027\0058\0053\0053\0027\0029\0029");
        assert_eq!(plain.len(), unquoted.len());

        let mixed = normalize(r"background-image:\0075r\006C\0028'\006a\0061\0076\0061\0073\0063\0072\0069\0070\0074\003a\0061\006c\0065\0072\0074\0028\0027\0058\0053\0053\0027\0029'\0029");
        assert_eq!(plain.len(), mixed.len());
    }

    #[test]
    fn test_escaped_url_is_resolved() {
        let items = normalize(r"background-image:\0075\0072\006C\0028'\006a\0061\0076\0061\0073\0063\0072\0069\0070\0074\003a\0061\006c\0065\0072\0074\0028\0027\0058\0053\0053\0027\0029'\0029");
        let decl = declaration(&items[0]);
        assert_eq!(decl.property, "background-image");
        assert!(matches!(decl.value[0].token, CssToken::Url { ref data, bad: false, .. }
            if data == "javascript:alert('XSS')"));
    }

    #[test]
    fn test_comments_split_names_group_equally() {
        let plain = normalize("xss:expression(alert('XSS'))");
        let split = normalize("xss:expr/*XSS*/ession(alert('XSS'))");
        let twice = normalize("xss:expr/*XSS*/ess/*XSS*/ion(alert('XSS'))");
        assert_eq!(plain.len(), 1);
        assert_eq!(plain.len(), split.len());
        assert_eq!(plain.len(), twice.len());

        let decl = declaration(&twice[0]);
        assert!(matches!(decl.value[0].token, CssToken::Function { ref name, .. } if name == "expression"));
    }

    #[test]
    fn test_double_encoded_escape() {
        let items = normalize(r"x:\5c 65xpression(1)");
        let decl = declaration(&items[0]);
        assert!(matches!(decl.value[0].token, CssToken::Function { ref name, .. } if name == "expression"));
    }

    #[test]
    fn test_declarations_and_terminators() {
        let items = normalize("margin: 8px; bla: 1px");
        assert_eq!(items.len(), 3);
        let first = declaration(&items[0]);
        assert_eq!(first.property, "margin");
        assert!(first.terminated);
        assert_eq!(first.value.len(), 2);
        assert!(items[1].is_whitespace());
        let second = declaration(&items[2]);
        assert_eq!(second.property, "bla");
        assert!(!second.terminated);
    }

    #[test]
    fn test_value_mode_colors() {
        let items = normalize("color:#fff");
        let decl = declaration(&items[0]);
        assert_eq!(decl.value[0].token, CssToken::Color("fff".into()));
    }

    #[test]
    fn test_selector_with_pseudo_class_stays_flat() {
        let items = normalize("a:hover { color: red }");
        assert_eq!(items[0], CssToken::Ident("a".into()));
        assert_eq!(items[1], CssToken::Colon);
        assert_eq!(items[2], CssToken::Ident("hover".into()));
        assert!(items[3].is_whitespace());
        assert_eq!(items[4], CssToken::LeftBrace);
        let decl = declaration(&items[6]);
        assert_eq!(decl.property, "color");
        assert!(!decl.terminated);
        assert_eq!(items[7], CssToken::RightBrace);
        assert_eq!(items.len(), 8);
    }

    #[test]
    fn test_statement_at_rule() {
        let items = normalize("@import 'x.css'; p{}");
        match &items[0] {
            CssToken::AtRule(rule) => {
                assert_eq!(rule.name, "import");
                assert!(rule.block.is_none());
                assert!(rule.terminated);
                assert!(matches!(rule.prelude[1].token, CssToken::String { ref value, .. } if value == "x.css"));
            }
            other => panic!("Expected AtRule, got {:?}", other),
        }
        assert_eq!(items[2], CssToken::Ident("p".into()));
        assert_eq!(items[3], CssToken::LeftBrace);
    }

    #[test]
    fn test_block_at_rule() {
        let items = normalize("@media screen { p { color: red; } } b");
        match &items[0] {
            CssToken::AtRule(rule) => {
                assert_eq!(rule.name, "media");
                assert!(rule.terminated);
                let block = rule.block.as_ref().unwrap();
                assert!(block.iter().any(|n| matches!(n.token, CssToken::Declaration(ref d) if d.property == "color")));
                assert_eq!(block.iter().filter(|n| n.token == CssToken::RightBrace).count(), 1);
            }
            other => panic!("Expected AtRule, got {:?}", other),
        }
        assert_eq!(items.last(), Some(&CssToken::Ident("b".into())));
    }

    #[test]
    fn test_bad_tokens_stay_bad() {
        let items = normalize("color: rgb(1, 2");
        assert!(matches!(declaration(&items[0]).value[1].token, CssToken::Function { ref name, bad: true, .. } if name == "rgb"));

        let items = normalize("background: url(a\"b) ");
        assert!(matches!(declaration(&items[0]).value[1].token, CssToken::Url { bad: true, .. }));

        let items = normalize("font-family: 'open\n; color: red");
        assert!(matches!(declaration(&items[0]).value[1].token, CssToken::String { bad: true, .. }));

        let items = normalize("x: f(g(1)");
        assert!(matches!(declaration(&items[0]).value[1].token, CssToken::Function { bad: true, .. }));

        let nested = format!("x: {}{}; color: red", "f(".repeat(40), ")".repeat(40));
        let items = normalize(&nested);
        assert!(declaration(&items[0]).value[1].is_bad());
        assert_eq!(declaration(&items[2]).property, "color");
    }

    #[test]
    fn test_rewrite_reaches_fixed_point_for_bad_tokens() {
        for css in ["color: rgb(1, 2", "background: url(a\"b) ", "a: 'open\nb", "s: 'x\\"] {
            let once = resolve(&mut Tokenizer::new(css));
            assert_eq!(resolve(&mut Tokenizer::new(&once)), once, "{:?}", css);
        }
    }

    #[test]
    fn test_items_keep_positions() {
        let items: Vec<CssNode> = Tokenizer::new("p {\n  color: red;\n}").normalize().collect();
        assert_eq!(items[4].position, Position::new(2, 3, 6));
        match &items[4].token {
            CssToken::Declaration(decl) => {
                assert_eq!(decl.value[1].token, CssToken::Ident("red".into()));
                assert_eq!(decl.value[1].position, Position::new(2, 10, 13));
            }
            other => panic!("Expected Declaration, got {:?}", other),
        }
        assert_eq!(items[6].position, Position::new(3, 1, 18));
    }

    #[test]
    fn test_comments_removed() {
        let items = normalize("/* a */ p /* b */");
        assert!(!items.iter().any(|t| matches!(t, CssToken::Comment { .. })));
    }

    #[test]
    fn test_deep_at_rules_are_bounded() {
        let css = format!("{}{}", "@media x{".repeat(50), "}".repeat(50));
        let items = normalize(&css);
        assert_eq!(items.len(), 1);
    }
}
