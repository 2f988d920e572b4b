//! CSS filtering for `style` attributes and `<style>` elements
//!
//! Input is always normalized first, so every check below sees resolved
//! escapes and no comments. Output is written through the token
//! serializer, which never emits a literal `<`.

use scour_css::{tokenize, AtRule, CssNode, CssToken, Declaration};

use crate::settings::SanitizeSettings;
use crate::url::sanitize_url;

/// Where the CSS being sanitized came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssContext {
    /// A `style` attribute: only declarations survive
    Attribute,
    /// The content of a `<style>` element
    Stylesheet,
}

/// Filter CSS against the allowed properties, functions and at-rules
pub fn sanitize_css(css: &str, settings: &SanitizeSettings, context: CssContext) -> String {
    let items = tokenize(css).normalize();
    let mut out = String::new();
    match context {
        CssContext::Attribute => {
            let mut needs_separator = false;
            for item in items {
                let CssToken::Declaration(decl) = item.token else {
                    continue;
                };
                if let Some(decl) = sanitize_declaration(decl, settings) {
                    if needs_separator {
                        out.push(';');
                    }
                    needs_separator = !decl.terminated;
                    out.push_str(&decl.to_string());
                }
            }
        }
        CssContext::Stylesheet => {
            for item in filter_rules(items, settings) {
                out.push_str(&item.to_string());
            }
        }
    }
    out
}

/// Filter a sequence of normalized items, at-rule blocks included
fn filter_rules(items: impl IntoIterator<Item = CssNode>, settings: &SanitizeSettings) -> Vec<CssNode> {
    let mut kept = Vec::new();
    for CssNode { position, token } in items {
        let token = match token {
            CssToken::Declaration(decl) => sanitize_declaration(decl, settings).map(CssToken::Declaration),
            CssToken::AtRule(rule) => sanitize_at_rule(rule, settings).map(CssToken::AtRule),
            mut token => sanitize_flat(&mut token, settings).then_some(token),
        };
        match token {
            Some(token) => kept.push(CssNode::new(token, position)),
            None => log::trace!("Dropped CSS item at {}", position),
        }
    }
    kept
}

fn sanitize_declaration(mut decl: Declaration, settings: &SanitizeSettings) -> Option<Declaration> {
    if !settings.allows_css_property(&decl.property) {
        log::debug!("Dropping CSS property {:?}", decl.property);
        return None;
    }
    if !sanitize_tokens(&mut decl.value, settings) {
        log::debug!("Dropping CSS declaration {:?} with an unsafe value", decl.property);
        return None;
    }
    Some(decl)
}

fn sanitize_at_rule(mut rule: AtRule, settings: &SanitizeSettings) -> Option<AtRule> {
    if !settings.allows_css_at_rule(&rule.name) {
        log::debug!("Dropping @{} rule", rule.name);
        return None;
    }
    if !sanitize_tokens(&mut rule.prelude, settings) {
        log::debug!("Dropping @{} rule with an unsafe prelude", rule.name);
        return None;
    }
    rule.block = rule.block.map(|block| filter_rules(block, settings));
    Some(rule)
}

/// Selectors and punctuation between rules; only active content is checked
fn sanitize_flat(token: &mut CssToken, settings: &SanitizeSettings) -> bool {
    match token {
        CssToken::Cdo | CssToken::Cdc => false,
        CssToken::Function { .. } | CssToken::Url { .. } => sanitize_token(token, settings),
        token => !token.is_bad(),
    }
}

fn sanitize_tokens(nodes: &mut [CssNode], settings: &SanitizeSettings) -> bool {
    nodes.iter_mut().all(|node| sanitize_token(&mut node.token, settings))
}

/// Check a single token, rewriting kept URLs to their canonical form
fn sanitize_token(token: &mut CssToken, settings: &SanitizeSettings) -> bool {
    if token.is_bad() {
        return false;
    }
    match token {
        CssToken::Function { name, args, .. } => {
            if !settings.allows_css_function(name) {
                log::debug!("Dropping CSS function {}()", name);
                return false;
            }
            sanitize_tokens(args, settings)
        }
        CssToken::Url { data, .. } => match sanitize_url(data, settings) {
            Some(url) => {
                *data = url;
                true
            }
            None => false,
        },
        CssToken::Ident(text)
        | CssToken::AtKeyword(text)
        | CssToken::Hash(text)
        | CssToken::Color(text)
        | CssToken::String { value: text, .. }
        | CssToken::Dimension { unit: text, .. } => !has_angle_bracket(text),
        CssToken::Delim('<') | CssToken::Delim('>') => false,
        CssToken::Cdo | CssToken::Cdc => false,
        // Grouped items never nest inside values
        CssToken::Declaration(_) | CssToken::AtRule(_) => false,
        _ => true,
    }
}

fn has_angle_bracket(text: &str) -> bool {
    text.contains(['<', '>'])
}
