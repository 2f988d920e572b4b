//! The node filter
//!
//! Tags, attributes and text are checked against [`SanitizeSettings`] one
//! node at a time. Content of a dropped element is skipped by counting the
//! start and end tags nested inside it. Encoded tags are turned into text
//! nodes holding their markup.

use rustc_hash::FxHashSet;
use scour_html::{is_void_element, to_html, Attributes, HtmlNode, NodeKind};
use scour_text::Position;

use crate::css::{sanitize_css, CssContext};
use crate::settings::{SanitizeSettings, TagBehavior, UriPolicy};
use crate::url::sanitize_url;

/// Lazy sanitizing adapter over an HTML node stream
pub struct Sanitize<'s, I> {
    nodes: I,
    settings: &'s SanitizeSettings,
    /// Open elements inside the element being removed
    remove_depth: Option<usize>,
    in_style: bool,
}

impl<'s, I> Sanitize<'s, I>
where
    I: Iterator<Item = HtmlNode>,
{
    pub fn new(nodes: I, settings: &'s SanitizeSettings) -> Self {
        Self {
            nodes,
            settings,
            remove_depth: None,
            in_style: false,
        }
    }

    fn filter(&mut self, node: HtmlNode) -> Option<HtmlNode> {
        let empty = node.is_empty_element();
        let HtmlNode { position, kind } = node;
        match kind {
            NodeKind::Text(text) => {
                if self.remove_depth.is_some() {
                    return None;
                }
                if !self.in_style {
                    return Some(HtmlNode::new(NodeKind::Text(text), position));
                }
                let css = sanitize_css(&text, self.settings, CssContext::Stylesheet);
                if css.is_empty() {
                    return None;
                }
                Some(HtmlNode::new(NodeKind::Text(css), position))
            }
            NodeKind::Comment { .. } | NodeKind::Doctype { .. } => None,
            NodeKind::StartTag { name, attributes, self_closing } => {
                if let Some(depth) = self.remove_depth.as_mut() {
                    if !empty {
                        *depth += 1;
                    }
                    return None;
                }
                match self.settings.tag_behavior(&name) {
                    TagBehavior::Allow => {}
                    TagBehavior::Encode => {
                        log::debug!("Encoding <{}> at {}", name, position);
                        return Some(encode(NodeKind::StartTag { name, attributes, self_closing }, position));
                    }
                    TagBehavior::Discard => {
                        log::debug!("Dropping <{}> at {}", name, position);
                        self.start_removal(empty);
                        return None;
                    }
                }
                let Some(attributes) = self.filter_attributes(&name, attributes) else {
                    log::debug!("Dropping <{}> with a rejected URL at {}", name, position);
                    self.start_removal(empty);
                    return None;
                };
                if name == "img" && !attributes.iter().any(|(key, _)| key == "src") {
                    log::debug!("Dropping <img> without a usable src at {}", position);
                    self.start_removal(empty);
                    return None;
                }
                if name == "style" && !empty {
                    self.in_style = true;
                }
                Some(HtmlNode::new(
                    NodeKind::StartTag { name, attributes, self_closing },
                    position,
                ))
            }
            NodeKind::EndTag { name } => {
                // Void elements never opened a level
                if is_void_element(&name) {
                    return None;
                }
                if name == "style" {
                    self.in_style = false;
                }
                match self.remove_depth {
                    Some(0) => {
                        self.remove_depth = None;
                        None
                    }
                    Some(depth) => {
                        self.remove_depth = Some(depth - 1);
                        None
                    }
                    None => match self.settings.tag_behavior(&name) {
                        TagBehavior::Allow => Some(HtmlNode::new(NodeKind::EndTag { name }, position)),
                        TagBehavior::Encode => Some(encode(NodeKind::EndTag { name }, position)),
                        TagBehavior::Discard => None,
                    },
                }
            }
        }
    }

    fn start_removal(&mut self, empty: bool) {
        if !empty {
            self.remove_depth = Some(0);
        }
    }

    /// Kept attributes, or `None` when the element itself must go
    fn filter_attributes(&self, tag: &str, attributes: Attributes) -> Option<Attributes> {
        let mut seen = FxHashSet::default();
        let mut kept = Attributes::new();
        for (key, value) in attributes {
            if !seen.insert(key.clone()) {
                continue;
            }
            if !self.settings.allows_attribute(&key) {
                log::debug!("Dropping attribute {} on <{}>", key, tag);
                continue;
            }
            // Netscape JavaScript entities
            if value.starts_with("&{") {
                log::debug!("Dropping script entity in {} on <{}>", key, tag);
                continue;
            }
            if key == "style" {
                let css = sanitize_css(&value, self.settings, CssContext::Attribute);
                if css.trim().is_empty() {
                    log::debug!("Dropping empty style on <{}>", tag);
                    continue;
                }
                kept.push((key, css));
                continue;
            }
            if self.settings.is_uri_attribute(&key) {
                match sanitize_url(&value, self.settings) {
                    Some(url) => kept.push((key, url)),
                    None => match self.settings.uri_policy() {
                        UriPolicy::DropAttribute => {
                            log::debug!("Dropping {} on <{}>: rejected URL {:?}", key, tag, value);
                        }
                        UriPolicy::DropElement => return None,
                    },
                }
                continue;
            }
            kept.push((key, value));
        }
        Some(kept)
    }
}

/// Text node showing the tag's markup
fn encode(kind: NodeKind, position: Position) -> HtmlNode {
    let markup = to_html([HtmlNode::new(kind, position)]);
    HtmlNode::new(NodeKind::Text(markup), position)
}

impl<I> Iterator for Sanitize<'_, I>
where
    I: Iterator<Item = HtmlNode>,
{
    type Item = HtmlNode;

    fn next(&mut self) -> Option<HtmlNode> {
        loop {
            let node = self.nodes.next()?;
            if let Some(node) = self.filter(node) {
                return Some(node);
            }
        }
    }
}
