//! HTML node model

use scour_text::Position;
use smallvec::SmallVec;

/// Attribute list in source order; duplicates are kept
pub type Attributes = SmallVec<[(String, String); 4]>;

/// Elements that never have content or an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose content is not tokenized as markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];

/// Raw text elements that still decode character references
const RCDATA_ELEMENTS: &[&str] = &["textarea", "title"];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

pub fn is_rcdata_element(name: &str) -> bool {
    RCDATA_ELEMENTS.contains(&name)
}

/// A single node of a flat HTML token stream
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlNode {
    /// Where the node started in the normalized input
    pub position: Position,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Character data with references decoded
    Text(String),
    /// Comment, bogus comment or CDATA section
    Comment {
        value: String,
        /// Internet Explorer conditional comment
        conditional: bool,
    },
    Doctype {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    StartTag {
        name: String,
        attributes: Attributes,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
}

impl HtmlNode {
    pub fn new(kind: NodeKind, position: Position) -> Self {
        Self { position, kind }
    }

    /// Tag name for start and end tags
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::StartTag { name, .. } | NodeKind::EndTag { name } => Some(name),
            _ => None,
        }
    }

    /// First value of an attribute on a start tag
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::StartTag { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Whether this start tag has no content to follow
    ///
    /// A trailing `/` does not close raw text elements: `<script/>` still
    /// reads everything up to `</script>` as its content.
    pub fn is_empty_element(&self) -> bool {
        match &self.kind {
            NodeKind::StartTag { name, self_closing, .. } => {
                is_void_element(name)
                    || (*self_closing && !is_raw_text_element(name) && !is_rcdata_element(name))
            }
            _ => false,
        }
    }
}
