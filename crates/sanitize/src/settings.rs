//! Sanitizer allow-lists
//!
//! Every set is matched case-insensitively; names are stored lowercase.

use std::sync::LazyLock;

use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

/// Settings result type
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors loading a sanitize policy
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid sanitize policy: {0}")]
    Json(#[from] serde_json::Error),
}

/// What happens to an element when one of its URI attributes is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UriPolicy {
    /// Only the offending attribute is removed
    #[default]
    DropAttribute,
    /// The whole element is removed, with its content
    DropElement,
}

/// How a start or end tag is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagBehavior {
    /// The element and its content are removed
    Discard,
    Allow,
    /// The tag is written as escaped text and its content is kept
    Encode,
}

const DEFAULT_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "area", "b", "bdo", "big", "blockquote", "br", "button",
    "caption", "center", "cite", "code", "col", "colgroup", "dd", "del", "dfn", "dir", "div", "dl",
    "dt", "em", "fieldset", "font", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "input",
    "ins", "kbd", "label", "legend", "li", "map", "menu", "ol", "optgroup", "option", "p", "pre",
    "q", "s", "samp", "select", "small", "span", "strike", "strong", "sub", "sup", "table",
    "tbody", "td", "textarea", "tfoot", "th", "thead", "tr", "tt", "u", "ul", "var",
];

const DEFAULT_ATTRIBUTES: &[&str] = &[
    "align", "alt", "bgcolor", "border", "cellpadding", "cellspacing", "colspan", "coords",
    "datetime", "dir", "for", "height", "href", "name", "rel", "rowspan", "shape", "span", "src",
    "style", "target", "title", "type", "valign", "value", "width",
];

const DEFAULT_SCHEMES: &[&str] = &["data", "ftp", "http", "https", "mailto"];

const DEFAULT_URI_ATTRIBUTES: &[&str] = &[
    "action", "background", "cite", "codebase", "data", "dynsrc", "formaction", "href", "icon",
    "longdesc", "lowsrc", "poster", "src", "usemap",
];

const DEFAULT_CSS_PROPS: &[&str] = &[
    "background", "background-attachment", "background-color", "background-image",
    "background-position", "background-repeat", "background-size", "border", "border-bottom",
    "border-bottom-color", "border-bottom-style", "border-bottom-width", "border-collapse",
    "border-color", "border-left", "border-left-color", "border-left-style", "border-left-width",
    "border-radius", "border-right", "border-right-color", "border-right-style",
    "border-right-width", "border-spacing", "border-style", "border-top", "border-top-color",
    "border-top-style", "border-top-width", "border-width", "bottom", "caption-side", "clear",
    "color", "content", "counter-increment", "counter-reset", "cursor", "direction", "display",
    "empty-cells", "float", "font", "font-family", "font-size", "font-style", "font-variant",
    "font-weight", "height", "left", "letter-spacing", "line-height", "list-style",
    "list-style-image", "list-style-position", "list-style-type", "margin", "margin-bottom",
    "margin-left", "margin-right", "margin-top", "max-height", "max-width", "min-height",
    "min-width", "opacity", "outline", "outline-color", "outline-style", "outline-width",
    "overflow", "padding", "padding-bottom", "padding-left", "padding-right", "padding-top",
    "page-break-after", "page-break-before", "page-break-inside", "quotes", "right",
    "table-layout", "text-align", "text-decoration", "text-indent", "text-transform", "top",
    "unicode-bidi", "vertical-align", "visibility", "white-space", "width", "word-spacing",
    "z-index",
];

const DEFAULT_CSS_FUNCTIONS: &[&str] = &[
    "calc", "clamp", "hsl", "hsla", "linear-gradient", "max", "min", "radial-gradient",
    "repeating-linear-gradient", "repeating-radial-gradient", "rgb", "rgba",
];

const DEFAULT_CSS_AT_RULES: &[&str] = &[
    "font-face", "keyframes", "-webkit-keyframes", "media", "page", "supports",
];

static SHARED: LazyLock<SanitizeSettings> = LazyLock::new(SanitizeSettings::hardened);

/// Immutable sanitizer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeSettings {
    allowed_tags: FxHashSet<String>,
    encoded_tags: FxHashSet<String>,
    allowed_attributes: FxHashSet<String>,
    allowed_schemes: FxHashSet<String>,
    uri_attributes: FxHashSet<String>,
    allowed_css_props: FxHashSet<String>,
    allowed_css_functions: FxHashSet<String>,
    allowed_css_at_rules: FxHashSet<String>,
    uri_policy: UriPolicy,
}

impl SanitizeSettings {
    /// The shared hardened defaults
    pub fn shared() -> &'static Self {
        &SHARED
    }

    fn hardened() -> Self {
        Self {
            allowed_tags: name_set(DEFAULT_TAGS),
            encoded_tags: FxHashSet::default(),
            allowed_attributes: name_set(DEFAULT_ATTRIBUTES),
            allowed_schemes: name_set(DEFAULT_SCHEMES),
            uri_attributes: name_set(DEFAULT_URI_ATTRIBUTES),
            allowed_css_props: name_set(DEFAULT_CSS_PROPS),
            allowed_css_functions: name_set(DEFAULT_CSS_FUNCTIONS),
            allowed_css_at_rules: name_set(DEFAULT_CSS_AT_RULES),
            uri_policy: UriPolicy::default(),
        }
    }

    /// Start a customized copy of these settings
    pub fn to_builder(&self) -> SettingsBuilder {
        SettingsBuilder {
            settings: self.clone(),
        }
    }

    /// Load a policy from JSON.
    ///
    /// Each list present in the object replaces the corresponding default
    /// list; missing keys keep the defaults.
    pub fn from_json(json: &str) -> SettingsResult<Self> {
        let policy: PolicyFile = serde_json::from_str(json)?;
        let mut settings = Self::hardened();
        replace(&mut settings.allowed_tags, policy.allowed_tags);
        replace(&mut settings.encoded_tags, policy.encoded_tags);
        replace(&mut settings.allowed_attributes, policy.allowed_attributes);
        replace(&mut settings.allowed_schemes, policy.allowed_schemes);
        replace(&mut settings.uri_attributes, policy.uri_attributes);
        replace(&mut settings.allowed_css_props, policy.allowed_css_props);
        replace(&mut settings.allowed_css_functions, policy.allowed_css_functions);
        replace(&mut settings.allowed_css_at_rules, policy.allowed_css_at_rules);
        if let Some(uri_policy) = policy.uri_policy {
            settings.uri_policy = uri_policy;
        }
        Ok(settings)
    }

    pub fn allows_tag(&self, name: &str) -> bool {
        contains(&self.allowed_tags, name)
    }

    /// Allowed tags win over encoded ones; anything else is discarded
    pub fn tag_behavior(&self, name: &str) -> TagBehavior {
        if self.allows_tag(name) {
            TagBehavior::Allow
        } else if contains(&self.encoded_tags, name) {
            TagBehavior::Encode
        } else {
            TagBehavior::Discard
        }
    }

    pub fn allows_attribute(&self, name: &str) -> bool {
        contains(&self.allowed_attributes, name)
    }

    pub fn allows_scheme(&self, scheme: &str) -> bool {
        contains(&self.allowed_schemes, scheme)
    }

    pub fn is_uri_attribute(&self, name: &str) -> bool {
        contains(&self.uri_attributes, name)
    }

    pub fn allows_css_property(&self, name: &str) -> bool {
        contains(&self.allowed_css_props, name)
    }

    pub fn allows_css_function(&self, name: &str) -> bool {
        contains(&self.allowed_css_functions, name)
    }

    pub fn allows_css_at_rule(&self, name: &str) -> bool {
        contains(&self.allowed_css_at_rules, name)
    }

    pub fn uri_policy(&self) -> UriPolicy {
        self.uri_policy
    }
}

impl Default for SanitizeSettings {
    fn default() -> Self {
        Self::shared().clone()
    }
}

/// Builder for custom settings, see [`SanitizeSettings::to_builder`]
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    settings: SanitizeSettings,
}

impl SettingsBuilder {
    pub fn allow_tags<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, tags: I) -> Self {
        insert_all(&mut self.settings.allowed_tags, tags);
        self
    }

    /// Discard these tags, whether they were allowed or encoded
    pub fn remove_tags<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, tags: I) -> Self {
        let tags: Vec<S> = tags.into_iter().collect();
        remove_all(&mut self.settings.allowed_tags, &tags);
        remove_all(&mut self.settings.encoded_tags, &tags);
        self
    }

    /// Write these tags out as text instead of dropping them
    pub fn encode_tags<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, tags: I) -> Self {
        let tags: Vec<S> = tags.into_iter().collect();
        remove_all(&mut self.settings.allowed_tags, &tags);
        insert_all(&mut self.settings.encoded_tags, &tags);
        self
    }

    pub fn allow_attributes<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        insert_all(&mut self.settings.allowed_attributes, names);
        self
    }

    pub fn remove_attributes<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        remove_all(&mut self.settings.allowed_attributes, names);
        self
    }

    pub fn allow_schemes<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, schemes: I) -> Self {
        insert_all(&mut self.settings.allowed_schemes, schemes);
        self
    }

    pub fn remove_schemes<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, schemes: I) -> Self {
        remove_all(&mut self.settings.allowed_schemes, schemes);
        self
    }

    pub fn add_uri_attributes<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        insert_all(&mut self.settings.uri_attributes, names);
        self
    }

    pub fn remove_uri_attributes<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        remove_all(&mut self.settings.uri_attributes, names);
        self
    }

    pub fn allow_css_properties<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        insert_all(&mut self.settings.allowed_css_props, names);
        self
    }

    pub fn remove_css_properties<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        remove_all(&mut self.settings.allowed_css_props, names);
        self
    }

    pub fn allow_css_functions<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        insert_all(&mut self.settings.allowed_css_functions, names);
        self
    }

    pub fn remove_css_functions<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        remove_all(&mut self.settings.allowed_css_functions, names);
        self
    }

    pub fn allow_css_at_rules<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        insert_all(&mut self.settings.allowed_css_at_rules, names);
        self
    }

    pub fn remove_css_at_rules<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        remove_all(&mut self.settings.allowed_css_at_rules, names);
        self
    }

    pub fn uri_policy(mut self, policy: UriPolicy) -> Self {
        self.settings.uri_policy = policy;
        self
    }

    pub fn build(self) -> SanitizeSettings {
        self.settings
    }
}

/// JSON policy file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PolicyFile {
    allowed_tags: Option<Vec<String>>,
    encoded_tags: Option<Vec<String>>,
    allowed_attributes: Option<Vec<String>>,
    allowed_schemes: Option<Vec<String>>,
    uri_attributes: Option<Vec<String>>,
    allowed_css_props: Option<Vec<String>>,
    allowed_css_functions: Option<Vec<String>>,
    allowed_css_at_rules: Option<Vec<String>>,
    uri_policy: Option<UriPolicy>,
}

fn name_set(names: &[&str]) -> FxHashSet<String> {
    names.iter().map(|name| name.to_ascii_lowercase()).collect()
}

fn replace(set: &mut FxHashSet<String>, names: Option<Vec<String>>) {
    if let Some(names) = names {
        *set = names.iter().map(|name| name.to_ascii_lowercase()).collect();
    }
}

fn insert_all<I: IntoIterator<Item = S>, S: AsRef<str>>(set: &mut FxHashSet<String>, names: I) {
    set.extend(names.into_iter().map(|name| name.as_ref().to_ascii_lowercase()));
}

fn remove_all<I: IntoIterator<Item = S>, S: AsRef<str>>(set: &mut FxHashSet<String>, names: I) {
    for name in names {
        set.remove(&name.as_ref().to_ascii_lowercase());
    }
}

fn contains(set: &FxHashSet<String>, name: &str) -> bool {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        set.contains(&name.to_ascii_lowercase())
    } else {
        set.contains(name)
    }
}
