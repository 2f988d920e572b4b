//! HTML serialization
//!
//! Writes nodes back out as markup that the tokenizer reads back to the
//! same nodes.

use std::borrow::Borrow;
use std::fmt::{self, Write};

use crate::node::{is_raw_text_element, is_void_element, HtmlNode, NodeKind};

/// Streaming HTML writer over any `fmt::Write` sink
pub struct HtmlWriter<W: Write> {
    out: W,
    /// Raw text element whose content is being written
    raw_text: Option<String>,
}

impl<W: Write> HtmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, raw_text: None }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_node(&mut self, node: &HtmlNode) -> fmt::Result {
        match &node.kind {
            NodeKind::Text(value) => match self.raw_text {
                Some(_) => self.out.write_str(&value.replace("</", "<\\/")),
                None => write_escaped(&mut self.out, value, false),
            },
            NodeKind::Comment { value, .. } => {
                self.out.write_str("<!--")?;
                write_comment_body(&mut self.out, value)?;
                self.out.write_str("-->")
            }
            NodeKind::Doctype { name, public_id, system_id } => {
                write!(self.out, "<!DOCTYPE {}", name)?;
                match (public_id, system_id) {
                    (Some(public_id), system_id) => {
                        self.out.write_str(" PUBLIC ")?;
                        write_quoted_id(&mut self.out, public_id)?;
                        if let Some(system_id) = system_id {
                            self.out.write_char(' ')?;
                            write_quoted_id(&mut self.out, system_id)?;
                        }
                    }
                    (None, Some(system_id)) => {
                        self.out.write_str(" SYSTEM ")?;
                        write_quoted_id(&mut self.out, system_id)?;
                    }
                    (None, None) => {}
                }
                self.out.write_char('>')
            }
            NodeKind::StartTag { name, attributes, self_closing } => {
                write!(self.out, "<{}", name)?;
                for (key, value) in attributes {
                    write!(self.out, " {}", key)?;
                    if !value.is_empty() {
                        self.out.write_str("=\"")?;
                        write_escaped(&mut self.out, value, true)?;
                        self.out.write_char('"')?;
                    }
                }
                if *self_closing && !is_void_element(name) && node.is_empty_element() {
                    self.out.write_str("/>")?;
                } else {
                    self.out.write_char('>')?;
                }
                if is_raw_text_element(name) {
                    self.raw_text = Some(name.clone());
                }
                Ok(())
            }
            NodeKind::EndTag { name } => {
                if self.raw_text.as_deref() == Some(name.as_str()) {
                    self.raw_text = None;
                }
                write!(self.out, "</{}>", name)
            }
        }
    }
}

/// Serialize a node sequence to a string
pub fn to_html<I>(nodes: I) -> String
where
    I: IntoIterator,
    I::Item: Borrow<HtmlNode>,
{
    let mut writer = HtmlWriter::new(String::new());
    for node in nodes {
        // Writing into a String cannot fail
        let _ = writer.write_node(node.borrow());
    }
    writer.into_inner()
}

fn write_escaped<W: Write>(out: &mut W, value: &str, attribute: bool) -> fmt::Result {
    for c in value.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '\u{A0}' => out.write_str("&nbsp;")?,
            '"' if attribute => out.write_str("&quot;")?,
            '<' if !attribute => out.write_str("&lt;")?,
            '>' if !attribute => out.write_str("&gt;")?,
            c => out.write_char(c)?,
        }
    }
    Ok(())
}

/// `--` would end the comment early, so dashes are kept apart
fn write_comment_body<W: Write>(out: &mut W, value: &str) -> fmt::Result {
    let mut previous = None;
    for c in value.chars() {
        if c == '-' && previous == Some('-') {
            out.write_char(' ')?;
        }
        out.write_char(c)?;
        previous = Some(c);
    }
    if previous == Some('-') {
        out.write_char(' ')?;
    }
    Ok(())
}

fn write_quoted_id<W: Write>(out: &mut W, id: &str) -> fmt::Result {
    let quote = if id.contains('"') { '\'' } else { '"' };
    write!(out, "{}{}{}", quote, id, quote)
}
