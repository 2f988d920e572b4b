//! CSS serialization
//!
//! Tokens are written back so that re-tokenizing yields the same tokens.
//! Outside of CDO tokens `<` always comes out as a hex escape, so serialized
//! CSS cannot close an enclosing `<style>` element.

use std::fmt::{self, Write};

use crate::token::{AtRule, CssNode, CssToken, Declaration};
use crate::tokenizer::is_name_char;

impl fmt::Display for CssToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write_ident(f, name),
            Self::AtKeyword(name) => {
                f.write_char('@')?;
                write_ident(f, name)
            }
            Self::Hash(name) | Self::Color(name) => {
                f.write_char('#')?;
                name.chars().try_for_each(|c| write_name_char(f, c))
            }
            Self::String { value, quote, bad } => {
                f.write_char(*quote)?;
                write_string_body(f, value, *quote)?;
                if !bad {
                    f.write_char(*quote)?;
                }
                Ok(())
            }
            Self::Url { function, data, .. } => {
                write_ident(f, function)?;
                f.write_char('(')?;
                if data.chars().all(is_plain_url_char) {
                    f.write_str(data)?;
                } else {
                    f.write_char('"')?;
                    write_string_body(f, data, '"')?;
                    f.write_char('"')?;
                }
                f.write_char(')')
            }
            Self::Function { name, args, .. } => {
                write_ident(f, name)?;
                f.write_char('(')?;
                for arg in args {
                    write!(f, "{}", arg)?;
                }
                f.write_char(')')
            }
            Self::Number(value) => f.write_str(value),
            Self::Percentage(value) => write!(f, "{}%", value),
            Self::Dimension { value, unit } => {
                f.write_str(value)?;
                write_unit(f, unit)
            }
            Self::Range { start, end } => {
                write!(f, "U+{}", start)?;
                match end {
                    Some(end) => write!(f, "-{}", end),
                    None => Ok(()),
                }
            }
            Self::Delim('<') => f.write_str("\\3c "),
            Self::Delim(c) => f.write_char(*c),
            Self::Comment { text, bad } => {
                write!(f, "/*{}", text)?;
                if !bad {
                    f.write_str("*/")?;
                }
                Ok(())
            }
            Self::Whitespace(ws) => f.write_str(ws),
            Self::Match(matcher) => f.write_str(matcher.as_str()),
            Self::Colon => f.write_char(':'),
            Self::Semicolon => f.write_char(';'),
            Self::Comma => f.write_char(','),
            Self::LeftParen => f.write_char('('),
            Self::RightParen => f.write_char(')'),
            Self::LeftBracket => f.write_char('['),
            Self::RightBracket => f.write_char(']'),
            Self::LeftBrace => f.write_char('{'),
            Self::RightBrace => f.write_char('}'),
            Self::Cdo => f.write_str("<!--"),
            Self::Cdc => f.write_str("-->"),
            Self::Declaration(decl) => decl.fmt(f),
            Self::AtRule(rule) => rule.fmt(f),
            Self::Eof => Ok(()),
        }
    }
}

impl fmt::Display for CssNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_ident(f, &self.property)?;
        f.write_char(':')?;
        for token in &self.value {
            write!(f, "{}", token)?;
        }
        if self.terminated {
            f.write_char(';')?;
        }
        Ok(())
    }
}

impl fmt::Display for AtRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('@')?;
        write_ident(f, &self.name)?;
        for token in &self.prelude {
            write!(f, "{}", token)?;
        }
        match &self.block {
            Some(block) => {
                f.write_char('{')?;
                for token in block {
                    write!(f, "{}", token)?;
                }
                if self.terminated {
                    f.write_char('}')?;
                }
            }
            None if self.terminated => f.write_char(';')?,
            None => {}
        }
        Ok(())
    }
}

fn write_ident(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if name == "-" {
        return f.write_str("\\-");
    }
    let dashed = name.starts_with('-');
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_digit() && (i == 0 || (i == 1 && dashed)) {
            write!(f, "\\{:x} ", c as u32)?;
        } else {
            write_name_char(f, c)?;
        }
    }
    Ok(())
}

fn write_name_char(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match c {
        c if is_name_char(c) => f.write_char(c),
        '\0' => f.write_char(char::REPLACEMENT_CHARACTER),
        c if c.is_ascii_control() || c == '<' || c == '>' || c == ' ' => write!(f, "\\{:x} ", c as u32),
        c => {
            f.write_char('\\')?;
            f.write_char(c)
        }
    }
}

/// Units that would read back as an exponent get their `e` escaped
fn write_unit(f: &mut fmt::Formatter<'_>, unit: &str) -> fmt::Result {
    let mut chars = unit.chars();
    match (chars.next(), chars.next()) {
        (Some(e @ ('e' | 'E')), Some(next)) if next.is_ascii_digit() || next == '-' || next == '+' => {
            write!(f, "\\{:x} ", e as u32)?;
            unit.chars().skip(1).try_for_each(|c| write_name_char(f, c))
        }
        _ => write_ident(f, unit),
    }
}

fn write_string_body(f: &mut fmt::Formatter<'_>, value: &str, quote: char) -> fmt::Result {
    for c in value.chars() {
        match c {
            c if c == quote || c == '\\' => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            '\0' => f.write_char(char::REPLACEMENT_CHARACTER)?,
            c if c.is_ascii_control() || c == '<' || c == '>' => write!(f, "\\{:x} ", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

fn is_plain_url_char(c: char) -> bool {
    !matches!(c, '"' | '\'' | '(' | ')' | '\\' | '<' | '>' | ' ' | '\t' | '\n' | '\x0C')
        && !c.is_control()
}
