//! URL validation and canonicalization

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::{ParseError, Url};

use crate::settings::SanitizeSettings;

/// Base that relative references must resolve against
const RELATIVE_BASE: &str = "http://www.example.com/";

/// Characters escaped in relative references. Non-ASCII is always escaped.
const RELATIVE_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// Validate a URL against the allowed schemes.
///
/// Returns the canonical form to write out, or `None` if the URL must not be
/// used. Absolute URLs are re-serialized by the `url` crate; relative
/// references keep their text with unsafe characters percent-encoded.
pub fn sanitize_url(raw: &str, settings: &SanitizeSettings) -> Option<String> {
    match Url::parse(raw) {
        Ok(url) if settings.allows_scheme(url.scheme()) => Some(url.into()),
        Ok(url) => {
            log::debug!("Rejected URL with scheme {:?}", url.scheme());
            None
        }
        Err(ParseError::RelativeUrlWithoutBase) => sanitize_relative(raw),
        Err(err) => {
            log::debug!("Rejected unparseable URL {:?}: {}", raw, err);
            None
        }
    }
}

fn sanitize_relative(raw: &str) -> Option<String> {
    // `java&#0;script:` style names fail scheme parsing but still hold a colon
    let path_start = raw.find('/').unwrap_or(raw.len());
    if raw[..path_start].contains(':') {
        log::debug!("Rejected relative URL with a colon before its path: {:?}", raw);
        return None;
    }

    let base = Url::parse(RELATIVE_BASE).ok()?;
    match base.join(raw) {
        Ok(resolved) if resolved.scheme() == "http" => {
            Some(utf8_percent_encode(raw, RELATIVE_ESCAPES).to_string())
        }
        Ok(resolved) => {
            log::debug!("Rejected relative URL resolving to {}", resolved);
            None
        }
        Err(err) => {
            log::debug!("Rejected relative URL {:?}: {}", raw, err);
            None
        }
    }
}
