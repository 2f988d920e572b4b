//! Character reference decoding
//!
//! Named references come from a fixed table. Numeric references are mapped
//! the way browsers map them, including the Windows-1252 remapping of C1
//! controls.

use rustc_hash::FxHashMap;
use std::sync::LazyLock;

/// Named character references, without the leading `&` and trailing `;`
const NAMED: &[(&str, &str)] = &[
    ("amp", "&"), ("lt", "<"), ("gt", ">"), ("quot", "\""), ("apos", "'"), ("nbsp", "\u{00A0}"),
    ("iexcl", "\u{00A1}"), ("cent", "\u{00A2}"), ("pound", "\u{00A3}"), ("curren", "\u{00A4}"),
    ("yen", "\u{00A5}"), ("brvbar", "\u{00A6}"), ("sect", "\u{00A7}"), ("uml", "\u{00A8}"),
    ("copy", "\u{00A9}"), ("ordf", "\u{00AA}"), ("laquo", "\u{00AB}"), ("not", "\u{00AC}"),
    ("shy", "\u{00AD}"), ("reg", "\u{00AE}"), ("macr", "\u{00AF}"), ("deg", "\u{00B0}"),
    ("plusmn", "\u{00B1}"), ("sup2", "\u{00B2}"), ("sup3", "\u{00B3}"), ("acute", "\u{00B4}"),
    ("micro", "\u{00B5}"), ("para", "\u{00B6}"), ("middot", "\u{00B7}"), ("cedil", "\u{00B8}"),
    ("sup1", "\u{00B9}"), ("ordm", "\u{00BA}"), ("raquo", "\u{00BB}"), ("frac14", "\u{00BC}"),
    ("frac12", "\u{00BD}"), ("frac34", "\u{00BE}"), ("iquest", "\u{00BF}"), ("times", "\u{00D7}"),
    ("divide", "\u{00F7}"), ("Agrave", "\u{00C0}"), ("Aacute", "\u{00C1}"), ("Acirc", "\u{00C2}"),
    ("Atilde", "\u{00C3}"), ("Auml", "\u{00C4}"), ("Aring", "\u{00C5}"), ("AElig", "\u{00C6}"),
    ("Ccedil", "\u{00C7}"), ("Egrave", "\u{00C8}"), ("Eacute", "\u{00C9}"), ("Ecirc", "\u{00CA}"),
    ("Euml", "\u{00CB}"), ("Igrave", "\u{00CC}"), ("Iacute", "\u{00CD}"), ("Icirc", "\u{00CE}"),
    ("Iuml", "\u{00CF}"), ("ETH", "\u{00D0}"), ("Ntilde", "\u{00D1}"), ("Ograve", "\u{00D2}"),
    ("Oacute", "\u{00D3}"), ("Ocirc", "\u{00D4}"), ("Otilde", "\u{00D5}"), ("Ouml", "\u{00D6}"),
    ("Oslash", "\u{00D8}"), ("Ugrave", "\u{00D9}"), ("Uacute", "\u{00DA}"), ("Ucirc", "\u{00DB}"),
    ("Uuml", "\u{00DC}"), ("Yacute", "\u{00DD}"), ("THORN", "\u{00DE}"), ("szlig", "\u{00DF}"),
    ("agrave", "\u{00E0}"), ("aacute", "\u{00E1}"), ("acirc", "\u{00E2}"), ("atilde", "\u{00E3}"),
    ("auml", "\u{00E4}"), ("aring", "\u{00E5}"), ("aelig", "\u{00E6}"), ("ccedil", "\u{00E7}"),
    ("egrave", "\u{00E8}"), ("eacute", "\u{00E9}"), ("ecirc", "\u{00EA}"), ("euml", "\u{00EB}"),
    ("igrave", "\u{00EC}"), ("iacute", "\u{00ED}"), ("icirc", "\u{00EE}"), ("iuml", "\u{00EF}"),
    ("eth", "\u{00F0}"), ("ntilde", "\u{00F1}"), ("ograve", "\u{00F2}"), ("oacute", "\u{00F3}"),
    ("ocirc", "\u{00F4}"), ("otilde", "\u{00F5}"), ("ouml", "\u{00F6}"), ("oslash", "\u{00F8}"),
    ("ugrave", "\u{00F9}"), ("uacute", "\u{00FA}"), ("ucirc", "\u{00FB}"), ("uuml", "\u{00FC}"),
    ("yacute", "\u{00FD}"), ("thorn", "\u{00FE}"), ("yuml", "\u{00FF}"), ("OElig", "\u{0152}"),
    ("oelig", "\u{0153}"), ("Scaron", "\u{0160}"), ("scaron", "\u{0161}"), ("Yuml", "\u{0178}"),
    ("fnof", "\u{0192}"), ("Alpha", "\u{0391}"), ("Beta", "\u{0392}"), ("Gamma", "\u{0393}"),
    ("Delta", "\u{0394}"), ("Epsilon", "\u{0395}"), ("Zeta", "\u{0396}"), ("Eta", "\u{0397}"),
    ("Theta", "\u{0398}"), ("Iota", "\u{0399}"), ("Kappa", "\u{039A}"), ("Lambda", "\u{039B}"),
    ("Mu", "\u{039C}"), ("Nu", "\u{039D}"), ("Xi", "\u{039E}"), ("Omicron", "\u{039F}"),
    ("Pi", "\u{03A0}"), ("Rho", "\u{03A1}"), ("Sigma", "\u{03A3}"), ("Tau", "\u{03A4}"),
    ("Upsilon", "\u{03A5}"), ("Phi", "\u{03A6}"), ("Chi", "\u{03A7}"), ("Psi", "\u{03A8}"),
    ("Omega", "\u{03A9}"), ("alpha", "\u{03B1}"), ("beta", "\u{03B2}"), ("gamma", "\u{03B3}"),
    ("delta", "\u{03B4}"), ("epsilon", "\u{03B5}"), ("zeta", "\u{03B6}"), ("eta", "\u{03B7}"),
    ("theta", "\u{03B8}"), ("iota", "\u{03B9}"), ("kappa", "\u{03BA}"), ("lambda", "\u{03BB}"),
    ("mu", "\u{03BC}"), ("nu", "\u{03BD}"), ("xi", "\u{03BE}"), ("omicron", "\u{03BF}"),
    ("pi", "\u{03C0}"), ("rho", "\u{03C1}"), ("sigmaf", "\u{03C2}"), ("sigma", "\u{03C3}"),
    ("tau", "\u{03C4}"), ("upsilon", "\u{03C5}"), ("phi", "\u{03C6}"), ("chi", "\u{03C7}"),
    ("psi", "\u{03C8}"), ("omega", "\u{03C9}"), ("thetasym", "\u{03D1}"), ("upsih", "\u{03D2}"),
    ("piv", "\u{03D6}"), ("ensp", "\u{2002}"), ("emsp", "\u{2003}"), ("thinsp", "\u{2009}"),
    ("zwnj", "\u{200C}"), ("zwj", "\u{200D}"), ("lrm", "\u{200E}"), ("rlm", "\u{200F}"),
    ("ndash", "\u{2013}"), ("mdash", "\u{2014}"), ("lsquo", "\u{2018}"), ("rsquo", "\u{2019}"),
    ("sbquo", "\u{201A}"), ("ldquo", "\u{201C}"), ("rdquo", "\u{201D}"), ("bdquo", "\u{201E}"),
    ("dagger", "\u{2020}"), ("Dagger", "\u{2021}"), ("bull", "\u{2022}"), ("hellip", "\u{2026}"),
    ("permil", "\u{2030}"), ("prime", "\u{2032}"), ("Prime", "\u{2033}"), ("lsaquo", "\u{2039}"),
    ("rsaquo", "\u{203A}"), ("oline", "\u{203E}"), ("frasl", "\u{2044}"), ("euro", "\u{20AC}"),
    ("weierp", "\u{2118}"), ("image", "\u{2111}"), ("real", "\u{211C}"), ("trade", "\u{2122}"),
    ("alefsym", "\u{2135}"), ("larr", "\u{2190}"), ("uarr", "\u{2191}"), ("rarr", "\u{2192}"),
    ("darr", "\u{2193}"), ("harr", "\u{2194}"), ("crarr", "\u{21B5}"), ("lArr", "\u{21D0}"),
    ("uArr", "\u{21D1}"), ("rArr", "\u{21D2}"), ("dArr", "\u{21D3}"), ("hArr", "\u{21D4}"),
    ("forall", "\u{2200}"), ("part", "\u{2202}"), ("exist", "\u{2203}"), ("empty", "\u{2205}"),
    ("nabla", "\u{2207}"), ("isin", "\u{2208}"), ("notin", "\u{2209}"), ("ni", "\u{220B}"),
    ("prod", "\u{220F}"), ("sum", "\u{2211}"), ("minus", "\u{2212}"), ("lowast", "\u{2217}"),
    ("radic", "\u{221A}"), ("prop", "\u{221D}"), ("infin", "\u{221E}"), ("ang", "\u{2220}"),
    ("and", "\u{2227}"), ("or", "\u{2228}"), ("cap", "\u{2229}"), ("cup", "\u{222A}"),
    ("int", "\u{222B}"), ("there4", "\u{2234}"), ("sim", "\u{223C}"), ("cong", "\u{2245}"),
    ("asymp", "\u{2248}"), ("ne", "\u{2260}"), ("equiv", "\u{2261}"), ("le", "\u{2264}"),
    ("ge", "\u{2265}"), ("sub", "\u{2282}"), ("sup", "\u{2283}"), ("nsub", "\u{2284}"),
    ("sube", "\u{2286}"), ("supe", "\u{2287}"), ("oplus", "\u{2295}"), ("otimes", "\u{2297}"),
    ("perp", "\u{22A5}"), ("sdot", "\u{22C5}"), ("lceil", "\u{2308}"), ("rceil", "\u{2309}"),
    ("lfloor", "\u{230A}"), ("rfloor", "\u{230B}"), ("lang", "\u{2329}"), ("rang", "\u{232A}"),
    ("loz", "\u{25CA}"), ("spades", "\u{2660}"), ("clubs", "\u{2663}"), ("hearts", "\u{2665}"),
    ("diams", "\u{2666}"), ("circ", "\u{02C6}"), ("tilde", "\u{02DC}"),
    ("AMP", "&"), ("LT", "<"), ("GT", ">"), ("QUOT", "\""), ("COPY", "\u{00A9}"), ("REG", "\u{00AE}"),
];

/// HTML5 additions; these only decode with their `;`
const NAMED_HTML5: &[(&str, &str)] = &[
    ("Tab", "\t"), ("NewLine", "\n"), ("excl", "!"), ("num", "#"), ("dollar", "$"),
    ("percnt", "%"), ("lpar", "("), ("rpar", ")"), ("ast", "*"), ("midast", "*"), ("plus", "+"),
    ("comma", ","), ("period", "."), ("sol", "/"), ("colon", ":"), ("semi", ";"), ("equals", "="),
    ("quest", "?"), ("commat", "@"), ("lsqb", "["), ("lbrack", "["), ("bsol", "\\"), ("rsqb", "]"),
    ("rbrack", "]"), ("Hat", "^"), ("lowbar", "_"), ("UnderBar", "_"), ("grave", "`"),
    ("lcub", "{"), ("lbrace", "{"), ("verbar", "|"), ("vert", "|"), ("rcub", "}"),
    ("rbrace", "}"), ("NoBreak", "\u{2060}"), ("hyphen", "\u{2010}"),
    ("dash", "\u{2010}"), ("lsquor", "\u{201A}"), ("ldquor", "\u{201E}"),
    ("nldr", "\u{2025}"), ("mldr", "\u{2026}"), ("check", "\u{2713}"), ("cross", "\u{2717}"),
    ("star", "\u{2606}"), ("starf", "\u{2605}"), ("phone", "\u{260E}"), ("female", "\u{2640}"),
    ("male", "\u{2642}"), ("sharp", "\u{266F}"), ("flat", "\u{266D}"), ("natural", "\u{266E}"),
];

static ENTITIES: LazyLock<FxHashMap<&'static str, &'static str>> =
    LazyLock::new(|| NAMED.iter().chain(NAMED_HTML5).copied().collect());

/// Longest entity name in the table
pub(crate) const MAX_NAME_LEN: usize = 8;

/// Decode a named reference (without the `&` and `;`)
pub fn decode_entity(name: &str) -> Option<&'static str> {
    ENTITIES.get(name).copied()
}

/// Whether `name` may appear without its trailing `;`
///
/// Browsers only accept the Latin-1 references in that form.
pub(crate) fn allows_missing_semicolon(name: &str) -> bool {
    name != "apos"
        && NAMED
            .iter()
            .any(|(legacy, value)| *legacy == name && value.chars().all(|c| (c as u32) <= 0xFF))
}

/// Map a numeric reference value to the character a browser would produce
pub fn decode_numeric(value: u32) -> char {
    let value = match value {
        0x80 => 0x20AC,
        0x82 => 0x201A,
        0x83 => 0x0192,
        0x84 => 0x201E,
        0x85 => 0x2026,
        0x86 => 0x2020,
        0x87 => 0x2021,
        0x88 => 0x02C6,
        0x89 => 0x2030,
        0x8A => 0x0160,
        0x8B => 0x2039,
        0x8C => 0x0152,
        0x8E => 0x017D,
        0x91 => 0x2018,
        0x92 => 0x2019,
        0x93 => 0x201C,
        0x94 => 0x201D,
        0x95 => 0x2022,
        0x96 => 0x2013,
        0x97 => 0x2014,
        0x98 => 0x02DC,
        0x99 => 0x2122,
        0x9A => 0x0161,
        0x9B => 0x203A,
        0x9C => 0x0153,
        0x9E => 0x017E,
        0x9F => 0x0178,
        v => v,
    };
    // 0, surrogates and anything past U+10FFFF all fail here
    match value {
        0 => char::REPLACEMENT_CHARACTER,
        v => char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essential_entities() {
        assert_eq!(decode_entity("amp"), Some("&"));
        assert_eq!(decode_entity("lt"), Some("<"));
        assert_eq!(decode_entity("gt"), Some(">"));
        assert_eq!(decode_entity("quot"), Some("\""));
        assert_eq!(decode_entity("apos"), Some("'"));
        assert_eq!(decode_entity("nbsp"), Some("\u{00A0}"));
    }

    #[test]
    fn test_symbol_entities() {
        assert_eq!(decode_entity("mdash"), Some("\u{2014}"));
        assert_eq!(decode_entity("hellip"), Some("\u{2026}"));
        assert_eq!(decode_entity("infin"), Some("\u{221E}"));
        assert_eq!(decode_entity("Omega"), Some("\u{03A9}"));
        assert_eq!(decode_entity("rarr"), Some("\u{2192}"));
    }

    #[test]
    fn test_unknown_entity() {
        assert_eq!(decode_entity("unknown"), None);
        assert_eq!(decode_entity("Amp"), None);
    }

    #[test]
    fn test_html5_entities() {
        assert_eq!(decode_entity("colon"), Some(":"));
        assert_eq!(decode_entity("Tab"), Some("\t"));
        assert_eq!(decode_entity("NewLine"), Some("\n"));
        assert_eq!(decode_entity("lpar"), Some("("));
        assert_eq!(decode_entity("rpar"), Some(")"));
        assert_eq!(decode_entity("AMP"), Some("&"));
    }

    #[test]
    fn test_table_names_fit_lookahead() {
        assert!(NAMED
            .iter()
            .chain(NAMED_HTML5)
            .all(|(name, _)| name.len() <= MAX_NAME_LEN));
    }

    #[test]
    fn test_missing_semicolon_only_for_latin1() {
        assert!(allows_missing_semicolon("amp"));
        assert!(allows_missing_semicolon("copy"));
        assert!(!allows_missing_semicolon("hellip"));
        assert!(!allows_missing_semicolon("apos"));
        assert!(!allows_missing_semicolon("bogus"));
        assert!(allows_missing_semicolon("AMP"));
        assert!(!allows_missing_semicolon("colon"));
        assert!(!allows_missing_semicolon("Tab"));
    }

    #[test]
    fn test_decode_numeric() {
        assert_eq!(decode_numeric(65), 'A');
        assert_eq!(decode_numeric(0x20AC), '€');
        assert_eq!(decode_numeric(169), '©');
    }

    #[test]
    fn test_decode_numeric_windows_1252() {
        assert_eq!(decode_numeric(0x80), '€');
        assert_eq!(decode_numeric(0x91), '\u{2018}');
        assert_eq!(decode_numeric(0x9F), '\u{0178}');
        // Unmapped C1 controls pass through
        assert_eq!(decode_numeric(0x81), '\u{0081}');
    }

    #[test]
    fn test_decode_numeric_invalid() {
        assert_eq!(decode_numeric(0), '\u{FFFD}');
        assert_eq!(decode_numeric(0xD800), '\u{FFFD}');
        assert_eq!(decode_numeric(0xDFFF), '\u{FFFD}');
        assert_eq!(decode_numeric(0x110000), '\u{FFFD}');
        assert_eq!(decode_numeric(u32::MAX), '\u{FFFD}');
    }
}
