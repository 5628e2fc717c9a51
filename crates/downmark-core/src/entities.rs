//! HTML character reference decoding.
//!
//! Named references are resolved against a read-only table built once per process.
//! Numeric references (`&#38;`, `&#x26;`) decode to their code point. Every reference
//! must be terminated by `;`; anything else, including unknown names, is left as-is.

use std::collections::HashMap;

use once_cell::sync::Lazy;

const MAX_NAME_LEN: usize = 32;
const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

static NAMED_ENTITIES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| NAMED.iter().copied().collect());

#[rustfmt::skip]
const NAMED: &[(&str, &str)] = &[
    // markup
    ("amp", "&"), ("lt", "<"), ("gt", ">"), ("quot", "\""), ("apos", "'"),
    // spaces and punctuation
    ("nbsp", "\u{00A0}"), ("ensp", "\u{2002}"), ("emsp", "\u{2003}"), ("thinsp", "\u{2009}"),
    ("zwnj", "\u{200C}"), ("zwj", "\u{200D}"), ("shy", "\u{00AD}"),
    ("ndash", "\u{2013}"), ("mdash", "\u{2014}"), ("hellip", "\u{2026}"),
    ("lsquo", "\u{2018}"), ("rsquo", "\u{2019}"), ("sbquo", "\u{201A}"),
    ("ldquo", "\u{201C}"), ("rdquo", "\u{201D}"), ("bdquo", "\u{201E}"),
    ("laquo", "\u{00AB}"), ("raquo", "\u{00BB}"), ("lsaquo", "\u{2039}"), ("rsaquo", "\u{203A}"),
    ("bull", "\u{2022}"), ("middot", "\u{00B7}"), ("prime", "\u{2032}"), ("Prime", "\u{2033}"),
    ("dagger", "\u{2020}"), ("Dagger", "\u{2021}"), ("permil", "\u{2030}"),
    ("iexcl", "\u{00A1}"), ("iquest", "\u{00BF}"), ("sect", "\u{00A7}"), ("para", "\u{00B6}"),
    ("brvbar", "\u{00A6}"), ("uml", "\u{00A8}"), ("macr", "\u{00AF}"), ("acute", "\u{00B4}"),
    ("cedil", "\u{00B8}"), ("ordf", "\u{00AA}"), ("ordm", "\u{00BA}"),
    ("lpar", "("), ("rpar", ")"), ("lsqb", "["), ("rsqb", "]"), ("lowbar", "_"),
    ("ast", "*"), ("grave", "`"), ("num", "#"), ("excl", "!"), ("vert", "|"),
    // symbols
    ("copy", "\u{00A9}"), ("reg", "\u{00AE}"), ("trade", "\u{2122}"), ("deg", "\u{00B0}"),
    ("plusmn", "\u{00B1}"), ("times", "\u{00D7}"), ("divide", "\u{00F7}"), ("micro", "\u{00B5}"),
    ("not", "\u{00AC}"), ("sup1", "\u{00B9}"), ("sup2", "\u{00B2}"), ("sup3", "\u{00B3}"),
    ("frac14", "\u{00BC}"), ("frac12", "\u{00BD}"), ("frac34", "\u{00BE}"),
    ("cent", "\u{00A2}"), ("pound", "\u{00A3}"), ("curren", "\u{00A4}"), ("yen", "\u{00A5}"),
    ("euro", "\u{20AC}"),
    // arrows and math
    ("larr", "\u{2190}"), ("uarr", "\u{2191}"), ("rarr", "\u{2192}"), ("darr", "\u{2193}"),
    ("harr", "\u{2194}"), ("lArr", "\u{21D0}"), ("rArr", "\u{21D2}"), ("hArr", "\u{21D4}"),
    ("minus", "\u{2212}"), ("le", "\u{2264}"), ("ge", "\u{2265}"), ("ne", "\u{2260}"),
    ("asymp", "\u{2248}"), ("equiv", "\u{2261}"), ("infin", "\u{221E}"), ("sum", "\u{2211}"),
    ("prod", "\u{220F}"), ("radic", "\u{221A}"), ("part", "\u{2202}"), ("int", "\u{222B}"),
    ("forall", "\u{2200}"), ("exist", "\u{2203}"), ("isin", "\u{2208}"), ("notin", "\u{2209}"),
    ("and", "\u{2227}"), ("or", "\u{2228}"), ("cap", "\u{2229}"), ("cup", "\u{222A}"),
    ("sub", "\u{2282}"), ("sup", "\u{2283}"), ("empty", "\u{2205}"), ("nabla", "\u{2207}"),
    ("loz", "\u{25CA}"), ("spades", "\u{2660}"), ("clubs", "\u{2663}"), ("hearts", "\u{2665}"),
    ("diams", "\u{2666}"), ("check", "\u{2713}"),
    // greek
    ("Alpha", "\u{0391}"), ("Beta", "\u{0392}"), ("Gamma", "\u{0393}"), ("Delta", "\u{0394}"),
    ("Theta", "\u{0398}"), ("Lambda", "\u{039B}"), ("Pi", "\u{03A0}"), ("Sigma", "\u{03A3}"),
    ("Phi", "\u{03A6}"), ("Psi", "\u{03A8}"), ("Omega", "\u{03A9}"),
    ("alpha", "\u{03B1}"), ("beta", "\u{03B2}"), ("gamma", "\u{03B3}"), ("delta", "\u{03B4}"),
    ("epsilon", "\u{03B5}"), ("zeta", "\u{03B6}"), ("eta", "\u{03B7}"), ("theta", "\u{03B8}"),
    ("iota", "\u{03B9}"), ("kappa", "\u{03BA}"), ("lambda", "\u{03BB}"), ("mu", "\u{03BC}"),
    ("nu", "\u{03BD}"), ("xi", "\u{03BE}"), ("omicron", "\u{03BF}"), ("pi", "\u{03C0}"),
    ("rho", "\u{03C1}"), ("sigma", "\u{03C3}"), ("tau", "\u{03C4}"), ("upsilon", "\u{03C5}"),
    ("phi", "\u{03C6}"), ("chi", "\u{03C7}"), ("psi", "\u{03C8}"), ("omega", "\u{03C9}"),
    // latin-1 letters
    ("Agrave", "\u{00C0}"), ("Aacute", "\u{00C1}"), ("Acirc", "\u{00C2}"), ("Atilde", "\u{00C3}"),
    ("Auml", "\u{00C4}"), ("Aring", "\u{00C5}"), ("AElig", "\u{00C6}"), ("Ccedil", "\u{00C7}"),
    ("Egrave", "\u{00C8}"), ("Eacute", "\u{00C9}"), ("Ecirc", "\u{00CA}"), ("Euml", "\u{00CB}"),
    ("Igrave", "\u{00CC}"), ("Iacute", "\u{00CD}"), ("Icirc", "\u{00CE}"), ("Iuml", "\u{00CF}"),
    ("ETH", "\u{00D0}"), ("Ntilde", "\u{00D1}"), ("Ograve", "\u{00D2}"), ("Oacute", "\u{00D3}"),
    ("Ocirc", "\u{00D4}"), ("Otilde", "\u{00D5}"), ("Ouml", "\u{00D6}"), ("Oslash", "\u{00D8}"),
    ("Ugrave", "\u{00D9}"), ("Uacute", "\u{00DA}"), ("Ucirc", "\u{00DB}"), ("Uuml", "\u{00DC}"),
    ("Yacute", "\u{00DD}"), ("THORN", "\u{00DE}"), ("szlig", "\u{00DF}"),
    ("agrave", "\u{00E0}"), ("aacute", "\u{00E1}"), ("acirc", "\u{00E2}"), ("atilde", "\u{00E3}"),
    ("auml", "\u{00E4}"), ("aring", "\u{00E5}"), ("aelig", "\u{00E6}"), ("ccedil", "\u{00E7}"),
    ("egrave", "\u{00E8}"), ("eacute", "\u{00E9}"), ("ecirc", "\u{00EA}"), ("euml", "\u{00EB}"),
    ("igrave", "\u{00EC}"), ("iacute", "\u{00ED}"), ("icirc", "\u{00EE}"), ("iuml", "\u{00EF}"),
    ("eth", "\u{00F0}"), ("ntilde", "\u{00F1}"), ("ograve", "\u{00F2}"), ("oacute", "\u{00F3}"),
    ("ocirc", "\u{00F4}"), ("otilde", "\u{00F5}"), ("ouml", "\u{00F6}"), ("oslash", "\u{00F8}"),
    ("ugrave", "\u{00F9}"), ("uacute", "\u{00FA}"), ("ucirc", "\u{00FB}"), ("uuml", "\u{00FC}"),
    ("yacute", "\u{00FD}"), ("thorn", "\u{00FE}"), ("yuml", "\u{00FF}"),
    ("OElig", "\u{0152}"), ("oelig", "\u{0153}"), ("Scaron", "\u{0160}"), ("scaron", "\u{0161}"),
    ("Yuml", "\u{0178}"), ("fnof", "\u{0192}"), ("circ", "\u{02C6}"), ("tilde", "\u{02DC}"),
];

/// Resolve a named reference (without `&` and `;`)
pub fn lookup(name: &str) -> Option<&'static str> {
    NAMED_ENTITIES.get(name).copied()
}

/// A character reference recognized at some position of the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharRef {
    /// Byte length of the reference, `&` and `;` included
    pub len: usize,
    /// Decoded text
    pub value: String,
}

/// Try to recognize a character reference starting at `start` (which must hold `&`).
pub fn match_at(input: &str, start: usize) -> Option<CharRef> {
    let bytes = input.as_bytes();
    if bytes.get(start) != Some(&b'&') {
        return None;
    }

    if bytes.get(start + 1) == Some(&b'#') {
        let (digits_start, is_hex) = match bytes.get(start + 2) {
            Some(b'x') | Some(b'X') => (start + 3, true),
            _ => (start + 2, false),
        };
        let max_digits = if is_hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };
        let end = scan_numeric(bytes, digits_start, max_digits, is_hex)?;
        let digits = &input[digits_start..end];
        let radix = if is_hex { 16 } else { 10 };
        let value = u32::from_str_radix(digits, radix)
            .ok()
            .filter(|&cp| cp != 0)
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        return Some(CharRef {
            len: end + 1 - start,
            value: value.to_string(),
        });
    }

    let name_start = start + 1;
    let mut j = name_start;
    while j < bytes.len() && j - name_start < MAX_NAME_LEN && bytes[j].is_ascii_alphanumeric() {
        j += 1;
    }
    if j == name_start || bytes.get(j) != Some(&b';') {
        return None;
    }
    let value = lookup(&input[name_start..j])?;
    Some(CharRef {
        len: j + 1 - start,
        value: value.to_string(),
    })
}

/// Bounded digit scan; returns the index of the terminating `;`
fn scan_numeric(bytes: &[u8], start: usize, max_digits: usize, is_hex: bool) -> Option<usize> {
    let mut j = start;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b';' {
            return (j > start).then_some(j);
        }
        let ok = if is_hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        };
        if !ok || j - start == max_digits {
            return None;
        }
        j += 1;
    }
    None
}

/// Decode every recognized reference in `s`, leaving the rest untouched.
pub fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut copy_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }
        match match_at(s, i) {
            Some(char_ref) => {
                out.push_str(&s[copy_start..i]);
                out.push_str(&char_ref.value);
                i += char_ref.len;
                copy_start = i;
            }
            None => i += 1,
        }
    }
    out.push_str(&s[copy_start..]);
    out
}
