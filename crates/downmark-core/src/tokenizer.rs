//! Tolerant, lazy HTML tokenizer.
//!
//! The tokenizer never fails: constructs left open at end of input are closed
//! implicitly, and `<` or `&` that do not start markup are plain text. It is not a
//! full HTML5 state machine; it covers the token shapes the tree builder needs:
//!
//! - start tags with attributes (quoted, unquoted or bare) and `/>` syntax
//! - end tags (attributes on them are skipped)
//! - comments, plus doctype, processing instructions and CDATA as bogus comments
//! - character references, emitted as their own tokens with the decoded value
//! - raw text inside `script`/`style`, up to the matching close tag
//!
//! Tag and attribute names are folded to ASCII lowercase; attribute values keep case.
//! Scanning is byte-based but only ever cuts the input at ASCII bytes, so every slice
//! boundary is also a UTF-8 character boundary.

use crate::entities::{decode_entities, match_at};
use crate::node::Attributes;
use crate::utilities::is_raw_text;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

/// A lexical unit of the HTML input, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Attributes,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    /// A contiguous run of source text (not yet whitespace-normalized)
    Text(String),
    /// Comment body, without the delimiters
    Comment(String),
    /// A character reference as written in the source and its decoded value
    Entity {
        raw: String,
        value: String,
    },
}

/// Create a tokenizer over `input`
pub fn tokenize(input: &str) -> Tokenizer<'_> {
    Tokenizer::new(input)
}

/// Lazy token iterator. Cloning it, or creating a new one, restarts from scratch.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Set after a raw-text start tag until its end tag has been produced
    raw_text: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_text: None,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        let input: &'a str = self.input;
        input.as_bytes()
    }

    /// Does the `<` at `i` open a tag, comment or declaration?
    fn starts_markup(&self, i: usize) -> bool {
        let bytes = self.bytes();
        match bytes.get(i + 1) {
            Some(b) if b.is_ascii_alphabetic() => true,
            Some(b'!') | Some(b'?') => true,
            Some(b'/') => bytes.get(i + 2).is_some(),
            _ => false,
        }
    }

    /// Scan plain text from the current position up to the next markup or reference
    fn text_run(&mut self) -> Token {
        let bytes = self.bytes();
        let start = self.pos;
        let mut i = start + 1;
        while i < bytes.len() {
            let stop = match bytes[i] {
                b'<' => self.starts_markup(i),
                b'&' => match_at(self.input, i).is_some(),
                _ => false,
            };
            if stop {
                break;
            }
            i += 1;
        }
        self.pos = i;
        Token::Text(self.input[start..i].to_string())
    }

    /// Body of a raw-text element, then its end tag
    fn raw_text_token(&mut self, tag: String) -> Token {
        let rest = &self.input[self.pos..];
        match find_raw_text_close(rest, &tag) {
            Some((0, end)) => {
                self.pos += end;
                Token::EndTag { name: tag }
            }
            Some((start, _)) => {
                self.pos += start;
                self.raw_text = Some(tag);
                Token::Text(rest[..start].to_string())
            }
            None if !rest.is_empty() => {
                self.pos = self.input.len();
                self.raw_text = Some(tag);
                Token::Text(rest.to_string())
            }
            None => {
                log::debug!(target: "downmark::tokenizer", "unterminated <{tag}> closed at end of input");
                Token::EndTag { name: tag }
            }
        }
    }

    /// Everything between `open_len` bytes past the current position and the next `>`
    fn bogus_comment(&mut self, open_len: usize) -> Token {
        let body_start = self.pos + open_len;
        match self.input[body_start..].find('>') {
            Some(rel) => {
                self.pos = body_start + rel + 1;
                Token::Comment(self.input[body_start..body_start + rel].to_string())
            }
            None => {
                self.pos = self.input.len();
                Token::Comment(self.input[body_start..].to_string())
            }
        }
    }

    fn comment(&mut self) -> Token {
        let body_start = self.pos + COMMENT_START.len();
        let rest = &self.input[body_start..];
        // `<!-->` and `<!--->` are complete (empty) comments
        for abrupt in [">", "->"] {
            if rest.starts_with(abrupt) {
                self.pos = body_start + abrupt.len();
                return Token::Comment(String::new());
            }
        }
        match rest.find(COMMENT_END) {
            Some(rel) => {
                self.pos = body_start + rel + COMMENT_END.len();
                Token::Comment(rest[..rel].to_string())
            }
            None => {
                log::debug!(target: "downmark::tokenizer", "unterminated comment closed at end of input");
                self.pos = self.input.len();
                Token::Comment(rest.to_string())
            }
        }
    }

    /// Read a tag or attribute name starting at `start`; returns the end index
    fn scan_name(&self, start: usize, stop_at_equals: bool) -> usize {
        let bytes = self.bytes();
        let mut j = start;
        while j < bytes.len() {
            let b = bytes[j];
            if b.is_ascii_whitespace() || b == b'/' || b == b'>' {
                break;
            }
            // A leading `=` belongs to the name so the scan always makes progress
            if stop_at_equals && b == b'=' && j > start {
                break;
            }
            j += 1;
        }
        j
    }

    fn skip_whitespace(&self, mut k: usize) -> usize {
        let bytes = self.bytes();
        while k < bytes.len() && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        k
    }

    fn end_tag(&mut self) -> Token {
        let bytes = self.bytes();
        let name_start = self.pos + 2;
        let name_end = self.scan_name(name_start, false);
        let name = self.input[name_start..name_end].to_ascii_lowercase();
        let mut k = name_end;
        while k < bytes.len() && bytes[k] != b'>' {
            k += 1;
        }
        if k < bytes.len() {
            k += 1;
        } else {
            log::debug!(target: "downmark::tokenizer", "unterminated </{name}> closed at end of input");
        }
        self.pos = k;
        Token::EndTag { name }
    }

    fn start_tag(&mut self) -> Token {
        let bytes = self.bytes();
        let len = bytes.len();
        let name_start = self.pos + 1;
        let name_end = self.scan_name(name_start, false);
        let name = self.input[name_start..name_end].to_ascii_lowercase();

        let mut attributes = Attributes::new();
        let mut self_closing = false;
        let mut k = name_end;
        let mut terminated = false;

        loop {
            k = self.skip_whitespace(k);
            if k >= len {
                break;
            }
            match bytes[k] {
                b'>' => {
                    k += 1;
                    terminated = true;
                    break;
                }
                b'/' => {
                    if bytes.get(k + 1) == Some(&b'>') {
                        self_closing = true;
                        terminated = true;
                        k += 2;
                        break;
                    }
                    k += 1;
                    continue;
                }
                _ => {}
            }

            let attr_start = k;
            k = self.scan_name(attr_start, true);
            let attr_name = self.input[attr_start..k].to_ascii_lowercase();

            let after_name = self.skip_whitespace(k);
            let value = if bytes.get(after_name) == Some(&b'=') {
                k = self.skip_whitespace(after_name + 1);
                match bytes.get(k) {
                    Some(&quote) if quote == b'"' || quote == b'\'' => {
                        let value_start = k + 1;
                        let value_end = self.input[value_start..]
                            .find(quote as char)
                            .map(|rel| value_start + rel)
                            .unwrap_or(len);
                        k = (value_end + 1).min(len);
                        decode_entities(&self.input[value_start..value_end])
                    }
                    _ => {
                        let value_start = k;
                        while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                            if bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>') {
                                break;
                            }
                            k += 1;
                        }
                        decode_entities(&self.input[value_start..k])
                    }
                }
            } else {
                String::new()
            };

            // Duplicate attributes: the first occurrence wins
            attributes.entry(attr_name).or_insert(value);
        }

        if !terminated {
            log::debug!(target: "downmark::tokenizer", "unterminated <{name}> closed at end of input");
        }
        self.pos = k;

        if is_raw_text(&name) && !self_closing {
            self.raw_text = Some(name.clone());
        }

        Token::StartTag {
            name,
            attributes,
            self_closing,
        }
    }

    /// Tokenize the markup at the current `<`; `None` when it produced no token
    fn markup(&mut self) -> Option<Token> {
        let rest = &self.input[self.pos..];
        let bytes = self.bytes();
        if rest.starts_with(COMMENT_START) {
            return Some(self.comment());
        }
        match bytes.get(self.pos + 1) {
            Some(b'!') | Some(b'?') => Some(self.bogus_comment(2)),
            Some(b'/') => match bytes.get(self.pos + 2) {
                Some(b) if b.is_ascii_alphabetic() => Some(self.end_tag()),
                Some(b'>') => {
                    // `</>` is dropped entirely
                    self.pos += 3;
                    None
                }
                _ => Some(self.bogus_comment(2)),
            },
            _ => Some(self.start_tag()),
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(tag) = self.raw_text.take() {
            return Some(self.raw_text_token(tag));
        }

        loop {
            if self.pos >= self.input.len() {
                return None;
            }
            let token = match self.bytes()[self.pos] {
                b'<' if self.starts_markup(self.pos) => match self.markup() {
                    Some(token) => token,
                    None => continue,
                },
                b'&' => match match_at(self.input, self.pos) {
                    Some(char_ref) => {
                        let raw = self.input[self.pos..self.pos + char_ref.len].to_string();
                        self.pos += char_ref.len;
                        Token::Entity {
                            raw,
                            value: char_ref.value,
                        }
                    }
                    None => self.text_run(),
                },
                _ => self.text_run(),
            };
            log::trace!(target: "downmark::tokenizer", "token: {token:?}");
            return Some(token);
        }
    }
}

/// Find `</tag` (case-insensitive) followed by whitespace, `/`, `>` or end of input.
/// Returns the start of the close tag and the index just past its `>`.
fn find_raw_text_close(haystack: &str, tag: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let tag = tag.as_bytes();
    let mut i = 0;
    while let Some(rel) = haystack[i..].find("</") {
        let start = i + rel;
        let name_start = start + 2;
        let name_end = name_start + tag.len();
        let name_matches = bytes
            .get(name_start..name_end)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag));
        let delimited = match bytes.get(name_end) {
            None => true,
            Some(b) => b.is_ascii_whitespace() || *b == b'/' || *b == b'>',
        };
        if name_matches && delimited {
            let end = haystack[name_end..]
                .find('>')
                .map(|rel| name_end + rel + 1)
                .unwrap_or(haystack.len());
            return Some((start, end));
        }
        i = start + 2;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).collect()
    }

    fn start(name: &str, attrs: &[(&str, &str)], self_closing: bool) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing,
        }
    }

    fn end(name: &str) -> Token {
        Token::EndTag {
            name: name.to_string(),
        }
    }

    fn text(s: &str) -> Token {
        Token::Text(s.to_string())
    }

    #[test]
    fn tags_and_text() {
        assert_eq!(
            tokens("<p>Hello <b>World</b></p>"),
            vec![
                start("p", &[], false),
                text("Hello "),
                start("b", &[], false),
                text("World"),
                end("b"),
                end("p"),
            ]
        );
    }

    #[test]
    fn names_are_lowercased_values_are_not() {
        assert_eq!(
            tokens(r#"<A HREF="Http://X.org" Title=Big>"#),
            vec![start("a", &[("href", "Http://X.org"), ("title", "Big")], false)]
        );
        assert_eq!(tokens("</DIV >"), vec![end("div")]);
    }

    #[test]
    fn attribute_forms() {
        assert_eq!(
            tokens(r#"<input disabled value='a "b"' data-x = y checked>"#),
            vec![start(
                "input",
                &[
                    ("disabled", ""),
                    ("value", "a \"b\""),
                    ("data-x", "y"),
                    ("checked", ""),
                ],
                false
            )]
        );
    }

    #[test]
    fn attribute_values_decode_references() {
        assert_eq!(
            tokens(r#"<a href="?a=1&amp;b=2">"#),
            vec![start("a", &[("href", "?a=1&b=2")], false)]
        );
    }

    #[test]
    fn duplicate_attribute_keeps_first() {
        assert_eq!(
            tokens(r#"<a id="one" id="two">"#),
            vec![start("a", &[("id", "one")], false)]
        );
    }

    #[test]
    fn self_closing_syntax() {
        assert_eq!(
            tokens("<br/><img src=a.png />"),
            vec![
                start("br", &[], true),
                start("img", &[("src", "a.png")], true),
            ]
        );
    }

    #[test]
    fn comments_pass_through() {
        assert_eq!(
            tokens("a<!-- note -->b"),
            vec![
                text("a"),
                Token::Comment(" note ".to_string()),
                text("b"),
            ]
        );
        assert_eq!(tokens("<!-->x"), vec![Token::Comment(String::new()), text("x")]);
    }

    #[test]
    fn declarations_are_bogus_comments() {
        assert_eq!(
            tokens("<!DOCTYPE html><?xml version=\"1.0\"?></ 3>"),
            vec![
                Token::Comment("DOCTYPE html".to_string()),
                Token::Comment("xml version=\"1.0\"?".to_string()),
                Token::Comment(" 3".to_string()),
            ]
        );
    }

    #[test]
    fn entities_split_text_runs() {
        assert_eq!(
            tokens("a &amp; b &#38; &#x26;"),
            vec![
                text("a "),
                Token::Entity {
                    raw: "&amp;".to_string(),
                    value: "&".to_string()
                },
                text(" b "),
                Token::Entity {
                    raw: "&#38;".to_string(),
                    value: "&".to_string()
                },
                text(" "),
                Token::Entity {
                    raw: "&#x26;".to_string(),
                    value: "&".to_string()
                },
            ]
        );
    }

    #[test]
    fn unknown_entities_and_stray_brackets_are_text() {
        assert_eq!(tokens("AT&T &bogus; 1 < 2"), vec![text("AT&T &bogus; 1 < 2")]);
        assert_eq!(tokens("a <"), vec![text("a <")]);
        assert_eq!(tokens("a </"), vec![text("a </")]);
    }

    #[test]
    fn empty_end_tag_is_dropped() {
        assert_eq!(tokens("a</>b"), vec![text("a"), text("b")]);
    }

    #[test]
    fn unterminated_constructs_close_at_end() {
        assert_eq!(
            tokens(r#"<a href="x"#),
            vec![start("a", &[("href", "x")], false)]
        );
        assert_eq!(tokens("<!-- open"), vec![Token::Comment(" open".to_string())]);
        assert_eq!(tokens("</p"), vec![end("p")]);
    }

    #[test]
    fn raw_text_elements() {
        assert_eq!(
            tokens("<script>if (a < b && c) {}</SCRIPT >x"),
            vec![
                start("script", &[], false),
                text("if (a < b && c) {}"),
                end("script"),
                text("x"),
            ]
        );
        assert_eq!(
            tokens("<style></style>"),
            vec![start("style", &[], false), end("style")]
        );
        assert_eq!(
            tokens("<style>p { }"),
            vec![start("style", &[], false), text("p { }"), end("style")]
        );
    }

    #[test]
    fn utf8_text_survives() {
        assert_eq!(
            tokens("¡Hola <b>café</b> 😊"),
            vec![
                text("¡Hola "),
                start("b", &[], false),
                text("café"),
                end("b"),
                text(" 😊"),
            ]
        );
    }

    #[test]
    fn restarts_from_scratch() {
        let tokenizer = tokenize("<p>x</p>");
        let first: Vec<Token> = tokenizer.clone().collect();
        let second: Vec<Token> = tokenizer.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
