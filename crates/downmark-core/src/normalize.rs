//! Whitespace normalization for text runs.
//!
//! Outside preformatted content, any run of HTML whitespace (space, tab, line feed,
//! form feed, carriage return) becomes a single space. Decoded character references
//! are appended literally so `&nbsp;` and friends survive collapsing.

/// Check for the HTML ASCII whitespace set
pub fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

/// Collapse every whitespace run to one space. Idempotent.
pub fn collapse_whitespace(s: &str) -> String {
    let mut collapser = WhitespaceCollapser::default();
    collapser.push_raw(s);
    collapser.finish()
}

/// Trim HTML whitespace (but not no-break spaces) from both ends
pub fn trim_html_whitespace(s: &str) -> &str {
    s.trim_matches(is_html_whitespace)
}

/// Turn CRLF and lone CR into LF
pub fn normalize_newlines(s: &str) -> String {
    if !s.contains('\r') {
        return s.to_string();
    }
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Incremental collapser fed with the raw pieces of one text run.
#[derive(Debug, Default)]
pub struct WhitespaceCollapser {
    out: String,
    in_whitespace: bool,
}

impl WhitespaceCollapser {
    /// Append source text, collapsing whitespace runs (also across calls)
    pub fn push_raw(&mut self, s: &str) {
        for c in s.chars() {
            if is_html_whitespace(c) {
                if !self.in_whitespace {
                    self.out.push(' ');
                    self.in_whitespace = true;
                }
            } else {
                self.out.push(c);
                self.in_whitespace = false;
            }
        }
    }

    /// Append text verbatim (decoded references, preformatted text)
    pub fn push_literal(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.out.push_str(s);
        self.in_whitespace = false;
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Take the accumulated text and reset
    pub fn take(&mut self) -> String {
        self.in_whitespace = false;
        std::mem::take(&mut self.out)
    }

    pub fn finish(self) -> String {
        self.out
    }
}
