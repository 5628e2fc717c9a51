//! Element classification tables shared by the tree builder and the emitter.

/// Tag name of the synthetic root every tree hangs from.
pub const DOCUMENT_TAG: &str = "#document";

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "#document", "address", "article", "aside", "blockquote", "body", "caption",
    "center", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frameset", "h1", "h2", "h3", "h4",
    "h5", "h6", "head", "header", "hgroup", "hr", "html", "li", "listing", "main",
    "menu", "nav", "noframes", "noscript", "ol", "p", "pre", "section", "summary",
    "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "ul",
];

/// Void (self-closing) HTML elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text keeps its whitespace verbatim
pub const PREFORMATTED_ELEMENTS: &[&str] = &["pre", "textarea", "listing", "plaintext", "xmp"];

/// Elements whose content is tokenized as raw text up to the matching close tag
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Start tags that implicitly close an open `<p>`
pub const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "dd", "details", "dialog",
    "dir", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "li", "listing",
    "main", "menu", "nav", "ol", "p", "pre", "section", "summary", "table", "ul",
];

/// Headings, in level order
pub const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag)
}

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Check if a tag preserves whitespace in its text
pub fn is_preformatted(tag: &str) -> bool {
    PREFORMATTED_ELEMENTS.contains(&tag)
}

/// Check if a tag holds raw (untokenized) text
pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Check if a tag is a heading (`h1`..`h6`)
pub fn is_heading(tag: &str) -> bool {
    HEADINGS.contains(&tag)
}

/// Heading level (1-6) of a heading tag
pub fn heading_level(tag: &str) -> Option<u8> {
    HEADINGS
        .iter()
        .position(|h| *h == tag)
        .map(|i| i as u8 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_block() {
        assert!(is_block("div"));
        assert!(is_block("p"));
        assert!(is_block(DOCUMENT_TAG));
        assert!(!is_block("span"));
        assert!(!is_block("a"));
    }

    #[test]
    fn test_is_void() {
        assert!(is_void("br"));
        assert!(is_void("img"));
        assert!(!is_void("div"));
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("h1"), Some(1));
        assert_eq!(heading_level("h6"), Some(6));
        assert_eq!(heading_level("header"), None);
    }
}
