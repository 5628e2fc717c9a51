//! Mapping from HTML elements to the Markdown construct they produce.
//!
//! Every tag name resolves to exactly one [`ElementKind`], and the emitter matches on
//! the kind exhaustively, so adding a construct means adding a variant here.

use once_cell::sync::Lazy;
use regex::Regex;

use downmark_core::utilities::{heading_level, is_block};
use downmark_core::Element;

/// Markdown construct produced by an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Heading(u8),
    Paragraph,
    /// Block element without syntax of its own (`div`, `section`, the document root)
    Container,
    BlockQuote,
    List { ordered: bool },
    ListItem,
    Preformatted,
    ThematicBreak,
    Table,
    LineBreak,
    Emphasis,
    Strong,
    InlineCode,
    Link,
    /// `img`, `audio` and `video`, all written as `![alt](src)`
    Image,
    /// Contributes nothing, children included
    Skipped,
    /// Inline element without syntax of its own; children are still visited
    Transparent,
}

impl ElementKind {
    pub fn of(tag: &str) -> Self {
        if let Some(level) = heading_level(tag) {
            return ElementKind::Heading(level);
        }
        match tag {
            "p" => ElementKind::Paragraph,
            "blockquote" => ElementKind::BlockQuote,
            "ul" | "menu" | "dir" => ElementKind::List { ordered: false },
            "ol" => ElementKind::List { ordered: true },
            "li" => ElementKind::ListItem,
            "pre" | "listing" | "xmp" | "plaintext" | "textarea" => ElementKind::Preformatted,
            "hr" => ElementKind::ThematicBreak,
            "table" => ElementKind::Table,
            "br" => ElementKind::LineBreak,
            "em" | "i" => ElementKind::Emphasis,
            "strong" | "b" => ElementKind::Strong,
            "code" | "kbd" | "samp" | "tt" => ElementKind::InlineCode,
            "a" => ElementKind::Link,
            "img" | "audio" | "video" => ElementKind::Image,
            "script" | "style" | "noscript" | "template" | "head" => ElementKind::Skipped,
            _ if is_block(tag) => ElementKind::Container,
            _ => ElementKind::Transparent,
        }
    }

    /// Check if the construct occupies its own block
    pub fn is_block(self) -> bool {
        matches!(
            self,
            ElementKind::Heading(_)
                | ElementKind::Paragraph
                | ElementKind::Container
                | ElementKind::BlockQuote
                | ElementKind::List { .. }
                | ElementKind::ListItem
                | ElementKind::Preformatted
                | ElementKind::ThematicBreak
                | ElementKind::Table
        )
    }
}

/// Column alignment of a table cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Delimiter-row cell for a column `width` characters wide
    pub fn delimiter(self, width: usize) -> String {
        let width = width.max(3);
        match self {
            Alignment::None => "-".repeat(width),
            Alignment::Left => format!(":{}", "-".repeat(width - 1)),
            Alignment::Center => format!(":{}:", "-".repeat(width - 2)),
            Alignment::Right => format!("{}:", "-".repeat(width - 1)),
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "left" => Alignment::Left,
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            _ => Alignment::None,
        }
    }
}

static STYLE_ALIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*text-align\s*:\s*(left|center|right)\b")
        .expect("STYLE_ALIGN: hardcoded regex is valid")
});

static CLASS_ALIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)text-(left|center|right)(?:\s|$)")
        .expect("CLASS_ALIGN: hardcoded regex is valid")
});

static CODE_LANGUAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(?:language|lang)-([\w+#.-]+)")
        .expect("CODE_LANGUAGE: hardcoded regex is valid")
});

/// Alignment of a table cell from its `style`, `align` or `class` attribute
pub fn cell_alignment(cell: &Element) -> Alignment {
    if let Some(caps) = cell.attr("style").and_then(|s| STYLE_ALIGN.captures(s)) {
        return Alignment::parse(&caps[1].to_ascii_lowercase());
    }
    if let Some(align) = cell.attr("align") {
        return Alignment::parse(&align.trim().to_ascii_lowercase());
    }
    cell.attr("class")
        .and_then(|c| CLASS_ALIGN.captures(c))
        .map(|caps| Alignment::parse(&caps[1]))
        .unwrap_or_default()
}

/// Info string for a fenced code block, from a `language-*`/`lang-*` class or
/// a `lang` attribute
pub fn code_language(element: &Element) -> Option<String> {
    if let Some(caps) = element.attr("class").and_then(|c| CODE_LANGUAGE.captures(c)) {
        return Some(caps[1].to_string());
    }
    element
        .attr("lang")
        .map(|lang| {
            lang.trim()
                .chars()
                .take_while(|&c| c.is_alphanumeric() || matches!(c, '_' | '+' | '#' | '.' | '-'))
                .collect::<String>()
        })
        .filter(|lang| !lang.is_empty())
}

/// Source URL of an image or media element. `audio` and `video` without a `src`
/// fall back to their first `<source src>` child.
pub fn media_source(element: &Element) -> Option<&str> {
    if let Some(src) = element.attr("src").and_then(non_empty) {
        return Some(src);
    }
    if element.tag_name == "img" {
        return None;
    }
    element
        .element_children()
        .filter(|child| child.tag_name == "source")
        .find_map(|child| child.attr("src").and_then(non_empty))
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}
