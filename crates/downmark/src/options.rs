//! Configuration options for Markdown emission

/// Heading style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// Use ATX-style headings (prefixed with #)
    #[default]
    Atx,
    /// Use setext-style headings (underlined with = or -)
    /// Only works for h1 and h2, falls back to ATX for h3-h6
    Setext,
}

/// Options for one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Separate sibling blocks with a single newline instead of a blank line
    pub compact: bool,

    /// Heading style (atx or setext)
    pub heading_style: HeadingStyle,

    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Horizontal rule string
    pub hr: String,

    /// Prefix headings and paragraphs that carry an `id` with an inline
    /// `<span id="..."></span>` anchor
    pub id_anchors: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            compact: false,
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: '-',
            hr: "* * *".to_string(),
            id_anchors: false,
        }
    }
}

impl ConversionOptions {
    /// Defaults with `compact` switched on
    pub fn compact() -> Self {
        Self {
            compact: true,
            ..Default::default()
        }
    }

    /// Text placed between two sibling blocks
    pub fn block_separator(&self) -> &'static str {
        if self.compact {
            "\n"
        } else {
            "\n\n"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ConversionOptions::default();
        assert!(!options.compact);
        assert_eq!(options.heading_style, HeadingStyle::Atx);
        assert_eq!(options.bullet_list_marker, '-');
        assert_eq!(options.block_separator(), "\n\n");
    }

    #[test]
    fn compact_separator() {
        assert_eq!(ConversionOptions::compact().block_separator(), "\n");
    }
}
