//! downmark-core - tolerant HTML parsing
//!
//! This crate turns arbitrary (possibly malformed) HTML into a small owned tree
//! that the `downmark` crate renders as Markdown. Parsing never fails on bad
//! markup; only a broken internal invariant is reported as an error.
//!
//! # Architecture
//!
//! ```text
//! HTML String ──▶ Tokenizer ──tokens──▶ TreeBuilder ──▶ Node tree
//!                 (lazy)               (arena, open stack)
//! ```
//!
//! # Example
//!
//! ```rust
//! use downmark_core::parse;
//!
//! let root = parse("<p>Hello <b>world</b>").unwrap();
//! let p = &root.children()[0];
//! assert_eq!(p.tag_name(), Some("p"));
//! assert_eq!(p.text_content(), "Hello world");
//! ```

pub mod entities;
mod node;
pub mod normalize;
pub mod tokenizer;
pub mod tree_builder;
pub mod utilities;

pub use node::{Attributes, Element, Node};
pub use tokenizer::{tokenize, Token, Tokenizer};
pub use tree_builder::{build_tree, TreeBuilder, MAX_OPEN_ELEMENTS};

/// Errors raised while building a tree
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("tree invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, DomError>;

/// Parse an HTML string into a tree rooted at a `#document` element
pub fn parse(html: &str) -> Result<Node> {
    build_tree(tokenize(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_returns_document_root() {
        let root = parse("").unwrap();
        assert_eq!(root.tag_name(), Some(utilities::DOCUMENT_TAG));
        assert!(root.children().is_empty());
    }

    #[test]
    fn parse_is_tolerant() {
        let root = parse("<div><span>a</div></span>b").unwrap();
        assert_eq!(root.text_content(), "ab");
    }
}
