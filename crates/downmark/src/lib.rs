//! # downmark
//!
//! Convert HTML documents to Markdown.
//!
//! ## Design
//!
//! Conversion runs in three stages over one document, each owned by the call in
//! progress:
//!
//! - **Tokenizer** (`downmark-core`): a lazy, tolerant scan of the HTML string
//! - **Tree builder** (`downmark-core`): an ordered element/text tree with implied
//!   and auto-closed tags, normalized whitespace and decoded entities
//! - **Emitter**: a depth-first walk rendering CommonMark-style Markdown
//!
//! Malformed markup is never an error. Errors are reserved for bad calls (an
//! empty path, bytes that are not UTF-8) and for file I/O.
//!
//! ## Example (HTML string)
//!
//! ```rust
//! use downmark::{convert_text, ConversionOptions};
//!
//! let markdown = convert_text("<h1>Hello, world.</h1>", &ConversionOptions::default()).unwrap();
//! assert_eq!(markdown, "# Hello, world.\n");
//! ```
//!
//! ## Example (reusing a converter)
//!
//! ```rust
//! use downmark::{ConversionOptions, Converter};
//!
//! let converter = Converter::with_options(ConversionOptions::compact());
//! let markdown = converter.convert_text("<p>one</p><p>two</p>").unwrap();
//! assert_eq!(markdown, "one\ntwo\n");
//! ```

use std::path::{Path, PathBuf};

mod converter;
mod emit;
mod options;
mod rules;
mod utilities;

pub use converter::Converter;
pub use downmark_core::{Element, Node};
pub use options::{ConversionOptions, HeadingStyle};
pub use utilities::escape_markdown;

/// Error type for downmark operations
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal parse error: {0}")]
    InternalParse(String),
}

impl From<downmark_core::DomError> for ConvertError {
    fn from(err: downmark_core::DomError) -> Self {
        ConvertError::InternalParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Parse HTML into a document tree without emitting Markdown
pub fn parse_html(html: &str) -> Result<Node> {
    Ok(downmark_core::parse(html)?)
}

/// Convert an HTML string to Markdown
pub fn convert_text(html: &str, options: &ConversionOptions) -> Result<String> {
    Converter::with_options(options.clone()).convert_text(html)
}

/// Convert UTF-8 encoded HTML to Markdown
pub fn convert_bytes(html: &[u8], options: &ConversionOptions) -> Result<String> {
    Converter::with_options(options.clone()).convert_bytes(html)
}

/// Read an HTML file and convert it to Markdown
pub fn convert_file(path: impl AsRef<Path>, options: &ConversionOptions) -> Result<String> {
    Converter::with_options(options.clone()).convert_file(path)
}

/// Convert an HTML string and write the Markdown to a file
pub fn convert_text_to_file(
    html: &str,
    out_path: impl AsRef<Path>,
    options: &ConversionOptions,
) -> Result<()> {
    Converter::with_options(options.clone()).convert_text_to_file(html, out_path)
}

/// Read an HTML file, convert it and write the Markdown to another file
pub fn convert_file_to_file(
    in_path: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
    options: &ConversionOptions,
) -> Result<()> {
    Converter::with_options(options.clone()).convert_file_to_file(in_path, out_path)
}
