//! Converter - the main entry point for HTML to Markdown conversion.

use std::fs;
use std::path::Path;

use downmark_core::Node;

use crate::emit::Emitter;
use crate::options::ConversionOptions;
use crate::{ConvertError, Result};

/// Converts HTML documents to Markdown with one set of options.
///
/// A converter holds no per-document state, so one instance can serve any
/// number of conversions, including concurrent ones through a shared reference.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConversionOptions,
}

impl Converter {
    /// Create a new Converter with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Converter with custom options
    pub fn with_options(options: ConversionOptions) -> Self {
        Self { options }
    }

    /// Get the current options
    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Get mutable access to options
    pub fn options_mut(&mut self) -> &mut ConversionOptions {
        &mut self.options
    }

    /// Convert an HTML string to Markdown
    pub fn convert_text(&self, html: &str) -> Result<String> {
        let root = downmark_core::parse(html)?;
        let markdown = self.convert_tree(&root);
        log::debug!(
            target: "downmark::convert",
            "converted {} bytes of HTML to {} bytes of Markdown",
            html.len(),
            markdown.len()
        );
        Ok(markdown)
    }

    /// Convert UTF-8 encoded HTML to Markdown
    pub fn convert_bytes(&self, html: &[u8]) -> Result<String> {
        let html = std::str::from_utf8(html).map_err(|e| {
            ConvertError::InvalidArgument(format!("input is not valid UTF-8: {e}"))
        })?;
        self.convert_text(html)
    }

    /// Render an already parsed tree
    pub fn convert_tree(&self, root: &Node) -> String {
        Emitter::new(&self.options).emit(root)
    }

    /// Read an HTML file and convert it
    pub fn convert_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let html = read_file(path.as_ref())?;
        self.convert_text(&html)
    }

    /// Convert an HTML string and write the Markdown to `out_path`
    pub fn convert_text_to_file(&self, html: &str, out_path: impl AsRef<Path>) -> Result<()> {
        let out_path = out_path.as_ref();
        check_path(out_path)?;
        let markdown = self.convert_text(html)?;
        write_file(out_path, &markdown)
    }

    /// Read an HTML file, convert it, and write the Markdown to `out_path`.
    ///
    /// The input is read and converted completely before the output is opened.
    pub fn convert_file_to_file(
        &self,
        in_path: impl AsRef<Path>,
        out_path: impl AsRef<Path>,
    ) -> Result<()> {
        let markdown = self.convert_file(in_path)?;
        let out_path = out_path.as_ref();
        check_path(out_path)?;
        write_file(out_path, &markdown)
    }
}

fn check_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(ConvertError::InvalidArgument("path is empty".to_string()));
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    check_path(path)?;
    let html = fs::read_to_string(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        target: "downmark::convert",
        "read {} bytes from {}",
        html.len(),
        path.display()
    );
    Ok(html)
}

fn write_file(path: &Path, markdown: &str) -> Result<()> {
    fs::write(path, markdown).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        target: "downmark::convert",
        "wrote {} bytes to {}",
        markdown.len(),
        path.display()
    );
    Ok(())
}
