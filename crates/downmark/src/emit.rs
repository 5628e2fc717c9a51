//! Markdown emission
//!
//! Walks a document tree depth-first and renders Markdown. Each container collects
//! its output as a sequence of block chunks plus a pending inline run; chunks are
//! joined with the block separator when the container is finished, so sibling blocks
//! never get more than one blank line between them.

use std::borrow::Cow;

use downmark_core::normalize::collapse_whitespace;
use downmark_core::{Element, Node};

use crate::options::{ConversionOptions, HeadingStyle};
use crate::rules::{cell_alignment, code_language, media_source, Alignment, ElementKind};
use crate::utilities::{
    code_span_delimiter, escape_attribute, escape_line_start, escape_markdown, escape_title,
    flatten_lines, indent_continuation, link_destination, longest_run,
};

/// CommonMark ordered list markers have at most nine digits
const MAX_LIST_START: u64 = 999_999_999;

/// Empty HTML comment placed between two sibling lists
const LIST_SEPARATOR: &str = "<!-- -->";

/// One open list while walking its items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLevel {
    pub ordered: bool,
    /// Number of the next item
    pub index: u64,
}

/// Walk state for one conversion
#[derive(Debug, Default)]
pub struct EmitContext {
    pub list_stack: Vec<ListLevel>,
    /// Number of enclosing blockquotes. Each level adds its own `> ` prefix to
    /// the lines it renders, so a line at depth n carries n markers.
    pub quote_depth: usize,
    /// Text is copied verbatim and inline syntax is suppressed
    pub in_preformatted: bool,
    /// Nothing inline has been emitted since the last block boundary
    pub last_emitted_was_block: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkKind {
    Block,
    List,
}

/// Output of one container: finished blocks plus the inline run being built
#[derive(Debug, Default)]
struct Blocks {
    chunks: Vec<(ChunkKind, String)>,
    inline: String,
}

impl Blocks {
    fn push_inline(&mut self, piece: &str) {
        let piece = if self.inline.ends_with('\n') {
            piece.trim_start_matches(' ')
        } else if self.inline.ends_with(' ') {
            piece.strip_prefix(' ').unwrap_or(piece)
        } else {
            piece
        };
        self.inline.push_str(piece);
    }

    fn push_hard_break(&mut self) {
        self.inline.truncate(self.inline.trim_end_matches(' ').len());
        self.inline.push_str("  \n");
    }

    fn flush_inline(&mut self) {
        let text = self.inline.trim_matches([' ', '\n']);
        if !text.is_empty() {
            self.chunks.push((ChunkKind::Block, text.to_string()));
        }
        self.inline.clear();
    }
}

/// Renders one tree with one set of options
pub struct Emitter<'a> {
    options: &'a ConversionOptions,
    ctx: EmitContext,
}

impl<'a> Emitter<'a> {
    pub fn new(options: &'a ConversionOptions) -> Self {
        Self {
            options,
            ctx: EmitContext::default(),
        }
    }

    /// Render a tree. Output is empty or ends with exactly one newline.
    pub fn emit(mut self, root: &Node) -> String {
        let body = self.render_nodes(std::slice::from_ref(root));
        let body = body.trim_matches('\n');
        if body.is_empty() {
            String::new()
        } else {
            format!("{body}\n")
        }
    }

    /// Render nodes as a block container and join the resulting blocks
    fn render_nodes(&mut self, nodes: &[Node]) -> String {
        let mut blocks = Blocks::default();
        self.ctx.last_emitted_was_block = true;
        self.collect(nodes, &mut blocks);
        blocks.flush_inline();
        self.ctx.last_emitted_was_block = true;
        self.join(blocks)
    }

    fn join(&self, blocks: Blocks) -> String {
        let separator = self.options.block_separator();
        let in_list_item = !self.ctx.list_stack.is_empty();
        let mut out = String::new();
        let mut previous = None;
        for (kind, text) in blocks.chunks {
            match previous {
                None => {}
                // Adjacent lists would otherwise continue each other
                Some(ChunkKind::List) if kind == ChunkKind::List => {
                    let around = if in_list_item { "\n" } else { separator };
                    out.push_str(around);
                    out.push_str(LIST_SEPARATOR);
                    out.push_str(around);
                }
                // Nested lists stay tight against the item text
                Some(_) if in_list_item && kind == ChunkKind::List => out.push('\n'),
                Some(_) => out.push_str(separator),
            }
            previous = Some(kind);
            out.push_str(&text);
        }
        out
    }

    fn collect(&mut self, nodes: &[Node], out: &mut Blocks) {
        for node in nodes {
            match node {
                Node::Text(text) => self.text(text, out),
                Node::Element(el) => self.element(el, out),
            }
        }
    }

    fn text(&mut self, text: &str, out: &mut Blocks) {
        if self.ctx.in_preformatted {
            out.inline.push_str(text);
            return;
        }
        let escaped = escape_markdown(text);
        if out.inline.trim_matches(' ').is_empty() || out.inline.ends_with('\n') {
            let body = escaped.trim_start_matches(' ');
            let leading = &escaped[..escaped.len() - body.len()];
            out.push_inline(&format!("{leading}{}", escape_line_start(body)));
        } else {
            out.push_inline(&escaped);
        }
        if !text.trim_matches(' ').is_empty() {
            self.ctx.last_emitted_was_block = false;
        }
    }

    fn push_block(&mut self, out: &mut Blocks, kind: ChunkKind, markdown: String) {
        out.flush_inline();
        if !markdown.is_empty() {
            out.chunks.push((kind, markdown));
        }
        self.ctx.last_emitted_was_block = true;
    }

    fn element(&mut self, el: &Element, out: &mut Blocks) {
        let kind = ElementKind::of(&el.tag_name);

        if self.ctx.in_preformatted {
            match kind {
                ElementKind::Skipped => {}
                ElementKind::LineBreak => out.inline.push('\n'),
                _ => self.collect(&el.children, out),
            }
            return;
        }

        match kind {
            ElementKind::Skipped => {}
            ElementKind::Container | ElementKind::ListItem => {
                self.push_block(out, ChunkKind::Block, String::new());
                self.collect(&el.children, out);
                self.push_block(out, ChunkKind::Block, String::new());
            }
            ElementKind::Heading(level) => {
                let markdown = self.heading(el, level);
                self.push_block(out, ChunkKind::Block, markdown);
            }
            ElementKind::Paragraph => {
                let markdown = self.paragraph(el);
                self.push_block(out, ChunkKind::Block, markdown);
            }
            ElementKind::BlockQuote => {
                let markdown = self.blockquote(el);
                self.push_block(out, ChunkKind::Block, markdown);
            }
            ElementKind::List { ordered } => {
                let markdown = self.list(el, ordered);
                self.push_block(out, ChunkKind::List, markdown);
            }
            ElementKind::Preformatted => {
                let markdown = self.code_block(el);
                self.push_block(out, ChunkKind::Block, markdown);
            }
            ElementKind::ThematicBreak => {
                let markdown = self.options.hr.clone();
                self.push_block(out, ChunkKind::Block, markdown);
            }
            ElementKind::Table => {
                let markdown = self.table(el);
                self.push_block(out, ChunkKind::Block, markdown);
            }
            ElementKind::LineBreak => {
                // A break before any inline content would only open the block with a blank line
                if !self.ctx.last_emitted_was_block {
                    out.push_hard_break();
                }
            }
            ElementKind::Transparent => self.collect(&el.children, out),
            ElementKind::Emphasis
            | ElementKind::Strong
            | ElementKind::InlineCode
            | ElementKind::Link
            | ElementKind::Image => {
                if contains_block(el) {
                    // Inline syntax cannot span blocks; keep the content only
                    self.collect(&el.children, out);
                    return;
                }
                let markdown = match kind {
                    ElementKind::Emphasis => wrap_delimited(&self.inline_content(el), "*"),
                    ElementKind::Strong => wrap_delimited(&self.inline_content(el), "**"),
                    ElementKind::InlineCode => self.code_span(el),
                    ElementKind::Link => self.link(el),
                    _ => self.image(el),
                };
                out.push_inline(&markdown);
                if !markdown.trim_matches([' ', '\n']).is_empty() {
                    self.ctx.last_emitted_was_block = false;
                }
            }
        }
    }

    /// Render the children of a block-free element as one inline run
    fn inline_content(&mut self, el: &Element) -> String {
        let mut blocks = Blocks::default();
        self.collect(&el.children, &mut blocks);
        blocks.inline
    }

    /// Text of `nodes` with whitespace and characters left exactly as they are
    fn literal(&mut self, nodes: &[Node]) -> String {
        let was_preformatted = std::mem::replace(&mut self.ctx.in_preformatted, true);
        let mut blocks = Blocks::default();
        self.collect(nodes, &mut blocks);
        self.ctx.in_preformatted = was_preformatted;
        blocks.inline
    }

    fn anchor(&self, el: &Element) -> Cow<'static, str> {
        match el.attr("id").map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) if self.options.id_anchors => {
                Cow::Owned(format!("<span id=\"{}\"></span>", escape_attribute(id)))
            }
            _ => Cow::Borrowed(""),
        }
    }

    fn heading(&mut self, el: &Element, level: u8) -> String {
        let text = flatten_lines(&self.render_nodes(&el.children));
        if text.is_empty() {
            return String::new();
        }
        let text = format!("{}{text}", self.anchor(el));

        match self.options.heading_style {
            HeadingStyle::Setext if level <= 2 => {
                let underline = if level == 1 { "=" } else { "-" };
                format!("{text}\n{}", underline.repeat(text.chars().count()))
            }
            _ => format!("{} {text}", "#".repeat(usize::from(level))),
        }
    }

    fn paragraph(&mut self, el: &Element) -> String {
        let content = self.render_nodes(&el.children);
        if content.is_empty() {
            return content;
        }
        format!("{}{content}", self.anchor(el))
    }

    fn blockquote(&mut self, el: &Element) -> String {
        self.ctx.quote_depth += 1;
        log::trace!(target: "downmark::emit", "blockquote depth {}", self.ctx.quote_depth);
        let content = self.render_nodes(&el.children);
        self.ctx.quote_depth -= 1;

        content
            .split('\n')
            .filter(|_| !content.is_empty())
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn list(&mut self, el: &Element, ordered: bool) -> String {
        let start = if ordered {
            el.attr("start")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map_or(1, |start| start.min(MAX_LIST_START))
        } else {
            1
        };
        self.ctx.list_stack.push(ListLevel {
            ordered,
            index: start,
        });

        // (rendered item, marker width)
        let mut items: Vec<(String, usize)> = Vec::new();
        for child in &el.children {
            match child {
                Node::Element(item) if item.tag_name == "li" => {
                    let rendered = self.list_item(item);
                    items.push(rendered);
                }
                other => {
                    // Content directly inside the list continues the previous item
                    let content = self.render_nodes(std::slice::from_ref(other));
                    if content.is_empty() {
                        continue;
                    }
                    match items.last_mut() {
                        Some((last, width)) => {
                            let indent = " ".repeat(*width);
                            last.push_str(&indent_continuation(&format!("\n{content}"), &indent));
                        }
                        None => items.push((content, 0)),
                    }
                }
            }
        }

        self.ctx.list_stack.pop();
        items
            .into_iter()
            .map(|(item, _)| item)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn list_item(&mut self, item: &Element) -> (String, usize) {
        let marker = match self.ctx.list_stack.last_mut() {
            Some(level) if level.ordered => {
                let marker = format!("{}. ", level.index);
                level.index = level.index.saturating_add(1);
                marker
            }
            _ => format!("{} ", self.options.bullet_list_marker),
        };
        let width = marker.chars().count();

        let content = self.render_nodes(&item.children);
        let body = indent_continuation(&content, &" ".repeat(width));
        let rendered = format!("{marker}{body}");
        (rendered.trim_end_matches(' ').to_string(), width)
    }

    fn code_block(&mut self, el: &Element) -> String {
        let language = el
            .element_children()
            .find(|child| child.tag_name == "code")
            .and_then(code_language)
            .or_else(|| code_language(el))
            .unwrap_or_default();

        let mut code = self.literal(&el.children);
        if code.ends_with('\n') {
            code.pop();
        }
        let fence = "`".repeat(longest_run(&code, '`').max(2) + 1);

        if code.is_empty() {
            format!("{fence}{language}\n{fence}")
        } else {
            format!("{fence}{language}\n{code}\n{fence}")
        }
    }

    fn code_span(&mut self, el: &Element) -> String {
        let code = self.literal(&el.children).replace('\n', " ");
        if code.is_empty() {
            return code;
        }
        let delimiter = code_span_delimiter(&code);
        let pad = if code.starts_with('`') || code.ends_with('`') {
            " "
        } else {
            ""
        };
        format!("{delimiter}{pad}{code}{pad}{delimiter}")
    }

    fn link(&mut self, el: &Element) -> String {
        let content = self.inline_content(el);
        let Some(href) = el.attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            return content;
        };
        let (leading, text, trailing) = split_flanking(&content);
        if text.is_empty() {
            return content;
        }
        format!(
            "{leading}[{text}]({}{}){trailing}",
            link_destination(href),
            title_suffix(el)
        )
    }

    fn image(&mut self, el: &Element) -> String {
        let Some(src) = media_source(el) else {
            // Fallback content of audio and video is still shown
            return if el.tag_name == "img" {
                String::new()
            } else {
                self.inline_content(el)
            };
        };
        let alt = el
            .attr("alt")
            .map(|alt| escape_markdown(collapse_whitespace(alt).trim()))
            .unwrap_or_default();
        format!("![{alt}]({}{})", link_destination(src), title_suffix(el))
    }

    fn table(&mut self, el: &Element) -> String {
        let caption = el
            .element_children()
            .find(|child| child.tag_name == "caption")
            .map(|caption| flatten_lines(&self.render_nodes(&caption.children)))
            .filter(|caption| !caption.is_empty());

        let mut rows = Vec::new();
        collect_rows(el, &mut rows);

        let mut cells: Vec<Vec<String>> = Vec::with_capacity(rows.len());
        let mut alignments: Vec<Alignment> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let row_cells: Vec<&Element> = row
                .element_children()
                .filter(|cell| cell.tag_name == "td" || cell.tag_name == "th")
                .collect();
            if i == 0 {
                alignments = row_cells.iter().map(|cell| cell_alignment(cell)).collect();
            }
            let mut rendered = Vec::with_capacity(row_cells.len());
            for cell in row_cells {
                let text = flatten_lines(&self.render_nodes(&cell.children));
                rendered.push(text.replace('|', "\\|"));
            }
            cells.push(rendered);
        }

        let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return caption.unwrap_or_default();
        }
        for row in &mut cells {
            row.resize(columns, String::new());
        }
        alignments.resize(columns, Alignment::None);

        let widths: Vec<usize> = (0..columns)
            .map(|column| {
                cells
                    .iter()
                    .map(|row| row[column].chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(3)
            })
            .collect();

        let mut lines = Vec::with_capacity(cells.len() + 1);
        let mut rows_iter = cells.iter();
        if let Some(header) = rows_iter.next() {
            lines.push(format_row(header, &widths));
        }
        let delimiters: Vec<String> = alignments
            .iter()
            .zip(&widths)
            .map(|(alignment, &width)| alignment.delimiter(width))
            .collect();
        lines.push(format!("| {} |", delimiters.join(" | ")));
        for row in rows_iter {
            lines.push(format_row(row, &widths));
        }

        let table = lines.join("\n");
        match caption {
            Some(caption) => format!("{caption}{}{table}", self.options.block_separator()),
            None => table,
        }
    }
}

/// Check if any descendant renders as a block
fn contains_block(el: &Element) -> bool {
    el.element_children().any(|child| {
        let kind = ElementKind::of(&child.tag_name);
        kind != ElementKind::Skipped && (kind.is_block() || contains_block(child))
    })
}

/// Split leading and trailing whitespace off inline content
fn split_flanking(content: &str) -> (&str, &str, &str) {
    let start = content.len() - content.trim_start_matches([' ', '\n']).len();
    let end = content.trim_end_matches([' ', '\n']).len().max(start);
    (&content[..start], &content[start..end], &content[end..])
}

/// Wrap inline content in a delimiter pair, keeping flanking whitespace outside
fn wrap_delimited(content: &str, delimiter: &str) -> String {
    let (leading, inner, trailing) = split_flanking(content);
    if inner.is_empty() {
        return if content.is_empty() {
            String::new()
        } else {
            " ".to_string()
        };
    }
    format!("{leading}{delimiter}{inner}{delimiter}{trailing}")
}

fn title_suffix(el: &Element) -> String {
    el.attr("title")
        .map(|title| collapse_whitespace(title).trim().to_string())
        .filter(|title| !title.is_empty())
        .map(|title| format!(" \"{}\"", escape_title(&title)))
        .unwrap_or_default()
}

/// Rows of a table in document order, looking through row groups but not into
/// nested tables
fn collect_rows<'t>(el: &'t Element, rows: &mut Vec<&'t Element>) {
    for child in el.element_children() {
        match child.tag_name.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => collect_rows(child, rows),
            _ => {}
        }
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| {
            let padding = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect();
    format!("| {} |", padded.join(" | "))
}
