//! Error-tolerant tree construction.
//!
//! Nodes live in a flat arena while the document is being built; children are
//! referenced by index so the open-element stack never needs parent pointers.
//! Once the token stream ends, the arena is folded into an owned [`Node`] tree.
//!
//! Recovery rules:
//! - an end tag pops the open stack down to (and including) the nearest element of
//!   the same name; an end tag with no such element is ignored
//! - void elements and `<x/>` never take children
//! - a few start tags imply the end of an open element (`li`, `dt`/`dd`, table
//!   rows, sections and cells, `p` before a block, a heading inside a heading)
//! - everything still open at end of input is closed innermost-first
//!
//! Text is normalized as it is attached: whitespace runs collapse outside
//! preformatted elements, and whitespace touching a block boundary is trimmed when
//! the enclosing element closes.

use crate::node::{Attributes, Element, Node};
use crate::normalize::{normalize_newlines, WhitespaceCollapser};
use crate::tokenizer::Token;
use crate::utilities::{
    is_block, is_heading, is_preformatted, is_void, CLOSES_PARAGRAPH, DOCUMENT_TAG,
};
use crate::{DomError, Result};

/// Deepest nesting of open elements; deeper start tags become siblings.
pub const MAX_OPEN_ELEMENTS: usize = 512;

const ROOT: usize = 0;

/// Build a tree from a token stream. Never fails on malformed markup.
pub fn build_tree<I>(tokens: I) -> Result<Node>
where
    I: IntoIterator<Item = Token>,
{
    let mut builder = TreeBuilder::new();
    for token in tokens {
        builder.process(token);
    }
    builder.finish()
}

#[derive(Debug)]
enum ArenaNode {
    Element {
        tag_name: String,
        attributes: Attributes,
        children: Vec<usize>,
    },
    Text(String),
}

#[derive(Debug)]
struct NodeArena {
    nodes: Vec<ArenaNode>,
}

impl NodeArena {
    fn new() -> Self {
        Self {
            nodes: vec![ArenaNode::Element {
                tag_name: DOCUMENT_TAG.to_string(),
                attributes: Attributes::new(),
                children: Vec::new(),
            }],
        }
    }

    fn add_child(&mut self, parent: usize, child: ArenaNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(child);
        if let ArenaNode::Element { children, .. } = &mut self.nodes[parent] {
            children.push(index);
        }
        index
    }

    fn tag(&self, index: usize) -> Option<&str> {
        match &self.nodes[index] {
            ArenaNode::Element { tag_name, .. } => Some(tag_name.as_str()),
            ArenaNode::Text(_) => None,
        }
    }

    fn children(&self, index: usize) -> &[usize] {
        match &self.nodes[index] {
            ArenaNode::Element { children, .. } => children.as_slice(),
            ArenaNode::Text(_) => &[],
        }
    }

    fn is_block_element(&self, index: usize) -> bool {
        self.tag(index).is_some_and(is_block)
    }

    fn text_mut(&mut self, index: usize) -> Option<&mut String> {
        match &mut self.nodes[index] {
            ArenaNode::Text(text) => Some(text),
            ArenaNode::Element { .. } => None,
        }
    }

    /// Fold the arena into an owned tree with an iterative post-order walk, so deep
    /// documents cannot exhaust the stack.
    fn into_tree(self, root: usize) -> Result<Node> {
        let mut slots: Vec<Option<ArenaNode>> = self.nodes.into_iter().map(Some).collect();
        let mut built: Vec<Node> = Vec::new();
        let mut stack: Vec<(usize, bool)> = vec![(root, false)];

        while let Some((index, visited)) = stack.pop() {
            let slot = slots
                .get(index)
                .ok_or_else(|| DomError::Invariant(format!("node {index} out of range")))?;

            if !visited {
                stack.push((index, true));
                if let Some(ArenaNode::Element { children, .. }) = slot {
                    // Reverse so children land on `built` in source order
                    for &child in children.iter().rev() {
                        stack.push((child, false));
                    }
                }
                continue;
            }

            let node = slots[index]
                .take()
                .ok_or_else(|| DomError::Invariant(format!("node {index} attached twice")))?;
            let node = match node {
                ArenaNode::Text(text) => Node::Text(text),
                ArenaNode::Element {
                    tag_name,
                    attributes,
                    children,
                } => {
                    let first = built.len().checked_sub(children.len()).ok_or_else(|| {
                        DomError::Invariant(format!("children of <{tag_name}> missing"))
                    })?;
                    let children = built.split_off(first);
                    Node::Element(Element {
                        tag_name,
                        attributes,
                        children,
                    })
                }
            };
            built.push(node);
        }

        let root = built
            .pop()
            .ok_or_else(|| DomError::Invariant("no root node built".to_string()))?;
        if !built.is_empty() {
            return Err(DomError::Invariant(format!(
                "{} nodes left outside the root",
                built.len()
            )));
        }
        Ok(root)
    }
}

/// Incremental tree builder fed one token at a time
#[derive(Debug)]
pub struct TreeBuilder {
    arena: NodeArena,
    open: Vec<usize>,
    text: WhitespaceCollapser,
    preformatted_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            open: Vec::new(),
            text: WhitespaceCollapser::default(),
            preformatted_depth: 0,
        }
    }

    fn current(&self) -> usize {
        self.open.last().copied().unwrap_or(ROOT)
    }

    fn current_tag(&self) -> &str {
        self.arena.tag(self.current()).unwrap_or(DOCUMENT_TAG)
    }

    pub fn process(&mut self, token: Token) {
        match token {
            Token::Text(raw) => {
                if self.preformatted_depth > 0 {
                    self.text.push_literal(&normalize_newlines(&raw));
                } else {
                    self.text.push_raw(&raw);
                }
            }
            Token::Entity { value, .. } => self.text.push_literal(&value),
            Token::Comment(_) => {}
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                self.flush_text();
                self.start_tag(name, attributes, self_closing);
            }
            Token::EndTag { name } => {
                self.flush_text();
                self.end_tag(&name);
            }
        }
    }

    /// Close everything still open and return the tree
    pub fn finish(mut self) -> Result<Node> {
        self.flush_text();
        if !self.open.is_empty() {
            log::debug!(
                target: "downmark::tree",
                "closing {} element(s) left open at end of input",
                self.open.len()
            );
        }
        while !self.open.is_empty() {
            self.close_top();
        }
        self.trim_block_boundaries(ROOT);
        self.arena.into_tree(ROOT)
    }

    /// Attach the pending text run to the current element
    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let mut text = self.text.take();
        let parent = self.current();

        if self.preformatted_depth > 0
            && is_preformatted(self.current_tag())
            && self.arena.children(parent).is_empty()
            && text.starts_with('\n')
        {
            text.remove(0);
        }
        if text.is_empty() {
            return;
        }

        let merge_into = self
            .arena
            .children(parent)
            .last()
            .copied()
            .filter(|&last| self.arena.tag(last).is_none());
        match merge_into.and_then(|last| self.arena.text_mut(last)) {
            Some(previous) => {
                if previous.ends_with(' ') && text.starts_with(' ') && self.preformatted_depth == 0 {
                    text.remove(0);
                }
                previous.push_str(&text);
            }
            None => {
                self.arena.add_child(parent, ArenaNode::Text(text));
            }
        }
    }

    fn start_tag(&mut self, name: String, attributes: Attributes, self_closing: bool) {
        self.close_implied(&name);

        let childless = self_closing || is_void(&name);
        let at_cap = !childless && self.open.len() >= MAX_OPEN_ELEMENTS;
        if at_cap {
            log::debug!(
                target: "downmark::tree",
                "nesting cap of {MAX_OPEN_ELEMENTS} reached, <{name}> will not nest"
            );
        }
        let preformatted = is_preformatted(&name);
        let parent = self.current();
        let index = self.arena.add_child(
            parent,
            ArenaNode::Element {
                tag_name: name,
                attributes,
                children: Vec::new(),
            },
        );

        if !childless && !at_cap {
            self.open.push(index);
            if preformatted {
                self.preformatted_depth += 1;
            }
        }
    }

    fn end_tag(&mut self, name: &str) {
        if name == "br" {
            // `</br>` is read as `<br>`
            self.start_tag(name.to_string(), Attributes::new(), true);
            return;
        }
        let position = self
            .open
            .iter()
            .rposition(|&index| self.arena.tag(index) == Some(name));
        match position {
            Some(position) => {
                let implied = self.open.len() - position - 1;
                if implied > 0 {
                    log::debug!(
                        target: "downmark::tree",
                        "</{name}> closes {implied} unclosed element(s)"
                    );
                }
                self.close_to(position);
            }
            None => {
                log::debug!(target: "downmark::tree", "ignoring stray </{name}>");
            }
        }
    }

    /// Pop the open stack until its length is `position`
    fn close_to(&mut self, position: usize) {
        while self.open.len() > position {
            self.close_top();
        }
    }

    fn close_top(&mut self) {
        let Some(index) = self.open.pop() else {
            return;
        };
        if self.arena.tag(index).is_some_and(is_preformatted) {
            self.preformatted_depth = self.preformatted_depth.saturating_sub(1);
        }
        self.trim_block_boundaries(index);
    }

    /// Close the innermost element named in `targets`, unless a `boundaries`
    /// element is found first.
    fn close_in_scope(&mut self, targets: &[&str], boundaries: &[&str]) {
        for position in (0..self.open.len()).rev() {
            let Some(tag) = self.arena.tag(self.open[position]) else {
                continue;
            };
            if targets.contains(&tag) {
                log::debug!(target: "downmark::tree", "implied </{tag}>");
                self.close_to(position);
                return;
            }
            if boundaries.contains(&tag) {
                return;
            }
        }
    }

    fn close_implied(&mut self, name: &str) {
        if CLOSES_PARAGRAPH.contains(&name) {
            self.close_in_scope(&["p"], &["button", "table", "td", "th", "caption"]);
        }
        match name {
            "li" => self.close_in_scope(&["li"], &["ul", "ol", "menu", "table", "td", "th"]),
            "dt" | "dd" => self.close_in_scope(&["dt", "dd"], &["dl", "table", "td", "th"]),
            "tr" => self.close_in_scope(&["tr"], &["table"]),
            "td" | "th" => self.close_in_scope(&["td", "th"], &["tr", "table"]),
            "thead" | "tbody" | "tfoot" => {
                self.close_in_scope(&["thead", "tbody", "tfoot"], &["table"])
            }
            _ if is_heading(name) && is_heading(self.current_tag()) => {
                log::debug!(target: "downmark::tree", "implied </{}>", self.current_tag());
                self.close_top();
            }
            _ => {}
        }
    }

    /// Trim whitespace that touches a block boundary in the children of `parent`,
    /// dropping text nodes that end up empty.
    fn trim_block_boundaries(&mut self, parent: usize) {
        let Some(tag) = self.arena.tag(parent) else {
            return;
        };
        if self.preformatted_depth > 0 || is_preformatted(tag) {
            return;
        }
        let parent_is_block = is_block(tag);
        let children = self.arena.children(parent).to_vec();
        let mut kept = Vec::with_capacity(children.len());

        for (i, &child) in children.iter().enumerate() {
            let after_block = match i.checked_sub(1) {
                Some(prev) => self.arena.is_block_element(children[prev]),
                None => parent_is_block,
            };
            let before_block = match children.get(i + 1) {
                Some(&next) => self.arena.is_block_element(next),
                None => parent_is_block,
            };
            if let Some(text) = self.arena.text_mut(child) {
                if after_block {
                    let leading = text.len() - text.trim_start_matches(' ').len();
                    text.drain(..leading);
                }
                if before_block {
                    text.truncate(text.trim_end_matches(' ').len());
                }
                if text.is_empty() {
                    continue;
                }
            }
            kept.push(child);
        }

        if let ArenaNode::Element { children, .. } = &mut self.arena.nodes[parent] {
            *children = kept;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse(html: &str) -> Node {
        build_tree(tokenize(html)).unwrap()
    }

    /// Compact rendering of a tree: `tag(children)` and `"text"`
    fn shape(node: &Node) -> String {
        match node {
            Node::Text(text) => format!("{text:?}"),
            Node::Element(el) => {
                let children: Vec<String> = el.children.iter().map(shape).collect();
                format!("{}({})", el.tag_name, children.join(" "))
            }
        }
    }

    fn body(html: &str) -> String {
        let root = parse(html);
        root.children().iter().map(shape).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn single_document_root() {
        let root = parse("<p>a</p><p>b</p>");
        assert_eq!(root.tag_name(), Some(DOCUMENT_TAG));
        assert_eq!(body("<p>a</p><p>b</p>"), r#"p("a") p("b")"#);
    }

    #[test]
    fn children_keep_source_order() {
        assert_eq!(
            body("<div>one<b>two</b>three<i>four</i></div>"),
            r#"div("one" b("two") "three" i("four"))"#
        );
    }

    #[test]
    fn end_tag_auto_closes_intervening_elements() {
        assert_eq!(body("<div><b><i>x</div>y"), r#"div(b(i("x"))) "y""#);
    }

    #[test]
    fn stray_end_tag_is_ignored() {
        assert_eq!(body("<p>a</span>b</p>"), r#"p("ab")"#);
        assert_eq!(body("</div>x"), r#""x""#);
    }

    #[test]
    fn void_elements_take_no_children() {
        assert_eq!(
            body("<p>a<br>b<img src=x>c</p>"),
            r#"p("a" br() "b" img() "c")"#
        );
        assert_eq!(body("<p>a</br>b</p>"), r#"p("a" br() "b")"#);
    }

    #[test]
    fn self_closing_non_void_is_empty() {
        assert_eq!(body("<div/>x"), r#"div() "x""#);
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(body("<span><!-- 1 -->2</span>"), r#"span("2")"#);
        assert_eq!(body("a<!-- x -->b"), r#""ab""#);
    }

    #[test]
    fn open_elements_close_at_end() {
        assert_eq!(body("<ul><li>one"), r#"ul(li("one"))"#);
    }

    #[test]
    fn implied_list_item_end() {
        assert_eq!(body("<ul><li>1<li>2</ul>"), r#"ul(li("1") li("2"))"#);
        assert_eq!(
            body("<ul><li>1<ul><li>1-1<li>1-2</ul><li>2</ul>"),
            r#"ul(li("1" ul(li("1-1") li("1-2"))) li("2"))"#
        );
    }

    #[test]
    fn implied_paragraph_end() {
        assert_eq!(body("<p>a<p>b"), r#"p("a") p("b")"#);
        assert_eq!(body("<p>a<div>b</div>"), r#"p("a") div("b")"#);
    }

    #[test]
    fn implied_table_ends() {
        assert_eq!(
            body("<table><tr><td>a<td>b<tr><td>c</table>"),
            r#"table(tr(td("a") td("b")) tr(td("c")))"#
        );
    }

    #[test]
    fn whitespace_collapses_and_trims_at_block_edges() {
        assert_eq!(
            body("<p>\n  Hello   <b>big</b>\n world  </p>"),
            r#"p("Hello " b("big") " world")"#
        );
        assert_eq!(
            body("<ul>\n  <li> one </li>\n  <li>two</li>\n</ul>"),
            r#"ul(li("one") li("two"))"#
        );
    }

    #[test]
    fn whitespace_between_inline_elements_survives() {
        assert_eq!(body("<p><b>a</b> <i>b</i></p>"), r#"p(b("a") " " i("b"))"#);
    }

    #[test]
    fn entities_decode_into_text() {
        assert_eq!(body("<p>a &amp; b &bogus;</p>"), r#"p("a & b &bogus;")"#);
        assert_eq!(parse("<p>x&nbsp;&nbsp;y</p>").text_content(), "x\u{a0}\u{a0}y");
    }

    #[test]
    fn preformatted_text_is_verbatim() {
        assert_eq!(
            body("<pre>\n  a\r\n\tb  </pre>"),
            r#"pre("  a\n\tb  ")"#
        );
        assert_eq!(
            body("<pre><code>x  =  1\n</code></pre>"),
            r#"pre(code("x  =  1\n"))"#
        );
    }

    #[test]
    fn nested_headings_are_split() {
        assert_eq!(body("<h1>a<h2>b</h2>"), r#"h1("a") h2("b")"#);
    }

    #[test]
    fn nesting_is_capped() {
        let depth = MAX_OPEN_ELEMENTS + 100;
        let html = "<span>".repeat(depth) + "x";
        let root = parse(&html);

        let mut node = &root;
        let mut levels = 0;
        while let Some(child) = node.children().iter().find(|c| c.is_element()) {
            node = child;
            levels += 1;
        }
        // Tags past the cap are attached as empty leaves of the deepest element
        assert_eq!(levels, MAX_OPEN_ELEMENTS + 1);
        assert_eq!(root.text_content(), "x");
    }

    #[test]
    fn never_fails_on_garbage() {
        for html in ["<", "<<>>", "</", "<a <b", "&&&;", "<!--", "<p></p></p></p>", "<<p>>"] {
            assert!(build_tree(tokenize(html)).is_ok(), "failed on {html:?}");
        }
    }
}
