//! Document tree produced by the tree builder.
//!
//! The tree is a closed two-variant type: elements own their children in source
//! order, text nodes hold already-normalized text. Every tree has exactly one root,
//! a synthetic `#document` element.

use indexmap::IndexMap;

use crate::utilities::{is_void, DOCUMENT_TAG};

/// Attributes of an element, in source order. Names are lowercase.
pub type Attributes = IndexMap<String, String>;

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Element with tag name, attributes and children
    Element(Element),
    /// Normalized text content
    Text(String),
}

/// An element node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name (`#document` for the root)
    pub tag_name: String,
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element without attributes or children
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value by (lowercase) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Check if an attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Check if this is the synthetic document root
    pub fn is_document(&self) -> bool {
        self.tag_name == DOCUMENT_TAG
    }

    /// Check if this is a void element
    pub fn is_void(&self) -> bool {
        is_void(&self.tag_name)
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}

impl Node {
    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Node::Element(Element::new(tag_name))
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        let mut element = Element::new(tag_name);
        for (name, value) in attrs {
            element
                .attributes
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
        Node::Element(element)
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Node::Text(content.to_string())
    }

    /// Create an empty document root
    pub fn document() -> Self {
        Node::element(DOCUMENT_TAG)
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// Check if this is a text node
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Tag name for elements
    pub fn tag_name(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag_name.as_str())
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.as_element()?.attr(name)
    }

    /// Get all child nodes
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Text(_) => &[],
        }
    }

    /// Add a child node. Text nodes silently ignore children.
    pub fn add_child(&mut self, child: Node) {
        if let Node::Element(el) = self {
            el.children.push(child);
        }
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(el) => el.text_content(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_element() {
        let node = Node::element("DIV");
        assert!(node.is_element());
        assert_eq!(node.tag_name(), Some("div"));
    }

    #[test]
    fn test_create_text() {
        let node = Node::text("Hello World");
        assert!(node.is_text());
        assert_eq!(node.tag_name(), None);
        assert_eq!(node.text_content(), "Hello World");
    }

    #[test]
    fn test_attributes_keep_order() {
        let node = Node::element_with_attrs(
            "a",
            vec![("href", "https://example.com"), ("Title", "Example")],
        );
        assert_eq!(node.attr("href"), Some("https://example.com"));
        assert_eq!(node.attr("title"), Some("Example"));
        assert_eq!(node.attr("class"), None);

        let names: Vec<&str> = node
            .as_element()
            .unwrap()
            .attributes
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, ["href", "title"]);
    }

    #[test]
    fn test_children_and_text_content() {
        let mut div = Node::element("div");
        div.add_child(Node::text("Hello "));
        let mut span = Node::element("span");
        span.add_child(Node::text("World"));
        div.add_child(span);

        assert_eq!(div.children().len(), 2);
        assert_eq!(div.as_element().unwrap().element_children().count(), 1);
        assert_eq!(div.text_content(), "Hello World");
    }

    #[test]
    fn test_document_root() {
        let doc = Node::document();
        assert!(doc.as_element().unwrap().is_document());
        assert!(Node::element("br").as_element().unwrap().is_void());
    }
}
