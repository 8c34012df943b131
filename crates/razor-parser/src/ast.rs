//! Document tree for Razor templates.
//!
//! A node is classified as markup, code or literal text. Leaf nodes carry
//! their whole text in `begin`; structural nodes (elements with a closing
//! tag, code blocks) split it into `begin`, `children` and `end`.

use razor_matcher::Span;
use std::fmt;

/// A parsed template. `nodes` are the top-level nodes in source order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    pub nodes: Vec<Node>,
}

/// Classification of a node. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NodeKind {
    /// Markup: a tag, an element or an HTML comment.
    Html,
    /// Razor code: expressions, comments, code blocks and control blocks.
    Razor,
    /// Literal text between markup and code.
    Text,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Html => "Html",
            NodeKind::Razor => "Razor",
            NodeKind::Text => "Text",
        })
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Node {
    pub kind: NodeKind,
    /// Leading text owned by the node. For a leaf this is all of it.
    pub begin: String,
    /// Closing text: an element's closing tag, or a block's `}` and anything
    /// that trails it (`} while (x)`, `})`).
    pub end: Option<String>,
    pub children: Vec<Node>,
    /// Source range the node was built from. Razor spans include the `@`.
    pub span: Span,
}

impl Node {
    pub fn leaf(kind: NodeKind, begin: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            begin: begin.into(),
            end: None,
            children: Vec::new(),
            span,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.end.is_none() && self.children.is_empty()
    }

    /// `begin`, then every child's text, then `end`, in document order.
    pub fn source_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        out.push_str(&self.begin);
        for child in &self.children {
            child.write_text(out);
        }
        if let Some(end) = &self.end {
            out.push_str(end);
        }
    }

    /// The source characters covered by `span`.
    pub fn source_slice(&self, source: &str) -> String {
        source
            .chars()
            .skip(self.span.start)
            .take(self.span.len())
            .collect()
    }

    /// This node and all its descendants, pre-order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

impl Document {
    /// Concatenated text of every top-level node.
    pub fn source_text(&self) -> String {
        self.nodes.iter().map(Node::source_text).collect()
    }

    /// Number of nodes in the whole tree.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(|n| n.descendants().count()).sum()
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element() -> Node {
        let mut node = Node::leaf(NodeKind::Html, "<a>", Span::new(0, 9, 1, 1));
        node.children.push(Node::leaf(NodeKind::Text, "x", Span::new(3, 4, 1, 4)));
        node.children.push(Node::leaf(NodeKind::Html, "<b/>", Span::new(4, 8, 1, 5)));
        node.end = Some("</a>".into());
        node
    }

    #[test]
    fn test_leaf() {
        let node = Node::leaf(NodeKind::Text, "hi", Span::new(0, 2, 1, 1));
        assert!(node.is_leaf());
        assert_eq!(node.source_text(), "hi");
    }

    #[test]
    fn test_source_text_is_pre_order() {
        let node = element();
        assert!(!node.is_leaf());
        assert_eq!(node.source_text(), "<a>x<b/></a>");
    }

    #[test]
    fn test_descendants() {
        let node = element();
        let kinds: Vec<&str> = node.descendants().map(|n| n.begin.as_str()).collect();
        assert_eq!(kinds, vec!["<a>", "x", "<b/>"]);
    }

    #[test]
    fn test_document_counts() {
        let doc = Document {
            nodes: vec![element(), Node::leaf(NodeKind::Razor, "y", Span::new(9, 11, 1, 10))],
        };
        assert_eq!(doc.node_count(), 4);
        assert_eq!(doc.source_text(), "<a>x<b/></a>y");
    }

    #[test]
    fn test_source_slice_uses_char_offsets() {
        let node = Node::leaf(NodeKind::Razor, "x", Span::new(2, 4, 1, 3));
        assert_eq!(node.source_slice("é @x!"), "@x");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(NodeKind::Html.to_string(), "Html");
        assert_eq!(NodeKind::Razor.to_string(), "Razor");
        assert_eq!(NodeKind::Text.to_string(), "Text");
    }
}
