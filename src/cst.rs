//! A thin, read-only view over a concrete syntax tree.
//!
//! Each source query language has its own grammar and its own parser front
//! end, but every translator in this crate only needs a handful of purely
//! structural queries over the resulting tree: the category of a node, its
//! children filtered by category, and the covered text. A front end builds a
//! [`CstNode`] tree with its language-specific [`Category`] type and hands it
//! to the matching translator.

use std::fmt::Debug;

/// Marker for the closed set of node categories of one grammar.
///
/// Categories are modelled as fieldless enums per grammar so that unhandled
/// categories are caught by exhaustive matching instead of silently ignored.
pub trait Category: Copy + Eq + Debug {}

impl<T: Copy + Eq + Debug> Category for T {}

/// One node of a concrete syntax tree.
///
/// Leaf nodes carry the matched surface text, inner nodes may carry the text
/// they cover (front ends set it where a translator needs it, e.g. for
/// qualified relation names).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstNode<C> {
    category: C,
    text: String,
    children: Vec<CstNode<C>>,
}

impl<C: Category> CstNode<C> {
    /// Creates a leaf node covering the given surface text.
    pub fn leaf(category: C, text: impl Into<String>) -> CstNode<C> {
        CstNode {
            category,
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// Creates an inner node with the given children.
    pub fn node(category: C, children: Vec<CstNode<C>>) -> CstNode<C> {
        CstNode {
            category,
            text: String::new(),
            children,
        }
    }

    /// Sets the covered surface text of an inner node.
    pub fn with_text(mut self, text: impl Into<String>) -> CstNode<C> {
        self.text = text.into();
        self
    }

    pub fn category(&self) -> C {
        self.category
    }

    /// The surface text covered by this node. Empty for inner nodes unless
    /// the front end recorded it.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[CstNode<C>] {
        &self.children
    }

    /// All direct children with the given category, in source order.
    pub fn children_with_category(&self, category: C) -> impl Iterator<Item = &CstNode<C>> {
        self.children
            .iter()
            .filter(move |c| c.category == category)
    }

    pub fn first_child_with_category(&self, category: C) -> Option<&CstNode<C>> {
        self.children_with_category(category).next()
    }

    pub fn has_child_category(&self, category: C) -> bool {
        self.first_child_with_category(category).is_some()
    }
}
