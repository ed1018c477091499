//! Translation of the simplified sequence language.
//!
//! The smallest front end of all: a query is a flat run of word segments,
//! optionally with alternations. It exists mainly as the reference point for
//! operand ordering, the canonical sequence group must list its tokens in
//! exactly the order they were written.

use crate::cst::CstNode;
use crate::errors::{KoralError, Result};
use crate::koral::{Group, GroupOperation, KoralNode, QueryRequest, Term};

/// The closed set of node categories of the simplified grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleCategory {
    Query,
    /// A single word.
    Segment,
    /// A `a|b|c` alternation of segments.
    Alternation,
}

/// Translates a simplified-language syntax tree into a request envelope.
pub fn translate(tree: &CstNode<SimpleCategory>) -> Result<QueryRequest> {
    Ok(QueryRequest::new(translate_tree(tree)?))
}

/// Translates a simplified-language syntax tree into the canonical top-level
/// graph node.
pub fn translate_tree(tree: &CstNode<SimpleCategory>) -> Result<KoralNode> {
    match tree.category() {
        SimpleCategory::Query => {
            let mut operands: Vec<KoralNode> = tree
                .children()
                .iter()
                .map(translate_tree)
                .collect::<Result<_>>()?;
            match operands.len() {
                0 => Err(KoralError::EmptyQuery),
                1 => Ok(operands.remove(0)),
                _ => {
                    let mut group = Group::new(GroupOperation::Sequence);
                    group.operands = operands;
                    Ok(KoralNode::Group(group))
                }
            }
        }
        SimpleCategory::Segment => Ok(KoralNode::token(Term::with_key(tree.text(), "orth"))),
        SimpleCategory::Alternation => {
            let mut group = Group::new(GroupOperation::Or);
            group.operands = tree
                .children()
                .iter()
                .map(translate_tree)
                .collect::<Result<_>>()?;
            Ok(KoralNode::Group(group))
        }
    }
}
