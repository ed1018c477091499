//! Translation of SRU/CQL retrieval queries into the canonical query graph.
//!
//! CQL is by far the smallest front end: the external parser hands over a
//! binary tree of boolean operations with search clauses at the leaves. What
//! makes this front end special is its error reporting contract. Semantic
//! limitations (an unsupported index, relation, boolean modifier or
//! combination thereof) are reported as numeric SRU diagnostic codes that the
//! calling protocol surfaces verbatim, see [`SruDiagnostic`].

use std::collections::HashSet;

use crate::cst::CstNode;
use crate::errors::{Result, SruDiagnostic};
use crate::koral::{Distance, Group, GroupOperation, KoralNode, QueryRequest, Term};

/// SRU diagnostic codes used by this front end.
pub const DIAG_QUERY_SYNTAX_ERROR: u16 = 10;
pub const DIAG_UNSUPPORTED_INDEX: u16 = 16;
pub const DIAG_UNSUPPORTED_RELATION: u16 = 19;
pub const DIAG_UNSUPPORTED_RELATION_MODIFIER: u16 = 20;
pub const DIAG_UNSUPPORTED_COMBINATION: u16 = 24;
pub const DIAG_EMPTY_TERM: u16 = 27;
pub const DIAG_UNSUPPORTED_BOOLEAN_OPERATOR: u16 = 48;

lazy_static! {
    static ref SUPPORTED_INDEXES: HashSet<&'static str> =
        ["cql.serverChoice", "cql.words"].into_iter().collect();
    static ref SUPPORTED_RELATIONS: HashSet<&'static str> =
        ["=", "==", "scr"].into_iter().collect();
}

/// The closed set of node categories of the CQL grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CqlCategory {
    /// `a and b`; both operands must match within the same sentence.
    And,
    /// `a or b`.
    Or,
    /// `a prox b`; recognized but not translated.
    Prox,
    /// `a not b`; recognized but not translated.
    Not,
    /// A boolean or relation modifier like `/rel.combine=sum`.
    Modifier,
    SearchClause,
    Index,
    Relation,
    Term,
}

/// Translates a CQL syntax tree into a request envelope.
pub fn translate(tree: &CstNode<CqlCategory>) -> Result<QueryRequest> {
    Ok(QueryRequest::new(translate_tree(tree)?))
}

/// Translates a CQL syntax tree into the canonical top-level graph node.
pub fn translate_tree(tree: &CstNode<CqlCategory>) -> Result<KoralNode> {
    match tree.category() {
        CqlCategory::And => {
            // Both conjuncts are required in one sentence, in any order.
            let mut group = Group::new(GroupOperation::Sequence);
            group.in_order = Some(false);
            group.distances.push(Distance::new("s", 0, 0));
            group.operands = boolean_operands(tree)?;
            Ok(KoralNode::Group(group))
        }
        CqlCategory::Or => {
            let mut group = Group::new(GroupOperation::Or);
            group.operands = boolean_operands(tree)?;
            Ok(KoralNode::Group(group))
        }
        CqlCategory::Prox => {
            Err(diagnostic(DIAG_UNSUPPORTED_BOOLEAN_OPERATOR, "Unsupported boolean operator: prox").into())
        }
        CqlCategory::Not => {
            Err(diagnostic(DIAG_UNSUPPORTED_BOOLEAN_OPERATOR, "Unsupported boolean operator: not").into())
        }
        CqlCategory::SearchClause => translate_search_clause(tree),
        category => Err(diagnostic(
            DIAG_QUERY_SYNTAX_ERROR,
            format!("Unexpected query node: {:?}", category),
        )
        .into()),
    }
}

/// Collects and translates the operands of a boolean node, rejecting any
/// attached combination modifier first.
fn boolean_operands(node: &CstNode<CqlCategory>) -> Result<Vec<KoralNode>> {
    if let Some(modifier) = node.first_child_with_category(CqlCategory::Modifier) {
        return Err(diagnostic(
            DIAG_UNSUPPORTED_RELATION_MODIFIER,
            format!("Unsupported boolean modifier: {}", modifier.text()),
        )
        .into());
    }
    node.children()
        .iter()
        .filter(|c| c.category() != CqlCategory::Modifier)
        .map(translate_tree)
        .collect()
}

fn translate_search_clause(node: &CstNode<CqlCategory>) -> Result<KoralNode> {
    let index = node
        .first_child_with_category(CqlCategory::Index)
        .map(|n| n.text())
        .unwrap_or("cql.serverChoice");
    let relation = node.first_child_with_category(CqlCategory::Relation);
    let relation_text = relation.map(|n| n.text()).unwrap_or("=");

    if let Some(modifier) =
        relation.and_then(|r| r.first_child_with_category(CqlCategory::Modifier))
    {
        return Err(diagnostic(
            DIAG_UNSUPPORTED_RELATION_MODIFIER,
            format!("Unsupported relation modifier: {}", modifier.text()),
        )
        .into());
    }
    if !SUPPORTED_INDEXES.contains(index) {
        return Err(diagnostic(
            DIAG_UNSUPPORTED_INDEX,
            format!("Unsupported index: {}", index),
        )
        .into());
    }
    if !SUPPORTED_RELATIONS.contains(relation_text) {
        return Err(diagnostic(
            DIAG_UNSUPPORTED_RELATION,
            format!("Unsupported relation: {}", relation_text),
        )
        .into());
    }
    // `scr` addresses a full record and cannot qualify a word-level index.
    if index == "cql.words" && relation_text == "scr" {
        return Err(diagnostic(
            DIAG_UNSUPPORTED_COMBINATION,
            format!("Unsupported combination of index {} and relation {}", index, relation_text),
        )
        .into());
    }

    let term = node
        .first_child_with_category(CqlCategory::Term)
        .map(|n| n.text())
        .unwrap_or("");
    let words: Vec<&str> = term.split_whitespace().collect();
    match words.as_slice() {
        [] => Err(diagnostic(DIAG_EMPTY_TERM, "An empty term is unsupported").into()),
        [word] => Ok(word_token(word)),
        words => {
            // A quoted phrase becomes a strict sequence of word tokens.
            let mut group = Group::new(GroupOperation::Sequence);
            group.operands = words.iter().map(|w| word_token(w)).collect();
            Ok(KoralNode::Group(group))
        }
    }
}

fn word_token(word: &str) -> KoralNode {
    KoralNode::token(Term::with_key(word, "orth"))
}

fn diagnostic(code: u16, message: impl Into<String>) -> SruDiagnostic {
    SruDiagnostic::new(code, message)
}
