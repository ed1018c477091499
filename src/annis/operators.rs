//! Resolution of AQL operator subtrees into canonical graph fragments.
//!
//! One pure function per operator family. Each takes the operator's CST
//! subtree and returns the partially built group/relation/distance fragment
//! that the tree walker assembles with the operands.

use crate::cst::CstNode;
use crate::errors::Result;
use crate::koral::{
    Distance, GroupOperation, MatchOperator, OperandIndex, Relation, Term, TermType,
    MAXIMUM_DISTANCE,
};

use super::AqlCategory;

/// The recognized operator families of the AQL grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFamily {
    Dominance,
    Pointing,
    Precedence,
    SpanRelation,
    CommonParent,
    CommonAncestor,
    Identity,
    EqualValue,
    NotEqualValue,
}

/// A partially built group produced by resolving one operator subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorFragment {
    pub operation: GroupOperation,
    pub relation: Option<Relation>,
    pub distances: Vec<Distance>,
    pub in_order: Option<bool>,
}

impl Default for OperatorFragment {
    /// The historical fallback: a relation group without further detail.
    fn default() -> OperatorFragment {
        OperatorFragment {
            operation: GroupOperation::Relation,
            relation: None,
            distances: Vec::new(),
            in_order: None,
        }
    }
}

/// Outcome of resolving one operator subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Fragment(OperatorFragment),
    /// A recognized operator family that carries no translation yet. Callers
    /// must treat this as "feature not yet translated", not as a crash.
    Unsupported(OperatorFamily),
}

pub fn operator_family(category: AqlCategory) -> Option<OperatorFamily> {
    match category {
        AqlCategory::Dominance => Some(OperatorFamily::Dominance),
        AqlCategory::Pointing => Some(OperatorFamily::Pointing),
        AqlCategory::Precedence => Some(OperatorFamily::Precedence),
        AqlCategory::SpanRelation => Some(OperatorFamily::SpanRelation),
        AqlCategory::CommonParent => Some(OperatorFamily::CommonParent),
        AqlCategory::CommonAncestor => Some(OperatorFamily::CommonAncestor),
        AqlCategory::Identity => Some(OperatorFamily::Identity),
        AqlCategory::EqualValue => Some(OperatorFamily::EqualValue),
        AqlCategory::NotEqualValue => Some(OperatorFamily::NotEqualValue),
        _ => None,
    }
}

/// Resolves an operator subtree to a graph fragment.
pub fn resolve_operator(node: &CstNode<AqlCategory>) -> Result<Resolution> {
    let family = match operator_family(node.category()) {
        Some(family) => family,
        None => return Ok(Resolution::Fragment(OperatorFragment::default())),
    };
    let resolution = match family {
        OperatorFamily::Dominance => Resolution::Fragment(resolve_dominance(node)?),
        OperatorFamily::Pointing => Resolution::Fragment(resolve_pointing(node)?),
        OperatorFamily::Precedence => Resolution::Fragment(resolve_precedence(node)?),
        // Recognized, but not carrying any translation behavior yet.
        family => Resolution::Unsupported(family),
    };
    Ok(resolution)
}

/// Tree parent/child edge, e.g. `>`, `>@l`, `>cnx/cat`, `>[func="SB"]`, `>*`.
fn resolve_dominance(node: &CstNode<AqlCategory>) -> Result<OperatorFragment> {
    let mut relation = Relation::tree("dominance");
    if node.has_child_category(AqlCategory::LeftChildSpec) {
        relation.index = Some(OperandIndex::First);
    }
    if node.has_child_category(AqlCategory::RightChildSpec) {
        relation.index = Some(OperandIndex::Last);
    }
    if let Some(qname) = node.first_child_with_category(AqlCategory::QName) {
        let (foundry, layer) = parse_qname(qname);
        relation.foundry = foundry;
        relation.layer = layer;
    }
    if let Some(edge_spec) = node.first_child_with_category(AqlCategory::EdgeSpec) {
        relation.wrap = parse_edge_spec(edge_spec);
    }
    relation.distance = range_distance(node)?;

    Ok(OperatorFragment {
        operation: GroupOperation::Relation,
        relation: Some(relation),
        distances: Vec::new(),
        in_order: None,
    })
}

/// Labeled directed edge, e.g. `->deps`, `->mate/dep[func="SB"]`. Unlike a
/// dominance edge, the relation type is the verbatim qualified name.
fn resolve_pointing(node: &CstNode<AqlCategory>) -> Result<OperatorFragment> {
    let mut relation = Relation::pointing();
    if let Some(qname) = node.first_child_with_category(AqlCategory::QName) {
        relation.relation_type = Some(qname_text(qname));
    }
    if let Some(edge_spec) = node.first_child_with_category(AqlCategory::EdgeSpec) {
        relation.wrap = parse_edge_spec(edge_spec);
    }
    relation.distance = range_distance(node)?;

    Ok(OperatorFragment {
        operation: GroupOperation::Relation,
        relation: Some(relation),
        distances: Vec::new(),
        in_order: None,
    })
}

/// Linear order constraint, e.g. `.`, `.2,6`, `.*`.
fn resolve_precedence(node: &CstNode<AqlCategory>) -> Result<OperatorFragment> {
    let mut distances = Vec::new();
    if node.has_child_category(AqlCategory::Star) {
        distances.push(Distance::words(0, MAXIMUM_DISTANCE));
    }
    if let Some(range) = node.first_child_with_category(AqlCategory::RangeSpec) {
        distances.push(distance_from_range_spec("w", range)?);
    }

    Ok(OperatorFragment {
        operation: GroupOperation::Sequence,
        relation: None,
        distances,
        in_order: Some(true),
    })
}

/// The optional range distance of an edge operator: a bare `*` yields the
/// unbounded sentinel range, an explicit range spec its own bounds.
fn range_distance(node: &CstNode<AqlCategory>) -> Result<Option<Distance>> {
    if node.has_child_category(AqlCategory::Star) {
        return Ok(Some(Distance::range(0, MAXIMUM_DISTANCE)));
    }
    if let Some(range) = node.first_child_with_category(AqlCategory::RangeSpec) {
        return Ok(Some(distance_from_range_spec("r", range)?));
    }
    Ok(None)
}

/// Parses `min` and optional `max` from a range spec like `2,6`. A missing
/// maximum falls back to the sentinel unbounded value.
pub(crate) fn distance_from_range_spec(
    key: &str,
    range: &CstNode<AqlCategory>,
) -> Result<Distance> {
    let mut numbers = range.children_with_category(AqlCategory::Number);
    let min = match numbers.next() {
        Some(n) => n.text().parse::<u64>()?,
        None => 0,
    };
    let max = match numbers.next() {
        Some(n) => n.text().parse::<u64>()?,
        None => MAXIMUM_DISTANCE,
    };
    Ok(Distance::new(key, min, max))
}

/// Parses a qualified name production into its optional foundry and layer.
pub(crate) fn parse_qname(node: &CstNode<AqlCategory>) -> (Option<String>, Option<String>) {
    let foundry = node
        .first_child_with_category(AqlCategory::Foundry)
        .map(|n| n.text().to_string());
    let layer = node
        .first_child_with_category(AqlCategory::Layer)
        .map(|n| n.text().to_string());
    (foundry, layer)
}

/// The verbatim text of a qualified name, reconstructed from its parts when
/// the front end did not record the covered text.
pub(crate) fn qname_text(node: &CstNode<AqlCategory>) -> String {
    if !node.text().is_empty() {
        return node.text().to_string();
    }
    match parse_qname(node) {
        (Some(foundry), Some(layer)) => format!("{}/{}", foundry, layer),
        (_, Some(layer)) => layer,
        _ => String::new(),
    }
}

/// Collects the edge annotation terms of an edge spec like `[func="SB"]`.
fn parse_edge_spec(node: &CstNode<AqlCategory>) -> Vec<Term> {
    node.children_with_category(AqlCategory::EdgeAnno)
        .map(parse_edge_anno)
        .collect()
}

fn parse_edge_anno(node: &CstNode<AqlCategory>) -> Term {
    let mut term = Term::default();
    term.layer = node
        .first_child_with_category(AqlCategory::Layer)
        .map(|n| n.text().to_string());
    if let Some(spec) = node.first_child_with_category(AqlCategory::TextSpec) {
        let (key, term_type) = parse_text_spec(spec);
        term.key = Some(key);
        term.term_type = term_type;
    }
    term.match_op = node
        .first_child_with_category(AqlCategory::MatchOp)
        .map(parse_match_operator);
    term
}

/// A text spec delimited by `/…/` is a regular expression key with the
/// delimiters stripped; anything else is a verbatim literal key.
pub(crate) fn parse_text_spec(node: &CstNode<AqlCategory>) -> (String, TermType) {
    if let Some(regex) = node.first_child_with_category(AqlCategory::Regex) {
        let key = regex
            .text()
            .strip_prefix('/')
            .and_then(|t| t.strip_suffix('/'))
            .unwrap_or_else(|| regex.text());
        return (key.to_string(), TermType::Regex);
    }
    let key = node
        .first_child_with_category(AqlCategory::Literal)
        .map(|n| n.text())
        .unwrap_or_else(|| node.text());
    (key.to_string(), TermType::Literal)
}

/// Surface `=` is an equality match, anything else (`!=`) a negated one.
pub(crate) fn parse_match_operator(node: &CstNode<AqlCategory>) -> MatchOperator {
    if node.text() == "=" {
        MatchOperator::Eq
    } else {
        MatchOperator::Ne
    }
}
