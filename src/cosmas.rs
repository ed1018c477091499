//! Translation of COSMAS II proximity queries into the canonical query graph.
//!
//! COSMAS is operator-centric: every binary operator (`oder`, `und`,
//! `/+w1:4`, `#IN`, `#OV`, `nicht`) sits between its two operands in the
//! syntax tree, so translation is a plain recursive descent without any
//! reference bookkeeping. Only the proximity operator carries structure of
//! its own, a measure with a minimum and maximum distance.

use crate::cst::CstNode;
use crate::errors::{KoralError, Result};
use crate::koral::{Distance, Group, GroupOperation, KoralNode, QueryRequest, Relation, Span, Term};

/// The closed set of node categories of the COSMAS II grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CosmasCategory {
    Query,
    /// A plain search word, matched on the surface form.
    Word,
    /// A `&word` search, matched on the base form.
    BaseWord,
    /// A structural element like `<s>`.
    Element,
    /// `oder`.
    OpOr,
    /// `und`.
    OpAnd,
    /// A proximity operator like `/+w1:4`.
    OpProx,
    ProxSpec,
    /// The `+`/`-` direction marker of a proximity spec.
    Direction,
    /// The measure letter of a proximity spec (`w`, `s`, `p`).
    Measure,
    Number,
    /// `#IN`, inclusion in a structural element.
    OpIn,
    /// `#OV`, overlap with a structural element.
    OpOv,
    /// `nicht`, exclusion.
    OpNot,
    /// The optional position argument of `#IN`, e.g. `L`.
    Position,
}

/// Translates a COSMAS II syntax tree into a request envelope.
pub fn translate(tree: &CstNode<CosmasCategory>) -> Result<QueryRequest> {
    Ok(QueryRequest::new(translate_tree(tree)?))
}

/// Translates a COSMAS II syntax tree into the canonical top-level graph node.
pub fn translate_tree(tree: &CstNode<CosmasCategory>) -> Result<KoralNode> {
    match tree.category() {
        CosmasCategory::Query => {
            let mut operands = operands(tree)?;
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
        CosmasCategory::Word => Ok(KoralNode::token(Term::with_key(tree.text(), "orth"))),
        CosmasCategory::BaseWord => Ok(KoralNode::token(Term::with_key(
            tree.text().trim_start_matches('&'),
            "base",
        ))),
        CosmasCategory::Element => Ok(KoralNode::Span(Span {
            key: Some(tree.text().to_string()),
            ..Span::default()
        })),
        CosmasCategory::OpOr => boolean_group(tree, GroupOperation::Or),
        CosmasCategory::OpAnd => boolean_group(tree, GroupOperation::And),
        CosmasCategory::OpProx => proximity_group(tree),
        CosmasCategory::OpIn => relation_group(tree, "include"),
        CosmasCategory::OpOv => relation_group(tree, "overlap"),
        CosmasCategory::OpNot => relation_group(tree, "not"),
        category => Err(KoralError::ParseFailure(format!(
            "unexpected {:?} as query node",
            category
        ))),
    }
}

fn operands(node: &CstNode<CosmasCategory>) -> Result<Vec<KoralNode>> {
    node.children()
        .iter()
        .filter(|c| !is_operator_detail(c.category()))
        .map(translate_tree)
        .collect()
}

fn is_operator_detail(category: CosmasCategory) -> bool {
    matches!(
        category,
        CosmasCategory::ProxSpec | CosmasCategory::Position
    )
}

fn boolean_group(node: &CstNode<CosmasCategory>, operation: GroupOperation) -> Result<KoralNode> {
    let mut group = Group::new(operation);
    group.operands = operands(node)?;
    Ok(KoralNode::Group(group))
}

/// `a /+w1:4 b`: a sequence constrained by a distance along one measure. The
/// direction marker decides whether operand order is significant.
fn proximity_group(node: &CstNode<CosmasCategory>) -> Result<KoralNode> {
    let mut group = Group::new(GroupOperation::Sequence);
    if let Some(spec) = node.first_child_with_category(CosmasCategory::ProxSpec) {
        group.in_order = Some(spec.has_child_category(CosmasCategory::Direction));
        group.distances.push(proximity_distance(spec)?);
    }
    group.operands = operands(node)?;
    Ok(KoralNode::Group(group))
}

fn proximity_distance(spec: &CstNode<CosmasCategory>) -> Result<Distance> {
    let measure = spec
        .first_child_with_category(CosmasCategory::Measure)
        .map(|n| n.text())
        .unwrap_or("w");
    let mut numbers = spec.children_with_category(CosmasCategory::Number);
    let min = match numbers.next() {
        Some(n) => n.text().parse::<u64>()?,
        None => 1,
    };
    // A single bound means an exact distance.
    let max = match numbers.next() {
        Some(n) => n.text().parse::<u64>()?,
        None => min,
    };
    Ok(Distance::new(measure, min, max))
}

/// `#IN`, `#OV` and `nicht` become relation groups with a fixed relation
/// type. The optional position argument has no canonical counterpart and is
/// dropped.
fn relation_group(node: &CstNode<CosmasCategory>, relation_type: &str) -> Result<KoralNode> {
    if let Some(position) = node.first_child_with_category(CosmasCategory::Position) {
        debug!("dropping position argument {}", position.text());
    }
    let mut relation = Relation::pointing();
    relation.relation_type = Some(relation_type.to_string());
    let mut group = Group::new(GroupOperation::Relation);
    group.relation = Some(relation);
    group.operands = operands(node)?;
    Ok(KoralNode::Group(group))
}
