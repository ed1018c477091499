//! Translation of the ANNIS graph query language (AQL) into the canonical
//! query graph.
//!
//! This is the stateful core of the crate: a single depth-first walk over the
//! AQL syntax tree that builds canonical graph fragments per node category
//! and assembles them into a properly nested group/token/span tree. Flat,
//! operator-delimited grammar productions ("`node & node & #1 . #2`") are
//! re-nested here, and `#n`-style references between tree nodes that are not
//! adjacent in the syntax tree are resolved through a per-query
//! [`ReferenceTable`].
//!
//! The expected tree shape mirrors the AQL grammar: a [`Start`] root holds an
//! [`ExprTop`] with one [`AndTopExpr`] per disjunction alternative; every
//! alternative holds [`Expr`] children that contain either a referable
//! [`VariableExpr`] or an operator application ([`NAryLinguisticTerm`],
//! [`UnaryLinguisticTerm`]) over [`RefOrNode`] operands.
//!
//! [`Start`]: AqlCategory::Start
//! [`ExprTop`]: AqlCategory::ExprTop
//! [`AndTopExpr`]: AqlCategory::AndTopExpr
//! [`Expr`]: AqlCategory::Expr
//! [`VariableExpr`]: AqlCategory::VariableExpr
//! [`NAryLinguisticTerm`]: AqlCategory::NAryLinguisticTerm
//! [`UnaryLinguisticTerm`]: AqlCategory::UnaryLinguisticTerm
//! [`RefOrNode`]: AqlCategory::RefOrNode

pub mod operators;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use crate::cst::CstNode;
use crate::errors::{KoralError, Result};
use crate::koral::{Group, GroupOperation, KoralNode, QueryRequest, Span, Term};
use crate::reference::ReferenceTable;

use self::operators::{
    parse_match_operator, parse_qname, parse_text_spec, resolve_operator, OperatorFragment,
    Resolution,
};

/// The closed set of node categories of the AQL grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqlCategory {
    Start,
    ExprTop,
    AndTopExpr,
    Expr,
    NAryLinguisticTerm,
    UnaryLinguisticTerm,
    RefOrNode,
    /// A back reference like `#1` or `#subj`.
    Reference,
    VariableExpr,
    /// An explicit label definition like `subj#`.
    VariableDef,
    /// The bare `node` keyword.
    Node,
    /// The bare `tok` keyword.
    Tok,
    QName,
    Foundry,
    Layer,
    TextSpec,
    Regex,
    Literal,
    MatchOp,
    Dominance,
    Pointing,
    Precedence,
    SpanRelation,
    CommonParent,
    CommonAncestor,
    Identity,
    EqualValue,
    NotEqualValue,
    LeftChildSpec,
    RightChildSpec,
    Star,
    RangeSpec,
    Number,
    EdgeSpec,
    EdgeAnno,
}

/// Annotation layers that describe single tokens rather than spans. A bare
/// qualified name is classified into a token or span search by its layer.
const TOKEN_LAYERS: [&str; 4] = ["pos", "lemma", "morph", "tok"];

/// Translates an AQL syntax tree into a request envelope.
pub fn translate(tree: &CstNode<AqlCategory>) -> Result<QueryRequest> {
    Ok(QueryRequest::new(translate_tree(tree)?))
}

/// Translates an AQL syntax tree into the canonical top-level graph node.
pub fn translate_tree(tree: &CstNode<AqlCategory>) -> Result<KoralNode> {
    let mut walker = TreeWalker::new();
    walker.process_node(tree)?;
    walker.finish()
}

/// Traversal state of one translation call. Created fresh per query and
/// discarded after assembly; nothing is shared across calls.
struct TreeWalker {
    /// Open groups awaiting operands, innermost last.
    stack: Vec<Group>,
    refs: ReferenceTable,
    /// Positional counter, advanced once per referable unit.
    next_ref: u64,
    /// Ids of units that only appear as operands of a later operator and
    /// must not be emitted a second time at their lexical position.
    operand_only: HashSet<String>,
    /// Guards against processing a node from two traversal paths: operand
    /// subtrees are consumed eagerly by their operator and are skipped when
    /// the linear walk reaches them as ordinary children.
    visited: HashSet<*const CstNode<AqlCategory>>,
    result: Option<KoralNode>,
}

impl TreeWalker {
    fn new() -> TreeWalker {
        TreeWalker {
            stack: Vec::new(),
            refs: ReferenceTable::new(),
            next_ref: 1,
            operand_only: HashSet::new(),
            visited: HashSet::new(),
            result: None,
        }
    }

    fn process_node(&mut self, node: &CstNode<AqlCategory>) -> Result<()> {
        if !self.visited.insert(node as *const _) {
            return Ok(());
        }
        trace!("processing {:?}", node.category());

        // Groups opened at this node; popped again after the children.
        let mut pushed = 0;
        match node.category() {
            AqlCategory::ExprTop => {
                // One and-expression per alternative of the disjunctive
                // normal form.
                if node.children_with_category(AqlCategory::AndTopExpr).count() > 1 {
                    self.stack.push(Group::new(GroupOperation::Or));
                    pushed += 1;
                }
            }
            AqlCategory::AndTopExpr => {
                self.collect_operand_refs(node);
                if node.children_with_category(AqlCategory::Expr).count() > 1 {
                    self.stack.push(Group::new(GroupOperation::And));
                    pushed += 1;
                }
            }
            AqlCategory::NAryLinguisticTerm | AqlCategory::UnaryLinguisticTerm => {
                let group = self.build_operator_group(node)?;
                self.stack.push(group);
                pushed += 1;
            }
            AqlCategory::VariableExpr => {
                let (object, attachable) = self.build_variable_expr(node)?;
                if attachable {
                    self.attach(object);
                }
            }
            _ => {}
        }

        for child in node.children() {
            self.process_node(child)?;
        }

        for _ in 0..pushed {
            if let Some(group) = self.stack.pop() {
                self.attach_group(group);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<KoralNode> {
        debug_assert!(self.stack.is_empty());
        self.result.take().ok_or(KoralError::EmptyQuery)
    }

    /// Pre-scans an and-expression for operator subtrees that consume
    /// references. The referenced units appear at the top level of the
    /// syntax tree but belong to the canonical graph only as operands of the
    /// operator group, so their ids are excluded from direct emission.
    fn collect_operand_refs(&mut self, node: &CstNode<AqlCategory>) {
        for expr in node.children_with_category(AqlCategory::Expr) {
            let terms = expr
                .children_with_category(AqlCategory::UnaryLinguisticTerm)
                .chain(expr.children_with_category(AqlCategory::NAryLinguisticTerm));
            for term in terms {
                for operand in term.children_with_category(AqlCategory::RefOrNode) {
                    if let Some(reference) = operand.first_child_with_category(AqlCategory::Reference)
                    {
                        let id = reference.text().trim_start_matches('#');
                        self.operand_only.insert(id.to_string());
                    }
                }
            }
        }
    }

    /// Builds the group for an operator application, with its relation and
    /// distance detail from the operator resolver and its operands resolved
    /// in source order.
    fn build_operator_group(&mut self, node: &CstNode<AqlCategory>) -> Result<Group> {
        let operator = node
            .children()
            .iter()
            .find(|c| operators::operator_family(c.category()).is_some());

        let fragment = match operator {
            Some(operator) => match resolve_operator(operator)? {
                Resolution::Fragment(fragment) => fragment,
                Resolution::Unsupported(family) => {
                    // Not yet translated; the group is left without relation
                    // or distance detail.
                    debug!("operator family {:?} is not translated yet", family);
                    OperatorFragment::default()
                }
            },
            None => {
                warn!("linguistic term without operator child");
                OperatorFragment::default()
            }
        };

        let mut group = Group::new(fragment.operation);
        group.relation = fragment.relation;
        group.distances = fragment.distances;
        group.in_order = fragment.in_order;
        for operand in node.children_with_category(AqlCategory::RefOrNode) {
            group.operands.push(self.resolve_operand(operand)?);
        }
        Ok(group)
    }

    /// Resolves one `refOrNode` operand: either a back reference looked up
    /// in the reference table, or an inline variable expression that is
    /// built eagerly so the linear walk does not emit it a second time.
    fn resolve_operand(&mut self, node: &CstNode<AqlCategory>) -> Result<KoralNode> {
        let child = node
            .children()
            .first()
            .ok_or_else(|| KoralError::UnresolvedReference(node.text().to_string()))?;
        match child.category() {
            AqlCategory::Reference => {
                let id = child.text().trim_start_matches('#');
                self.refs.resolve(id)
            }
            AqlCategory::VariableExpr => {
                let (object, _) = self.build_variable_expr(child)?;
                Ok(object)
            }
            category => Err(KoralError::ParseFailure(format!(
                "unexpected {:?} as relation operand",
                category
            ))),
        }
    }

    /// Builds the token or span for a variable expression, registers it in
    /// the reference table and advances the positional counter. Returns the
    /// object and whether it should be emitted at its lexical position.
    fn build_variable_expr(
        &mut self,
        node: &CstNode<AqlCategory>,
    ) -> Result<(KoralNode, bool)> {
        // Operand subtrees are reached a second time by the linear walk.
        self.visited.insert(node as *const _);

        let children = node.children();
        let (label, parts) = match children.first() {
            Some(def) if def.category() == AqlCategory::VariableDef => (
                Some(def.text().trim_end_matches('#').to_string()),
                &children[1..],
            ),
            _ => (None, children),
        };
        let first = parts.first().ok_or_else(|| {
            KoralError::ParseFailure("variable expression without content".to_string())
        })?;

        let mut object = match first.category() {
            AqlCategory::Node => KoralNode::Span(Span::default()),
            AqlCategory::Tok => KoralNode::token(Term::default()),
            AqlCategory::QName => {
                let (foundry, layer) = parse_qname(first);
                // A bare qualified name may describe a token or a span,
                // depending on the indicated layer (e.g. mate/pos=NN vs.
                // cnx/cat=NP).
                let is_token = layer
                    .as_deref()
                    .map(|l| TOKEN_LAYERS.contains(&l))
                    .unwrap_or(false);
                if is_token {
                    KoralNode::token(Term {
                        foundry,
                        layer,
                        ..Term::default()
                    })
                } else {
                    KoralNode::Span(Span {
                        foundry,
                        layer,
                        ..Span::default()
                    })
                }
            }
            AqlCategory::TextSpec => {
                let (key, term_type) = parse_text_spec(first);
                KoralNode::token(Term {
                    key: Some(key),
                    term_type,
                    match_op: Some(crate::koral::MatchOperator::Eq),
                    ..Term::default()
                })
            }
            category => {
                return Err(KoralError::ParseFailure(format!(
                    "unexpected {:?} in variable expression",
                    category
                )))
            }
        };

        // Three-part form: `name OP value`.
        if let [_, op, value] = parts {
            if op.category() == AqlCategory::MatchOp && value.category() == AqlCategory::TextSpec {
                let (key, term_type) = parse_text_spec(value);
                let match_op = parse_match_operator(op);
                match &mut object {
                    KoralNode::Token { wrap: Some(term) } => {
                        term.key = Some(key);
                        term.term_type = term_type;
                        term.match_op = Some(match_op);
                    }
                    KoralNode::Span(span) => {
                        span.key = Some(key);
                        span.term_type = term_type;
                        span.match_op = Some(match_op);
                    }
                    _ => {}
                }
            }
        }

        let positional = self.next_ref.to_string();
        let attachable = !self.operand_only.contains(&positional)
            && label
                .as_deref()
                .map(|l| !self.operand_only.contains(l))
                .unwrap_or(true);
        self.refs.define(positional, object.clone())?;
        if let Some(label) = label {
            self.refs.define(label, object.clone())?;
        }
        self.next_ref += 1;

        Ok((object, attachable))
    }

    /// Attaches a finished group to its enclosing object. Structural and/or
    /// groups that collected a single operand are unwrapped: this happens
    /// when all other conjuncts were consumed as operands of a relation.
    fn attach_group(&mut self, mut group: Group) {
        let object = match group.operation {
            GroupOperation::And | GroupOperation::Or if group.operands.len() == 1 => {
                group.operands.remove(0)
            }
            GroupOperation::And | GroupOperation::Or if group.operands.is_empty() => return,
            _ => KoralNode::Group(group),
        };
        self.attach(object);
    }

    /// Inserts a finished object into the innermost open group, or makes it
    /// the top-level result when no group is open.
    fn attach(&mut self, object: KoralNode) {
        if let Some(top) = self.stack.last_mut() {
            top.operands.push(object);
        } else {
            if self.result.is_some() {
                debug!("replacing previous top-level result");
            }
            self.result = Some(object);
        }
    }
}
