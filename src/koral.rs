//! The canonical query graph model shared by all front ends.
//!
//! Whatever language a query was written in, the translator output is built
//! from the node types in this module: [`Token`](KoralNode::Token) and
//! [`Span`] for single match units, [`Term`] for leaf predicates, [`Group`]
//! for n-ary combinators and [`Relation`]/[`Distance`] for edge and distance
//! constraints. The serde mapping to JSON-LD is part of the contract with the
//! downstream search engine: field names, tag values and field order must not
//! change.

use serde::ser::{Serialize, Serializer};

/// Fixed context identifier of the request envelope.
pub const KORAL_CONTEXT: &str = "http://ids-mannheim.de/ns/KorAP/json-ld/v0.1/context.jsonld";

/// Sentinel upper bound standing in for "no explicit maximum" in distance
/// encoding, e.g. for an unbounded `*` quantifier.
pub const MAXIMUM_DISTANCE: u64 = 100;

/// Match polarity of a term predicate.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOperator {
    #[serde(rename = "match:eq")]
    Eq,
    #[serde(rename = "match:ne")]
    Ne,
}

/// Interpretation of a term key. Literal keys are the engine default and are
/// left out of the serialized form.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermType {
    #[default]
    #[serde(rename = "type:literal")]
    Literal,
    #[serde(rename = "type:regex")]
    Regex,
}

impl TermType {
    fn is_literal(&self) -> bool {
        matches!(self, TermType::Literal)
    }
}

/// A leaf predicate: an annotation key, optionally qualified by foundry and
/// layer, compared against a literal or regular expression.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(tag = "@type", rename = "koral:term")]
pub struct Term {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foundry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "TermType::is_literal")]
    pub term_type: TermType,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_op: Option<MatchOperator>,
}

impl Term {
    /// A fully specified term as produced for single-word searches.
    pub fn with_key(key: impl Into<String>, layer: impl Into<String>) -> Term {
        Term {
            key: Some(key.into()),
            layer: Some(layer.into()),
            match_op: Some(MatchOperator::Eq),
            ..Term::default()
        }
    }
}

/// A named structural region, e.g. a sentence boundary marker.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foundry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "TermType::is_literal")]
    pub term_type: TermType,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_op: Option<MatchOperator>,
}

/// A distance constraint between two operands along one dimension.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "@type", rename = "koral:distance")]
pub struct Distance {
    pub key: String,
    pub min: u64,
    pub max: u64,
}

impl Distance {
    pub fn new(key: impl Into<String>, min: u64, max: u64) -> Distance {
        Distance {
            key: key.into(),
            min,
            max,
        }
    }

    /// Word distance, used by precedence operators.
    pub fn words(min: u64, max: u64) -> Distance {
        Distance::new("w", min, max)
    }

    /// Range distance, used by dominance and pointing operators.
    pub fn range(min: u64, max: u64) -> Distance {
        Distance::new("r", min, max)
    }
}

/// An inclusive min/max pair without a distance dimension.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "@type", rename = "koral:boundary")]
pub struct Boundary {
    pub min: u64,
    pub max: u64,
}

impl Boundary {
    pub fn new(min: u64, max: u64) -> Boundary {
        Boundary { min, max }
    }
}

/// Combinator kind of a [`Group`].
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOperation {
    #[serde(rename = "operation:and")]
    And,
    #[serde(rename = "operation:or")]
    Or,
    #[serde(rename = "operation:sequence")]
    Sequence,
    #[serde(rename = "operation:relation")]
    Relation,
    #[serde(rename = "operation:treeRelation")]
    TreeRelation,
}

/// Whether a relation edge predicate is tree-shaped.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    #[serde(rename = "koral:relation")]
    Relation,
    #[serde(rename = "koral:treeRelation")]
    TreeRelation,
}

/// Marks which operand of the enclosing group is positionally fixed by a
/// left/right child specifier. Serialized as `0` (first) or `-1` (last).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandIndex {
    First,
    Last,
}

impl Serialize for OperandIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OperandIndex::First => serializer.serialize_i64(0),
            OperandIndex::Last => serializer.serialize_i64(-1),
        }
    }
}

/// An edge predicate between two operands of a [`Group`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    #[serde(rename = "@type")]
    pub kind: RelationKind,
    #[serde(rename = "reltype", skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<OperandIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foundry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Edge annotation terms.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wrap: Vec<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<Distance>,
}

impl Relation {
    /// A tree-shaped edge predicate with a fixed relation type.
    pub fn tree(relation_type: impl Into<String>) -> Relation {
        Relation {
            kind: RelationKind::TreeRelation,
            relation_type: Some(relation_type.into()),
            index: None,
            foundry: None,
            layer: None,
            wrap: Vec::new(),
            distance: None,
        }
    }

    /// A labeled directed edge predicate; the relation type is filled in from
    /// the qualified name of the operator.
    pub fn pointing() -> Relation {
        Relation {
            kind: RelationKind::Relation,
            relation_type: None,
            index: None,
            foundry: None,
            layer: None,
            wrap: Vec::new(),
            distance: None,
        }
    }
}

/// An n-ary combinator over an ordered sequence of operand nodes.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub operation: GroupOperation,
    #[serde(rename = "inOrder", skip_serializing_if = "Option::is_none")]
    pub in_order: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub distances: Vec<Distance>,
    pub operands: Vec<KoralNode>,
}

impl Group {
    pub fn new(operation: GroupOperation) -> Group {
        Group {
            operation,
            in_order: None,
            relation: None,
            distances: Vec::new(),
            operands: Vec::new(),
        }
    }
}

/// A node of the canonical query graph.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "@type")]
pub enum KoralNode {
    /// A single-position match unit wrapping at most one term predicate.
    #[serde(rename = "koral:token")]
    Token {
        #[serde(skip_serializing_if = "Option::is_none")]
        wrap: Option<Term>,
    },
    #[serde(rename = "koral:span")]
    Span(Span),
    #[serde(rename = "koral:group")]
    Group(Group),
}

impl KoralNode {
    /// A token wrapping the given term.
    pub fn token(term: Term) -> KoralNode {
        KoralNode::Token { wrap: Some(term) }
    }
}

/// The request envelope handed to the serializer: a fixed context identifier
/// plus the finished top-level graph node.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    #[serde(rename = "@context")]
    pub context: String,
    pub query: KoralNode,
}

impl QueryRequest {
    pub fn new(query: KoralNode) -> QueryRequest {
        QueryRequest {
            context: KORAL_CONTEXT.to_string(),
            query,
        }
    }
}
