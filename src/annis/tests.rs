use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::cst::CstNode;
use crate::koral::KORAL_CONTEXT;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn start(alternatives: Vec<CstNode<AqlCategory>>) -> CstNode<AqlCategory> {
    CstNode::node(
        AqlCategory::Start,
        vec![CstNode::node(AqlCategory::ExprTop, alternatives)],
    )
}

fn and_top(exprs: Vec<CstNode<AqlCategory>>) -> CstNode<AqlCategory> {
    CstNode::node(AqlCategory::AndTopExpr, exprs)
}

fn expr(child: CstNode<AqlCategory>) -> CstNode<AqlCategory> {
    CstNode::node(AqlCategory::Expr, vec![child])
}

fn bare_node() -> CstNode<AqlCategory> {
    CstNode::node(
        AqlCategory::VariableExpr,
        vec![CstNode::leaf(AqlCategory::Node, "node")],
    )
}

/// A quoted single-word search like `"Mann"`.
fn word(text: &str) -> CstNode<AqlCategory> {
    CstNode::node(
        AqlCategory::VariableExpr,
        vec![CstNode::node(
            AqlCategory::TextSpec,
            vec![CstNode::leaf(AqlCategory::Literal, text)],
        )],
    )
}

/// An annotation search like `pos="NN"`.
fn annotation(layer: &str, value: &str) -> CstNode<AqlCategory> {
    CstNode::node(
        AqlCategory::VariableExpr,
        vec![
            CstNode::node(
                AqlCategory::QName,
                vec![CstNode::leaf(AqlCategory::Layer, layer)],
            ),
            CstNode::leaf(AqlCategory::MatchOp, "="),
            CstNode::node(
                AqlCategory::TextSpec,
                vec![CstNode::leaf(AqlCategory::Literal, value)],
            ),
        ],
    )
}

fn reference(text: &str) -> CstNode<AqlCategory> {
    CstNode::node(
        AqlCategory::RefOrNode,
        vec![CstNode::leaf(AqlCategory::Reference, text)],
    )
}

fn inline(variable_expr: CstNode<AqlCategory>) -> CstNode<AqlCategory> {
    CstNode::node(AqlCategory::RefOrNode, vec![variable_expr])
}

fn nary(
    left: CstNode<AqlCategory>,
    operator: CstNode<AqlCategory>,
    right: CstNode<AqlCategory>,
) -> CstNode<AqlCategory> {
    CstNode::node(AqlCategory::NAryLinguisticTerm, vec![left, operator, right])
}

fn precedence(quantifiers: Vec<CstNode<AqlCategory>>) -> CstNode<AqlCategory> {
    CstNode::node(AqlCategory::Precedence, quantifiers)
}

fn range_spec(min: &str, max: &str) -> CstNode<AqlCategory> {
    CstNode::node(
        AqlCategory::RangeSpec,
        vec![
            CstNode::leaf(AqlCategory::Number, min),
            CstNode::leaf(AqlCategory::Number, max),
        ],
    )
}

/// `node & node & #1 . #2`
#[test]
fn precedence_between_references() {
    init_logging();
    let tree = start(vec![and_top(vec![
        expr(bare_node()),
        expr(bare_node()),
        expr(nary(reference("#1"), precedence(vec![]), reference("#2"))),
    ])]);

    let query = translate_tree(&tree).unwrap();
    assert_eq!(
        json!({
            "@type": "koral:group",
            "operation": "operation:sequence",
            "inOrder": true,
            "operands": [
                {"@type": "koral:span"},
                {"@type": "koral:span"},
            ]
        }),
        serde_json::to_value(&query).unwrap()
    );
}

/// `node & node & #1 .2,6 #2`
#[test]
fn precedence_with_explicit_distance() {
    let tree = start(vec![and_top(vec![
        expr(bare_node()),
        expr(bare_node()),
        expr(nary(
            reference("#1"),
            precedence(vec![range_spec("2", "6")]),
            reference("#2"),
        )),
    ])]);

    let query = translate_tree(&tree).unwrap();
    assert_eq!(
        json!({
            "@type": "koral:group",
            "operation": "operation:sequence",
            "inOrder": true,
            "distances": [
                {"@type": "koral:distance", "key": "w", "min": 2, "max": 6}
            ],
            "operands": [
                {"@type": "koral:span"},
                {"@type": "koral:span"},
            ]
        }),
        serde_json::to_value(&query).unwrap()
    );
}

/// `node & node & #1 .* #2`
#[test]
fn precedence_with_unbounded_star() {
    let tree = start(vec![and_top(vec![
        expr(bare_node()),
        expr(bare_node()),
        expr(nary(
            reference("#1"),
            precedence(vec![CstNode::leaf(AqlCategory::Star, "*")]),
            reference("#2"),
        )),
    ])]);

    let query = translate_tree(&tree).unwrap();
    if let KoralNode::Group(group) = query {
        assert_eq!(vec![crate::koral::Distance::words(0, 100)], group.distances);
    } else {
        panic!("expected group, got {:?}", query);
    }
}

/// `"Sonne" | "Mond"`
#[test]
fn disjunction_of_two_words() {
    let tree = start(vec![
        and_top(vec![expr(word("Sonne"))]),
        and_top(vec![expr(word("Mond"))]),
    ]);

    let query = translate_tree(&tree).unwrap();
    assert_eq!(
        json!({
            "@type": "koral:group",
            "operation": "operation:or",
            "operands": [
                {"@type": "koral:token", "wrap":
                    {"@type": "koral:term", "key": "Sonne", "match": "match:eq"}},
                {"@type": "koral:token", "wrap":
                    {"@type": "koral:term", "key": "Mond", "match": "match:eq"}},
            ]
        }),
        serde_json::to_value(&query).unwrap()
    );
}

#[test]
fn empty_query_is_an_error() {
    let tree = CstNode::node(AqlCategory::Start, vec![]);
    assert!(matches!(
        translate_tree(&tree),
        Err(KoralError::EmptyQuery)
    ));
}

/// `pos="VVFIN" & cas="Nom"` without any relation between the two.
#[test]
fn plain_conjunction_builds_and_group() {
    let tree = start(vec![and_top(vec![
        expr(annotation("pos", "VVFIN")),
        expr(annotation("cas", "Nom")),
    ])]);

    let query = translate_tree(&tree).unwrap();
    let value = serde_json::to_value(&query).unwrap();
    assert_eq!("operation:and", value["operation"]);
    assert_eq!(2, value["operands"].as_array().unwrap().len());
    assert_eq!("VVFIN", value["operands"][0]["wrap"]["key"]);
    assert_eq!("Nom", value["operands"][1]["wrap"]["key"]);
}

/// `"Mann" & node & #2 > #1`: referenced units appear exactly once, as the
/// relation operands, never additionally at their lexical position.
#[test]
fn references_are_not_duplicated() {
    init_logging();
    let tree = start(vec![and_top(vec![
        expr(word("Mann")),
        expr(bare_node()),
        expr(nary(
            reference("#2"),
            CstNode::node(AqlCategory::Dominance, vec![]),
            reference("#1"),
        )),
    ])]);

    let query = translate_tree(&tree).unwrap();
    let serialized = serde_json::to_string(&query).unwrap();
    assert_eq!(1, serialized.matches("Mann").count());

    let value = serde_json::to_value(&query).unwrap();
    assert_eq!("operation:relation", value["operation"]);
    assert_eq!("dominance", value["relation"]["reltype"]);
    // Operand order follows the relation, not the lexical definitions.
    assert_eq!("koral:span", value["operands"][0]["@type"]);
    assert_eq!("koral:token", value["operands"][1]["@type"]);
}

/// `tiger/pos="NN" > node`: inline operands are consumed by the relation.
#[test]
fn dominance_with_inline_operands() {
    let annotation_with_foundry = CstNode::node(
        AqlCategory::VariableExpr,
        vec![
            CstNode::node(
                AqlCategory::QName,
                vec![
                    CstNode::leaf(AqlCategory::Foundry, "tiger"),
                    CstNode::leaf(AqlCategory::Layer, "pos"),
                ],
            ),
            CstNode::leaf(AqlCategory::MatchOp, "="),
            CstNode::node(
                AqlCategory::TextSpec,
                vec![CstNode::leaf(AqlCategory::Literal, "NN")],
            ),
        ],
    );
    let tree = start(vec![and_top(vec![expr(nary(
        inline(annotation_with_foundry),
        CstNode::node(AqlCategory::Dominance, vec![]),
        inline(bare_node()),
    ))])]);

    let query = translate_tree(&tree).unwrap();
    let value = serde_json::to_value(&query).unwrap();
    assert_eq!("operation:relation", value["operation"]);
    // Left operand first, exactly as written.
    assert_eq!("tiger", value["operands"][0]["wrap"]["foundry"]);
    assert_eq!("NN", value["operands"][0]["wrap"]["key"]);
    assert_eq!("koral:span", value["operands"][1]["@type"]);
}

/// `subj#node & pos="NN" > #subj`: an explicit label shares the namespace
/// with positional ids.
#[test]
fn explicit_label_is_resolvable() {
    let labeled = CstNode::node(
        AqlCategory::VariableExpr,
        vec![
            CstNode::leaf(AqlCategory::VariableDef, "subj#"),
            CstNode::leaf(AqlCategory::Node, "node"),
        ],
    );
    let tree = start(vec![and_top(vec![
        expr(labeled),
        expr(nary(
            inline(annotation("pos", "NN")),
            CstNode::node(AqlCategory::Dominance, vec![]),
            reference("#subj"),
        )),
    ])]);

    let query = translate_tree(&tree).unwrap();
    let value = serde_json::to_value(&query).unwrap();
    assert_eq!("operation:relation", value["operation"]);
    assert_eq!("NN", value["operands"][0]["wrap"]["key"]);
    assert_eq!("koral:span", value["operands"][1]["@type"]);
}

#[test]
fn unresolved_reference_fails_translation() {
    let tree = start(vec![and_top(vec![expr(nary(
        reference("#1"),
        precedence(vec![]),
        reference("#2"),
    ))])]);

    assert!(matches!(
        translate_tree(&tree),
        Err(KoralError::UnresolvedReference(id)) if id == "1"
    ));
}

#[test]
fn duplicate_label_fails_translation() {
    let labeled = || {
        CstNode::node(
            AqlCategory::VariableExpr,
            vec![
                CstNode::leaf(AqlCategory::VariableDef, "subj#"),
                CstNode::leaf(AqlCategory::Node, "node"),
            ],
        )
    };
    let tree = start(vec![and_top(vec![expr(labeled()), expr(labeled())])]);

    assert!(matches!(
        translate_tree(&tree),
        Err(KoralError::DuplicateReference(id)) if id == "subj"
    ));
}

/// A pending operator family still produces a group over its operands, just
/// without relation detail.
#[test]
fn unsupported_operator_is_lenient() {
    let tree = start(vec![and_top(vec![
        expr(bare_node()),
        expr(bare_node()),
        expr(nary(
            reference("#1"),
            CstNode::node(AqlCategory::CommonParent, vec![]),
            reference("#2"),
        )),
    ])]);

    let query = translate_tree(&tree).unwrap();
    assert_eq!(
        json!({
            "@type": "koral:group",
            "operation": "operation:relation",
            "operands": [
                {"@type": "koral:span"},
                {"@type": "koral:span"},
            ]
        }),
        serde_json::to_value(&query).unwrap()
    );
}

#[test]
fn translation_is_deterministic() {
    let tree = start(vec![and_top(vec![
        expr(bare_node()),
        expr(bare_node()),
        expr(nary(
            reference("#1"),
            precedence(vec![range_spec("2", "6")]),
            reference("#2"),
        )),
    ])]);

    let first = translate_tree(&tree).unwrap();
    let second = translate_tree(&tree).unwrap();
    assert_eq!(first, second);
}

#[test]
fn request_envelope_carries_fixed_context() {
    let tree = start(vec![and_top(vec![expr(word("Sonne"))])]);
    let request = translate(&tree).unwrap();
    assert_eq!(KORAL_CONTEXT, request.context);
    assert_eq!(
        KoralNode::token(Term {
            key: Some("Sonne".to_string()),
            match_op: Some(crate::koral::MatchOperator::Eq),
            ..Term::default()
        }),
        request.query
    );
}
