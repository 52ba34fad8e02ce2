//! Round-trip tests: parse, serialize, and repeat.
//!
//! Each fixture checks that serialization reaches the expected normal form
//! and stays there across four parse/serialize iterations.

use proptest::prelude::*;

use mdjsx::{
    Attribute, AttributeValue, BlockNode, FlowElement, InlineNode, NamedAttribute, Paragraph,
    Root, Text,
};

fn assert_fixed_point(input: &str, expected: &str) {
    let mut current = input.to_string();
    for iteration in 1..=4 {
        let root = mdjsx::parse(&current)
            .unwrap_or_else(|e| panic!("iteration {iteration} failed to parse: {e}"));
        current = mdjsx::serialize(&root).expect("serialize");
        assert_eq!(current, expected, "iteration {iteration}");
    }
}

#[test]
fn test_multiline_attribute_value() {
    assert_fixed_point("<a x=\"a\nb\nc\" />", "<a\n  x=\"a\nb\nc\"\n/>\n");
}

#[test]
fn test_multiline_attribute_value_in_nested_element() {
    assert_fixed_point(
        "<a>\n<b x=\"a\nb\nc\" />\n</a>",
        "<a>\n  <b\n    x=\"a\nb\nc\"\n  />\n</a>\n",
    );
}

#[test]
fn test_multiline_attribute_value_in_nested_elements() {
    assert_fixed_point(
        "<a>\n  <b>\n    <c x=\"a\nb\nc\" />\n  </b>\n</a>",
        "<a>\n  <b>\n    <c\n      x=\"a\nb\nc\"\n    />\n  </b>\n</a>\n",
    );
}

#[test]
fn test_multiline_attribute_expression() {
    assert_fixed_point("<a x={`a\nb\nc`} />", "<a\n  x={`a\nb\nc`}\n/>\n");
}

#[test]
fn test_multiline_attribute_expression_in_nested_element() {
    assert_fixed_point(
        "<a>\n<b x={`a\nb\nc`} />\n</a>",
        "<a>\n  <b\n    x={`a\nb\nc`}\n  />\n</a>\n",
    );
}

#[test]
fn test_multiline_expression_attribute() {
    assert_fixed_point("<a {\n...a\n} />", "<a\n  {\n...a\n}\n/>\n");
}

#[test]
fn test_multiline_expression_attribute_in_nested_elements() {
    assert_fixed_point(
        "<a>\n  <b>\n    <c {\n...a\n} />\n  </b>\n</a>",
        "<a>\n  <b>\n    <c\n      {\n...a\n}\n    />\n  </b>\n</a>\n",
    );
}

#[test]
fn test_deeply_nested_flow_children() {
    assert_fixed_point(
        "<a>\n  <b>\n    <c>\n      <h/>\n    </c>\n  </b>\n</a>",
        "<a>\n  <b>\n    <c>\n      <h />\n    </c>\n  </b>\n</a>\n",
    );
}

#[test]
fn test_text_children_in_flow_elements() {
    let document = "<video src=\"#\">\n  Download the <a href=\"#\">WEBM</a> or\n  <a href=\"#\">MP4</a> video.\n</video>\n";
    assert_fixed_point(document, document);
}

#[test]
fn test_escaped_angle_bracket_in_text() {
    assert_fixed_point("a \\< b", "a \\< b\n");
}

fn attribute_strategy() -> impl Strategy<Value = Attribute> {
    ("[a-z]{1,6}", prop::option::of("[a-zA-Z0-9 ]{0,12}")).prop_map(|(name, value)| {
        Attribute::Named(NamedAttribute {
            name,
            value: value.map(AttributeValue::Literal),
        })
    })
}

fn tree_strategy() -> impl Strategy<Value = Root> {
    (
        "[a-z]{1,8}",
        prop::collection::vec(attribute_strategy(), 0..4),
        prop::option::of("[a-z]([a-z ]{0,18}[a-z])?"),
    )
        .prop_map(|(name, attributes, body)| {
            let children = body
                .map(|value| {
                    vec![BlockNode::Paragraph(Paragraph {
                        children: vec![InlineNode::Text(Text {
                            value,
                            position: None,
                        })],
                        position: None,
                    })]
                })
                .unwrap_or_default();
            Root {
                children: vec![BlockNode::FlowElement(FlowElement {
                    name: Some(name),
                    attributes,
                    children,
                    position: None,
                })],
                position: None,
            }
        })
}

proptest! {
    // Serialized trees parse back to the same tree (positions aside).
    #[test]
    fn prop_serialize_then_parse_is_identity(tree in tree_strategy()) {
        let markdown = mdjsx::serialize(&tree).expect("serialize");
        let mut back = mdjsx::parse(&markdown).expect("parse");
        back.strip_positions();
        prop_assert_eq!(back, tree);
    }

    // Serialization is a fixed point after one round trip.
    #[test]
    fn prop_serialization_reaches_fixed_point(tree in tree_strategy()) {
        let first = mdjsx::serialize(&tree).expect("serialize");
        let reparsed = mdjsx::parse(&first).expect("parse");
        let second = mdjsx::serialize(&reparsed).expect("serialize");
        prop_assert_eq!(first, second);
    }
}
