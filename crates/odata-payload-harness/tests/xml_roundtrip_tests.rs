//! Integration tests for Atom/XML serialize-deserialize fidelity.

mod common;

use odata_payload_harness::{ComparisonMode, verify_response};
use odata_payload_model::{
    PayloadElement, PrimitiveCollection, PrimitiveValue, ScalarValue,
};

fn roundtrip_strict(tree: &PayloadElement) {
    let uri = common::service_uri("Customers");
    let strategy = odata_payload_harness::strategy_for_exchange(Some("application/xml"), &uri);
    let bytes = strategy.serialize(tree, "utf-8").expect("serialize");
    let response = common::response("application/xml", bytes);
    verify_response(tree, &response, &uri, ComparisonMode::Strict)
        .expect("round trip should verify strictly");
}

#[test]
fn xml_roundtrip_tests_primitive_value() {
    roundtrip_strict(&PayloadElement::Primitive(PrimitiveValue::typed(
        "Edm.Int32",
        ScalarValue::Int32(42),
    )));
}

#[test]
fn xml_roundtrip_tests_complex_value() {
    roundtrip_strict(&PayloadElement::Complex(common::address()));
}

#[test]
fn xml_roundtrip_tests_primitive_collection() {
    roundtrip_strict(&PayloadElement::PrimitiveCollection(PrimitiveCollection {
        elements: vec![
            PrimitiveValue::typed("Edm.String", ScalarValue::String("a".to_string())),
            PrimitiveValue::typed("Edm.String", ScalarValue::String("b".to_string())),
        ],
        inline_count: Some(2),
        next_link: None,
    }));
}

#[test]
fn xml_roundtrip_tests_entity_with_links() {
    roundtrip_strict(&PayloadElement::Entity(common::customer(1, "Alice")));
}

#[test]
fn xml_roundtrip_tests_feed_with_paging_metadata() {
    roundtrip_strict(&PayloadElement::EntitySet(common::customers_feed()));
}

#[test]
fn xml_roundtrip_tests_detects_a_changed_property() {
    let uri = common::service_uri("Customers(1)");
    let strategy = odata_payload_harness::strategy_for_exchange(Some("application/xml"), &uri);
    let actual = PayloadElement::Entity(common::customer(1, "Alice"));
    let bytes = strategy.serialize(&actual, "utf-8").expect("serialize");
    let response = common::response("application/xml", bytes);

    let expected = PayloadElement::Entity(common::customer(1, "Bob"));
    let failure = verify_response(&expected, &response, &uri, ComparisonMode::Strict)
        .expect_err("differing names must fail verification");
    assert!(failure.to_string().contains("/Name"), "failure: {failure}");
}
