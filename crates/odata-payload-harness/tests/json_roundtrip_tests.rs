//! Integration tests for verbose-JSON serialize-deserialize fidelity.

mod common;

use odata_payload_harness::{ComparisonMode, verify_response};
use odata_payload_model::{PayloadElement, PrimitiveValue, ScalarValue};
use serde_json::Value;

const VERBOSE_JSON: &str = "application/json;odata=verbose";

fn roundtrip_strict(tree: &PayloadElement) {
    let uri = common::service_uri("Customers");
    let strategy = odata_payload_harness::strategy_for_exchange(Some(VERBOSE_JSON), &uri);
    let bytes = strategy.serialize(tree, "utf-8").expect("serialize");
    let response = common::response(VERBOSE_JSON, bytes);
    verify_response(tree, &response, &uri, ComparisonMode::Strict)
        .expect("round trip should verify strictly");
}

#[test]
fn json_roundtrip_tests_primitive_value() {
    roundtrip_strict(&PayloadElement::Primitive(PrimitiveValue::typed(
        "Edm.Int32",
        ScalarValue::Int32(42),
    )));
}

#[test]
fn json_roundtrip_tests_complex_value() {
    roundtrip_strict(&PayloadElement::Complex(common::address()));
}

#[test]
fn json_roundtrip_tests_entity_with_links() {
    roundtrip_strict(&PayloadElement::Entity(common::customer(1, "Alice")));
}

#[test]
fn json_roundtrip_tests_feed_with_paging_metadata() {
    roundtrip_strict(&PayloadElement::EntitySet(common::customers_feed()));
}

#[test]
fn json_roundtrip_tests_entities_carry_verbose_metadata() {
    let uri = common::service_uri("Customers(1)");
    let strategy = odata_payload_harness::strategy_for_exchange(Some(VERBOSE_JSON), &uri);
    let bytes = strategy
        .serialize(&PayloadElement::Entity(common::customer(1, "Alice")), "utf-8")
        .expect("serialize");
    let value: Value = serde_json::from_slice(&bytes).expect("valid json");

    let metadata = value.get("__metadata").expect("entity metadata");
    assert_eq!(
        metadata.get("uri").and_then(Value::as_str),
        Some("https://service.test/Customers(1)")
    );
    assert!(value.get("Orders").and_then(|v| v.get("__deferred")).is_some());
}
