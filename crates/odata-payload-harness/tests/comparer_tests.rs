//! Integration tests for comparison-mode behavior across formats.

mod common;

use odata_payload_harness::{ComparisonMode, verify_response};
use odata_payload_model::{EntitySetInstance, PayloadElement};

const VERBOSE_JSON: &str = "application/json;odata=verbose";

fn feed_response(entities: Vec<odata_payload_model::EntityInstance>) -> Vec<u8> {
    let uri = common::service_uri("Customers");
    let strategy = odata_payload_harness::strategy_for_exchange(Some(VERBOSE_JSON), &uri);
    strategy
        .serialize(
            &PayloadElement::EntitySet(EntitySetInstance {
                entities,
                inline_count: None,
                next_link: None,
            }),
            "utf-8",
        )
        .expect("serialize")
}

#[test]
fn comparer_tests_order_sensitivity_is_mode_dependent() {
    let uri = common::service_uri("Customers");
    let expected = PayloadElement::EntitySet(EntitySetInstance {
        entities: vec![common::customer(1, "Alice"), common::customer(2, "Bob")],
        inline_count: None,
        next_link: None,
    });
    let permuted = common::response(
        VERBOSE_JSON,
        feed_response(vec![common::customer(2, "Bob"), common::customer(1, "Alice")]),
    );

    verify_response(&expected, &permuted, &uri, ComparisonMode::Strict)
        .expect_err("strict mode must respect element order");
    verify_response(&expected, &permuted, &uri, ComparisonMode::IgnoringOrder)
        .expect("order-insensitive mode must match");
}

#[test]
fn comparer_tests_property_order_is_significant_in_strict_mode() {
    let uri = common::service_uri("Customers(1)");
    let strategy = odata_payload_harness::strategy_for_exchange(Some(VERBOSE_JSON), &uri);
    let body = strategy
        .serialize(&PayloadElement::Entity(common::customer(1, "Alice")), "utf-8")
        .expect("serialize");
    let response = common::response(VERBOSE_JSON, body);

    let mut permuted = common::customer(1, "Alice");
    permuted.properties.swap(0, 1);
    let expected = PayloadElement::Entity(permuted);

    verify_response(&expected, &response, &uri, ComparisonMode::Strict)
        .expect_err("strict mode must treat property order as significant");
    verify_response(&expected, &response, &uri, ComparisonMode::IgnoringOrder)
        .expect("order-insensitive mode must match properties by name");
}

#[test]
fn comparer_tests_json_light_accepts_convention_metadata() {
    let uri = common::service_uri("Customers(1)");
    let strategy = odata_payload_harness::strategy_for_exchange(Some(VERBOSE_JSON), &uri);
    let on_the_wire = common::customer(1, "Alice");
    let body = strategy
        .serialize(&PayloadElement::Entity(on_the_wire), "utf-8")
        .expect("serialize");
    let response = common::response(VERBOSE_JSON, body);

    // The expected tree knows only the structural data; identity metadata is
    // computed by convention on the service side.
    let mut expected_entity = common::customer(1, "Alice");
    expected_entity.id = None;
    expected_entity.edit_link = None;
    expected_entity.etag = None;
    let expected = PayloadElement::Entity(expected_entity);

    verify_response(&expected, &response, &uri, ComparisonMode::Strict)
        .expect_err("strict mode pins identity metadata");
    verify_response(&expected, &response, &uri, ComparisonMode::JsonLight)
        .expect("convention mode accepts computed metadata");
}
