//! Integration tests for named-value flattening and rebuilding.

mod common;

use odata_payload_convert::{from_named_values, to_named_values};
use odata_payload_model::{
    ComplexInstance, NamedPayloadValue, NamedValueSet, PayloadElement, PrimitiveCollection,
    PrimitiveValue, QueryType, QueryValue, ScalarValue,
};

#[test]
fn named_value_tests_flattening_order_follows_the_tree() {
    let tree = PayloadElement::Complex(
        ComplexInstance::new(None)
            .with_property(
                "Name",
                PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::String(
                    "A".to_string(),
                ))),
            )
            .with_property(
                "Nested",
                PayloadElement::Complex(ComplexInstance::new(None).with_property(
                    "X",
                    PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::Int32(1))),
                )),
            ),
    );
    let values = to_named_values(&tree).expect("flatten");
    let flattened: Vec<(String, NamedPayloadValue)> = values
        .into_iter()
        .map(|entry| (entry.path, entry.value))
        .collect();
    assert_eq!(
        flattened,
        vec![
            (
                "Name".to_string(),
                NamedPayloadValue::Scalar(ScalarValue::String("A".to_string()))
            ),
            (
                "Nested.X".to_string(),
                NamedPayloadValue::Scalar(ScalarValue::Int32(1))
            ),
        ]
    );
}

#[test]
fn named_value_tests_empty_collection_leaves_a_sentinel() {
    let tree = PayloadElement::Complex(ComplexInstance::new(None).with_property(
        "Tags",
        PayloadElement::PrimitiveCollection(PrimitiveCollection::default()),
    ));
    let values = to_named_values(&tree).expect("flatten");
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].path, "Tags");
    assert_eq!(values[0].value, NamedPayloadValue::EmptyCollection);
}

#[test]
fn named_value_tests_collections_flatten_with_zero_based_indices() {
    let tree = PayloadElement::Complex(ComplexInstance::new(None).with_property(
        "Tags",
        PayloadElement::PrimitiveCollection(PrimitiveCollection {
            elements: vec![
                PrimitiveValue::untyped(ScalarValue::String("red".to_string())),
                PrimitiveValue::untyped(ScalarValue::String("blue".to_string())),
            ],
            inline_count: None,
            next_link: None,
        }),
    ));
    let values = to_named_values(&tree).expect("flatten");
    let paths: Vec<&str> = values.iter().map(|entry| entry.path.as_str()).collect();
    assert_eq!(paths, vec!["Tags.0", "Tags.1"]);
}

#[test]
fn named_value_tests_rebuild_reverses_flattening() {
    let tree = PayloadElement::Complex(common::address());
    let mut set = NamedValueSet::new();
    for entry in to_named_values(&tree).expect("flatten") {
        set.set(entry.path, entry.value);
    }
    let rebuilt =
        from_named_values(&set, &QueryType::Complex("Model.Address".to_string())).expect("rebuild");
    assert_eq!(
        rebuilt.property("Zip"),
        Some(&QueryValue::Scalar(ScalarValue::Int32(98052)))
    );
    let QueryValue::Record { properties, .. } = &rebuilt else {
        panic!("expected a record");
    };
    assert_eq!(properties.len(), 2);
}
