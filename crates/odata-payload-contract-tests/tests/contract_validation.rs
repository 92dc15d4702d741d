//! Validates payload fixtures and live serializer output against frozen
//! JSON schemas.

use jsonschema::JSONSchema;
use serde_json::Value;

use odata_payload_formats::{element_to_json, json_to_element};
use odata_payload_model::{
    ComplexInstance, DeferredLink, EntityInstance, ErrorPayload, PayloadElement, PrimitiveValue,
    ScalarValue,
};

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

fn entity_validator() -> JSONSchema {
    compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/json-entity.schema.json"
    ))
}

fn error_validator() -> JSONSchema {
    compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/error-payload.schema.json"
    ))
}

#[test]
fn entity_fixture_matches_schema() {
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/json-entity.valid.json"
    ));
    assert!(
        entity_validator().is_valid(&fixture),
        "entity fixture should validate against schema"
    );
}

#[test]
fn error_fixture_matches_schema() {
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/error-payload.valid.json"
    ));
    assert!(
        error_validator().is_valid(&fixture),
        "error fixture should validate against schema"
    );
}

#[test]
fn serialized_entities_match_the_frozen_contract() {
    let mut entity = EntityInstance::new(Some("Model.Customer".to_string()));
    entity.id = Some("https://service.test/Customers(1)".to_string());
    entity.edit_link = Some("https://service.test/Customers(1)".to_string());
    entity.etag = Some("W/\"1\"".to_string());
    entity.properties.push((
        "ID".to_string(),
        PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::Int32(1))),
    ));
    entity.properties.push((
        "Address".to_string(),
        PayloadElement::Complex(
            ComplexInstance::new(Some("Model.Address".to_string())).with_property(
                "City",
                PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::String(
                    "Redmond".to_string(),
                ))),
            ),
        ),
    ));
    entity.properties.push((
        "Orders".to_string(),
        PayloadElement::DeferredLink(DeferredLink {
            uri: "https://service.test/Customers(1)/Orders".to_string(),
        }),
    ));

    let value = element_to_json(&PayloadElement::Entity(entity)).expect("serialize");
    assert!(
        entity_validator().is_valid(&value),
        "live entity output should validate against schema"
    );
}

#[test]
fn serialized_errors_match_the_frozen_contract() {
    let value = element_to_json(&PayloadElement::Error(ErrorPayload {
        code: Some("500".to_string()),
        message: Some("boom".to_string()),
        stack_trace: Some("at Service.Get".to_string()),
    }))
    .expect("serialize");
    assert!(
        error_validator().is_valid(&value),
        "live error output should validate against schema"
    );
}

#[test]
fn fixture_round_trips_through_the_payload_tree() {
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/json-entity.valid.json"
    ));
    let tree = json_to_element(&fixture).expect("fixture should deserialize");
    let PayloadElement::Entity(entity) = &tree else {
        panic!("fixture should read back as an entity");
    };
    assert_eq!(entity.type_name.as_deref(), Some("Model.Customer"));

    let reserialized = element_to_json(&tree).expect("reserialize");
    assert!(
        entity_validator().is_valid(&reserialized),
        "round-tripped fixture should still validate"
    );
}
