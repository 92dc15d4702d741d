//! Shared fixtures for payload harness integration tests.

use odata_payload_edm::{HttpResponseData, ODataUri};
use odata_payload_model::{
    ComplexInstance, DeferredLink, EntityInstance, EntitySetInstance, PayloadElement,
    PrimitiveValue, ScalarValue,
};

/// Parses a request URI under the fixture service root.
#[allow(dead_code)]
pub fn service_uri(path: &str) -> ODataUri {
    ODataUri::parse(&format!("https://service.test/{path}")).expect("fixture uri should parse")
}

/// Deterministic address complex value.
#[allow(dead_code)]
pub fn address() -> ComplexInstance {
    ComplexInstance::new(Some("Model.Address".to_string()))
        .with_property(
            "City",
            PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::String(
                "Redmond".to_string(),
            ))),
        )
        .with_property(
            "Zip",
            PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::Int32(98052))),
        )
}

/// Deterministic customer entity with identity metadata, a nested complex
/// property and a deferred navigation link.
#[allow(dead_code)]
pub fn customer(id: i32, name: &str) -> EntityInstance {
    let mut entity = EntityInstance::new(Some("Model.Customer".to_string()));
    entity.id = Some(format!("https://service.test/Customers({id})"));
    entity.edit_link = Some(format!("https://service.test/Customers({id})"));
    entity.etag = Some(format!("W/\"{id}\""));
    entity.properties.push((
        "ID".to_string(),
        PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::Int32(id))),
    ));
    entity.properties.push((
        "Name".to_string(),
        PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::String(
            name.to_string(),
        ))),
    ));
    entity
        .properties
        .push(("Address".to_string(), PayloadElement::Complex(address())));
    entity.properties.push((
        "Orders".to_string(),
        PayloadElement::DeferredLink(DeferredLink {
            uri: format!("https://service.test/Customers({id})/Orders"),
        }),
    ));
    entity
}

/// Two-customer feed with paging metadata.
#[allow(dead_code)]
pub fn customers_feed() -> EntitySetInstance {
    EntitySetInstance {
        entities: vec![customer(1, "Alice"), customer(2, "Bob")],
        inline_count: Some(4),
        next_link: Some("https://service.test/Customers?$skiptoken=2".to_string()),
    }
}

/// Wraps body bytes as a 200 response with the given content type.
#[allow(dead_code)]
pub fn response(content_type: &str, body: Vec<u8>) -> HttpResponseData {
    HttpResponseData {
        status: 200,
        headers: vec![("Content-Type".to_string(), content_type.to_string())],
        body,
    }
}
