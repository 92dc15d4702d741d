//! Verbose-JSON payload conversion.

use serde_json::{Map, Number, Value, json};

use odata_payload_model::{
    ComplexCollection, ComplexInstance, ComplexMultiValue, DeferredLink, EmptyUntypedCollection,
    EntityInstance, EntitySetInstance, ErrorPayload, LinkCollection, PayloadElement,
    PrimitiveCollection, PrimitiveMultiValue, PrimitiveValue, ScalarValue,
};

use crate::normalize::normalize_tree;
use crate::{
    DeserializeContext, FormatError, FormatKind, FormatStrategy, ScalarComparer, check_encoding,
};

/// Verbose-JSON format strategy.
///
/// Entities and complex values map to objects with a `__metadata` marker,
/// collections to `results` wrappers with optional `__count`/`__next`, and
/// deferred links to `__deferred` objects. Raw tree-to-JSON conversion is
/// exposed separately so the HTML-form serializer can embed nested values.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStrategy;

impl FormatStrategy for JsonStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::Json
    }

    fn serialize(&self, payload: &PayloadElement, encoding: &str) -> Result<Vec<u8>, FormatError> {
        check_encoding(encoding)?;
        let value = element_to_json(payload)?;
        Ok(serde_json::to_vec(&value)?)
    }

    fn deserialize(
        &self,
        raw: &[u8],
        _context: &DeserializeContext,
    ) -> Result<PayloadElement, FormatError> {
        let value: Value = serde_json::from_slice(raw)?;
        json_to_element(&value)
    }

    fn normalize(&self, payload: PayloadElement) -> Result<PayloadElement, FormatError> {
        Ok(normalize_tree(payload))
    }

    fn scalar_comparer(&self) -> ScalarComparer {
        ScalarComparer::new(FormatKind::Json)
    }
}

/// Converts a payload tree into its verbose-JSON value.
///
/// # Errors
/// Currently total for every tree shape; the `Result` reserves room for
/// unrepresentable future variants.
pub fn element_to_json(element: &PayloadElement) -> Result<Value, FormatError> {
    let value = match element {
        PayloadElement::Primitive(primitive) => scalar_to_json(&primitive.value),
        PayloadElement::Complex(complex) => complex_to_json(complex)?,
        PayloadElement::Entity(entity) => entity_to_json(entity)?,
        PayloadElement::EntitySet(set) => {
            let entities = set
                .entities
                .iter()
                .map(entity_to_json)
                .collect::<Result<Vec<_>, _>>()?;
            results_wrapper(entities, set.inline_count, set.next_link.as_deref(), None)
        }
        PayloadElement::PrimitiveCollection(collection) => {
            let elements = collection
                .elements
                .iter()
                .map(|primitive| scalar_to_json(&primitive.value))
                .collect();
            results_wrapper(
                elements,
                collection.inline_count,
                collection.next_link.as_deref(),
                None,
            )
        }
        PayloadElement::ComplexCollection(collection) => {
            let elements = collection
                .elements
                .iter()
                .map(complex_to_json)
                .collect::<Result<Vec<_>, _>>()?;
            results_wrapper(
                elements,
                collection.inline_count,
                collection.next_link.as_deref(),
                None,
            )
        }
        PayloadElement::LinkCollection(collection) => {
            let links = collection
                .links
                .iter()
                .map(|link| json!({ "uri": link.uri }))
                .collect();
            results_wrapper(
                links,
                collection.inline_count,
                collection.next_link.as_deref(),
                None,
            )
        }
        PayloadElement::PrimitiveMultiValue(bag) => {
            let elements = bag
                .elements
                .iter()
                .map(|primitive| scalar_to_json(&primitive.value))
                .collect();
            results_wrapper(elements, None, None, bag.type_name.as_deref())
        }
        PayloadElement::ComplexMultiValue(bag) => {
            let elements = bag
                .elements
                .iter()
                .map(complex_to_json)
                .collect::<Result<Vec<_>, _>>()?;
            results_wrapper(elements, None, None, bag.type_name.as_deref())
        }
        PayloadElement::DeferredLink(link) => json!({ "__deferred": { "uri": link.uri } }),
        PayloadElement::Error(error) => error_to_json(error),
        PayloadElement::EmptyUntypedCollection(_) => json!({ "results": [] }),
    };
    Ok(value)
}

/// Converts a verbose-JSON value back into a payload tree.
///
/// # Errors
/// Returns [`FormatError::Malformed`] for shapes outside the verbose mapping.
pub fn json_to_element(value: &Value) -> Result<PayloadElement, FormatError> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(
            PayloadElement::Primitive(PrimitiveValue::untyped(json_to_scalar(value))),
        ),
        Value::Array(elements) => array_to_element(elements, None, None, None),
        Value::Object(object) => object_to_element(object),
    }
}

fn object_to_element(object: &Map<String, Value>) -> Result<PayloadElement, FormatError> {
    if let Some(error) = object.get("error") {
        return Ok(PayloadElement::Error(json_to_error(error)));
    }
    if let Some(deferred) = object.get("__deferred") {
        let uri = deferred
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("__deferred object without a uri"))?;
        return Ok(PayloadElement::DeferredLink(DeferredLink {
            uri: uri.to_string(),
        }));
    }

    let metadata = object.get("__metadata").and_then(Value::as_object);
    if let Some(results) = object.get("results").and_then(Value::as_array) {
        let inline_count = object.get("__count").and_then(parse_count);
        let next_link = object
            .get("__next")
            .and_then(Value::as_str)
            .map(str::to_string);
        let collection_type = metadata
            .and_then(|meta| meta.get("type"))
            .and_then(Value::as_str)
            .filter(|name| name.starts_with("Collection("));
        return array_to_element(results, inline_count, next_link, collection_type);
    }

    if is_entity_metadata(metadata) {
        return Ok(PayloadElement::Entity(json_to_entity(object, metadata)?));
    }

    let type_name = metadata
        .and_then(|meta| meta.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let mut complex = ComplexInstance::new(type_name);
    for (name, value) in object {
        if name == "__metadata" {
            continue;
        }
        complex.properties.push((name.clone(), json_to_element(value)?));
    }
    Ok(PayloadElement::Complex(complex))
}

fn array_to_element(
    elements: &[Value],
    inline_count: Option<i64>,
    next_link: Option<String>,
    collection_type: Option<&str>,
) -> Result<PayloadElement, FormatError> {
    if let Some(type_name) = collection_type {
        return multi_value_from_results(elements, type_name);
    }

    if elements.is_empty() {
        if inline_count.is_some() || next_link.is_some() {
            // Feed metadata implies an entity collection even without rows.
            return Ok(PayloadElement::EntitySet(EntitySetInstance {
                entities: Vec::new(),
                inline_count,
                next_link,
            }));
        }
        return Ok(PayloadElement::EmptyUntypedCollection(
            EmptyUntypedCollection::default(),
        ));
    }

    if let Some(first) = elements.first().and_then(Value::as_object) {
        if is_entity_metadata(first.get("__metadata").and_then(Value::as_object)) {
            let entities = elements
                .iter()
                .map(|element| {
                    let object = element
                        .as_object()
                        .ok_or_else(|| malformed("mixed entity feed"))?;
                    json_to_entity(object, object.get("__metadata").and_then(Value::as_object))
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(PayloadElement::EntitySet(EntitySetInstance {
                entities,
                inline_count,
                next_link,
            }));
        }
        if first.len() == 1 && first.contains_key("uri") {
            let links = elements
                .iter()
                .map(|element| {
                    element
                        .get("uri")
                        .and_then(Value::as_str)
                        .map(|uri| DeferredLink {
                            uri: uri.to_string(),
                        })
                        .ok_or_else(|| malformed("link collection entry without a uri"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(PayloadElement::LinkCollection(LinkCollection {
                links,
                inline_count,
                next_link,
            }));
        }
        let instances = elements
            .iter()
            .map(json_to_complex)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(PayloadElement::ComplexCollection(ComplexCollection {
            elements: instances,
            inline_count,
            next_link,
        }));
    }

    let primitives = elements
        .iter()
        .map(|element| PrimitiveValue::untyped(json_to_scalar(element)))
        .collect();
    Ok(PayloadElement::PrimitiveCollection(PrimitiveCollection {
        elements: primitives,
        inline_count,
        next_link,
    }))
}

fn multi_value_from_results(
    elements: &[Value],
    type_name: &str,
) -> Result<PayloadElement, FormatError> {
    let complex_elements = elements.iter().all(Value::is_object);
    if complex_elements && !elements.is_empty() {
        let instances = elements
            .iter()
            .map(json_to_complex)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PayloadElement::ComplexMultiValue(ComplexMultiValue {
            type_name: Some(type_name.to_string()),
            elements: instances,
        }))
    } else {
        let primitives = elements
            .iter()
            .map(|element| PrimitiveValue::untyped(json_to_scalar(element)))
            .collect();
        Ok(PayloadElement::PrimitiveMultiValue(PrimitiveMultiValue {
            type_name: Some(type_name.to_string()),
            elements: primitives,
        }))
    }
}

fn json_to_complex(value: &Value) -> Result<ComplexInstance, FormatError> {
    match json_to_element(value)? {
        PayloadElement::Complex(complex) => Ok(complex),
        other => Err(malformed(&format!(
            "expected a complex object, found {:?}",
            other.element_type()
        ))),
    }
}

fn json_to_entity(
    object: &Map<String, Value>,
    metadata: Option<&Map<String, Value>>,
) -> Result<EntityInstance, FormatError> {
    let mut entity = EntityInstance::new(
        metadata
            .and_then(|meta| meta.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string),
    );
    if let Some(meta) = metadata {
        entity.id = meta.get("id").and_then(Value::as_str).map(str::to_string);
        entity.edit_link = meta.get("uri").and_then(Value::as_str).map(str::to_string);
        entity.etag = meta.get("etag").and_then(Value::as_str).map(str::to_string);
        entity.stream_source_link = meta
            .get("media_src")
            .and_then(Value::as_str)
            .map(str::to_string);
        entity.stream_edit_link = meta
            .get("edit_media")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    for (name, value) in object {
        if name == "__metadata" {
            continue;
        }
        entity.properties.push((name.clone(), json_to_element(value)?));
    }
    Ok(entity)
}

fn is_entity_metadata(metadata: Option<&Map<String, Value>>) -> bool {
    metadata.is_some_and(|meta| {
        meta.contains_key("uri")
            || meta.contains_key("id")
            || meta.contains_key("etag")
            || meta.contains_key("media_src")
            || meta.contains_key("edit_media")
    })
}

fn complex_to_json(complex: &ComplexInstance) -> Result<Value, FormatError> {
    let mut object = Map::new();
    if let Some(type_name) = &complex.type_name {
        object.insert("__metadata".to_string(), json!({ "type": type_name }));
    }
    for (name, value) in &complex.properties {
        object.insert(name.clone(), element_to_json(value)?);
    }
    Ok(Value::Object(object))
}

fn entity_to_json(entity: &EntityInstance) -> Result<Value, FormatError> {
    let mut metadata = Map::new();
    // `uri` is always present (possibly null) so readers can tell an entity
    // apart from a complex value without entity-model knowledge.
    metadata.insert(
        "uri".to_string(),
        entity
            .edit_link
            .as_ref()
            .map(|link| Value::String(link.clone()))
            .unwrap_or(Value::Null),
    );
    if let Some(id) = &entity.id {
        metadata.insert("id".to_string(), Value::String(id.clone()));
    }
    if let Some(type_name) = &entity.type_name {
        metadata.insert("type".to_string(), Value::String(type_name.clone()));
    }
    if let Some(etag) = &entity.etag {
        metadata.insert("etag".to_string(), Value::String(etag.clone()));
    }
    if let Some(source) = &entity.stream_source_link {
        metadata.insert("media_src".to_string(), Value::String(source.clone()));
    }
    if let Some(edit) = &entity.stream_edit_link {
        metadata.insert("edit_media".to_string(), Value::String(edit.clone()));
    }

    let mut object = Map::new();
    object.insert("__metadata".to_string(), Value::Object(metadata));
    for (name, value) in &entity.properties {
        object.insert(name.clone(), element_to_json(value)?);
    }
    Ok(Value::Object(object))
}

fn error_to_json(error: &ErrorPayload) -> Value {
    let mut body = Map::new();
    if let Some(code) = &error.code {
        body.insert("code".to_string(), Value::String(code.clone()));
    }
    if let Some(message) = &error.message {
        body.insert("message".to_string(), json!({ "value": message }));
    }
    if let Some(stack_trace) = &error.stack_trace {
        body.insert(
            "innererror".to_string(),
            json!({ "stacktrace": stack_trace }),
        );
    }
    json!({ "error": Value::Object(body) })
}

fn json_to_error(value: &Value) -> ErrorPayload {
    ErrorPayload {
        code: value
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string),
        message: value
            .get("message")
            .and_then(|message| {
                message
                    .get("value")
                    .and_then(Value::as_str)
                    .or_else(|| message.as_str())
            })
            .map(str::to_string),
        stack_trace: value
            .get("innererror")
            .and_then(|inner| inner.get("stacktrace"))
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn scalar_to_json(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::Null => Value::Null,
        ScalarValue::Boolean(flag) => Value::Bool(*flag),
        ScalarValue::Int32(number) => Value::Number((*number).into()),
        ScalarValue::Int64(number) => Value::Number((*number).into()),
        ScalarValue::Single(number) => float_to_json(f64::from(*number)),
        ScalarValue::Double(number) => float_to_json(*number),
        ScalarValue::Decimal(text) => Value::String(text.clone()),
        ScalarValue::String(text) => Value::String(text.clone()),
        ScalarValue::Guid(text)
        | ScalarValue::DateTime(text)
        | ScalarValue::DateTimeOffset(text)
        | ScalarValue::Duration(text)
        | ScalarValue::Geometry(text)
        | ScalarValue::Geography(text) => Value::String(text.clone()),
        ScalarValue::Binary(bytes) => Value::String(hex::encode(bytes)),
    }
}

fn float_to_json(number: f64) -> Value {
    match Number::from_f64(number) {
        Some(finite) => Value::Number(finite),
        // JSON has no literal for these; the normalizer restores them from
        // the annotated type on the way back in.
        None => {
            if number.is_nan() {
                Value::String("NaN".to_string())
            } else if number > 0.0 {
                Value::String("INF".to_string())
            } else {
                Value::String("-INF".to_string())
            }
        }
    }
}

fn json_to_scalar(value: &Value) -> ScalarValue {
    match value {
        Value::Null => ScalarValue::Null,
        Value::Bool(flag) => ScalarValue::Boolean(*flag),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                match i32::try_from(integer) {
                    Ok(narrow) => ScalarValue::Int32(narrow),
                    Err(_) => ScalarValue::Int64(integer),
                }
            } else {
                ScalarValue::Double(number.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(text) => ScalarValue::String(text.clone()),
        other => ScalarValue::String(other.to_string()),
    }
}

fn parse_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn results_wrapper(
    elements: Vec<Value>,
    inline_count: Option<i64>,
    next_link: Option<&str>,
    collection_type: Option<&str>,
) -> Value {
    let mut object = Map::new();
    if let Some(type_name) = collection_type {
        object.insert("__metadata".to_string(), json!({ "type": type_name }));
    }
    object.insert("results".to_string(), Value::Array(elements));
    if let Some(count) = inline_count {
        // Verbose JSON renders the inline count as a string.
        object.insert("__count".to_string(), Value::String(count.to_string()));
    }
    if let Some(next) = next_link {
        object.insert("__next".to_string(), Value::String(next.to_string()));
    }
    Value::Object(object)
}

fn malformed(reason: &str) -> FormatError {
    FormatError::Malformed {
        format: FormatKind::Json,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the verbose-JSON mapping.

    use super::*;

    #[test]
    fn deferred_links_round_trip() {
        let link = PayloadElement::DeferredLink(DeferredLink {
            uri: "https://service.test/Customers(1)/Orders".to_string(),
        });
        let value = element_to_json(&link).expect("serialize");
        let back = json_to_element(&value).expect("deserialize");
        assert_eq!(link, back);
    }

    #[test]
    fn empty_results_become_untyped_collections() {
        let value: Value = serde_json::from_str(r#"{"results": []}"#).expect("valid json");
        let element = json_to_element(&value).expect("deserialize");
        assert!(matches!(
            element,
            PayloadElement::EmptyUntypedCollection(_)
        ));
    }

    #[test]
    fn error_documents_extract_message_and_stack() {
        let value: Value = serde_json::from_str(
            r#"{"error":{"code":"500","message":{"value":"boom"},"innererror":{"stacktrace":"at Service.Get"}}}"#,
        )
        .expect("valid json");
        match json_to_element(&value).expect("deserialize") {
            PayloadElement::Error(error) => {
                assert_eq!(error.code.as_deref(), Some("500"));
                assert_eq!(error.message.as_deref(), Some("boom"));
                assert_eq!(error.stack_trace.as_deref(), Some("at Service.Get"));
            }
            other => panic!("expected an error payload, got {other:?}"),
        }
    }
}
