//! Structure-preserving tree normalization applied before comparison.

use odata_payload_model::{
    CollectionKind, ComplexCollection, ComplexInstance, EntityInstance, EntitySetInstance,
    LinkCollection, PayloadElement, PrimitiveCollection, PrimitiveValue, ScalarValue,
};

/// Rewrites a deserialized tree to resolve format ambiguities.
///
/// Two responsibilities: empty untyped collections are replaced by the
/// concrete collection variant their recorded hint names, and primitive
/// values are coerced toward their declared type annotation. When neither
/// scalar coercion nor the geometry-to-geography fallback applies the value
/// passes through unchanged; downstream comparison catches real mismatches.
pub fn normalize_tree(element: PayloadElement) -> PayloadElement {
    match element {
        PayloadElement::Primitive(primitive) => {
            PayloadElement::Primitive(normalize_primitive(primitive))
        }
        PayloadElement::Complex(complex) => PayloadElement::Complex(normalize_complex(complex)),
        PayloadElement::Entity(entity) => PayloadElement::Entity(normalize_entity(entity)),
        PayloadElement::EntitySet(set) => PayloadElement::EntitySet(EntitySetInstance {
            entities: set.entities.into_iter().map(normalize_entity).collect(),
            inline_count: set.inline_count,
            next_link: set.next_link,
        }),
        PayloadElement::PrimitiveCollection(collection) => {
            PayloadElement::PrimitiveCollection(PrimitiveCollection {
                elements: collection
                    .elements
                    .into_iter()
                    .map(normalize_primitive)
                    .collect(),
                inline_count: collection.inline_count,
                next_link: collection.next_link,
            })
        }
        PayloadElement::ComplexCollection(collection) => {
            PayloadElement::ComplexCollection(ComplexCollection {
                elements: collection
                    .elements
                    .into_iter()
                    .map(normalize_complex)
                    .collect(),
                inline_count: collection.inline_count,
                next_link: collection.next_link,
            })
        }
        PayloadElement::PrimitiveMultiValue(mut bag) => {
            bag.elements = bag.elements.into_iter().map(normalize_primitive).collect();
            PayloadElement::PrimitiveMultiValue(bag)
        }
        PayloadElement::ComplexMultiValue(mut bag) => {
            bag.elements = bag.elements.into_iter().map(normalize_complex).collect();
            PayloadElement::ComplexMultiValue(bag)
        }
        PayloadElement::EmptyUntypedCollection(empty) => resolve_empty_collection(empty.kind_hint),
        // Links and errors have no format-ambiguous content.
        other @ (PayloadElement::LinkCollection(_)
        | PayloadElement::DeferredLink(_)
        | PayloadElement::Error(_)) => other,
    }
}

fn resolve_empty_collection(hint: Option<CollectionKind>) -> PayloadElement {
    match hint {
        Some(CollectionKind::Primitive) => {
            PayloadElement::PrimitiveCollection(PrimitiveCollection::default())
        }
        Some(CollectionKind::Complex) => {
            PayloadElement::ComplexCollection(ComplexCollection::default())
        }
        Some(CollectionKind::Entity) => PayloadElement::EntitySet(EntitySetInstance::default()),
        Some(CollectionKind::Link) => PayloadElement::LinkCollection(LinkCollection::default()),
        // Without a hint the ambiguity is left for the comparer to report.
        None => PayloadElement::EmptyUntypedCollection(Default::default()),
    }
}

fn normalize_complex(mut complex: ComplexInstance) -> ComplexInstance {
    complex.properties = complex
        .properties
        .into_iter()
        .map(|(name, value)| (name, normalize_tree(value)))
        .collect();
    complex
}

fn normalize_entity(mut entity: EntityInstance) -> EntityInstance {
    entity.properties = entity
        .properties
        .into_iter()
        .map(|(name, value)| (name, normalize_tree(value)))
        .collect();
    entity
}

/// Coerces a primitive toward its declared type annotation.
pub fn normalize_primitive(primitive: PrimitiveValue) -> PrimitiveValue {
    let PrimitiveValue { type_name, value } = primitive;
    let coerced = match &type_name {
        Some(target) => coerce_scalar(target, &value).unwrap_or(value),
        None => value,
    };
    PrimitiveValue {
        type_name,
        value: coerced,
    }
}

/// Attempts to convert `value` to the scalar shape `target` names.
///
/// Returns `None` when no coercion applies; callers keep the original value
/// in that case.
pub fn coerce_scalar(target: &str, value: &ScalarValue) -> Option<ScalarValue> {
    if value.is_null() {
        return None;
    }
    if value.implied_type_name() == Some(target) {
        return None;
    }

    match target {
        "Edm.Int32" => match value {
            ScalarValue::Int64(number) => i32::try_from(*number).ok().map(ScalarValue::Int32),
            ScalarValue::String(text) => text.parse().ok().map(ScalarValue::Int32),
            _ => None,
        },
        "Edm.Int64" => match value {
            ScalarValue::Int32(number) => Some(ScalarValue::Int64(i64::from(*number))),
            ScalarValue::String(text) => text.parse().ok().map(ScalarValue::Int64),
            _ => None,
        },
        "Edm.Single" => match value {
            ScalarValue::Int32(number) => Some(ScalarValue::Single(*number as f32)),
            ScalarValue::Int64(number) => Some(ScalarValue::Single(*number as f32)),
            ScalarValue::Double(number) => Some(ScalarValue::Single(*number as f32)),
            ScalarValue::String(text) => parse_float_text(text).map(|d| ScalarValue::Single(d as f32)),
            _ => None,
        },
        "Edm.Double" => match value {
            ScalarValue::Int32(number) => Some(ScalarValue::Double(f64::from(*number))),
            ScalarValue::Int64(number) => Some(ScalarValue::Double(*number as f64)),
            ScalarValue::Single(number) => Some(ScalarValue::Double(f64::from(*number))),
            ScalarValue::String(text) => parse_float_text(text).map(ScalarValue::Double),
            _ => None,
        },
        "Edm.Decimal" => match value {
            ScalarValue::Int32(number) => Some(ScalarValue::Decimal(number.to_string())),
            ScalarValue::Int64(number) => Some(ScalarValue::Decimal(number.to_string())),
            ScalarValue::Double(number) => Some(ScalarValue::Decimal(number.to_string())),
            ScalarValue::String(text) => text
                .parse::<f64>()
                .ok()
                .map(|_| ScalarValue::Decimal(text.clone())),
            _ => None,
        },
        "Edm.Boolean" => match value {
            ScalarValue::String(text) => match text.as_str() {
                "true" => Some(ScalarValue::Boolean(true)),
                "false" => Some(ScalarValue::Boolean(false)),
                _ => None,
            },
            _ => None,
        },
        "Edm.Guid" => match value {
            ScalarValue::String(text) => Some(ScalarValue::Guid(text.clone())),
            _ => None,
        },
        "Edm.DateTime" => match value {
            ScalarValue::String(text) => Some(ScalarValue::DateTime(text.clone())),
            _ => None,
        },
        "Edm.DateTimeOffset" => match value {
            ScalarValue::String(text) => Some(ScalarValue::DateTimeOffset(text.clone())),
            _ => None,
        },
        "Edm.Time" => match value {
            ScalarValue::String(text) => Some(ScalarValue::Duration(text.clone())),
            _ => None,
        },
        "Edm.Binary" => match value {
            ScalarValue::String(text) => hex::decode(text).ok().map(ScalarValue::Binary),
            _ => None,
        },
        "Edm.String" => match value {
            ScalarValue::Guid(text)
            | ScalarValue::DateTime(text)
            | ScalarValue::DateTimeOffset(text)
            | ScalarValue::Duration(text) => Some(ScalarValue::String(text.clone())),
            _ => None,
        },
        "Edm.Geometry" => match value {
            ScalarValue::String(text) => Some(ScalarValue::Geometry(text.clone())),
            _ => None,
        },
        "Edm.Geography" => match value {
            ScalarValue::String(text) => Some(ScalarValue::Geography(text.clone())),
            // A value parsed as geometry satisfies a geography expectation;
            // coordinate order is format-defined and is not reordered here.
            ScalarValue::Geometry(text) => Some(ScalarValue::Geography(text.clone())),
            _ => None,
        },
        _ => None,
    }
}

fn parse_float_text(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}
