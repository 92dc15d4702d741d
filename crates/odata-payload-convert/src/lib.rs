#![warn(missing_docs)]
//! # odata-payload-convert
//!
//! ## Purpose
//! Conversion between payload-element trees, flattened named-value sets and
//! strongly typed query values, used for action-parameter binding.
//!
//! ## Responsibilities
//! - Flatten a tree into dot-joined (path, value) pairs in traversal order,
//!   reconciling flattening mappings with in-content properties.
//! - Rebuild a typed [`QueryValue`] from a named-value set against its
//!   expected static type.
//! - Bind the properties of a posted complex instance to the declared
//!   parameters of an action.
//!
//! ## Data flow
//! Tree -> [`to_named_values`] -> `NamedValueSet` -> [`from_named_values`]
//! -> `QueryValue`; or tree property -> [`convert_action_parameters`] ->
//! per-parameter `QueryValue`s.
//!
//! ## Ownership and lifetimes
//! Flattening threads an explicit context (path stack plus output set)
//! through the walk; nothing is shared across invocations.
//!
//! ## Error model
//! Unconvertible elements surface as [`ConvertError`] values carrying the
//! offending element's tag and a rendering of its content; missing or
//! shape-incompatible values carry the structural path.

use thiserror::Error;

use odata_payload_edm::ActionDescriptor;
use odata_payload_literals::render_text;
use odata_payload_model::{
    ComplexInstance, ElementType, EntityInstance, NamedPayloadValue, NamedValue, NamedValueSet,
    PayloadElement, QueryType, QueryValue,
};

/// Flattens a payload tree into ordered (dotted path, value) pairs.
///
/// Depth-first walk: complex and entity properties contribute their name as
/// a path segment, collection elements their zero-based index. Empty
/// collections record a single sentinel at their own path. Entity flattening
/// mappings are recorded before in-content properties, so in-content values
/// win on conflict; after the walk, descendants of null-valued paths are
/// pruned.
///
/// # Errors
/// Returns [`ConvertError::Unconvertible`] for elements with no flattened
/// form (deferred links, link collections, errors).
pub fn to_named_values(payload: &PayloadElement) -> Result<Vec<NamedValue>, ConvertError> {
    let mut context = FlattenContext::default();
    context.element(payload)?;
    context.prune_null_descendants();
    Ok(context.values.into_values())
}

#[derive(Default)]
struct FlattenContext {
    path: Vec<String>,
    values: NamedValueSet,
}

impl FlattenContext {
    fn with_segment<F>(&mut self, segment: &str, action: F) -> Result<(), ConvertError>
    where
        F: FnOnce(&mut Self) -> Result<(), ConvertError>,
    {
        self.path.push(segment.to_string());
        let result = action(self);
        self.path.pop();
        result
    }

    fn current_path(&self) -> String {
        self.path.join(".")
    }

    fn record(&mut self, value: NamedPayloadValue) {
        self.values.set(self.current_path(), value);
    }

    fn element(&mut self, element: &PayloadElement) -> Result<(), ConvertError> {
        if element.is_empty_collection() {
            self.record(NamedPayloadValue::EmptyCollection);
            return Ok(());
        }
        match element {
            PayloadElement::Primitive(primitive) => {
                self.record(NamedPayloadValue::Scalar(primitive.value.clone()));
                Ok(())
            }
            PayloadElement::Complex(complex) => self.properties(&complex.properties),
            PayloadElement::Entity(entity) => self.entity(entity),
            PayloadElement::EntitySet(set) => {
                for (index, entity) in set.entities.iter().enumerate() {
                    self.with_segment(&index.to_string(), |context| context.entity(entity))?;
                }
                Ok(())
            }
            PayloadElement::PrimitiveCollection(collection) => {
                for (index, element) in collection.elements.iter().enumerate() {
                    self.with_segment(&index.to_string(), |context| {
                        context.record(NamedPayloadValue::Scalar(element.value.clone()));
                        Ok(())
                    })?;
                }
                Ok(())
            }
            PayloadElement::ComplexCollection(collection) => {
                for (index, element) in collection.elements.iter().enumerate() {
                    self.with_segment(&index.to_string(), |context| {
                        context.properties(&element.properties)
                    })?;
                }
                Ok(())
            }
            PayloadElement::PrimitiveMultiValue(bag) => {
                for (index, element) in bag.elements.iter().enumerate() {
                    self.with_segment(&index.to_string(), |context| {
                        context.record(NamedPayloadValue::Scalar(element.value.clone()));
                        Ok(())
                    })?;
                }
                Ok(())
            }
            PayloadElement::ComplexMultiValue(bag) => {
                for (index, element) in bag.elements.iter().enumerate() {
                    self.with_segment(&index.to_string(), |context| {
                        context.properties(&element.properties)
                    })?;
                }
                Ok(())
            }
            PayloadElement::EmptyUntypedCollection(_) => {
                self.record(NamedPayloadValue::EmptyCollection);
                Ok(())
            }
            other @ (PayloadElement::LinkCollection(_)
            | PayloadElement::DeferredLink(_)
            | PayloadElement::Error(_)) => Err(unconvertible(other)),
        }
    }

    fn entity(&mut self, entity: &EntityInstance) -> Result<(), ConvertError> {
        // Mapped values land first so same-path in-content values overwrite
        // them while keeping the mapping's slot.
        for mapping in &entity.flattening_mappings {
            if let Some(value) = &mapping.mapped_value {
                let path = self.qualified(&mapping.source_path);
                self.values
                    .set(path, NamedPayloadValue::Scalar(value.clone()));
            }
        }
        self.properties(&entity.properties)
    }

    fn properties(&mut self, properties: &[(String, PayloadElement)]) -> Result<(), ConvertError> {
        for (name, value) in properties {
            self.with_segment(name, |context| context.element(value))?;
        }
        Ok(())
    }

    fn qualified(&self, relative: &str) -> String {
        if self.path.is_empty() {
            relative.to_string()
        } else {
            format!("{}.{relative}", self.current_path())
        }
    }

    fn prune_null_descendants(&mut self) {
        let null_parents: Vec<String> = self
            .values
            .iter()
            .filter(|entry| entry.value.is_null())
            .map(|entry| entry.path.clone())
            .collect();
        for parent in null_parents {
            self.values.remove_descendants_of(&parent);
        }
    }
}

/// Rebuilds a typed query value from a flattened set.
///
/// The target type drives the top-level shape; nested shapes below a complex
/// target are inferred from the recorded paths (numeric child segments mean
/// a collection).
///
/// # Errors
/// Returns [`ConvertError::MissingValue`] when a required path is absent and
/// [`ConvertError::ShapeMismatch`] when the recorded values cannot take the
/// expected shape.
pub fn from_named_values(
    values: &NamedValueSet,
    target: &QueryType,
) -> Result<QueryValue, ConvertError> {
    rebuild(values, "", target)
}

fn rebuild(
    values: &NamedValueSet,
    prefix: &str,
    target: &QueryType,
) -> Result<QueryValue, ConvertError> {
    match target {
        QueryType::Primitive(_) => match values.get(prefix) {
            Some(NamedPayloadValue::Scalar(scalar)) => Ok(QueryValue::Scalar(scalar.clone())),
            Some(NamedPayloadValue::EmptyCollection) => Err(ConvertError::ShapeMismatch {
                path: prefix.to_string(),
                expected: "a scalar".to_string(),
            }),
            None => Err(ConvertError::MissingValue {
                path: prefix.to_string(),
            }),
        },
        QueryType::Collection(inner) => {
            if let Some(NamedPayloadValue::EmptyCollection) = values.get(prefix) {
                return Ok(QueryValue::Collection(Vec::new()));
            }
            let segments = child_segments(values, prefix);
            if segments.is_empty() {
                return Err(ConvertError::MissingValue {
                    path: prefix.to_string(),
                });
            }
            let mut elements = Vec::with_capacity(segments.len());
            for (position, segment) in segments.iter().enumerate() {
                if segment.parse::<usize>() != Ok(position) {
                    return Err(ConvertError::ShapeMismatch {
                        path: join(prefix, segment),
                        expected: format!("collection index {position}"),
                    });
                }
                elements.push(rebuild(values, &join(prefix, segment), inner)?);
            }
            Ok(QueryValue::Collection(elements))
        }
        QueryType::Complex(type_name) => {
            let record = rebuild_inferred(values, prefix)?;
            match record {
                QueryValue::Record { properties, .. } => Ok(QueryValue::Record {
                    type_name: Some(type_name.clone()),
                    properties,
                }),
                _ => Err(ConvertError::ShapeMismatch {
                    path: prefix.to_string(),
                    expected: format!("a {type_name} record"),
                }),
            }
        }
    }
}

// Below a complex target the member types are unknown; the recorded paths
// decide the shape.
fn rebuild_inferred(values: &NamedValueSet, prefix: &str) -> Result<QueryValue, ConvertError> {
    if let Some(value) = values.get(prefix) {
        return match value {
            NamedPayloadValue::Scalar(scalar) => Ok(QueryValue::Scalar(scalar.clone())),
            NamedPayloadValue::EmptyCollection => Ok(QueryValue::Collection(Vec::new())),
        };
    }
    let segments = child_segments(values, prefix);
    if segments.is_empty() {
        return Err(ConvertError::MissingValue {
            path: prefix.to_string(),
        });
    }
    let indexed = segments
        .iter()
        .all(|segment| segment.parse::<usize>().is_ok());
    if indexed {
        let mut elements = Vec::with_capacity(segments.len());
        for (position, segment) in segments.iter().enumerate() {
            if segment.parse::<usize>() != Ok(position) {
                return Err(ConvertError::ShapeMismatch {
                    path: join(prefix, segment),
                    expected: format!("collection index {position}"),
                });
            }
            elements.push(rebuild_inferred(values, &join(prefix, segment))?);
        }
        Ok(QueryValue::Collection(elements))
    } else {
        let mut properties = Vec::with_capacity(segments.len());
        for segment in &segments {
            properties.push((
                segment.clone(),
                rebuild_inferred(values, &join(prefix, segment))?,
            ));
        }
        Ok(QueryValue::Record {
            type_name: None,
            properties,
        })
    }
}

fn child_segments(values: &NamedValueSet, prefix: &str) -> Vec<String> {
    let scope = if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}.")
    };
    let mut segments: Vec<String> = Vec::new();
    for entry in values.iter() {
        let Some(remainder) = entry.path.strip_prefix(&scope) else {
            continue;
        };
        if remainder.is_empty() {
            continue;
        }
        let segment = remainder.split('.').next().unwrap_or(remainder);
        if !segments.iter().any(|seen| seen == segment) {
            segments.push(segment.to_string());
        }
    }
    segments
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

/// Binds the properties of a posted complex instance to the declared
/// parameters of an action.
///
/// Each declared parameter must match exactly one same-named payload
/// property; the property's element is converted by the sub-converter for
/// its tag and checked against the parameter's declared shape.
///
/// # Errors
/// Returns [`ConvertError::MissingParameter`] or
/// [`ConvertError::AmbiguousParameter`] for match-count violations,
/// [`ConvertError::Unconvertible`] when no sub-converter handles the
/// element's tag, and [`ConvertError::ShapeMismatch`] when the converted
/// value contradicts the declared type.
pub fn convert_action_parameters(
    payload: &ComplexInstance,
    action: &ActionDescriptor,
) -> Result<Vec<(String, QueryValue)>, ConvertError> {
    let mut bound = Vec::with_capacity(action.parameters.len());
    for parameter in &action.parameters {
        let mut matches = payload
            .properties
            .iter()
            .filter(|(name, _)| name == &parameter.name);
        let (_, element) = matches.next().ok_or_else(|| ConvertError::MissingParameter {
            name: parameter.name.clone(),
        })?;
        if matches.next().is_some() {
            return Err(ConvertError::AmbiguousParameter {
                name: parameter.name.clone(),
            });
        }
        let value = element_to_query_value(element)?;
        check_shape(&value, &parameter.value_type, &parameter.name)?;
        bound.push((parameter.name.clone(), value));
    }
    Ok(bound)
}

/// Converts one payload element into a query value by its tag.
///
/// # Errors
/// Returns [`ConvertError::Unconvertible`] for tags with no query-value
/// form (entities, feeds, links, errors).
pub fn element_to_query_value(element: &PayloadElement) -> Result<QueryValue, ConvertError> {
    match element {
        PayloadElement::Primitive(primitive) => Ok(QueryValue::Scalar(primitive.value.clone())),
        PayloadElement::Complex(complex) => complex_to_record(complex),
        PayloadElement::PrimitiveMultiValue(bag) => Ok(QueryValue::Collection(
            bag.elements
                .iter()
                .map(|element| QueryValue::Scalar(element.value.clone()))
                .collect(),
        )),
        PayloadElement::ComplexMultiValue(bag) => Ok(QueryValue::Collection(
            bag.elements
                .iter()
                .map(complex_to_record)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        PayloadElement::PrimitiveCollection(collection) => Ok(QueryValue::Collection(
            collection
                .elements
                .iter()
                .map(|element| QueryValue::Scalar(element.value.clone()))
                .collect(),
        )),
        PayloadElement::ComplexCollection(collection) => Ok(QueryValue::Collection(
            collection
                .elements
                .iter()
                .map(complex_to_record)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        PayloadElement::EmptyUntypedCollection(_) => Ok(QueryValue::Collection(Vec::new())),
        other => Err(unconvertible(other)),
    }
}

fn complex_to_record(complex: &ComplexInstance) -> Result<QueryValue, ConvertError> {
    let mut properties = Vec::with_capacity(complex.properties.len());
    for (name, value) in &complex.properties {
        properties.push((name.clone(), element_to_query_value(value)?));
    }
    Ok(QueryValue::Record {
        type_name: complex.type_name.clone(),
        properties,
    })
}

fn check_shape(value: &QueryValue, target: &QueryType, name: &str) -> Result<(), ConvertError> {
    let compatible = matches!(
        (value, target),
        (QueryValue::Scalar(_), QueryType::Primitive(_))
            | (QueryValue::Record { .. }, QueryType::Complex(_))
            | (QueryValue::Collection(_), QueryType::Collection(_))
    );
    if compatible {
        Ok(())
    } else {
        Err(ConvertError::ShapeMismatch {
            path: name.to_string(),
            expected: format!("{target:?}"),
        })
    }
}

fn unconvertible(element: &PayloadElement) -> ConvertError {
    ConvertError::Unconvertible {
        element: element.element_type(),
        content: render_content(element),
    }
}

fn render_content(element: &PayloadElement) -> String {
    match element {
        PayloadElement::Primitive(primitive) if !primitive.is_null() => {
            render_text(&primitive.value)
        }
        other => format!("{other:?}"),
    }
}

/// Errors produced by named-value and query-value conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The element's tag has no conversion.
    #[error("a {element:?} element cannot be converted: {content}")]
    Unconvertible {
        /// Tag of the offending element.
        element: ElementType,
        /// Rendering of the element's content for diagnosis.
        content: String,
    },
    /// No value was recorded where the target type requires one.
    #[error("no value recorded at `{path}`")]
    MissingValue {
        /// Path the rebuild expected a value at.
        path: String,
    },
    /// The recorded values cannot take the expected shape.
    #[error("value at `{path}` cannot be read as {expected}")]
    ShapeMismatch {
        /// Path of the incompatible value.
        path: String,
        /// Shape the target type expected.
        expected: String,
    },
    /// A declared action parameter has no same-named payload property.
    #[error("no payload property matches parameter `{name}`")]
    MissingParameter {
        /// Declared parameter name.
        name: String,
    },
    /// A declared action parameter matched more than one payload property.
    #[error("more than one payload property matches parameter `{name}`")]
    AmbiguousParameter {
        /// Declared parameter name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    //! Unit tests for flattening and rebuilding.

    use super::*;
    use odata_payload_edm::ActionParameter;
    use odata_payload_model::{
        FlatteningMapping, PrimitiveCollection, PrimitiveValue, ScalarValue,
    };

    fn address() -> ComplexInstance {
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

    #[test]
    fn flattening_preserves_traversal_order() {
        let tree = PayloadElement::Complex(
            ComplexInstance::new(None)
                .with_property(
                    "Name",
                    PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::String(
                        "A".to_string(),
                    ))),
                )
                .with_property("Nested", PayloadElement::Complex(address()))
                .with_property(
                    "Tags",
                    PayloadElement::PrimitiveCollection(PrimitiveCollection::default()),
                ),
        );
        let values = to_named_values(&tree).expect("flatten");
        let paths: Vec<&str> = values.iter().map(|entry| entry.path.as_str()).collect();
        assert_eq!(paths, vec!["Name", "Nested.City", "Nested.Zip", "Tags"]);
        assert_eq!(values[3].value, NamedPayloadValue::EmptyCollection);
    }

    #[test]
    fn in_content_values_win_over_mappings() {
        let mut entity = EntityInstance::new(Some("Model.Customer".to_string()));
        entity.flattening_mappings.push(FlatteningMapping {
            source_path: "Name".to_string(),
            target_slot: "SyndicationTitle".to_string(),
            keep_in_content: false,
            min_version: Default::default(),
            mapped_value: Some(ScalarValue::String("mapped".to_string())),
        });
        entity.properties.push((
            "Name".to_string(),
            PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::String(
                "in-content".to_string(),
            ))),
        ));
        let values = to_named_values(&PayloadElement::Entity(entity)).expect("flatten");
        assert_eq!(values.len(), 1);
        assert_eq!(
            values[0].value,
            NamedPayloadValue::Scalar(ScalarValue::String("in-content".to_string()))
        );
    }

    #[test]
    fn null_parents_prune_their_descendants() {
        let mut entity = EntityInstance::new(None);
        entity.flattening_mappings.push(FlatteningMapping {
            source_path: "Address.City".to_string(),
            target_slot: "SyndicationSummary".to_string(),
            keep_in_content: true,
            min_version: Default::default(),
            mapped_value: Some(ScalarValue::String("Redmond".to_string())),
        });
        entity.properties.push((
            "Address".to_string(),
            PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::Null)),
        ));
        let values = to_named_values(&PayloadElement::Entity(entity)).expect("flatten");
        let paths: Vec<&str> = values.iter().map(|entry| entry.path.as_str()).collect();
        assert_eq!(paths, vec!["Address"]);
    }

    #[test]
    fn rebuild_follows_the_target_shape() {
        let tree = PayloadElement::Complex(address());
        let mut set = NamedValueSet::new();
        for value in to_named_values(&tree).expect("flatten") {
            set.set(value.path, value.value);
        }
        let rebuilt = from_named_values(&set, &QueryType::Complex("Model.Address".to_string()))
            .expect("rebuild");
        assert_eq!(
            rebuilt.property("City"),
            Some(&QueryValue::Scalar(ScalarValue::String(
                "Redmond".to_string()
            )))
        );
        from_named_values(&set, &QueryType::Primitive("Edm.Int32".to_string()))
            .expect_err("a record is not a scalar");
    }

    #[test]
    fn action_parameters_bind_by_name_exactly_once() {
        let action = ActionDescriptor {
            name: "RateProduct".to_string(),
            parameters: vec![
                ActionParameter {
                    name: "rating".to_string(),
                    value_type: QueryType::Primitive("Edm.Int32".to_string()),
                },
                ActionParameter {
                    name: "address".to_string(),
                    value_type: QueryType::Complex("Model.Address".to_string()),
                },
            ],
        };
        let payload = ComplexInstance::new(None)
            .with_property(
                "rating",
                PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::Int32(4))),
            )
            .with_property("address", PayloadElement::Complex(address()));
        let bound = convert_action_parameters(&payload, &action).expect("bind");
        assert_eq!(bound.len(), 2);
        assert_eq!(
            bound[0],
            (
                "rating".to_string(),
                QueryValue::Scalar(ScalarValue::Int32(4))
            )
        );

        let missing = ComplexInstance::new(None);
        assert!(matches!(
            convert_action_parameters(&missing, &action),
            Err(ConvertError::MissingParameter { .. })
        ));
    }
}
