//! The tagged-variant payload-element tree.

use serde::{Deserialize, Serialize};

use crate::value::{PrimitiveValue, ScalarValue};
use crate::version::ProtocolVersion;

/// Tag identifying the variant of a [`PayloadElement`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    /// Typed nullable scalar.
    Primitive,
    /// Named-property record without identity.
    Complex,
    /// Entity with identity/link/stream metadata.
    Entity,
    /// Collection of entities (a feed).
    EntitySet,
    /// Collection of primitives.
    PrimitiveCollection,
    /// Collection of complex instances.
    ComplexCollection,
    /// Collection of deferred links.
    LinkCollection,
    /// Bag of primitives (ordered multi-value).
    PrimitiveMultiValue,
    /// Bag of complex instances (ordered multi-value).
    ComplexMultiValue,
    /// Unexpanded navigation link.
    DeferredLink,
    /// In-payload error document.
    Error,
    /// Empty collection whose concrete kind is not yet known.
    EmptyUntypedCollection,
}

/// Concrete collection kind recorded on an [`EmptyUntypedCollection`] from
/// sibling annotations, so a normalizer can resolve the ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Resolves to [`PrimitiveCollection`].
    Primitive,
    /// Resolves to [`ComplexCollection`].
    Complex,
    /// Resolves to [`EntitySetInstance`].
    Entity,
    /// Resolves to [`LinkCollection`].
    Link,
}

/// Named-property record, optionally carrying a declared complex type name.
///
/// Property order is declaration order and is preserved through every
/// transformation; order-insensitivity is a comparer concern, never a model
/// concern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplexInstance {
    /// Declared complex type name.
    pub type_name: Option<String>,
    /// Ordered named properties.
    pub properties: Vec<(String, PayloadElement)>,
}

impl ComplexInstance {
    /// Creates an empty complex instance with an optional type name.
    pub fn new(type_name: Option<String>) -> Self {
        Self {
            type_name,
            properties: Vec::new(),
        }
    }

    /// Appends a property, builder style.
    pub fn with_property(mut self, name: impl Into<String>, value: PayloadElement) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    /// Returns the first property with the given name.
    pub fn property(&self, name: &str) -> Option<&PayloadElement> {
        self.properties
            .iter()
            .find(|(property, _)| property == name)
            .map(|(_, value)| value)
    }

    /// Returns how many properties carry the given name.
    pub fn property_count(&self, name: &str) -> usize {
        self.properties
            .iter()
            .filter(|(property, _)| property == name)
            .count()
    }
}

/// Declared flattening ("EPM") mapping attached to an entity.
///
/// A mapping relocates the value at `source_path` into an out-of-content slot
/// (`target_slot`); when `keep_in_content` is false the value exists only in
/// the mapped slot and raises the minimum protocol version of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatteningMapping {
    /// Dotted structural path of the mapped property.
    pub source_path: String,
    /// Name of the out-of-content slot the value is serialized into.
    pub target_slot: String,
    /// Whether the value also remains in the structural content.
    pub keep_in_content: bool,
    /// Minimum protocol version this mapping requires.
    pub min_version: ProtocolVersion,
    /// Value observed in the mapped slot, when the payload carried one.
    pub mapped_value: Option<ScalarValue>,
}

/// Entity node: complex shape plus identity, links and stream metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityInstance {
    /// Declared entity type name.
    pub type_name: Option<String>,
    /// Entity id URI.
    pub id: Option<String>,
    /// Edit link URI.
    pub edit_link: Option<String>,
    /// Entity tag for concurrency control.
    pub etag: Option<String>,
    /// Media-resource read link, for media-link entries.
    pub stream_source_link: Option<String>,
    /// Media-resource edit link, for media-link entries.
    pub stream_edit_link: Option<String>,
    /// Ordered named properties, including navigation links.
    pub properties: Vec<(String, PayloadElement)>,
    /// Declared flattening mappings for this entity.
    pub flattening_mappings: Vec<FlatteningMapping>,
}

impl EntityInstance {
    /// Creates an empty entity with an optional type name.
    pub fn new(type_name: Option<String>) -> Self {
        Self {
            type_name,
            ..Self::default()
        }
    }

    /// Appends a property, builder style.
    pub fn with_property(mut self, name: impl Into<String>, value: PayloadElement) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    /// Returns the first property with the given name.
    pub fn property(&self, name: &str) -> Option<&PayloadElement> {
        self.properties
            .iter()
            .find(|(property, _)| property == name)
            .map(|(_, value)| value)
    }
}

/// Ordered collection of entities with feed-level metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntitySetInstance {
    /// Entities in document order.
    pub entities: Vec<EntityInstance>,
    /// Inline count, when the feed declared one.
    pub inline_count: Option<i64>,
    /// Next-page link, when the feed declared one.
    pub next_link: Option<String>,
}

/// Ordered collection of primitive values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimitiveCollection {
    /// Values in document order.
    pub elements: Vec<PrimitiveValue>,
    /// Inline count, when the payload declared one.
    pub inline_count: Option<i64>,
    /// Next-page link, when the payload declared one.
    pub next_link: Option<String>,
}

/// Ordered collection of complex instances.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplexCollection {
    /// Instances in document order.
    pub elements: Vec<ComplexInstance>,
    /// Inline count, when the payload declared one.
    pub inline_count: Option<i64>,
    /// Next-page link, when the payload declared one.
    pub next_link: Option<String>,
}

/// Ordered collection of deferred links.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkCollection {
    /// Links in document order.
    pub links: Vec<DeferredLink>,
    /// Inline count, when the payload declared one.
    pub inline_count: Option<i64>,
    /// Next-page link, when the payload declared one.
    pub next_link: Option<String>,
}

/// Ordered bag of primitive values with a declared collection type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimitiveMultiValue {
    /// Declared `Collection(...)` type name.
    pub type_name: Option<String>,
    /// Values in document order.
    pub elements: Vec<PrimitiveValue>,
}

/// Ordered bag of complex instances with a declared collection type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplexMultiValue {
    /// Declared `Collection(...)` type name.
    pub type_name: Option<String>,
    /// Instances in document order.
    pub elements: Vec<ComplexInstance>,
}

/// Unexpanded navigation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredLink {
    /// Target URI of the link.
    pub uri: String,
}

/// In-payload error document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Service-defined error code.
    pub code: Option<String>,
    /// Human-readable error message.
    pub message: Option<String>,
    /// Server stack trace, when the service exposes one.
    pub stack_trace: Option<String>,
}

/// Empty collection whose concrete kind could not be read off the wire.
///
/// Some formats cannot distinguish empty collection kinds without metadata;
/// the optional hint records what sibling annotations implied so a normalizer
/// can resolve the node before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmptyUntypedCollection {
    /// Collection kind implied by sibling annotations, when known.
    pub kind_hint: Option<CollectionKind>,
}

/// Format-neutral payload tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PayloadElement {
    /// Typed nullable scalar.
    Primitive(PrimitiveValue),
    /// Named-property record.
    Complex(ComplexInstance),
    /// Entity with identity metadata.
    Entity(EntityInstance),
    /// Feed of entities.
    EntitySet(EntitySetInstance),
    /// Collection of primitives.
    PrimitiveCollection(PrimitiveCollection),
    /// Collection of complex instances.
    ComplexCollection(ComplexCollection),
    /// Collection of deferred links.
    LinkCollection(LinkCollection),
    /// Bag of primitives.
    PrimitiveMultiValue(PrimitiveMultiValue),
    /// Bag of complex instances.
    ComplexMultiValue(ComplexMultiValue),
    /// Unexpanded navigation link.
    DeferredLink(DeferredLink),
    /// Error document.
    Error(ErrorPayload),
    /// Empty collection awaiting kind resolution.
    EmptyUntypedCollection(EmptyUntypedCollection),
}

impl PayloadElement {
    /// Returns the variant tag of this node.
    pub fn element_type(&self) -> ElementType {
        match self {
            PayloadElement::Primitive(_) => ElementType::Primitive,
            PayloadElement::Complex(_) => ElementType::Complex,
            PayloadElement::Entity(_) => ElementType::Entity,
            PayloadElement::EntitySet(_) => ElementType::EntitySet,
            PayloadElement::PrimitiveCollection(_) => ElementType::PrimitiveCollection,
            PayloadElement::ComplexCollection(_) => ElementType::ComplexCollection,
            PayloadElement::LinkCollection(_) => ElementType::LinkCollection,
            PayloadElement::PrimitiveMultiValue(_) => ElementType::PrimitiveMultiValue,
            PayloadElement::ComplexMultiValue(_) => ElementType::ComplexMultiValue,
            PayloadElement::DeferredLink(_) => ElementType::DeferredLink,
            PayloadElement::Error(_) => ElementType::Error,
            PayloadElement::EmptyUntypedCollection(_) => ElementType::EmptyUntypedCollection,
        }
    }

    /// Returns `true` when this node is a collection variant with no elements.
    ///
    /// A declared inline count is authoritative over the element list, since
    /// a paged payload may carry a count without carrying elements.
    pub fn is_empty_collection(&self) -> bool {
        fn empty(len: usize, inline_count: Option<i64>) -> bool {
            match inline_count {
                Some(count) => count == 0,
                None => len == 0,
            }
        }

        match self {
            PayloadElement::EntitySet(set) => empty(set.entities.len(), set.inline_count),
            PayloadElement::PrimitiveCollection(collection) => {
                empty(collection.elements.len(), collection.inline_count)
            }
            PayloadElement::ComplexCollection(collection) => {
                empty(collection.elements.len(), collection.inline_count)
            }
            PayloadElement::LinkCollection(collection) => {
                empty(collection.links.len(), collection.inline_count)
            }
            PayloadElement::PrimitiveMultiValue(bag) => bag.elements.is_empty(),
            PayloadElement::ComplexMultiValue(bag) => bag.elements.is_empty(),
            PayloadElement::EmptyUntypedCollection(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for element tags and emptiness checks.

    use super::*;

    #[test]
    fn inline_count_is_authoritative_for_emptiness() {
        let counted = PayloadElement::PrimitiveCollection(PrimitiveCollection {
            elements: Vec::new(),
            inline_count: Some(12),
            next_link: None,
        });
        assert!(!counted.is_empty_collection());

        let uncounted = PayloadElement::PrimitiveCollection(PrimitiveCollection::default());
        assert!(uncounted.is_empty_collection());
    }

    #[test]
    fn every_variant_reports_its_tag() {
        let entity = PayloadElement::Entity(EntityInstance::new(None));
        assert_eq!(entity.element_type(), ElementType::Entity);
        let empty = PayloadElement::EmptyUntypedCollection(EmptyUntypedCollection::default());
        assert_eq!(empty.element_type(), ElementType::EmptyUntypedCollection);
    }
}
