#![warn(missing_docs)]
//! # odata-payload-model
//!
//! ## Purpose
//! Defines the format-neutral payload-element tree and value types shared by
//! every crate in the `odata-payload` workspace.
//!
//! ## Responsibilities
//! - Represent OData payloads as a tagged-variant tree ([`PayloadElement`]).
//! - Model typed scalar values and nullable primitives.
//! - Provide ordered named-value sets used for tree flattening.
//! - Define query values/types for action-parameter binding.
//! - Define payload option flags and the ordered protocol version.
//!
//! ## Data flow
//! Deserializers produce [`PayloadElement`] trees; normalizers rewrite them;
//! comparers and the named-value converter consume them. All instances live
//! for one request/response processing pass and are then discarded.
//!
//! ## Ownership and lifetimes
//! Every node owns its children and string/byte buffers outright, so trees can
//! be moved between pipeline stages without borrow coupling.
//!
//! ## Error model
//! This crate favors total constructors over recoverable errors; invalid
//! combinations are prevented by the variant structure itself.

mod element;
mod named;
mod options;
mod query;
mod value;
mod version;

pub use element::{
    CollectionKind, ComplexCollection, ComplexInstance, ComplexMultiValue, DeferredLink,
    ElementType, EmptyUntypedCollection, EntityInstance, EntitySetInstance, ErrorPayload,
    FlatteningMapping, LinkCollection, PayloadElement, PrimitiveCollection, PrimitiveMultiValue,
};
pub use named::{NamedPayloadValue, NamedValue, NamedValueSet};
pub use options::ODataPayloadOptions;
pub use query::{QueryType, QueryValue};
pub use value::{PrimitiveValue, ScalarValue};
pub use version::ProtocolVersion;
