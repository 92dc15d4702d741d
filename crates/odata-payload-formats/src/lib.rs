#![warn(missing_docs)]
//! # odata-payload-formats
//!
//! ## Purpose
//! Implements the wire-format strategies of the payload abstraction layer:
//! serialization, deserialization, normalization and scalar comparison for
//! each supported content type, plus the strategy selector.
//!
//! ## Responsibilities
//! - Route (content type, request URI) pairs to a concrete strategy.
//! - Convert payload-element trees to and from XML/Atom, verbose JSON, raw
//!   text, raw binary and HTML-form bodies.
//! - Normalize deserialized trees so they compare independently of
//!   format-specific encoding quirks.
//! - Supply the per-format scalar comparer used by structural comparison.
//!
//! ## Data flow
//! HTTP body bytes -> [`select_strategy`] -> [`FormatStrategy::deserialize`]
//! -> tree -> [`FormatStrategy::normalize`] -> comparer or converter. The
//! reverse path serializes a tree back to bytes.
//!
//! ## Ownership and lifetimes
//! Strategies are stateless; all per-call working state is confined to one
//! invocation, so one strategy instance can serve concurrent exchanges.
//!
//! ## Error model
//! Operations meaningless for a format fail with [`FormatError::Unsupported`];
//! malformed bodies and unrepresentable elements fail with variants carrying
//! the format and the offending detail.

use thiserror::Error;

use odata_payload_edm::ODataUri;
use odata_payload_model::{ElementType, PayloadElement};

mod binary;
mod html_form;
mod json;
pub mod normalize;
mod scalar;
mod text;
mod xml;

pub use binary::BinaryStrategy;
pub use html_form::HtmlFormStrategy;
pub use json::{JsonStrategy, element_to_json, json_to_element};
pub use scalar::{ScalarComparer, ScalarMismatch};
pub use text::{CountStrategy, TextValueStrategy};
pub use xml::XmlStrategy;

/// Identifies a wire-format strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Atom/XML.
    Xml,
    /// Verbose JSON.
    Json,
    /// Raw text (`$value` of non-binary primitives).
    Text,
    /// Raw binary (`$value` of streams and media resources).
    Binary,
    /// `$count` plain-text integer.
    Count,
    /// `application/x-www-form-urlencoded` bodies.
    HtmlForm,
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormatKind::Xml => "xml",
            FormatKind::Json => "json",
            FormatKind::Text => "text",
            FormatKind::Binary => "binary",
            FormatKind::Count => "count",
            FormatKind::HtmlForm => "html-form",
        };
        formatter.write_str(name)
    }
}

/// Per-call deserialization context.
#[derive(Debug, Clone, Default)]
pub struct DeserializeContext {
    /// Content type the body was declared with, when known.
    pub content_type: Option<String>,
}

/// One wire-format strategy: a serializer, deserializer, normalizer and
/// scalar comparer for a single format.
pub trait FormatStrategy {
    /// Returns the format this strategy implements.
    fn kind(&self) -> FormatKind;

    /// Serializes a payload tree to body bytes.
    ///
    /// # Errors
    /// Returns [`FormatError::Unsupported`] when the format has no serialized
    /// form, [`FormatError::UnsupportedElement`] when the tree cannot be
    /// represented, and [`FormatError::UnsupportedEncoding`] for encodings
    /// other than the utf-8 family.
    fn serialize(&self, payload: &PayloadElement, encoding: &str) -> Result<Vec<u8>, FormatError>;

    /// Deserializes body bytes into a payload tree.
    ///
    /// # Errors
    /// Returns [`FormatError::Unsupported`] when the format cannot be read
    /// back, or [`FormatError::Malformed`] for undecodable bodies.
    fn deserialize(
        &self,
        raw: &[u8],
        context: &DeserializeContext,
    ) -> Result<PayloadElement, FormatError>;

    /// Rewrites a deserialized tree to resolve format-specific ambiguities
    /// before comparison.
    ///
    /// # Errors
    /// Returns [`FormatError::Unsupported`] for formats without a normal form.
    fn normalize(&self, payload: PayloadElement) -> Result<PayloadElement, FormatError>;

    /// Returns the scalar comparer for this format.
    fn scalar_comparer(&self) -> ScalarComparer;
}

/// Selects the strategy for a (content type, request URI) pair.
///
/// Decision order, first match wins:
/// 1. Named-stream and media-resource URIs return opaque bytes regardless of
///    the declared content type, so they route to binary before anything else.
/// 2. `$count` requests with a plain-text content type route to the count
///    strategy.
/// 3. Otherwise the content-type prefix decides, case-insensitively except
///    for `text/html`, which is matched ordinally.
/// 4. Anything unrecognized falls back to binary.
pub fn select_strategy(content_type: &str, uri: &ODataUri) -> Box<dyn FormatStrategy> {
    if uri.is_named_stream() || uri.is_media_resource() {
        return Box::new(BinaryStrategy);
    }

    let lowered = content_type.trim().to_ascii_lowercase();

    if uri.is_count_request() && lowered.starts_with("text/plain") {
        return Box::new(CountStrategy);
    }

    if lowered.starts_with("application/atom+xml")
        || lowered.starts_with("application/xml")
        || lowered.starts_with("text/xml")
    {
        Box::new(XmlStrategy)
    } else if lowered.starts_with("application/json") {
        Box::new(JsonStrategy)
    } else if content_type.trim().starts_with("text/html") || lowered.starts_with("text/plain") {
        Box::new(TextValueStrategy)
    } else if lowered.starts_with("application/x-www-form-urlencoded") {
        Box::new(HtmlFormStrategy)
    } else {
        Box::new(BinaryStrategy)
    }
}

/// Validates an encoding name; only the utf-8 family is supported.
pub(crate) fn check_encoding(name: &str) -> Result<(), FormatError> {
    let normalized = name.trim().to_ascii_lowercase();
    if normalized.is_empty() || normalized == "utf-8" || normalized == "utf8" {
        Ok(())
    } else {
        Err(FormatError::UnsupportedEncoding(name.to_string()))
    }
}

pub(crate) fn decode_utf8(raw: &[u8], format: FormatKind) -> Result<String, FormatError> {
    String::from_utf8(raw.to_vec()).map_err(|error| FormatError::Malformed {
        format,
        reason: format!("body is not valid utf-8: {error}"),
    })
}

/// Errors produced by format strategies.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The operation is meaningless for the format.
    #[error("{operation} is not supported by the {format} format")]
    Unsupported {
        /// Operation name (`serialize`, `deserialize`, `normalize`).
        operation: &'static str,
        /// Format that rejected the operation.
        format: FormatKind,
    },
    /// The encoding name is outside the supported utf-8 family.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    /// The tree contains an element the format cannot represent.
    #[error("a {format} payload cannot carry a {element:?} element")]
    UnsupportedElement {
        /// Format that rejected the element.
        format: FormatKind,
        /// Tag of the offending element.
        element: ElementType,
    },
    /// The body could not be decoded as the format.
    #[error("malformed {format} payload: {reason}")]
    Malformed {
        /// Format that failed to decode.
        format: FormatKind,
        /// Decoder diagnostic.
        reason: String,
    },
    /// JSON codec failure.
    #[error("json codec failure: {0}")]
    Json(#[from] serde_json::Error),
}
