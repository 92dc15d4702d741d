#![warn(missing_docs)]
//! # odata-payload-edm
//!
//! ## Purpose
//! Provides the entity-data-model accessors, request-URI model and HTTP
//! request/response abstractions consumed by the payload format layer.
//!
//! ## Responsibilities
//! - Look up entity sets, entity types, key properties and flattening
//!   mappings.
//! - Classify request URIs (named stream, media resource, `$count`) and
//!   expose `$select` projections.
//! - Carry HTTP exchanges as owned header/body data with byte-exact bodies.
//!
//! ## Data flow
//! The strategy selector and version calculator query [`ODataUri`] and
//! [`EntityModel`]; the batch serializer frames [`HttpRequestData`] /
//! [`HttpResponseData`] values.
//!
//! ## Ownership and lifetimes
//! All values are owned; nothing borrows from transport buffers.
//!
//! ## Error model
//! Unparsable URIs and unknown model lookups surface as [`EdmError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use odata_payload_model::{FlatteningMapping, QueryType};

/// Declared structural property of an entity or complex type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property name.
    pub name: String,
    /// Declared EDM type name.
    pub type_name: String,
}

/// Declared entity type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityType {
    /// Entity type name.
    pub name: String,
    /// Names of the key properties.
    pub key_properties: Vec<String>,
    /// Declared structural properties.
    pub properties: Vec<PropertyDef>,
    /// Declared flattening mappings.
    pub flattening_mappings: Vec<FlatteningMapping>,
    /// Names of declared named-stream properties.
    pub stream_properties: Vec<String>,
}

/// Declared entity set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySet {
    /// Entity set name as it appears in URIs.
    pub name: String,
    /// Element type of the set.
    pub entity_type: EntityType,
}

/// Minimal entity data model: the set of declared entity sets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityModel {
    /// Declared entity sets.
    pub entity_sets: Vec<EntitySet>,
}

impl EntityModel {
    /// Returns the entity set with the given name.
    pub fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.entity_sets.iter().find(|set| set.name == name)
    }

    /// Returns the entity type backing the given set name.
    pub fn entity_type_for_set(&self, set_name: &str) -> Option<&EntityType> {
        self.entity_set(set_name).map(|set| &set.entity_type)
    }
}

/// Declared service action parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParameter {
    /// Parameter name, matched against payload property names.
    pub name: String,
    /// Expected static type of the bound value.
    pub value_type: QueryType,
}

/// Declared service action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Action name.
    pub name: String,
    /// Declared parameters in signature order.
    pub parameters: Vec<ActionParameter>,
}

/// Parsed request URI with OData-shape predicates.
///
/// Named-stream detection requires model knowledge, so the set of known
/// stream property names is supplied at construction time instead of being
/// looked up through an ambient registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ODataUri {
    url: Url,
    segments: Vec<String>,
    stream_properties: Vec<String>,
}

impl ODataUri {
    /// Parses an absolute request URI.
    ///
    /// # Errors
    /// Returns [`EdmError::InvalidUri`] when the text is not a valid URL.
    pub fn parse(raw: &str) -> Result<Self, EdmError> {
        let url =
            Url::parse(raw).map_err(|error| EdmError::InvalidUri(format!("{raw}: {error}")))?;
        let segments = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            url,
            segments,
            stream_properties: Vec::new(),
        })
    }

    /// Records the named-stream property names the target model declares.
    pub fn with_stream_properties(mut self, names: Vec<String>) -> Self {
        self.stream_properties = names;
        self
    }

    /// Returns the underlying URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the non-empty path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` when the URI addresses a `$count` value.
    pub fn is_count_request(&self) -> bool {
        self.segments.last().map(String::as_str) == Some("$count")
    }

    /// Returns `true` when the URI addresses a media resource (`.../$value`).
    pub fn is_media_resource(&self) -> bool {
        self.segments.last().map(String::as_str) == Some("$value")
    }

    /// Returns `true` when the URI addresses a declared named stream.
    pub fn is_named_stream(&self) -> bool {
        match self.segments.last() {
            Some(last) => self.stream_properties.iter().any(|name| name == last),
            None => false,
        }
    }

    /// Returns the entity set addressed by the first path segment, with any
    /// key expression stripped (`Customers(1)` yields `Customers`).
    pub fn target_entity_set(&self) -> Option<&str> {
        let first = self.segments.first()?;
        Some(match first.find('(') {
            Some(open) => &first[..open],
            None => first.as_str(),
        })
    }

    /// Returns the `$select` projection, when the query declares one.
    pub fn select_projection(&self) -> Option<Vec<String>> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == "$select")
            .map(|(_, value)| {
                value
                    .split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
    }
}

/// HTTP verb of a batch or exchange operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpVerb {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// MERGE (pre-V3 partial update).
    Merge,
    /// DELETE.
    Delete,
}

impl HttpVerb {
    /// Renders the wire form of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Merge => "MERGE",
            HttpVerb::Delete => "DELETE",
        }
    }

    /// Parses a wire verb token.
    pub fn parse(token: &str) -> Option<HttpVerb> {
        match token {
            "GET" => Some(HttpVerb::Get),
            "POST" => Some(HttpVerb::Post),
            "PUT" => Some(HttpVerb::Put),
            "PATCH" => Some(HttpVerb::Patch),
            "MERGE" => Some(HttpVerb::Merge),
            "DELETE" => Some(HttpVerb::Delete),
            _ => None,
        }
    }

    /// Returns `true` for verbs that create or update entities.
    pub fn is_update(&self) -> bool {
        matches!(
            self,
            HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch | HttpVerb::Merge
        )
    }
}

/// One HTTP request as carried through batches and exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequestData {
    /// Request verb.
    pub verb: HttpVerb,
    /// Raw request URI, preserved byte-exact for batch framing.
    pub uri: String,
    /// Headers in declaration order.
    pub headers: Vec<(String, String)>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpRequestData {
    /// Returns the first header with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_header(&self.headers, name)
    }
}

/// One HTTP response as carried through batches and exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponseData {
    /// Status code.
    pub status: u16,
    /// Headers in declaration order.
    pub headers: Vec<(String, String)>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponseData {
    /// Returns the first header with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_header(&self.headers, name)
    }
}

fn lookup_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Errors produced by URI parsing and model lookups.
#[derive(Debug, Error)]
pub enum EdmError {
    /// Request URI could not be parsed.
    #[error("invalid request uri: {0}")]
    InvalidUri(String),
    /// A named entity set is not declared by the model.
    #[error("unknown entity set: {0}")]
    UnknownEntitySet(String),
}
