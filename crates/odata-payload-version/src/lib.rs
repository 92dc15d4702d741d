#![warn(missing_docs)]
//! # odata-payload-version
//!
//! ## Purpose
//! Pure calculators for protocol-version and payload-option expectations:
//! which optional payload features a response should carry for a given
//! (content type, version, URI) combination, and the minimum protocol
//! version a request needs given its verb, body format and target metadata.
//!
//! ## Responsibilities
//! - [`expected_payload_options`]: derive the expected
//!   [`ODataPayloadOptions`] flag set.
//! - [`minimum_required_version`]: derive the lowest [`ProtocolVersion`] a
//!   request can be served at; versions only ever increase via `raise_to`.
//!
//! ## Data flow
//! Both functions read their inputs and return a value; nothing is cached
//! or mutated.
//!
//! ## Ownership and lifetimes
//! Stateless free functions over borrowed inputs.
//!
//! ## Error model
//! Only an unparsable request URI fails; everything else is total.

use thiserror::Error;

use odata_payload_edm::{EdmError, EntityModel, HttpRequestData, HttpVerb, ODataUri};
use odata_payload_model::{ODataPayloadOptions, ProtocolVersion};

/// Returns `true` for JSON content types without the verbose marker.
pub fn is_json_light(content_type: &str) -> bool {
    let lowered = content_type.trim().to_ascii_lowercase();
    lowered.starts_with("application/json") && !lowered.contains("odata=verbose")
}

/// Derives the payload options a response is expected to carry.
///
/// `$count`, media-resource and named-stream responses are bare values and
/// carry no options. Metadata-full formats (Atom, verbose JSON) expect the
/// full identity/link/etag set, plus paging options from V2 on. JSON-light
/// expects the same set only from V3 on, narrowed to type names alone when
/// the request projects away one of `key_properties` (the conventions are
/// computed from the identity properties, so a projection keeping every key
/// changes nothing).
pub fn expected_payload_options(
    content_type: &str,
    version: ProtocolVersion,
    uri: &ODataUri,
    key_properties: &[String],
) -> ODataPayloadOptions {
    if uri.is_count_request() || uri.is_media_resource() || uri.is_named_stream() {
        return ODataPayloadOptions::empty();
    }

    let metadata = ODataPayloadOptions::TYPE_NAMES
        | ODataPayloadOptions::IDS
        | ODataPayloadOptions::EDIT_LINKS
        | ODataPayloadOptions::ETAGS
        | ODataPayloadOptions::STREAM_LINKS;
    let paging = ODataPayloadOptions::NEXT_LINKS | ODataPayloadOptions::INLINE_COUNTS;

    if is_json_light(content_type) {
        if version < ProtocolVersion::V3 {
            return ODataPayloadOptions::empty();
        }
        if let Some(projection) = uri.select_projection() {
            let omits_a_key = key_properties
                .iter()
                .any(|key| !projection.contains(key));
            if omits_a_key {
                return ODataPayloadOptions::TYPE_NAMES;
            }
        }
        return metadata | paging;
    }

    let mut options = metadata;
    if version >= ProtocolVersion::V2 {
        options |= paging;
    }
    options
}

/// Derives the minimum protocol version a request requires.
///
/// DELETE needs only the baseline. Creates and updates sent as JSON-light
/// need V3; in any other format they need at least the minimum version of
/// every content-excluding flattening mapping on the target entity type.
/// The result is capped at `max` when a ceiling is declared.
///
/// # Errors
/// Returns [`VersionError::Uri`] when the request URI cannot be parsed.
pub fn minimum_required_version(
    request: &HttpRequestData,
    model: &EntityModel,
    max: ProtocolVersion,
) -> Result<ProtocolVersion, VersionError> {
    let mut version = ProtocolVersion::V1;

    if request.verb == HttpVerb::Delete {
        return Ok(capped(version, max));
    }

    if request.verb == HttpVerb::Post || request.verb.is_update() {
        let content_type = request.header("content-type").unwrap_or_default();
        if is_json_light(content_type) {
            version = version.raise_to(ProtocolVersion::V3);
        } else {
            let uri = ODataUri::parse(&request.uri)?;
            if let Some(entity_type) = uri
                .target_entity_set()
                .and_then(|set| model.entity_type_for_set(set))
            {
                for mapping in &entity_type.flattening_mappings {
                    if !mapping.keep_in_content {
                        version = version.raise_to(mapping.min_version);
                    }
                }
            }
        }
    }

    Ok(capped(version, max))
}

fn capped(version: ProtocolVersion, max: ProtocolVersion) -> ProtocolVersion {
    if max == ProtocolVersion::Unspecified {
        version
    } else {
        version.min(max)
    }
}

/// Errors produced by version calculation.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The request URI could not be parsed.
    #[error(transparent)]
    Uri(#[from] EdmError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for option and version derivation.

    use super::*;
    use odata_payload_edm::{EntitySet, EntityType};
    use odata_payload_model::FlatteningMapping;

    fn model_with_mapping(keep_in_content: bool) -> EntityModel {
        EntityModel {
            entity_sets: vec![EntitySet {
                name: "Customers".to_string(),
                entity_type: EntityType {
                    name: "Model.Customer".to_string(),
                    key_properties: vec!["ID".to_string()],
                    properties: Vec::new(),
                    flattening_mappings: vec![FlatteningMapping {
                        source_path: "Name".to_string(),
                        target_slot: "SyndicationTitle".to_string(),
                        keep_in_content,
                        min_version: ProtocolVersion::V2,
                        mapped_value: None,
                    }],
                    stream_properties: Vec::new(),
                },
            }],
        }
    }

    fn post(uri: &str, content_type: &str) -> HttpRequestData {
        HttpRequestData {
            verb: HttpVerb::Post,
            uri: uri.to_string(),
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: Vec::new(),
        }
    }

    #[test]
    fn delete_needs_only_the_baseline() {
        let request = HttpRequestData {
            verb: HttpVerb::Delete,
            uri: "https://service.test/Customers(1)".to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        };
        let version =
            minimum_required_version(&request, &model_with_mapping(false), ProtocolVersion::V3)
                .expect("calculate");
        assert_eq!(version, ProtocolVersion::V1);
    }

    #[test]
    fn content_excluding_mappings_raise_the_version() {
        let request = post(
            "https://service.test/Customers",
            "application/atom+xml",
        );
        let raised =
            minimum_required_version(&request, &model_with_mapping(false), ProtocolVersion::V3)
                .expect("calculate");
        assert_eq!(raised, ProtocolVersion::V2);

        let kept =
            minimum_required_version(&request, &model_with_mapping(true), ProtocolVersion::V3)
                .expect("calculate");
        assert_eq!(kept, ProtocolVersion::V1);
    }

    #[test]
    fn json_light_updates_need_v3() {
        let request = post("https://service.test/Customers", "application/json");
        let version =
            minimum_required_version(&request, &model_with_mapping(true), ProtocolVersion::V3)
                .expect("calculate");
        assert_eq!(version, ProtocolVersion::V3);
    }

    #[test]
    fn key_excluding_projections_narrow_json_light_options_to_type_names() {
        let keys = vec!["ID".to_string()];
        let full = ODataUri::parse("https://service.test/Customers").expect("uri");
        let projected =
            ODataUri::parse("https://service.test/Customers?$select=Name").expect("uri");
        assert!(
            expected_payload_options("application/json", ProtocolVersion::V3, &full, &keys)
                .contains(ODataPayloadOptions::EDIT_LINKS)
        );
        assert_eq!(
            expected_payload_options("application/json", ProtocolVersion::V3, &projected, &keys),
            ODataPayloadOptions::TYPE_NAMES
        );
        assert_eq!(
            expected_payload_options("application/json", ProtocolVersion::V2, &projected, &keys),
            ODataPayloadOptions::empty()
        );
    }

    #[test]
    fn key_keeping_projections_keep_the_full_option_set() {
        let keys = vec!["ID".to_string()];
        let projected =
            ODataUri::parse("https://service.test/Customers?$select=ID,Name").expect("uri");
        let options =
            expected_payload_options("application/json", ProtocolVersion::V3, &projected, &keys);
        assert!(options.contains(ODataPayloadOptions::EDIT_LINKS));
        assert!(options.contains(ODataPayloadOptions::NEXT_LINKS));
    }

    #[test]
    fn verbose_formats_gain_paging_options_at_v2() {
        let uri = ODataUri::parse("https://service.test/Customers").expect("uri");
        let v1 = expected_payload_options(
            "application/json;odata=verbose",
            ProtocolVersion::V1,
            &uri,
            &[],
        );
        assert!(!v1.contains(ODataPayloadOptions::NEXT_LINKS));
        let v2 = expected_payload_options(
            "application/json;odata=verbose",
            ProtocolVersion::V2,
            &uri,
            &[],
        );
        assert!(v2.contains(ODataPayloadOptions::INLINE_COUNTS));
    }
}
