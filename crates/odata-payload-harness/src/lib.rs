#![warn(missing_docs)]
//! # odata-payload-harness
//!
//! ## Purpose
//! Orchestration facade over the payload crates: one call per HTTP exchange
//! to pick a strategy, read a body into a tree, verify it against an
//! expected tree, or bind an action invocation's parameters.
//!
//! ## Responsibilities
//! - Route an exchange's (content type, URI) to a format strategy.
//! - Deserialize and normalize response bodies.
//! - Verify responses: deserialize, normalize, compare.
//! - Bind posted action payloads to declared parameters.
//!
//! ## Data flow
//! `HttpResponseData`/`HttpRequestData` -> strategy -> tree -> normalizer ->
//! comparer or converter; every step's failure funnels into
//! [`HarnessError`].
//!
//! ## Ownership and lifetimes
//! The facade holds no state; strategies are created per exchange.
//!
//! ## Error model
//! One error enum wrapping each stage's error type, so callers handle a
//! single failure surface. A comparison failure is a designed outcome and
//! keeps its structural path.

use thiserror::Error;

use odata_payload_compare::ComparisonFailure;
use odata_payload_convert::ConvertError;
use odata_payload_edm::{ActionDescriptor, EdmError, HttpRequestData, HttpResponseData, ODataUri};
use odata_payload_formats::{DeserializeContext, FormatError, select_strategy};
use odata_payload_model::{PayloadElement, QueryValue};

pub use odata_payload_compare::PayloadComparer;
pub use odata_payload_formats::{FormatKind, FormatStrategy};

/// Content type assumed when an exchange declares none.
const DEFAULT_CONTENT_TYPE: &str = "application/xml";

/// How a verification compares expected and actual trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    /// Property and collection-element order and metadata must match
    /// exactly.
    Strict,
    /// Property and collection-element order is irrelevant.
    IgnoringOrder,
    /// Order-insensitive; convention-computed metadata absent from the
    /// expected tree is accepted.
    JsonLight,
}

/// Selects the format strategy for one exchange.
pub fn strategy_for_exchange(
    content_type: Option<&str>,
    uri: &ODataUri,
) -> Box<dyn FormatStrategy> {
    select_strategy(content_type.unwrap_or(DEFAULT_CONTENT_TYPE), uri)
}

/// Deserializes and normalizes a response body.
///
/// # Errors
/// Returns [`HarnessError::Format`] when the body cannot be read as the
/// declared format.
pub fn deserialize_response(
    response: &HttpResponseData,
    uri: &ODataUri,
) -> Result<PayloadElement, HarnessError> {
    let content_type = response.header("content-type");
    let strategy = strategy_for_exchange(content_type, uri);
    let context = DeserializeContext {
        content_type: content_type.map(str::to_string),
    };
    let tree = strategy.deserialize(&response.body, &context)?;
    Ok(strategy.normalize(tree)?)
}

/// Verifies a response body against an expected tree.
///
/// The expected tree is normalized with the same strategy before comparison
/// so both sides share one canonical shape.
///
/// # Errors
/// Returns [`HarnessError::Comparison`] carrying the structural path of the
/// first divergence, or [`HarnessError::Format`] when the body cannot be
/// read at all.
pub fn verify_response(
    expected: &PayloadElement,
    response: &HttpResponseData,
    uri: &ODataUri,
    mode: ComparisonMode,
) -> Result<(), HarnessError> {
    let content_type = response.header("content-type");
    let strategy = strategy_for_exchange(content_type, uri);
    let context = DeserializeContext {
        content_type: content_type.map(str::to_string),
    };
    let actual = strategy.normalize(strategy.deserialize(&response.body, &context)?)?;
    let expected = strategy.normalize(expected.clone())?;

    let scalars = strategy.scalar_comparer();
    let comparer = match mode {
        ComparisonMode::Strict => PayloadComparer::strict(scalars),
        ComparisonMode::IgnoringOrder => PayloadComparer::ignoring_order(scalars),
        ComparisonMode::JsonLight => PayloadComparer::json_light(scalars),
    };
    comparer.compare(&expected, &actual)?;
    Ok(())
}

/// Reads an action-invocation request body and binds it to the action's
/// declared parameters.
///
/// # Errors
/// Returns [`HarnessError::NotAnActionPayload`] when the body is not a
/// single complex instance, or the underlying format/conversion error.
pub fn bind_action_parameters(
    request: &HttpRequestData,
    action: &ActionDescriptor,
    uri: &ODataUri,
) -> Result<Vec<(String, QueryValue)>, HarnessError> {
    let content_type = request.header("content-type");
    let strategy = strategy_for_exchange(content_type, uri);
    let context = DeserializeContext {
        content_type: content_type.map(str::to_string),
    };
    let tree = strategy.normalize(strategy.deserialize(&request.body, &context)?)?;
    let element = tree.element_type();
    let PayloadElement::Complex(complex) = tree else {
        return Err(HarnessError::NotAnActionPayload {
            element: format!("{element:?}"),
        });
    };
    Ok(odata_payload_convert::convert_action_parameters(
        &complex, action,
    )?)
}

/// Errors produced by the harness facade.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Format strategy failure.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Expected/actual divergence.
    #[error(transparent)]
    Comparison(#[from] ComparisonFailure),
    /// Conversion failure while binding parameters.
    #[error(transparent)]
    Convert(#[from] ConvertError),
    /// URI or model failure.
    #[error(transparent)]
    Edm(#[from] EdmError),
    /// An action invocation's body was not a single complex instance.
    #[error("action payload is a {element} element, not a complex instance")]
    NotAnActionPayload {
        /// Tag of the offending element.
        element: String,
    },
}
