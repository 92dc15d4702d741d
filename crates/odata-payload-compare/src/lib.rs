#![warn(missing_docs)]
//! # odata-payload-compare
//!
//! ## Purpose
//! Structural comparison of payload-element trees, used to verify a
//! deserialized response against the expected tree a test computed.
//!
//! ## Responsibilities
//! - Walk expected and actual trees in lockstep, by element tag.
//! - Delegate scalar leaves to the owning format's scalar comparer.
//! - Report the first divergence as a failure carrying the full path from
//!   the payload root.
//!
//! ## Data flow
//! Two normalized trees enter [`PayloadComparer::compare`]; the walker
//! recurses with an explicit path stack and either returns unit or the
//! [`ComparisonFailure`] built at the divergence site.
//!
//! ## Ownership and lifetimes
//! The comparer borrows both trees immutably; the path stack is the only
//! per-comparison state and lives inside the call.
//!
//! ## Error model
//! A failed comparison is the designed output of verification, not a fault:
//! [`ComparisonFailure`] is an ordinary error value with the path and a
//! human-readable reason.

use thiserror::Error;

use odata_payload_formats::ScalarComparer;
use odata_payload_model::{
    ComplexInstance, DeferredLink, EntityInstance, ErrorPayload, PayloadElement, PrimitiveValue,
};

/// Compares an expected payload tree against an actual one.
#[derive(Debug, Clone, Copy)]
pub struct PayloadComparer {
    ignore_order: bool,
    metadata_by_convention: bool,
    scalars: ScalarComparer,
}

impl PayloadComparer {
    /// Exact comparison: element order and every metadata field must match.
    pub fn strict(scalars: ScalarComparer) -> Self {
        Self {
            ignore_order: false,
            metadata_by_convention: false,
            scalars,
        }
    }

    /// Order-insensitive comparison for responses without a guaranteed
    /// element order. Each expected element greedily claims the first
    /// not-yet-claimed actual element it matches.
    pub fn ignoring_order(scalars: ScalarComparer) -> Self {
        Self {
            ignore_order: true,
            metadata_by_convention: false,
            scalars,
        }
    }

    /// Order-insensitive comparison for payloads whose entity metadata is
    /// established by convention rather than carried on the wire: actual
    /// ids, edit links and etags are accepted when the expected tree leaves
    /// them unset.
    pub fn json_light(scalars: ScalarComparer) -> Self {
        Self {
            ignore_order: true,
            metadata_by_convention: true,
            scalars,
        }
    }

    /// Compares two trees.
    ///
    /// # Errors
    /// Returns the [`ComparisonFailure`] describing the first divergence.
    pub fn compare(
        &self,
        expected: &PayloadElement,
        actual: &PayloadElement,
    ) -> Result<(), ComparisonFailure> {
        let mut walker = Walker {
            comparer: self,
            path: Vec::new(),
        };
        walker.element(expected, actual)
    }
}

/// First divergence found by a comparison.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("payload mismatch at `{path}`: {reason}")]
pub struct ComparisonFailure {
    /// Slash-separated path from the payload root to the divergence.
    pub path: String,
    /// Human-readable description of the divergence.
    pub reason: String,
}

struct Walker<'a> {
    comparer: &'a PayloadComparer,
    path: Vec<String>,
}

impl Walker<'_> {
    fn element(
        &mut self,
        expected: &PayloadElement,
        actual: &PayloadElement,
    ) -> Result<(), ComparisonFailure> {
        if expected.element_type() != actual.element_type() {
            // An untyped empty collection is indistinguishable on the wire
            // from any other empty collection, so either direction matches.
            let empty_equivalent = matches!(
                expected,
                PayloadElement::EmptyUntypedCollection(_)
            ) && actual.is_empty_collection()
                || matches!(actual, PayloadElement::EmptyUntypedCollection(_))
                    && expected.is_empty_collection();
            if empty_equivalent {
                return Ok(());
            }
            return Err(self.fail(format!(
                "expected a {:?} element, found {:?}",
                expected.element_type(),
                actual.element_type()
            )));
        }

        match (expected, actual) {
            (PayloadElement::Primitive(expected), PayloadElement::Primitive(actual)) => {
                self.primitive(expected, actual)
            }
            (PayloadElement::Complex(expected), PayloadElement::Complex(actual)) => {
                self.complex(expected, actual)
            }
            (PayloadElement::Entity(expected), PayloadElement::Entity(actual)) => {
                self.entity(expected, actual)
            }
            (PayloadElement::EntitySet(expected), PayloadElement::EntitySet(actual)) => {
                self.optional_count(expected.inline_count, actual.inline_count)?;
                self.optional_text("next link", &expected.next_link, &actual.next_link, false)?;
                self.sequence(&expected.entities, &actual.entities, Self::entity)
            }
            (
                PayloadElement::PrimitiveCollection(expected),
                PayloadElement::PrimitiveCollection(actual),
            ) => {
                self.optional_count(expected.inline_count, actual.inline_count)?;
                self.optional_text("next link", &expected.next_link, &actual.next_link, false)?;
                self.sequence(&expected.elements, &actual.elements, Self::primitive)
            }
            (
                PayloadElement::ComplexCollection(expected),
                PayloadElement::ComplexCollection(actual),
            ) => {
                self.optional_count(expected.inline_count, actual.inline_count)?;
                self.optional_text("next link", &expected.next_link, &actual.next_link, false)?;
                self.sequence(&expected.elements, &actual.elements, Self::complex)
            }
            (
                PayloadElement::LinkCollection(expected),
                PayloadElement::LinkCollection(actual),
            ) => {
                self.optional_count(expected.inline_count, actual.inline_count)?;
                self.optional_text("next link", &expected.next_link, &actual.next_link, false)?;
                self.sequence(&expected.links, &actual.links, Self::link)
            }
            (
                PayloadElement::PrimitiveMultiValue(expected),
                PayloadElement::PrimitiveMultiValue(actual),
            ) => {
                self.type_names(&expected.type_name, &actual.type_name)?;
                self.sequence(&expected.elements, &actual.elements, Self::primitive)
            }
            (
                PayloadElement::ComplexMultiValue(expected),
                PayloadElement::ComplexMultiValue(actual),
            ) => {
                self.type_names(&expected.type_name, &actual.type_name)?;
                self.sequence(&expected.elements, &actual.elements, Self::complex)
            }
            (PayloadElement::DeferredLink(expected), PayloadElement::DeferredLink(actual)) => {
                self.link(expected, actual)
            }
            (PayloadElement::Error(expected), PayloadElement::Error(actual)) => {
                self.error(expected, actual)
            }
            (
                PayloadElement::EmptyUntypedCollection(_),
                PayloadElement::EmptyUntypedCollection(_),
            ) => Ok(()),
            _ => unreachable!("tags already compared equal"),
        }
    }

    fn primitive(
        &mut self,
        expected: &PrimitiveValue,
        actual: &PrimitiveValue,
    ) -> Result<(), ComparisonFailure> {
        self.type_names(&expected.type_name, &actual.type_name)?;
        self.comparer
            .scalars
            .compare_scalar(&expected.value, &actual.value)
            .map_err(|mismatch| self.fail(mismatch.to_string()))
    }

    fn complex(
        &mut self,
        expected: &ComplexInstance,
        actual: &ComplexInstance,
    ) -> Result<(), ComparisonFailure> {
        self.type_names(&expected.type_name, &actual.type_name)?;
        self.properties(&expected.properties, &actual.properties)
    }

    fn entity(
        &mut self,
        expected: &EntityInstance,
        actual: &EntityInstance,
    ) -> Result<(), ComparisonFailure> {
        let convention = self.comparer.metadata_by_convention;
        self.type_names(&expected.type_name, &actual.type_name)?;
        self.optional_text("id", &expected.id, &actual.id, convention)?;
        self.optional_text("edit link", &expected.edit_link, &actual.edit_link, convention)?;
        self.optional_text("etag", &expected.etag, &actual.etag, convention)?;
        self.optional_text(
            "stream source link",
            &expected.stream_source_link,
            &actual.stream_source_link,
            false,
        )?;
        self.optional_text(
            "stream edit link",
            &expected.stream_edit_link,
            &actual.stream_edit_link,
            false,
        )?;
        self.properties(&expected.properties, &actual.properties)
    }

    fn link(
        &mut self,
        expected: &DeferredLink,
        actual: &DeferredLink,
    ) -> Result<(), ComparisonFailure> {
        if expected.uri == actual.uri {
            Ok(())
        } else {
            Err(self.fail(format!(
                "link uri `{}` does not match expected `{}`",
                actual.uri, expected.uri
            )))
        }
    }

    fn error(
        &mut self,
        expected: &ErrorPayload,
        actual: &ErrorPayload,
    ) -> Result<(), ComparisonFailure> {
        self.optional_text("error code", &expected.code, &actual.code, false)?;
        self.optional_text("error message", &expected.message, &actual.message, false)?;
        // Stack traces are environment-dependent; only pinned expectations
        // are enforced.
        self.optional_text(
            "stack trace",
            &expected.stack_trace,
            &actual.stack_trace,
            true,
        )
    }

    fn properties(
        &mut self,
        expected: &[(String, PayloadElement)],
        actual: &[(String, PayloadElement)],
    ) -> Result<(), ComparisonFailure> {
        if self.comparer.ignore_order {
            return self.properties_by_name(expected, actual);
        }
        if expected.len() != actual.len() {
            return Err(self.fail(format!(
                "expected {} properties, found {}",
                expected.len(),
                actual.len()
            )));
        }
        for ((name, expected_value), (actual_name, actual_value)) in expected.iter().zip(actual) {
            if name != actual_name {
                return Err(self.fail(format!(
                    "property `{actual_name}` appears where `{name}` was expected"
                )));
            }
            self.path.push(name.clone());
            let result = self.element(expected_value, actual_value);
            self.path.pop();
            result?;
        }
        Ok(())
    }

    // Duplicate property names are representable, so each expected property
    // claims one unclaimed actual property of the same name.
    fn properties_by_name(
        &mut self,
        expected: &[(String, PayloadElement)],
        actual: &[(String, PayloadElement)],
    ) -> Result<(), ComparisonFailure> {
        let mut claimed = vec![false; actual.len()];
        for (name, expected_value) in expected {
            let found = actual
                .iter()
                .enumerate()
                .find(|(index, (actual_name, _))| !claimed[*index] && actual_name == name);
            let Some((index, (_, actual_value))) = found else {
                return Err(self.fail(format!("missing property `{name}`")));
            };
            claimed[index] = true;
            self.path.push(name.clone());
            let result = self.element(expected_value, actual_value);
            self.path.pop();
            result?;
        }
        if let Some(index) = claimed.iter().position(|taken| !taken) {
            return Err(self.fail(format!("unexpected property `{}`", actual[index].0)));
        }
        Ok(())
    }

    fn sequence<T>(
        &mut self,
        expected: &[T],
        actual: &[T],
        compare: fn(&mut Self, &T, &T) -> Result<(), ComparisonFailure>,
    ) -> Result<(), ComparisonFailure> {
        if expected.len() != actual.len() {
            return Err(self.fail(format!(
                "expected {} elements, found {}",
                expected.len(),
                actual.len()
            )));
        }
        if self.comparer.ignore_order {
            let mut claimed = vec![false; actual.len()];
            for (index, expected_element) in expected.iter().enumerate() {
                let matched = actual.iter().enumerate().find(|(candidate, element)| {
                    !claimed[*candidate] && compare(self, expected_element, element).is_ok()
                });
                match matched {
                    Some((candidate, _)) => claimed[candidate] = true,
                    None => {
                        return Err(self.fail(format!(
                            "no actual element matches expected element {index}"
                        )));
                    }
                }
            }
            Ok(())
        } else {
            for (index, (expected_element, actual_element)) in
                expected.iter().zip(actual).enumerate()
            {
                self.path.push(format!("[{index}]"));
                let result = compare(self, expected_element, actual_element);
                self.path.pop();
                result?;
            }
            Ok(())
        }
    }

    // Formats drop type annotations they cannot carry, so a missing name on
    // either side is not a divergence; only contradicting names are.
    fn type_names(
        &mut self,
        expected: &Option<String>,
        actual: &Option<String>,
    ) -> Result<(), ComparisonFailure> {
        match (expected, actual) {
            (Some(expected), Some(actual)) if expected != actual => Err(self.fail(format!(
                "type name `{actual}` does not match expected `{expected}`"
            ))),
            _ => Ok(()),
        }
    }

    fn optional_text(
        &mut self,
        label: &str,
        expected: &Option<String>,
        actual: &Option<String>,
        accept_when_unset: bool,
    ) -> Result<(), ComparisonFailure> {
        if expected == actual || (accept_when_unset && expected.is_none()) {
            return Ok(());
        }
        Err(self.fail(format!(
            "{label} `{}` does not match expected `{}`",
            display(actual),
            display(expected)
        )))
    }

    fn optional_count(
        &mut self,
        expected: Option<i64>,
        actual: Option<i64>,
    ) -> Result<(), ComparisonFailure> {
        if expected == actual {
            return Ok(());
        }
        Err(self.fail(format!(
            "inline count {actual:?} does not match expected {expected:?}"
        )))
    }

    fn fail(&self, reason: String) -> ComparisonFailure {
        let path = if self.path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.path.join("/"))
        };
        ComparisonFailure { path, reason }
    }
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<unset>")
}

#[cfg(test)]
mod tests {
    //! Unit tests for structural comparison.

    use super::*;
    use odata_payload_formats::FormatKind;
    use odata_payload_model::{
        EmptyUntypedCollection, EntitySetInstance, PrimitiveCollection, ScalarValue,
    };

    fn scalars() -> ScalarComparer {
        ScalarComparer::new(FormatKind::Json)
    }

    fn customer(id: i32, name: &str) -> EntityInstance {
        let mut entity = EntityInstance::new(Some("Model.Customer".to_string()));
        entity.id = Some(format!("Customers({id})"));
        entity.properties.push((
            "ID".to_string(),
            PayloadElement::Primitive(PrimitiveValue::typed(
                "Edm.Int32",
                ScalarValue::Int32(id),
            )),
        ));
        entity.properties.push((
            "Name".to_string(),
            PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::String(
                name.to_string(),
            ))),
        ));
        entity
    }

    #[test]
    fn failures_carry_the_full_path() {
        let expected = PayloadElement::Entity(customer(1, "Alice"));
        let actual = PayloadElement::Entity(customer(1, "Bob"));
        let failure = PayloadComparer::strict(scalars())
            .compare(&expected, &actual)
            .expect_err("names differ");
        assert_eq!(failure.path, "/Name");
    }

    #[test]
    fn order_insensitive_mode_matches_permuted_feeds() {
        let expected = PayloadElement::EntitySet(EntitySetInstance {
            entities: vec![customer(1, "Alice"), customer(2, "Bob")],
            inline_count: None,
            next_link: None,
        });
        let actual = PayloadElement::EntitySet(EntitySetInstance {
            entities: vec![customer(2, "Bob"), customer(1, "Alice")],
            inline_count: None,
            next_link: None,
        });
        PayloadComparer::strict(scalars())
            .compare(&expected, &actual)
            .expect_err("strict mode must respect order");
        PayloadComparer::ignoring_order(scalars())
            .compare(&expected, &actual)
            .expect("order-insensitive mode must match");
    }

    #[test]
    fn strict_mode_rejects_permuted_properties() {
        let mut reordered = EntityInstance::new(Some("Model.Customer".to_string()));
        reordered.id = Some("Customers(1)".to_string());
        let mut forward = customer(1, "Alice");
        reordered.properties.push(forward.properties.pop().expect("Name"));
        reordered.properties.push(forward.properties.pop().expect("ID"));

        let expected = PayloadElement::Entity(customer(1, "Alice"));
        let actual = PayloadElement::Entity(reordered);
        let failure = PayloadComparer::strict(scalars())
            .compare(&expected, &actual)
            .expect_err("strict mode must respect property order");
        assert!(failure.reason.contains("`Name`"), "{failure}");
        PayloadComparer::ignoring_order(scalars())
            .compare(&expected, &actual)
            .expect("order-insensitive mode matches by name");
    }

    #[test]
    fn duplicate_properties_must_be_claimed_one_for_one() {
        let value = |text: &str| {
            PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::String(
                text.to_string(),
            )))
        };
        let expected = PayloadElement::Complex(
            ComplexInstance::new(None)
                .with_property("Tag", value("a"))
                .with_property("Tag", value("b")),
        );
        let actual = PayloadElement::Complex(
            ComplexInstance::new(None)
                .with_property("Tag", value("a"))
                .with_property("Tag", value("a")),
        );
        PayloadComparer::ignoring_order(scalars())
            .compare(&expected, &actual)
            .expect_err("second duplicate differs and must not re-match the first");
    }

    #[test]
    fn convention_metadata_accepts_unset_expectations() {
        let mut expected_entity = customer(1, "Alice");
        expected_entity.id = None;
        let mut actual_entity = customer(1, "Alice");
        actual_entity.etag = Some("W/\"1\"".to_string());

        let expected = PayloadElement::Entity(expected_entity);
        let actual = PayloadElement::Entity(actual_entity);
        PayloadComparer::strict(scalars())
            .compare(&expected, &actual)
            .expect_err("strict mode pins metadata");
        PayloadComparer::json_light(scalars())
            .compare(&expected, &actual)
            .expect("convention mode accepts derived metadata");
    }

    #[test]
    fn empty_collections_match_across_tags() {
        let untyped = PayloadElement::EmptyUntypedCollection(EmptyUntypedCollection::default());
        let concrete = PayloadElement::PrimitiveCollection(PrimitiveCollection::default());
        PayloadComparer::strict(scalars())
            .compare(&untyped, &concrete)
            .expect("untyped empty matches a concrete empty collection");
    }
}
