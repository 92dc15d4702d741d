//! Per-format scalar value comparison.

use thiserror::Error;

use odata_payload_literals::render_text;
use odata_payload_model::{PrimitiveValue, QueryValue, ScalarValue};

use crate::FormatKind;

/// Compares scalar leaves by canonical literal text.
///
/// Both sides are normalized (date/time canonicalization, guid casing,
/// binary-to-hex) and rendered to the format's literal string before
/// comparison. Equivalent in-memory representations — an `Int64` against an
/// `Int32` holding the same number, date/times differing only in fractional
/// zeros — therefore compare equal, while real semantic differences still
/// surface.
#[derive(Debug, Clone, Copy)]
pub struct ScalarComparer {
    format: FormatKind,
}

impl ScalarComparer {
    /// Creates the comparer for one format.
    pub fn new(format: FormatKind) -> Self {
        Self { format }
    }

    /// Returns the format this comparer normalizes for.
    pub fn format(&self) -> FormatKind {
        self.format
    }

    /// Renders the canonical comparison text of a scalar.
    pub fn canonical_text(&self, value: &ScalarValue) -> String {
        render_text(value)
    }

    /// Compares two scalar values by canonical text.
    ///
    /// # Errors
    /// Returns [`ScalarMismatch`] when the canonical strings differ; this is
    /// the designed output of a verification pass, not an internal fault.
    pub fn compare_scalar(
        &self,
        expected: &ScalarValue,
        actual: &ScalarValue,
    ) -> Result<(), ScalarMismatch> {
        let expected_text = self.canonical_text(expected);
        let actual_text = self.canonical_text(actual);
        if expected_text == actual_text {
            Ok(())
        } else {
            Err(ScalarMismatch {
                expected: expected_text,
                actual: actual_text,
            })
        }
    }

    /// Compares two primitive values by canonical text.
    ///
    /// # Errors
    /// Returns [`ScalarMismatch`] when the canonical strings differ.
    pub fn compare(
        &self,
        expected: &PrimitiveValue,
        actual: &PrimitiveValue,
    ) -> Result<(), ScalarMismatch> {
        self.compare_scalar(&expected.value, &actual.value)
    }

    /// Compares an expected query value against an actual primitive.
    ///
    /// # Errors
    /// Returns [`ScalarMismatch`] when the canonical strings differ or the
    /// query value is not a scalar.
    pub fn compare_query(
        &self,
        expected: &QueryValue,
        actual: &PrimitiveValue,
    ) -> Result<(), ScalarMismatch> {
        match expected {
            QueryValue::Scalar(scalar) => self.compare_scalar(scalar, &actual.value),
            other => Err(ScalarMismatch {
                expected: format!("{other:?}"),
                actual: self.canonical_text(&actual.value),
            }),
        }
    }
}

/// Scalar comparison failure with both canonical renditions.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("scalar mismatch: expected `{expected}`, actual `{actual}`")]
pub struct ScalarMismatch {
    /// Canonical text of the expected side.
    pub expected: String,
    /// Canonical text of the actual side.
    pub actual: String,
}

#[cfg(test)]
mod tests {
    //! Unit tests for canonical-text comparison.

    use super::*;

    #[test]
    fn equivalent_representations_compare_equal() {
        let comparer = ScalarComparer::new(FormatKind::Json);
        comparer
            .compare_scalar(&ScalarValue::Int64(5), &ScalarValue::Int32(5))
            .expect("same number should compare equal across widths");
        comparer
            .compare_scalar(
                &ScalarValue::DateTime("2013-01-01T00:00:00.000".to_string()),
                &ScalarValue::DateTime("2013-01-01T00:00:00".to_string()),
            )
            .expect("fractional zeros should not diverge");
    }

    #[test]
    fn real_differences_surface() {
        let comparer = ScalarComparer::new(FormatKind::Xml);
        let failure = comparer
            .compare_scalar(&ScalarValue::Int32(5), &ScalarValue::Int32(6))
            .expect_err("different numbers must mismatch");
        assert_eq!(failure.expected, "5");
        assert_eq!(failure.actual, "6");
    }
}
