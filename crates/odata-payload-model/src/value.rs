//! Typed scalar values carried by primitive payload elements.

use serde::{Deserialize, Serialize};

/// Typed scalar value as it appears inside an OData payload.
///
/// Date/time, duration, guid, decimal and spatial values are carried as their
/// canonical text forms; the wire formats differ only in how those texts are
/// framed, not in how they are modeled here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// Explicit null.
    Null,
    /// `Edm.Boolean`.
    Boolean(bool),
    /// `Edm.Int32`.
    Int32(i32),
    /// `Edm.Int64`.
    Int64(i64),
    /// `Edm.Single`.
    Single(f32),
    /// `Edm.Double`.
    Double(f64),
    /// `Edm.Decimal`, kept as text to preserve precision.
    Decimal(String),
    /// `Edm.String`.
    String(String),
    /// `Edm.Guid` canonical text.
    Guid(String),
    /// `Edm.DateTime` ISO-8601 text without offset.
    DateTime(String),
    /// `Edm.DateTimeOffset` ISO-8601 text with offset.
    DateTimeOffset(String),
    /// `Edm.Time`/duration text.
    Duration(String),
    /// `Edm.Binary` raw bytes.
    Binary(Vec<u8>),
    /// Spatial geometry well-known text.
    Geometry(String),
    /// Spatial geography well-known text.
    Geography(String),
}

impl ScalarValue {
    /// Returns the EDM type name naturally implied by this value, or `None`
    /// for null.
    pub fn implied_type_name(&self) -> Option<&'static str> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Boolean(_) => Some("Edm.Boolean"),
            ScalarValue::Int32(_) => Some("Edm.Int32"),
            ScalarValue::Int64(_) => Some("Edm.Int64"),
            ScalarValue::Single(_) => Some("Edm.Single"),
            ScalarValue::Double(_) => Some("Edm.Double"),
            ScalarValue::Decimal(_) => Some("Edm.Decimal"),
            ScalarValue::String(_) => Some("Edm.String"),
            ScalarValue::Guid(_) => Some("Edm.Guid"),
            ScalarValue::DateTime(_) => Some("Edm.DateTime"),
            ScalarValue::DateTimeOffset(_) => Some("Edm.DateTimeOffset"),
            ScalarValue::Duration(_) => Some("Edm.Time"),
            ScalarValue::Binary(_) => Some("Edm.Binary"),
            ScalarValue::Geometry(_) => Some("Edm.Geometry"),
            ScalarValue::Geography(_) => Some("Edm.Geography"),
        }
    }

    /// Returns `true` for the null scalar.
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

/// Nullable primitive value with an optional declared EDM type annotation.
///
/// The annotation records what the wire payload declared (or what metadata
/// implies), which may differ from the natural type of the parsed value until
/// a normalizer reconciles the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveValue {
    /// Declared EDM type name, when the payload or metadata supplied one.
    pub type_name: Option<String>,
    /// The scalar value itself.
    pub value: ScalarValue,
}

impl PrimitiveValue {
    /// Creates a primitive without a declared type annotation.
    pub fn untyped(value: ScalarValue) -> Self {
        Self {
            type_name: None,
            value,
        }
    }

    /// Creates a primitive with a declared EDM type annotation.
    pub fn typed(type_name: impl Into<String>, value: ScalarValue) -> Self {
        Self {
            type_name: Some(type_name.into()),
            value,
        }
    }

    /// Creates an untyped null primitive.
    pub fn null() -> Self {
        Self::untyped(ScalarValue::Null)
    }

    /// Returns `true` when the carried scalar is null.
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for scalar typing helpers.

    use super::*;

    #[test]
    fn implied_type_names_cover_nullability() {
        assert_eq!(ScalarValue::Null.implied_type_name(), None);
        assert_eq!(
            ScalarValue::Int64(7).implied_type_name(),
            Some("Edm.Int64")
        );
        assert!(PrimitiveValue::null().is_null());
    }
}
