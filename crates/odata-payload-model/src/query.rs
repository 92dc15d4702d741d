//! Typed query values used for action-parameter binding.

use serde::{Deserialize, Serialize};

use crate::value::ScalarValue;

/// Expected static type of a query value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    /// Scalar with the given EDM type name (for example `Edm.Int32`).
    Primitive(String),
    /// Named-property record with the given complex type name.
    Complex(String),
    /// Homogeneous collection of the inner type.
    Collection(Box<QueryType>),
}

impl QueryType {
    /// Convenience constructor for a collection of the given inner type.
    pub fn collection_of(inner: QueryType) -> Self {
        QueryType::Collection(Box::new(inner))
    }
}

/// Strongly typed value rebuilt from named values or a payload element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
    /// Scalar leaf.
    Scalar(ScalarValue),
    /// Named-property record in declaration order.
    Record {
        /// Declared complex type name, when known.
        type_name: Option<String>,
        /// Ordered named properties.
        properties: Vec<(String, QueryValue)>,
    },
    /// Ordered collection of values.
    Collection(Vec<QueryValue>),
}

impl QueryValue {
    /// Returns the property value of a record by name.
    pub fn property(&self, name: &str) -> Option<&QueryValue> {
        match self {
            QueryValue::Record { properties, .. } => properties
                .iter()
                .find(|(property, _)| property == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}
