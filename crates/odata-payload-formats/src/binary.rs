//! Raw-binary payload conversion for streams and media resources.

use odata_payload_model::{PayloadElement, PrimitiveValue, ScalarValue};

use crate::{
    DeserializeContext, FormatError, FormatKind, FormatStrategy, ScalarComparer,
};

/// Opaque-bytes strategy.
///
/// Media-resource and named-stream bodies pass through byte-exact; a null
/// primitive serializes to an empty body. Also the fallback for content types
/// no other strategy claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryStrategy;

impl FormatStrategy for BinaryStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::Binary
    }

    // The encoding is ignored: bytes are not text.
    fn serialize(&self, payload: &PayloadElement, _encoding: &str) -> Result<Vec<u8>, FormatError> {
        match payload {
            PayloadElement::Primitive(PrimitiveValue {
                value: ScalarValue::Binary(bytes),
                ..
            }) => Ok(bytes.clone()),
            PayloadElement::Primitive(primitive) if primitive.is_null() => Ok(Vec::new()),
            other => Err(FormatError::UnsupportedElement {
                format: FormatKind::Binary,
                element: other.element_type(),
            }),
        }
    }

    fn deserialize(
        &self,
        raw: &[u8],
        _context: &DeserializeContext,
    ) -> Result<PayloadElement, FormatError> {
        Ok(PayloadElement::Primitive(PrimitiveValue::untyped(
            ScalarValue::Binary(raw.to_vec()),
        )))
    }

    fn normalize(&self, payload: PayloadElement) -> Result<PayloadElement, FormatError> {
        Ok(payload)
    }

    fn scalar_comparer(&self) -> ScalarComparer {
        ScalarComparer::new(FormatKind::Binary)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for opaque-byte handling.

    use super::*;

    #[test]
    fn bytes_pass_through_unchanged() {
        let payload = PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::Binary(
            vec![0x00, 0xff, 0x10],
        )));
        let bytes = BinaryStrategy.serialize(&payload, "utf-8").expect("serialize");
        assert_eq!(bytes, vec![0x00, 0xff, 0x10]);
        assert_eq!(
            BinaryStrategy
                .deserialize(&bytes, &DeserializeContext::default())
                .expect("deserialize"),
            payload
        );
    }

    #[test]
    fn null_serializes_to_an_empty_body() {
        let bytes = BinaryStrategy
            .serialize(
                &PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::Null)),
                "utf-8",
            )
            .expect("serialize");
        assert!(bytes.is_empty());
    }

    #[test]
    fn structured_trees_are_rejected() {
        let error = BinaryStrategy
            .serialize(
                &PayloadElement::EntitySet(Default::default()),
                "utf-8",
            )
            .expect_err("feeds have no byte form");
        assert!(matches!(error, FormatError::UnsupportedElement { .. }));
    }
}
