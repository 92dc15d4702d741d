//! `application/x-www-form-urlencoded` payload conversion.

use odata_payload_literals::format_literal;
use odata_payload_model::PayloadElement;

use crate::json::element_to_json;
use crate::{
    DeserializeContext, FormatError, FormatKind, FormatStrategy, ScalarComparer, check_encoding,
};

/// Form-encoded strategy for action invocations posted as HTML forms.
///
/// Only a complex instance has a form rendition: each property becomes one
/// `name=value` pair in declaration order. Primitive values use their literal
/// form; nested complex values and multi-values are carried as inline JSON.
/// Forms are written, never read back.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormStrategy;

impl FormatStrategy for HtmlFormStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::HtmlForm
    }

    fn serialize(&self, payload: &PayloadElement, encoding: &str) -> Result<Vec<u8>, FormatError> {
        check_encoding(encoding)?;
        let PayloadElement::Complex(complex) = payload else {
            return Err(FormatError::UnsupportedElement {
                format: FormatKind::HtmlForm,
                element: payload.element_type(),
            });
        };

        let mut form = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &complex.properties {
            let rendered = match value {
                PayloadElement::Primitive(primitive) if primitive.is_null() => String::new(),
                PayloadElement::Primitive(primitive) => format_literal(&primitive.value),
                PayloadElement::Complex(_)
                | PayloadElement::PrimitiveMultiValue(_)
                | PayloadElement::ComplexMultiValue(_) => element_to_json(value)?.to_string(),
                other => {
                    return Err(FormatError::UnsupportedElement {
                        format: FormatKind::HtmlForm,
                        element: other.element_type(),
                    });
                }
            };
            form.append_pair(name, &rendered);
        }
        Ok(form.finish().into_bytes())
    }

    fn deserialize(
        &self,
        _raw: &[u8],
        _context: &DeserializeContext,
    ) -> Result<PayloadElement, FormatError> {
        Err(FormatError::Unsupported {
            operation: "deserialize",
            format: FormatKind::HtmlForm,
        })
    }

    fn normalize(&self, _payload: PayloadElement) -> Result<PayloadElement, FormatError> {
        Err(FormatError::Unsupported {
            operation: "normalize",
            format: FormatKind::HtmlForm,
        })
    }

    fn scalar_comparer(&self) -> ScalarComparer {
        ScalarComparer::new(FormatKind::HtmlForm)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for form encoding.

    use super::*;
    use odata_payload_model::{ComplexInstance, PrimitiveValue, ScalarValue};

    #[test]
    fn pairs_follow_declaration_order() {
        let complex = PayloadElement::Complex(
            ComplexInstance::new(None)
                .with_property(
                    "rating",
                    PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::Int32(4))),
                )
                .with_property(
                    "comment",
                    PayloadElement::Primitive(PrimitiveValue::untyped(ScalarValue::String(
                        "a & b".to_string(),
                    ))),
                ),
        );
        let bytes = HtmlFormStrategy.serialize(&complex, "utf-8").expect("serialize");
        assert_eq!(
            String::from_utf8(bytes).expect("utf-8"),
            "rating=4&comment=%27a+%26+b%27"
        );
    }

    #[test]
    fn forms_are_write_only() {
        let error = HtmlFormStrategy
            .deserialize(b"a=1", &DeserializeContext::default())
            .expect_err("reading a form must be rejected");
        assert!(matches!(error, FormatError::Unsupported { .. }));
    }
}
