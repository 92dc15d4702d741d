//! Raw-text and `$count` payload conversion.

use odata_payload_literals::render_text;
use odata_payload_model::{ErrorPayload, PayloadElement, PrimitiveValue, ScalarValue};

use crate::normalize::normalize_tree;
use crate::{
    DeserializeContext, FormatError, FormatKind, FormatStrategy, ScalarComparer, check_encoding,
    decode_utf8,
};

/// Raw-text strategy for `$value` requests on non-binary primitives.
///
/// The body is the literal rendition of a single scalar. Failed requests may
/// come back as an HTML error page instead; those are sniffed into an error
/// payload so the caller sees the service message rather than markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextValueStrategy;

impl FormatStrategy for TextValueStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::Text
    }

    fn serialize(&self, payload: &PayloadElement, encoding: &str) -> Result<Vec<u8>, FormatError> {
        check_encoding(encoding)?;
        match payload {
            PayloadElement::Primitive(primitive) if primitive.is_null() => Ok(Vec::new()),
            PayloadElement::Primitive(primitive) => {
                Ok(render_text(&primitive.value).into_bytes())
            }
            other => Err(FormatError::UnsupportedElement {
                format: FormatKind::Text,
                element: other.element_type(),
            }),
        }
    }

    fn deserialize(
        &self,
        raw: &[u8],
        context: &DeserializeContext,
    ) -> Result<PayloadElement, FormatError> {
        let text = decode_utf8(raw, FormatKind::Text)?;
        let is_html = context
            .content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("text/html"));
        if is_html {
            return Ok(PayloadElement::Error(sniff_html_error(&text)));
        }
        Ok(PayloadElement::Primitive(PrimitiveValue::untyped(
            ScalarValue::String(text),
        )))
    }

    fn normalize(&self, payload: PayloadElement) -> Result<PayloadElement, FormatError> {
        Ok(normalize_tree(payload))
    }

    fn scalar_comparer(&self) -> ScalarComparer {
        ScalarComparer::new(FormatKind::Text)
    }
}

/// `$count` strategy: a plain-text decimal integer body.
///
/// Read-only; counts are never serialized from a tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountStrategy;

impl FormatStrategy for CountStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::Count
    }

    fn serialize(&self, _payload: &PayloadElement, _encoding: &str) -> Result<Vec<u8>, FormatError> {
        Err(FormatError::Unsupported {
            operation: "serialize",
            format: FormatKind::Count,
        })
    }

    fn deserialize(
        &self,
        raw: &[u8],
        _context: &DeserializeContext,
    ) -> Result<PayloadElement, FormatError> {
        let text = decode_utf8(raw, FormatKind::Count)?;
        let count: i64 = text
            .trim()
            .parse()
            .map_err(|_| FormatError::Malformed {
                format: FormatKind::Count,
                reason: format!("`{}` is not a count", text.trim()),
            })?;
        Ok(PayloadElement::Primitive(PrimitiveValue::typed(
            "Edm.Int64",
            ScalarValue::Int64(count),
        )))
    }

    fn normalize(&self, payload: PayloadElement) -> Result<PayloadElement, FormatError> {
        Ok(payload)
    }

    fn scalar_comparer(&self) -> ScalarComparer {
        ScalarComparer::new(FormatKind::Count)
    }
}

/// Extracts the service message and stack trace from an HTML error page.
///
/// The message sits between the fixed `<title>`/`</title>` markers and the
/// stack trace between `<pre>`/`</pre>`; absent markers leave the field unset.
pub fn sniff_html_error(html: &str) -> ErrorPayload {
    ErrorPayload {
        code: None,
        message: between(html, "<title>", "</title>").map(|text| text.trim().to_string()),
        stack_trace: between(html, "<pre>", "</pre>").map(|text| text.trim().to_string()),
    }
}

fn between<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let length = text[start..].find(close)?;
    Some(&text[start..start + length])
}
