#![warn(missing_docs)]
//! # odata-payload-literals
//!
//! ## Purpose
//! Parses OData key/literal strings into typed primitives and renders typed
//! scalars back to literal text.
//!
//! ## Responsibilities
//! - Match key literals against the ordered literal grammar
//!   (`datetime'…'`, `guid'…'`, numeric suffixes, quoted strings, …).
//! - Render scalar values as URI key literals and as plain text.
//! - Canonicalize date/time text for lenient scalar comparison.
//!
//! ## Data flow
//! URI key expressions -> [`parse_key_literal`] -> [`PrimitiveValue`] consumed
//! by the query-value converter; scalar comparers and the HTML-form
//! serializer call [`format_literal`]/[`render_text`].
//!
//! ## Ownership and lifetimes
//! Pure functions over borrowed text producing owned values.
//!
//! ## Error model
//! Text matching no literal grammar fails fast with [`LiteralError`] carrying
//! the offending literal.

use percent_encoding::percent_decode_str;
use thiserror::Error;

use odata_payload_model::{PrimitiveValue, ScalarValue};

/// Parses one OData key/literal string into a typed primitive.
///
/// The grammar is an ordered pattern list; the first matching pattern wins.
/// Infinity/NaN are checked before the float/double suffix rules so they are
/// never misclassified as generic float literals. Empty input passes through
/// unchanged as a string.
///
/// # Errors
/// Returns [`LiteralError::Unrecognized`] when no pattern matches.
pub fn parse_key_literal(text: &str) -> Result<PrimitiveValue, LiteralError> {
    if text.is_empty() {
        return Ok(PrimitiveValue::untyped(ScalarValue::String(String::new())));
    }

    // Key literals arrive straight out of request URIs, so escaped characters
    // are decoded before any numeric/date parsing sees them.
    let decoded = percent_decode_str(text)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| text.to_string());
    let literal = decoded.as_str();

    let parsed = quoted_body(literal, "datetime")
        .map(|body| ScalarValue::DateTime(body.to_string()))
        .or_else(|| quoted_body(literal, "guid").map(|body| ScalarValue::Guid(body.to_string())))
        .or_else(|| suffixed(literal, &['L', 'l']).and_then(parse_int64))
        .or_else(|| suffixed(literal, &['M', 'm']).and_then(parse_decimal))
        .or_else(|| parse_special_double(literal))
        .or_else(|| suffixed(literal, &['F', 'f']).and_then(parse_single))
        .or_else(|| suffixed(literal, &['D', 'd']).and_then(parse_double))
        .or_else(|| parse_quoted_string(literal))
        .or_else(|| {
            quoted_body(literal, "datetimeoffset")
                .map(|body| ScalarValue::DateTimeOffset(body.to_string()))
        })
        .or_else(|| {
            quoted_body(literal, "duration")
                .or_else(|| quoted_body(literal, "time"))
                .map(|body| ScalarValue::Duration(body.to_string()))
        })
        .or_else(|| parse_boolean(literal))
        .or_else(|| {
            quoted_body(literal, "x")
                .or_else(|| quoted_body(literal, "binary"))
                .and_then(parse_binary)
        });

    match parsed {
        Some(value) => {
            let type_name = value.implied_type_name().map(str::to_string);
            Ok(PrimitiveValue { type_name, value })
        }
        None => Err(LiteralError::Unrecognized {
            literal: text.to_string(),
        }),
    }
}

/// Renders a scalar as an OData key/URI literal.
pub fn format_literal(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Null => "null".to_string(),
        ScalarValue::Boolean(flag) => flag.to_string(),
        ScalarValue::Int32(number) => number.to_string(),
        ScalarValue::Int64(number) => format!("{number}L"),
        ScalarValue::Single(number) => {
            if number.is_finite() {
                format!("{number}F")
            } else {
                render_non_finite(f64::from(*number))
            }
        }
        ScalarValue::Double(number) => {
            if number.is_finite() {
                format!("{number}D")
            } else {
                render_non_finite(*number)
            }
        }
        ScalarValue::Decimal(text) => format!("{text}M"),
        ScalarValue::String(text) => format!("'{}'", text.replace('\'', "''")),
        ScalarValue::Guid(text) => format!("guid'{text}'"),
        ScalarValue::DateTime(text) => format!("datetime'{text}'"),
        ScalarValue::DateTimeOffset(text) => format!("datetimeoffset'{text}'"),
        ScalarValue::Duration(text) => format!("duration'{text}'"),
        ScalarValue::Binary(bytes) => format!("binary'{}'", hex::encode_upper(bytes)),
        ScalarValue::Geometry(text) => format!("geometry'{text}'"),
        ScalarValue::Geography(text) => format!("geography'{text}'"),
    }
}

/// Renders a scalar as plain unadorned text (no quotes, no type suffixes).
///
/// This is the rendition used by the text-value format and by scalar
/// comparers, where differing but equivalent in-memory representations must
/// produce the same string.
pub fn render_text(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Null => "null".to_string(),
        ScalarValue::Boolean(flag) => flag.to_string(),
        ScalarValue::Int32(number) => number.to_string(),
        ScalarValue::Int64(number) => number.to_string(),
        ScalarValue::Single(number) => {
            if number.is_finite() {
                format!("{number}")
            } else {
                render_non_finite(f64::from(*number))
            }
        }
        ScalarValue::Double(number) => {
            if number.is_finite() {
                format!("{number}")
            } else {
                render_non_finite(*number)
            }
        }
        ScalarValue::Decimal(text) => trim_numeric(text),
        ScalarValue::String(text) => text.clone(),
        ScalarValue::Guid(text) => text.to_ascii_lowercase(),
        ScalarValue::DateTime(text) => canonicalize_date_time(text),
        ScalarValue::DateTimeOffset(text) => canonicalize_date_time(text),
        ScalarValue::Duration(text) => text.clone(),
        ScalarValue::Binary(bytes) => hex::encode(bytes),
        ScalarValue::Geometry(text) => text.clone(),
        ScalarValue::Geography(text) => text.clone(),
    }
}

/// Canonicalizes ISO-8601 date/time text for comparison.
///
/// Uppercases the `T`/`Z` markers and strips trailing fractional zeros, so
/// `2013-01-01t00:00:00.000` and `2013-01-01T00:00:00` compare equal.
pub fn canonicalize_date_time(text: &str) -> String {
    let mut canonical = text.trim().replace('t', "T").replace('z', "Z");
    if let Some(dot) = canonical.find('.') {
        let (head, fraction) = canonical.split_at(dot);
        let tail_start = fraction[1..]
            .find(|ch: char| !ch.is_ascii_digit())
            .map(|offset| dot + 1 + offset)
            .unwrap_or(canonical.len());
        let digits = &canonical[dot + 1..tail_start];
        let trimmed = digits.trim_end_matches('0');
        let mut rebuilt = String::from(head);
        if !trimmed.is_empty() {
            rebuilt.push('.');
            rebuilt.push_str(trimmed);
        }
        rebuilt.push_str(&canonical[tail_start..]);
        canonical = rebuilt;
    }
    canonical
}

fn quoted_body<'a>(literal: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = strip_prefix_ignore_case(literal, prefix)?;
    let body = rest.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(body)
}

fn strip_prefix_ignore_case<'a>(literal: &'a str, prefix: &str) -> Option<&'a str> {
    let head = literal.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&literal[prefix.len()..])
    } else {
        None
    }
}

fn suffixed<'a>(literal: &'a str, suffixes: &[char]) -> Option<&'a str> {
    let last = literal.chars().last()?;
    if suffixes.contains(&last) {
        Some(&literal[..literal.len() - last.len_utf8()])
    } else {
        None
    }
}

fn parse_int64(body: &str) -> Option<ScalarValue> {
    body.parse::<i64>().ok().map(ScalarValue::Int64)
}

fn parse_decimal(body: &str) -> Option<ScalarValue> {
    body.parse::<f64>()
        .ok()
        .map(|_| ScalarValue::Decimal(body.to_string()))
}

fn parse_special_double(literal: &str) -> Option<ScalarValue> {
    match literal {
        "INF" => Some(ScalarValue::Double(f64::INFINITY)),
        "-INF" => Some(ScalarValue::Double(f64::NEG_INFINITY)),
        "NaN" => Some(ScalarValue::Double(f64::NAN)),
        _ => None,
    }
}

fn parse_single(body: &str) -> Option<ScalarValue> {
    body.parse::<f32>().ok().map(ScalarValue::Single)
}

fn parse_double(body: &str) -> Option<ScalarValue> {
    body.parse::<f64>().ok().map(ScalarValue::Double)
}

fn parse_quoted_string(literal: &str) -> Option<ScalarValue> {
    let body = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(ScalarValue::String(body.replace("''", "'")))
}

fn parse_boolean(literal: &str) -> Option<ScalarValue> {
    match literal {
        "true" => Some(ScalarValue::Boolean(true)),
        "false" => Some(ScalarValue::Boolean(false)),
        _ => None,
    }
}

fn parse_binary(body: &str) -> Option<ScalarValue> {
    hex::decode(body).ok().map(ScalarValue::Binary)
}

fn render_non_finite(number: f64) -> String {
    if number.is_nan() {
        "NaN".to_string()
    } else if number > 0.0 {
        "INF".to_string()
    } else {
        "-INF".to_string()
    }
}

fn trim_numeric(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

/// Errors produced by literal parsing.
#[derive(Debug, Error)]
pub enum LiteralError {
    /// No literal grammar pattern matched the input.
    #[error("unrecognized key literal: `{literal}`")]
    Unrecognized {
        /// The offending literal text.
        literal: String,
    },
}

#[cfg(test)]
mod tests {
    //! Unit tests for the ordered literal grammar.

    use super::*;

    #[test]
    fn datetime_literal_parses_before_suffix_rules() {
        let parsed = parse_key_literal("datetime'2013-01-01T00:00:00'").expect("should parse");
        assert_eq!(
            parsed.value,
            ScalarValue::DateTime("2013-01-01T00:00:00".to_string())
        );
        assert_eq!(parsed.type_name.as_deref(), Some("Edm.DateTime"));
    }

    #[test]
    fn infinity_is_not_a_float_literal() {
        let inf = parse_key_literal("-INF").expect("should parse");
        assert_eq!(inf.value, ScalarValue::Double(f64::NEG_INFINITY));

        let nan = parse_key_literal("NaN").expect("should parse");
        match nan.value {
            ScalarValue::Double(number) => assert!(number.is_nan()),
            other => panic!("expected a double, got {other:?}"),
        }
    }

    #[test]
    fn suffixed_numerics_parse_to_their_types() {
        assert_eq!(
            parse_key_literal("123L").expect("int64").value,
            ScalarValue::Int64(123)
        );
        assert_eq!(
            parse_key_literal("1.50M").expect("decimal").value,
            ScalarValue::Decimal("1.50".to_string())
        );
        assert_eq!(
            parse_key_literal("2.5F").expect("single").value,
            ScalarValue::Single(2.5)
        );
        assert_eq!(
            parse_key_literal("2.5D").expect("double").value,
            ScalarValue::Double(2.5)
        );
    }

    #[test]
    fn quoted_strings_unescape_doubled_quotes() {
        assert_eq!(
            parse_key_literal("'ab''c'").expect("string").value,
            ScalarValue::String("ab'c".to_string())
        );
    }

    #[test]
    fn binary_literals_decode_hex() {
        assert_eq!(
            parse_key_literal("X'0AFF'").expect("binary").value,
            ScalarValue::Binary(vec![0x0A, 0xFF])
        );
        assert_eq!(
            parse_key_literal("binary'00'").expect("binary").value,
            ScalarValue::Binary(vec![0x00])
        );
    }

    #[test]
    fn unrecognized_literal_fails_with_offending_text() {
        let error = parse_key_literal("notakey").expect_err("should fail");
        assert!(error.to_string().contains("notakey"));
    }

    #[test]
    fn percent_encoded_literals_decode_before_parsing() {
        let parsed = parse_key_literal("datetime%272013-01-01T00%3A00%3A00%27")
            .expect("should parse after decoding");
        assert_eq!(
            parsed.value,
            ScalarValue::DateTime("2013-01-01T00:00:00".to_string())
        );
    }

    #[test]
    fn date_time_canonicalization_strips_fraction_zeros() {
        assert_eq!(
            canonicalize_date_time("2013-01-01t12:00:00.5000"),
            "2013-01-01T12:00:00.5"
        );
        assert_eq!(
            canonicalize_date_time("2013-01-01T12:00:00.000"),
            "2013-01-01T12:00:00"
        );
    }
}
