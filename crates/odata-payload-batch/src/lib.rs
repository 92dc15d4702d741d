#![warn(missing_docs)]
//! # odata-payload-batch
//!
//! ## Purpose
//! Multipart encoder and decoder for `$batch` bodies: ordered parts, each a
//! bare operation or a changeset of operations sharing an inner boundary.
//!
//! ## Responsibilities
//! - Frame operations and changesets with CRLF multipart boundaries.
//! - Write request/response lines and headers, with operation bodies carried
//!   verbatim.
//! - Split a batch body back into parts, detecting nested changesets by
//!   their part content type.
//!
//! ## Data flow
//! [`BatchPayload`] -> [`serialize_batch`] -> bytes, and bytes ->
//! [`deserialize_batch`] -> [`BatchPayload`]; each operation body passes
//! through untouched in both directions.
//!
//! ## Ownership and lifetimes
//! Serialization appends into one output buffer owned by the call;
//! deserialization borrows the input and copies only what the parsed
//! structures keep.
//!
//! ## Error model
//! Encoding and boundary violations fail fast with [`BatchError`]; malformed
//! input carries the framing diagnostic. An empty batch or changeset writes
//! no closing boundary; that asymmetry is deliberate and round-trips.

use thiserror::Error;

use odata_payload_edm::{HttpRequestData, HttpResponseData, HttpVerb};

/// Ordered sequence of batch parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchPayload {
    /// Parts in wire order.
    pub parts: Vec<BatchPart>,
}

/// One batch part.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchPart {
    /// A bare operation.
    Operation(BatchOperation),
    /// A changeset of operations sharing an inner boundary.
    Changeset(Changeset),
}

/// Nested group of operations with its own multipart boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Changeset {
    /// Inner boundary; must differ from the outer batch boundary.
    pub boundary: String,
    /// Operations in wire order.
    pub operations: Vec<BatchOperation>,
}

/// One request or response inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOperation {
    /// An HTTP request part.
    Request(HttpRequestData),
    /// An HTTP response part.
    Response(HttpResponseData),
}

/// Serializes a batch into a multipart body.
///
/// Each part opens with `--boundary`; a closing `--boundary--` is written
/// only when the batch (or changeset) holds at least one part.
///
/// # Errors
/// Returns [`BatchError::UnsupportedEncoding`] outside the utf-8 family and
/// [`BatchError::BoundaryConflict`] when a changeset reuses the outer
/// boundary.
pub fn serialize_batch(
    payload: &BatchPayload,
    boundary: &str,
    encoding: &str,
) -> Result<Vec<u8>, BatchError> {
    check_encoding(encoding)?;
    for part in &payload.parts {
        if let BatchPart::Changeset(changeset) = part {
            if changeset.boundary == boundary {
                return Err(BatchError::BoundaryConflict {
                    boundary: boundary.to_string(),
                });
            }
        }
    }

    let mut out = Vec::new();
    for part in &payload.parts {
        write_line(&mut out, &format!("--{boundary}"));
        match part {
            BatchPart::Operation(operation) => {
                write_operation_part(&mut out, operation);
            }
            BatchPart::Changeset(changeset) => {
                write_line(
                    &mut out,
                    &format!(
                        "Content-Type: multipart/mixed; boundary={}",
                        changeset.boundary
                    ),
                );
                write_line(&mut out, "");
                for operation in &changeset.operations {
                    write_line(&mut out, &format!("--{}", changeset.boundary));
                    write_operation_part(&mut out, operation);
                }
                if !changeset.operations.is_empty() {
                    write_line(&mut out, &format!("--{}--", changeset.boundary));
                }
                // Trailing CRLF so the outer delimiter never swallows the
                // changeset's header blank line.
                out.extend_from_slice(b"\r\n");
            }
        }
    }
    if !payload.parts.is_empty() {
        write_line(&mut out, &format!("--{boundary}--"));
    }
    Ok(out)
}

fn write_operation_part(out: &mut Vec<u8>, operation: &BatchOperation) {
    write_line(out, "Content-Type: application/http");
    write_line(out, "Content-Transfer-Encoding: binary");
    write_line(out, "");
    match operation {
        BatchOperation::Request(request) => {
            write_line(
                out,
                &format!("{} {} HTTP/1.1", request.verb.as_str(), request.uri),
            );
            for (name, value) in &request.headers {
                write_line(out, &format!("{name}: {value}"));
            }
            write_line(out, "");
            out.extend_from_slice(&request.body);
        }
        BatchOperation::Response(response) => {
            write_line(
                out,
                &format!(
                    "HTTP/1.1 {} {}",
                    response.status,
                    reason_phrase(response.status)
                ),
            );
            for (name, value) in &response.headers {
                write_line(out, &format!("{name}: {value}"));
            }
            write_line(out, "");
            out.extend_from_slice(&response.body);
        }
    }
    out.extend_from_slice(b"\r\n");
}

fn write_line(out: &mut Vec<u8>, line: &str) {
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(b"\r\n");
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        304 => "Not Modified",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        412 => "Precondition Failed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Parses a multipart batch body.
///
/// # Errors
/// Returns [`BatchError::Malformed`] for broken framing and
/// [`BatchError::BoundaryConflict`] when a changeset declares the outer
/// boundary as its own.
pub fn deserialize_batch(raw: &[u8], boundary: &str) -> Result<BatchPayload, BatchError> {
    let mut parts = Vec::new();
    for content in split_parts(raw, boundary)? {
        let (headers, body) = split_headers(content)?;
        let content_type = header_value(&headers, "content-type").unwrap_or_default();
        if content_type
            .to_ascii_lowercase()
            .starts_with("multipart/mixed")
        {
            let inner = boundary_parameter(&content_type).ok_or_else(|| BatchError::Malformed {
                reason: "changeset part without a boundary parameter".to_string(),
            })?;
            if inner == boundary {
                return Err(BatchError::BoundaryConflict {
                    boundary: boundary.to_string(),
                });
            }
            let mut operations = Vec::new();
            for operation_content in split_parts(body, &inner)? {
                let (_, operation_body) = split_headers(operation_content)?;
                operations.push(parse_operation(operation_body)?);
            }
            parts.push(BatchPart::Changeset(Changeset {
                boundary: inner,
                operations,
            }));
        } else {
            parts.push(BatchPart::Operation(parse_operation(body)?));
        }
    }
    Ok(BatchPayload { parts })
}

/// Splits multipart content into part bodies delimited by `--boundary`
/// lines, up to the `--boundary--` closer. No boundary lines at all is a
/// valid empty sequence.
fn split_parts<'a>(input: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>, BatchError> {
    let marker = format!("--{boundary}");
    let marker = marker.as_bytes();
    let mut parts = Vec::new();
    let mut open: Option<usize> = None;
    let mut position = 0usize;

    while let Some(found) = find(&input[position..], marker) {
        let at = position + found;
        if at != 0 && !input[..at].ends_with(b"\r\n") {
            position = at + marker.len();
            continue;
        }
        if let Some(start) = open.take() {
            let end = at.saturating_sub(2).max(start);
            parts.push(&input[start..end]);
        }
        let after = at + marker.len();
        if input[after..].starts_with(b"--") {
            return Ok(parts);
        }
        let content_start = if input[after..].starts_with(b"\r\n") {
            after + 2
        } else {
            after
        };
        open = Some(content_start);
        position = content_start;
    }

    if open.is_some() {
        return Err(BatchError::Malformed {
            reason: "missing closing boundary".to_string(),
        });
    }
    Ok(parts)
}

fn split_headers(content: &[u8]) -> Result<(Vec<(String, String)>, &[u8]), BatchError> {
    let Some(split) = find(content, b"\r\n\r\n") else {
        return Err(BatchError::Malformed {
            reason: "part without a blank line after its headers".to_string(),
        });
    };
    let head = std::str::from_utf8(&content[..split]).map_err(|_| BatchError::Malformed {
        reason: "part headers are not valid utf-8".to_string(),
    })?;
    let mut headers = Vec::new();
    for line in head.split("\r\n").filter(|line| !line.is_empty()) {
        let Some((name, value)) = line.split_once(':') else {
            return Err(BatchError::Malformed {
                reason: format!("header line without a colon: `{line}`"),
            });
        };
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }
    Ok((headers, &content[split + 4..]))
}

fn parse_operation(content: &[u8]) -> Result<BatchOperation, BatchError> {
    let (head, body) = match find(content, b"\r\n\r\n") {
        Some(split) => (&content[..split], &content[split + 4..]),
        None => (content, &content[content.len()..]),
    };
    let head = std::str::from_utf8(head).map_err(|_| BatchError::Malformed {
        reason: "operation head is not valid utf-8".to_string(),
    })?;
    let mut lines = head.split("\r\n");
    let first_line = lines.next().unwrap_or_default();
    let mut headers = Vec::new();
    for line in lines.filter(|line| !line.is_empty()) {
        let Some((name, value)) = line.split_once(':') else {
            return Err(BatchError::Malformed {
                reason: format!("header line without a colon: `{line}`"),
            });
        };
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    if let Some(status_part) = first_line.strip_prefix("HTTP/1.1 ") {
        let status = status_part
            .split_whitespace()
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or_else(|| BatchError::Malformed {
                reason: format!("unreadable status line: `{first_line}`"),
            })?;
        return Ok(BatchOperation::Response(HttpResponseData {
            status,
            headers,
            body: body.to_vec(),
        }));
    }

    let mut tokens = first_line.split_whitespace();
    let verb = tokens
        .next()
        .and_then(HttpVerb::parse)
        .ok_or_else(|| BatchError::Malformed {
            reason: format!("unreadable request line: `{first_line}`"),
        })?;
    let uri = tokens
        .next()
        .ok_or_else(|| BatchError::Malformed {
            reason: format!("request line without a uri: `{first_line}`"),
        })?
        .to_string();
    Ok(BatchOperation::Request(HttpRequestData {
        verb,
        uri,
        headers,
        body: body.to_vec(),
    }))
}

fn header_value(headers: &[(String, String)], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}

fn boundary_parameter(content_type: &str) -> Option<String> {
    let (_, parameter) = content_type.split_once("boundary=")?;
    let value = parameter.split(';').next()?.trim();
    Some(value.trim_matches('"').to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn check_encoding(name: &str) -> Result<(), BatchError> {
    let normalized = name.trim().to_ascii_lowercase();
    if normalized.is_empty() || normalized == "utf-8" || normalized == "utf8" {
        Ok(())
    } else {
        Err(BatchError::UnsupportedEncoding(name.to_string()))
    }
}

/// Errors produced by batch framing.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The encoding name is outside the supported utf-8 family.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    /// A changeset declared the outer batch boundary as its own.
    #[error("changeset boundary `{boundary}` collides with the batch boundary")]
    BoundaryConflict {
        /// The colliding boundary text.
        boundary: String,
    },
    /// The body does not follow the multipart framing.
    #[error("malformed batch payload: {reason}")]
    Malformed {
        /// Framing diagnostic.
        reason: String,
    },
}
