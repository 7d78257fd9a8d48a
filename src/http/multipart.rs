//! `multipart/form-data` decoding.
//!
//! # Responsibilities
//! - Locate the boundary markers and isolate the preamble/epilogue
//! - Split the part sequence and parse each part's disposition attributes
//! - Stage file parts in the transaction cache and hand back their paths
//!
//! # Design Decisions
//! - Works on bytes so uploaded files survive untouched
//! - Text outside the part sequence is returned as leftover, so plain form
//!   fields mixed into the same request can still be recovered
//! - A part without a `name` attribute fails the decode

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::cache::TransactionCache;
use crate::error::{WireError, WireResult};
use crate::package::Kwargs;

pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Value of a decoded part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Inline text content.
    Text(String),
    /// Path of the staged upload.
    File(PathBuf),
}

/// A single decoded part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartField {
    pub name: String,
    pub filename: Option<String>,
    /// Remaining disposition attributes and sibling part headers.
    pub attributes: BTreeMap<String, String>,
    pub value: FieldValue,
}

/// Result of decoding a multipart body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<MultipartField>,
    /// Preamble and epilogue bytes.
    pub leftover: Vec<u8>,
}

impl MultipartForm {
    /// Fields as keyword arguments; a repeated name keeps its last value.
    pub fn into_kwargs(self) -> Kwargs {
        self.fields
            .into_iter()
            .map(|field| {
                let value = match field.value {
                    FieldValue::Text(text) => text,
                    FieldValue::File(path) => path.to_string_lossy().into_owned(),
                };
                (field.name, Value::String(value))
            })
            .collect()
    }
}

/// Boundary token from a `Content-Type` value: whatever follows
/// `boundary=` in the last `; ` segment.
pub fn boundary_from_content_type(content_type: &str) -> Option<&str> {
    let last = content_type.rsplit("; ").next()?;
    let boundary = last.trim().strip_prefix("boundary=")?;
    let boundary = boundary.trim_matches('"');
    (!boundary.is_empty()).then_some(boundary)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn split<'a>(mut haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    while let Some(index) = find(haystack, needle) {
        parts.push(&haystack[..index]);
        haystack = &haystack[index + needle.len()..];
    }
    parts.push(haystack);
    parts
}

fn trim_leading_newlines(mut bytes: &[u8]) -> &[u8] {
    while let [b'\r' | b'\n', rest @ ..] = bytes {
        bytes = rest;
    }
    bytes
}

fn trim_newlines(bytes: &[u8]) -> &[u8] {
    let mut bytes = trim_leading_newlines(bytes);
    while let [rest @ .., b'\r' | b'\n'] = bytes {
        bytes = rest;
    }
    bytes
}

/// Split a part on its first blank line into headers and body.
fn split_part(part: &[u8]) -> Option<(&[u8], &[u8])> {
    let crlf = find(part, b"\r\n\r\n").map(|i| (i, 4));
    let lf = find(part, b"\n\n").map(|i| (i, 2));
    let (index, len) = match (crlf, lf) {
        (Some(a), Some(b)) => if a.0 <= b.0 { a } else { b },
        (a, b) => a.or(b)?,
    };
    Some((&part[..index], &part[index + len..]))
}

/// Split a disposition value on `;`, ignoring separators inside quotes.
fn split_attributes(value: &str) -> Vec<&str> {
    let mut attributes = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (index, ch) in value.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                attributes.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    attributes.push(&value[start..]);
    attributes
}

fn clean_attribute(raw: &str) -> String {
    raw.trim().trim_matches('\r').replace('"', "")
}

/// Parse part headers into an attribute map.
fn parse_part_headers(headers: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();

    for line in headers.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        if !name.trim().eq_ignore_ascii_case("Content-Disposition") {
            attributes.insert(name.trim().to_string(), value.trim().to_string());
            continue;
        }

        // skip the disposition type itself ("form-data")
        for attribute in split_attributes(value).into_iter().skip(1) {
            if let Some((key, value)) = attribute.split_once('=') {
                attributes.insert(clean_attribute(key), clean_attribute(value));
            }
        }
    }

    attributes
}

fn decode_part(
    transaction_id: &str,
    part: &[u8],
    cache: &dyn TransactionCache,
) -> WireResult<MultipartField> {
    let (headers, body) = split_part(part)
        .ok_or_else(|| WireError::Multipart("part has no header separator".into()))?;
    let body = trim_newlines(body);

    let mut attributes = parse_part_headers(&String::from_utf8_lossy(headers));
    let name = attributes
        .remove("name")
        .ok_or_else(|| WireError::Multipart("part has no name attribute".into()))?;
    let filename = attributes.remove("filename");

    let value = match &filename {
        Some(filename) => FieldValue::File(cache.store(transaction_id, filename, body)?),
        None => FieldValue::Text(String::from_utf8_lossy(body).into_owned()),
    };

    Ok(MultipartField {
        name,
        filename,
        attributes,
        value,
    })
}

/// Decode a multipart body delimited by `boundary`.
pub fn decode_multipart(
    transaction_id: &str,
    body: &[u8],
    boundary: &str,
    cache: &dyn TransactionCache,
) -> WireResult<MultipartForm> {
    let marker = format!("--{}", boundary).into_bytes();
    let closing = format!("--{}--", boundary).into_bytes();

    let Some(start) = find(body, &marker) else {
        tracing::debug!(transaction_id, "No multipart boundary found in body");
        return Ok(MultipartForm {
            fields: Vec::new(),
            leftover: body.to_vec(),
        });
    };

    let preamble = &body[..start];
    let rest = &body[start..];
    let (middle, epilogue) = match find(rest, &closing) {
        Some(end) => (&rest[..end], &rest[end + closing.len()..]),
        None => (rest, &[][..]),
    };

    let mut fields = Vec::new();
    for part in split(middle, &marker) {
        let trimmed = trim_newlines(part);
        if trimmed.is_empty() || trimmed == b"--" {
            continue;
        }
        let part = trim_leading_newlines(part);
        fields.push(decode_part(transaction_id, part, cache)?);
    }

    tracing::debug!(transaction_id, parts = fields.len(), "Decoded multipart body");

    let mut leftover = preamble.to_vec();
    leftover.extend_from_slice(epilogue);
    Ok(MultipartForm { fields, leftover })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTransactionCache;
    use serde_json::json;

    #[test]
    fn test_boundary_from_content_type() {
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=----abc123"),
            Some("----abc123")
        );
        assert_eq!(
            boundary_from_content_type("multipart/form-data; charset=utf-8; boundary=\"xyz\""),
            Some("xyz")
        );
        assert_eq!(boundary_from_content_type("multipart/form-data"), None);
    }

    #[test]
    fn test_single_text_part() {
        let cache = MemoryTransactionCache::new();
        let body = b"--B\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\nhello\r\n--B--";

        let form = decode_multipart("tx", body, "B", &cache).unwrap();
        assert!(form.leftover.is_empty());
        assert_eq!(form.fields.len(), 1);
        assert_eq!(form.fields[0].value, FieldValue::Text("hello".into()));
        assert_eq!(form.into_kwargs()["x"], json!("hello"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_file_part_is_staged() {
        let cache = MemoryTransactionCache::new();
        let body = b"--B\r\n\
Content-Disposition: form-data; name=\"doc\"; filename=\"a.bin\"\r\n\
Content-Type: application/octet-stream\r\n\
\r\n\
\x00\x01binary\r\n\
--B\r\n\
Content-Disposition: form-data; name=\"title\"\r\n\
\r\n\
My file\r\n\
--B--\r\n";

        let form = decode_multipart("tx-9", body, "B", &cache).unwrap();
        assert_eq!(form.leftover, b"\r\n");

        let doc = &form.fields[0];
        assert_eq!(doc.name, "doc");
        assert_eq!(doc.filename.as_deref(), Some("a.bin"));
        assert_eq!(
            doc.attributes.get("Content-Type").map(String::as_str),
            Some("application/octet-stream")
        );
        let FieldValue::File(path) = &doc.value else {
            panic!("expected a staged file");
        };
        assert_eq!(cache.read(path).unwrap(), b"\x00\x01binary");

        assert_eq!(form.fields[1].value, FieldValue::Text("My file".into()));
    }

    #[test]
    fn test_preamble_and_epilogue_are_leftover() {
        let cache = MemoryTransactionCache::new();
        let body = b"a=1\r\n--B\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\ny\r\n--B--\r\nb=2";

        let form = decode_multipart("tx", body, "B", &cache).unwrap();
        assert_eq!(form.leftover, b"a=1\r\n\r\nb=2");
        assert_eq!(form.fields.len(), 1);
    }

    #[test]
    fn test_quoted_semicolon_in_filename() {
        let cache = MemoryTransactionCache::new();
        let body = b"--B\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"a;b.txt\"\r\n\r\nx\r\n--B--";

        let form = decode_multipart("tx", body, "B", &cache).unwrap();
        assert_eq!(form.fields[0].filename.as_deref(), Some("a;b.txt"));
        let FieldValue::File(path) = &form.fields[0].value else {
            panic!("expected a staged file");
        };
        assert!(path.ends_with("a;b.txt"));
    }

    #[test]
    fn test_file_parts_sharing_a_filename() {
        let cache = MemoryTransactionCache::new();
        let body = b"--B\r\n\
Content-Disposition: form-data; name=\"a\"; filename=\"f.txt\"\r\n\r\nAAA\r\n\
--B\r\n\
Content-Disposition: form-data; name=\"b\"; filename=\"f.txt\"\r\n\r\nBBB\r\n\
--B--";

        let kwargs = decode_multipart("tx", body, "B", &cache).unwrap().into_kwargs();
        let a = std::path::Path::new(kwargs["a"].as_str().unwrap());
        let b = std::path::Path::new(kwargs["b"].as_str().unwrap());

        assert_ne!(a, b);
        assert_eq!(cache.read(a).unwrap(), b"AAA");
        assert_eq!(cache.read(b).unwrap(), b"BBB");
    }

    #[test]
    fn test_empty_text_part() {
        let cache = MemoryTransactionCache::new();
        let body = b"--B\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\n\r\n--B--";
        let form = decode_multipart("tx", body, "B", &cache).unwrap();
        assert_eq!(form.fields[0].value, FieldValue::Text(String::new()));
    }

    #[test]
    fn test_part_without_name_fails() {
        let cache = MemoryTransactionCache::new();
        let body = b"--B\r\nContent-Disposition: form-data\r\n\r\nvalue\r\n--B--";
        assert!(matches!(
            decode_multipart("tx", body, "B", &cache),
            Err(WireError::Multipart(_))
        ));
    }

    #[test]
    fn test_body_without_boundary() {
        let cache = MemoryTransactionCache::new();
        let form = decode_multipart("tx", b"plain=1", "B", &cache).unwrap();
        assert!(form.fields.is_empty());
        assert_eq!(form.leftover, b"plain=1");
    }
}
