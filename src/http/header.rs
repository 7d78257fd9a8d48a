//! HTTP header block codec.
//!
//! # Responsibilities
//! - Decode request ("question") and response header blocks into `HeaderData`
//! - Extract command, clean path and query-string kwargs from the request line
//! - Serialize command/status lines and header fields back into bytes
//!
//! # Design Decisions
//! - Field names are not canonicalized; lookups are exact
//! - Lines without a colon are skipped rather than rejected
//! - A malformed request or status line fails the whole transaction
//! - Encoded blocks use bare `\n` terminators; the decoder accepts both

use serde_json::{Map, Value};

use crate::error::{WireError, WireResult};
use crate::http::form::decode_component;
use crate::http::header_map::HeaderMap;
use crate::package::{Kwargs, Package, DEFAULT_ACCEPT_ENCODING};

pub const HTTP_VERSION: &str = "HTTP/1.1";
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONNECTION: &str = "Connection";

/// CORS preflight requests carry the real verb here.
pub const ACCESS_CONTROL_REQUEST_METHOD: &str = "Access-Control-Request-Method";

/// A decoded header block.
///
/// Transport metadata (command, path, query kwargs, status) is kept apart
/// from the header fields so adapters can move it without touching fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderData {
    pub fields: HeaderMap,
    /// Verb or command name taken from the request line.
    pub command: Option<String>,
    /// Request path without the query string.
    pub path: Option<String>,
    /// Keyword arguments parsed from the query string.
    pub kwargs: Option<Kwargs>,
    /// Response status code.
    pub code: Option<u16>,
    /// Response reason phrase.
    pub reason: Option<String>,
}

impl HeaderData {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    /// Header fields plus the request path, as handed to commands that
    /// take header data.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut map = self.fields.to_json();
        if let Some(path) = &self.path {
            map.insert("path".into(), Value::String(path.clone()));
        }
        map
    }
}

/// Split a block into its first line and the parsed field lines.
fn split_block(block: &[u8]) -> WireResult<(String, HeaderMap)> {
    let text = std::str::from_utf8(block)
        .map_err(|e| WireError::Decode(format!("header is not valid UTF-8: {}", e)))?;

    let mut lines = text.lines();
    let first = lines
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or_else(|| WireError::Decode("empty header block".into()))?;

    let mut fields = HeaderMap::new();
    for line in lines {
        // values keep their padding; only the line terminator goes
        let line = line.trim_start().trim_end_matches('\r');
        let Some((key, value)) = line.split_once(": ").or_else(|| line.split_once(':')) else {
            continue;
        };
        fields.insert(key, value);
    }

    Ok((first.to_string(), fields))
}

/// Parse `a=1&b=2` into keyword arguments.
pub fn parse_query(query: &str) -> Kwargs {
    let mut kwargs = Kwargs::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        kwargs.insert(decode_component(key), Value::String(decode_component(value)));
    }
    kwargs
}

fn default_accept_encoding(fields: &mut HeaderMap) {
    if !fields.contains(ACCEPT_ENCODING) {
        fields.insert(ACCEPT_ENCODING, DEFAULT_ACCEPT_ENCODING);
    }
}

/// Decode a request header block (`METHOD /path?query HTTP/1.1` + fields).
pub fn decode_request_header(block: &[u8]) -> WireResult<HeaderData> {
    let (request_line, mut fields) = split_block(block)?;

    let parts: Vec<&str> = request_line.split(' ').collect();
    let [method, target, _version] = parts.as_slice() else {
        return Err(WireError::Decode(format!("malformed request line: {:?}", request_line)));
    };

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (*target, None),
    };

    let command = fields
        .get(ACCESS_CONTROL_REQUEST_METHOD)
        .unwrap_or(*method)
        .to_string();

    default_accept_encoding(&mut fields);

    Ok(HeaderData {
        fields,
        command: Some(command),
        path: Some(path.to_string()),
        kwargs: Some(query.map(parse_query).unwrap_or_default()),
        code: None,
        reason: None,
    })
}

/// Decode a response header block (`HTTP/1.1 200 OK` + fields).
pub fn decode_response_header(block: &[u8]) -> WireResult<HeaderData> {
    let (status_line, mut fields) = split_block(block)?;

    let (_protocol, rest) = status_line.split_once(' ').unwrap_or((status_line.as_str(), ""));
    let (code, reason) = rest.split_once(' ').unwrap_or((rest, ""));
    let code: u16 = code
        .parse()
        .map_err(|_| WireError::Decode(format!("malformed status line: {:?}", status_line)))?;

    default_accept_encoding(&mut fields);

    Ok(HeaderData {
        fields,
        code: Some(code),
        reason: Some(reason.to_string()),
        ..HeaderData::default()
    })
}

fn encode_block(first_line: String, fields: &HeaderMap) -> Vec<u8> {
    let mut data = first_line;
    data.push('\n');
    for (key, value) in fields.iter() {
        data.push_str(key);
        data.push_str(": ");
        data.push_str(value.trim_end_matches(['\r', '\n']));
        data.push('\n');
    }
    data.truncate(data.trim_end().len());
    data.into_bytes()
}

/// Encode a request header block.
pub fn encode_request_header(command: &str, path: &str, fields: &HeaderMap) -> Vec<u8> {
    encode_block(format!("{} {} {}", command, path, HTTP_VERSION), fields)
}

/// Encode a response header block.
pub fn encode_response_header(code: u16, reason: &str, fields: &HeaderMap) -> Vec<u8> {
    encode_block(format!("{} {} {}", HTTP_VERSION, code, reason), fields)
}

/// Reason phrase for a response: the last traceback line, else the last
/// error message, else `OK`.
pub fn error_reason(package: &Package) -> String {
    let from_traceback = package
        .traceback
        .as_deref()
        .and_then(|tb| tb.lines().rev().map(str::trim).find(|line| !line.is_empty()));

    let reason = from_traceback.or_else(|| {
        package
            .errors
            .last()
            .and_then(|err| err.lines().map(str::trim).find(|line| !line.is_empty()))
    });

    reason.unwrap_or("OK").to_string()
}

/// Header fields sent with an outgoing package.
pub fn outgoing_fields(package: &Package, content_length: usize) -> HeaderMap {
    let mut fields = package.header_data.clone().unwrap_or_default();
    if package.keep_alive {
        fields.insert(CONNECTION, "keep-alive");
    }
    fields.insert(ACCEPT_ENCODING, package.accept_encoding.as_str());
    fields.insert(CONTENT_LENGTH, content_length.to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ReturnCode;
    use serde_json::json;

    #[test]
    fn test_decode_request_header() {
        let block = b"GET /items?limit=10&sort=asc HTTP/1.1\r\nHost: localhost:8080\r\nAccept: */*\r\n";
        let header = decode_request_header(block).unwrap();

        assert_eq!(header.command.as_deref(), Some("GET"));
        assert_eq!(header.path.as_deref(), Some("/items"));
        assert_eq!(header.get("Host"), Some("localhost:8080"));
        assert_eq!(header.get("Accept-Encoding"), Some("text/json"));

        let kwargs = header.kwargs.unwrap();
        assert_eq!(kwargs["limit"], json!("10"));
        assert_eq!(kwargs["sort"], json!("asc"));
    }

    #[test]
    fn test_decode_skips_lines_without_colon() {
        let block = b"POST / HTTP/1.1\nnot a header\n\nX-Test: yes\n";
        let header = decode_request_header(block).unwrap();
        assert_eq!(header.fields.len(), 2);
        assert_eq!(header.get("X-Test"), Some("yes"));
    }

    #[test]
    fn test_preflight_overrides_command() {
        let block = b"OPTIONS /items HTTP/1.1\nAccess-Control-Request-Method: DELETE\n";
        let header = decode_request_header(block).unwrap();
        assert_eq!(header.command.as_deref(), Some("DELETE"));
    }

    #[test]
    fn test_query_split_on_first_question_mark() {
        let header = decode_request_header(b"GET /a?q=what?&x=%20y HTTP/1.1").unwrap();
        assert_eq!(header.path.as_deref(), Some("/a"));
        let kwargs = header.kwargs.unwrap();
        assert_eq!(kwargs["q"], json!("what?"));
        assert_eq!(kwargs["x"], json!(" y"));
    }

    #[test]
    fn test_malformed_request_line() {
        assert!(matches!(
            decode_request_header(b"GET /only-two\nHost: x\n"),
            Err(WireError::Decode(_))
        ));
        assert!(matches!(decode_request_header(b""), Err(WireError::Decode(_))));
    }

    #[test]
    fn test_decode_response_header() {
        let header = decode_response_header(b"HTTP/1.1 404 Not Found\nContent-Length: 0\n").unwrap();
        assert_eq!(header.code, Some(404));
        assert_eq!(header.reason.as_deref(), Some("Not Found"));
        assert_eq!(header.get("Content-Length"), Some("0"));

        assert!(decode_response_header(b"HTTP/1.1 abc OK").is_err());
    }

    #[test]
    fn test_header_round_trip() {
        let fields: HeaderMap = [
            ("Host", "example.com"),
            ("Accept-Encoding", "gzip"),
            ("X-Value", "a: b"),
            ("x-value", "lower"),
        ]
        .into_iter()
        .collect();

        let block = encode_request_header("PUT", "/things", &fields);
        let decoded = decode_request_header(&block).unwrap();
        assert_eq!(decoded.fields, fields);

        let block = encode_response_header(200, "OK", &fields);
        let decoded = decode_response_header(&block).unwrap();
        assert_eq!(decoded.fields, fields);
    }

    #[test]
    fn test_round_trip_keeps_empty_and_padded_values() {
        let fields: HeaderMap = [
            ("Accept-Encoding", "gzip"),
            ("X-Empty", ""),
            ("X-Pad", "a "),
            ("Host", "h"),
        ]
        .into_iter()
        .collect();

        let block = encode_request_header("GET", "/", &fields);
        assert_eq!(block, b"GET / HTTP/1.1\nAccept-Encoding: gzip\nX-Empty: \nX-Pad: a \nHost: h".to_vec());

        let decoded = decode_request_header(&block).unwrap();
        assert_eq!(decoded.fields, fields);
        assert_eq!(decoded.get("X-Empty"), Some(""));
        assert_eq!(decoded.get("X-Pad"), Some("a "));
    }

    #[test]
    fn test_field_without_space_after_colon() {
        let decoded = decode_request_header(b"GET / HTTP/1.1\r\nX-Tight:value\r\nX-Bare:\r\n").unwrap();
        assert_eq!(decoded.get("X-Tight"), Some("value"));
        assert_eq!(decoded.get("X-Bare"), Some(""));
    }

    #[test]
    fn test_encode_strips_trailing_newlines() {
        let fields: HeaderMap = [("A", "1\r\n")].into_iter().collect();
        let block = encode_response_header(200, "OK", &fields);
        assert_eq!(block, b"HTTP/1.1 200 OK\nA: 1".to_vec());

        let block = encode_request_header("GET", "/", &HeaderMap::new());
        assert_eq!(block, b"GET / HTTP/1.1".to_vec());
    }

    #[test]
    fn test_error_reason() {
        let mut package = Package::response(json!(null), ReturnCode::Ok);
        assert_eq!(error_reason(&package), "OK");

        package.errors.push("first".into());
        package.errors.push("second".into());
        assert_eq!(error_reason(&package), "second");

        package.traceback = Some("Traceback:\n  frame\nValueError: boom\n".into());
        assert_eq!(error_reason(&package), "ValueError: boom");
    }

    #[test]
    fn test_outgoing_fields() {
        let mut package = Package::response(json!("ok"), ReturnCode::Ok);
        package.header_data_mut().insert("Content-Type", "text/json");
        package.keep_alive = true;

        let fields = outgoing_fields(&package, 42);
        assert_eq!(fields.get("Content-Type"), Some("text/json"));
        assert_eq!(fields.get("Connection"), Some("keep-alive"));
        assert_eq!(fields.get("Accept-Encoding"), Some("text/json"));
        assert_eq!(fields.get("Content-Length"), Some("42"));
    }
}
