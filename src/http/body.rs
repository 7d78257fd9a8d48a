//! Body marshalling.
//!
//! # Responsibilities
//! - Encode an outgoing package payload into response bytes
//! - Decode request bodies (URL-encoded, multipart, `value=`-wrapped JSON)
//!   into a payload map
//!
//! # Design Decisions
//! - Multipart parts become `kwargs`; a `command` part becomes the command
//! - Form decoding always runs over whatever the multipart pass left over
//! - A lone `value` field is read back as JSON, mirroring raw-response
//!   encoding. This also applies when a form happens to carry only a
//!   field called `value`.

use std::sync::Arc;

use serde_json::Value;

use crate::cache::TransactionCache;
use crate::error::{WireError, WireResult};
use crate::http::form::decode_form_into;
use crate::http::header::{HeaderData, CONTENT_TYPE};
use crate::http::multipart::{boundary_from_content_type, decode_multipart, MULTIPART_FORM_DATA};
use crate::package::{Kwargs, Package};

/// Field used to carry a JSON payload through a form body.
pub const RAW_VALUE_FIELD: &str = "value";

/// Converts packages to and from body bytes.
pub trait Marshaller: Send + Sync + std::fmt::Debug {
    /// Encode an outgoing package's payload.
    fn encode_package(&self, transaction_id: &str, package: &Package, raw_response: bool) -> WireResult<Vec<u8>>;

    /// Decode a request body into a payload map.
    fn decode_package(&self, transaction_id: &str, header: &HeaderData, body: &[u8]) -> WireResult<Kwargs>;
}

/// Render a value as response text: strings verbatim, everything else as JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Form/multipart marshaller for browser-style traffic.
#[derive(Debug, Clone)]
pub struct FormMarshaller {
    cache: Arc<dyn TransactionCache>,
}

impl FormMarshaller {
    pub fn new(cache: Arc<dyn TransactionCache>) -> Self {
        Self { cache }
    }
}

impl Marshaller for FormMarshaller {
    fn encode_package(&self, _transaction_id: &str, package: &Package, raw_response: bool) -> WireResult<Vec<u8>> {
        let text = if raw_response {
            format!("{}={}", RAW_VALUE_FIELD, serde_json::to_string(&package.payload)?)
        } else if let Some(response) = package.payload.get("response") {
            stringify(response)
        } else {
            serde_json::to_string(&package.payload)?
        };
        Ok(text.into_bytes())
    }

    fn decode_package(&self, transaction_id: &str, header: &HeaderData, body: &[u8]) -> WireResult<Kwargs> {
        let mut result = Kwargs::new();
        let mut remaining = body.to_vec();

        let content_type = header.get(CONTENT_TYPE).unwrap_or_default();
        if content_type.contains(MULTIPART_FORM_DATA) {
            let boundary = boundary_from_content_type(content_type)
                .ok_or_else(|| WireError::Multipart("missing boundary".into()))?;
            let form = decode_multipart(transaction_id, body, boundary, self.cache.as_ref())?;
            remaining = form.leftover.clone();

            let mut parts = form.into_kwargs();
            if let Some(command) = parts.remove("command") {
                result.insert("command".into(), command);
            }
            result.insert("kwargs".into(), Value::Object(parts));
        }

        decode_form_into(&String::from_utf8_lossy(&remaining), &mut result);

        if result.len() == 1 {
            if let Some(Value::String(raw)) = result.get(RAW_VALUE_FIELD) {
                return match serde_json::from_str(raw)? {
                    Value::Object(payload) => Ok(payload),
                    other => Err(WireError::Decode(format!(
                        "raw value is not a JSON object: {}",
                        other
                    ))),
                };
            }
        }

        Ok(result)
    }
}

/// Plain JSON marshaller: the payload is the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshaller;

impl Marshaller for JsonMarshaller {
    fn encode_package(&self, _transaction_id: &str, package: &Package, _raw_response: bool) -> WireResult<Vec<u8>> {
        Ok(serde_json::to_vec(&package.payload)?)
    }

    fn decode_package(&self, _transaction_id: &str, _header: &HeaderData, body: &[u8]) -> WireResult<Kwargs> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Kwargs::new());
        }
        match serde_json::from_slice(body)? {
            Value::Object(payload) => Ok(payload),
            other => Err(WireError::Decode(format!("body is not a JSON object: {}", other))),
        }
    }
}
