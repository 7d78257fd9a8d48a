//! One transaction, from header bytes to response bytes.
//!
//! # Responsibilities
//! - Decode the request header and body
//! - Run adapter hooks around command execution
//! - Resolve the command: HTTP verbs go through the router, other names
//!   reach resources exposed as commands
//! - Encode the response and clear the transaction cache
//!
//! # Design Decisions
//! - `handle` never fails: every error becomes a response whose status
//!   comes from `WireError::return_code` and whose reason is the message
//! - The cache is cleared after every transaction, successful or not

use std::sync::Arc;

use serde_json::Value;

use crate::adapters::{http_adapters, Adapter};
use crate::cache::TransactionCache;
use crate::config::{MarshallerKind, TransportConfig};
use crate::error::{WireError, WireResult};
use crate::http::header::{decode_request_header, encode_response_header, error_reason, outgoing_fields};
use crate::http::{FormMarshaller, HeaderData, JsonMarshaller, Marshaller};
use crate::package::{Kwargs, Package, ReturnCode};
use crate::routing::{Router, Verb, HEADER_DATA_KWARG};

/// Separator between the response header block and the body.
const HEADER_TERMINATOR: &[u8] = b"\n\n";

/// Request processing shared by every connection.
#[derive(Debug)]
pub struct Pipeline {
    router: Arc<Router>,
    marshaller: Arc<dyn Marshaller>,
    cache: Arc<dyn TransactionCache>,
    adapters: Vec<Arc<dyn Adapter>>,
    raw_response: bool,
    keep_alive: bool,
}

impl Pipeline {
    /// A pipeline with the HTTP adapter set and no raw responses.
    pub fn new(router: Arc<Router>, marshaller: Arc<dyn Marshaller>, cache: Arc<dyn TransactionCache>) -> Self {
        Self {
            router,
            marshaller,
            cache,
            adapters: http_adapters(),
            raw_response: false,
            keep_alive: false,
        }
    }

    pub fn from_config(router: Arc<Router>, transport: &TransportConfig, cache: Arc<dyn TransactionCache>) -> Self {
        let marshaller: Arc<dyn Marshaller> = match transport.marshaller {
            MarshallerKind::Form => Arc::new(FormMarshaller::new(Arc::clone(&cache))),
            MarshallerKind::Json => Arc::new(JsonMarshaller),
        };
        let mut pipeline = Self::new(router, marshaller, cache);
        pipeline.raw_response = transport.raw_response;
        pipeline.keep_alive = transport.keep_alive;
        pipeline
    }

    pub fn with_adapters(mut self, adapters: Vec<Arc<dyn Adapter>>) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn with_raw_response(mut self, raw_response: bool) -> Self {
        self.raw_response = raw_response;
        self
    }

    /// Process one request and produce the full response bytes.
    pub fn handle(&self, transaction_id: &str, header_block: &[u8], body: &[u8]) -> Vec<u8> {
        let span = tracing::debug_span!("transaction", transaction_id);
        let _entered = span.enter();

        let mut response = match decode_request_header(header_block) {
            Ok(mut header) => {
                let mut response = self
                    .digest(transaction_id, &mut header, body)
                    .unwrap_or_else(|err| self.error_response(&err));
                if let Err(err) = self.post_digest(transaction_id, &header, &mut response) {
                    response.fail(&err);
                }
                response
            }
            Err(err) => self.error_response(&err),
        };

        let bytes = match self.respond(transaction_id, &mut response) {
            Ok(bytes) => bytes,
            Err(err) => self.reject(&err),
        };

        if let Err(err) = self.cache.clear(transaction_id) {
            tracing::warn!(error = %err, "Failed to clear transaction cache");
        }

        tracing::debug!(code = %response.code, bytes = bytes.len(), "Transaction complete");
        bytes
    }

    /// Response bytes for a request that failed before reaching the pipeline.
    pub fn reject(&self, err: &WireError) -> Vec<u8> {
        let response = self.error_response(err);
        let body = err.to_string().into_bytes();
        assemble(&response, body)
    }

    /// Run `command` with `kwargs`.
    pub fn execute(&self, command: &str, mut kwargs: Kwargs, header: &HeaderData) -> WireResult<(Value, ReturnCode)> {
        if let Ok(verb) = command.parse::<Verb>() {
            kwargs.insert(HEADER_DATA_KWARG.into(), Value::Object(header.to_json()));
            return self.router.dispatch(verb, kwargs);
        }

        match self.router.command(command) {
            Some(resource) => Ok((resource.call(kwargs)?, ReturnCode::Ok)),
            None => {
                let err = WireError::CommandNotFound(command.to_string());
                tracing::error!(command, "{}", err);
                Err(err)
            }
        }
    }

    fn digest(&self, transaction_id: &str, header: &mut HeaderData, body: &[u8]) -> WireResult<Package> {
        let mut payload = self.marshaller.decode_package(transaction_id, header, body)?;
        for adapter in &self.adapters {
            adapter.pre_digest(transaction_id, header, &mut payload)?;
        }

        let command = payload
            .get("command")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| header.command.clone())
            .ok_or_else(|| WireError::Decode("request carries no command".into()))?;
        let kwargs = match payload.remove("kwargs") {
            Some(Value::Object(kwargs)) => kwargs,
            _ => Kwargs::new(),
        };

        tracing::debug!(command = %command, path = header.path.as_deref().unwrap_or_default(), "Executing");
        let (value, code) = self.execute(&command, kwargs, header)?;

        let mut response = Package::response(value, code);
        response.keep_alive = self.keep_alive;
        Ok(response)
    }

    fn post_digest(&self, transaction_id: &str, header: &HeaderData, response: &mut Package) -> WireResult<()> {
        for adapter in &self.adapters {
            adapter.post_digest(transaction_id, header, response)?;
        }
        Ok(())
    }

    fn respond(&self, transaction_id: &str, response: &mut Package) -> WireResult<Vec<u8>> {
        for adapter in &self.adapters {
            adapter.pre_respond(transaction_id, response)?;
        }
        for adapter in &self.adapters {
            adapter.pre_encode_package(transaction_id, response)?;
        }
        let body = self
            .marshaller
            .encode_package(transaction_id, response, self.raw_response)?;
        Ok(assemble(response, body))
    }

    fn error_response(&self, err: &WireError) -> Package {
        tracing::warn!(code = %err.return_code(), error = %err, "Transaction failed");
        let mut response = Package::response(Value::String(err.to_string()), err.return_code());
        response.keep_alive = self.keep_alive;
        response.fail(err);
        response
    }
}

/// Header block, separator, body.
fn assemble(package: &Package, body: Vec<u8>) -> Vec<u8> {
    let fields = outgoing_fields(package, body.len());
    let mut bytes = encode_response_header(package.code.as_u16(), &error_reason(package), &fields);
    bytes.extend_from_slice(HEADER_TERMINATOR);
    bytes.extend(body);
    bytes
}
