//! The envelope exchanged with the host for a single transaction.
//!
//! # Design Decisions
//! - The payload is a JSON object; `command`, `args`, `kwargs` and
//!   `response` live inside it as ordinary fields
//! - Header data is optional and created on first write
//! - Return codes double as HTTP status codes

use serde_json::{Map, Value};

use crate::error::WireError;
use crate::http::header_map::HeaderMap;

/// Keyword arguments carried by a package.
pub type Kwargs = Map<String, Value>;

/// Default `Accept-Encoding` advertised by packages.
pub const DEFAULT_ACCEPT_ENCODING: &str = "text/json";

/// Outcome code of a transaction, rendered as the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Ok,
    BadRequest,
    NotFound,
    ServerError,
}

impl ReturnCode {
    pub fn as_u16(self) -> u16 {
        match self {
            ReturnCode::Ok => 200,
            ReturnCode::BadRequest => 400,
            ReturnCode::NotFound => 404,
            ReturnCode::ServerError => 500,
        }
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// A single request or response exchanged with the host.
#[derive(Debug, Clone)]
pub struct Package {
    /// Body fields.
    pub payload: Kwargs,
    /// Transport metadata attached to the package.
    pub header_data: Option<HeaderMap>,
    pub code: ReturnCode,
    /// Structured error messages, most recent last.
    pub errors: Vec<String>,
    /// Captured stack trace text, if the command failed with one.
    pub traceback: Option<String>,
    pub keep_alive: bool,
    pub accept_encoding: String,
}

impl Package {
    /// Create a package around an existing payload.
    pub fn new(payload: Kwargs) -> Self {
        Self {
            payload,
            header_data: None,
            code: ReturnCode::Ok,
            errors: Vec::new(),
            traceback: None,
            keep_alive: false,
            accept_encoding: DEFAULT_ACCEPT_ENCODING.to_string(),
        }
    }

    /// A question carrying a command and its keyword arguments.
    pub fn question(command: impl Into<String>, kwargs: Kwargs) -> Self {
        let mut payload = Kwargs::new();
        payload.insert("command".into(), Value::String(command.into()));
        payload.insert("kwargs".into(), Value::Object(kwargs));
        Self::new(payload)
    }

    /// A response wrapping a command result.
    pub fn response(value: Value, code: ReturnCode) -> Self {
        let mut payload = Kwargs::new();
        payload.insert("response".into(), value);
        let mut package = Self::new(payload);
        package.code = code;
        package
    }

    pub fn command(&self) -> Option<&str> {
        self.payload.get("command").and_then(Value::as_str)
    }

    /// Positional arguments; empty when absent.
    pub fn args(&self) -> &[Value] {
        match self.payload.get("args") {
            Some(Value::Array(args)) => args,
            _ => &[],
        }
    }

    pub fn kwargs(&self) -> Option<&Kwargs> {
        self.payload.get("kwargs").and_then(Value::as_object)
    }

    /// Header data, created empty on first access.
    pub fn header_data_mut(&mut self) -> &mut HeaderMap {
        self.header_data.get_or_insert_with(HeaderMap::new)
    }

    /// True when the package carries error information.
    pub fn is_error(&self) -> bool {
        !self.errors.is_empty() || self.traceback.is_some()
    }

    /// Record a failure on this package.
    pub fn fail(&mut self, err: &WireError) {
        self.code = err.return_code();
        self.errors.push(err.to_string());
    }
}
