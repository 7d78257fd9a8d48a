//! Configuration schema definitions.
//!
//! All sections derive Serde traits and fall back to defaults, so an empty
//! file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Wire format and framing limits.
    pub transport: TransportConfig,

    /// Upload staging.
    pub cache: CacheConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_connections: 1024,
        }
    }
}

/// Body marshaller used for every transaction.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarshallerKind {
    /// URL-encoded and multipart bodies.
    #[default]
    Form,
    /// Plain JSON bodies.
    Json,
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    pub marshaller: MarshallerKind,

    /// Wrap responses as `value=<json>` so the payload survives a round trip.
    pub raw_response: bool,

    /// Advertise `Connection: keep-alive` on responses.
    pub keep_alive: bool,

    /// Largest accepted header block in bytes.
    pub max_header_bytes: usize,

    /// Largest accepted body in bytes.
    pub max_body_bytes: usize,

    /// Time allowed to receive a full request, in seconds.
    pub read_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            marshaller: MarshallerKind::Form,
            raw_response: false,
            keep_alive: false,
            max_header_bytes: 16 * 1024,
            max_body_bytes: 16 * 1024 * 1024,
            read_timeout_secs: 30,
        }
    }
}

/// Where uploads are staged.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Files under the system temp directory.
    #[default]
    Filesystem,
    /// Process memory; paths are virtual.
    Memory,
}

/// Transaction cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Directory created under the system temp directory.
    pub directory_name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Filesystem,
            directory_name: "rest_bridge_cache".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
