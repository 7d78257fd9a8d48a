//! Transaction host.
//!
//! # Data Flow
//! ```text
//! Listener::accept
//!     → host.rs (spawn per connection, hold permit)
//!     → net::connection (framing)
//!     → pipeline.rs:
//!         decode_request_header
//!         → Marshaller::decode_package
//!         → Adapter::pre_digest
//!         → execute (verb → Router::dispatch | exposed command)
//!         → Adapter::post_digest / pre_respond / pre_encode_package
//!         → Marshaller::encode_package + response header
//!         → TransactionCache::clear
//! ```
//!
//! # Design Decisions
//! - Each transaction gets a UUID v4 id; it keys the upload cache and the
//!   tracing span
//! - Verbs always receive the request header data as `_header_data`

pub mod host;
pub mod pipeline;

pub use host::Server;
pub use pipeline::Pipeline;
