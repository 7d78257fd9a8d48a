//! HTTP wire codec subsystem.
//!
//! # Data Flow
//! ```text
//! raw header block
//!     → header.rs (request line, fields, query kwargs)
//!     → negotiate.rs (response content type)
//! raw body
//!     → body.rs (marshaller selection, `value=` unwrap)
//!     → multipart.rs (parts, staged uploads, leftover)
//!     → form.rs (URL-encoded pairs)
//!     → payload map
//!
//! Outgoing:
//!     payload → body.rs → bytes
//!     package metadata → header.rs → header block
//! ```
//!
//! # Design Decisions
//! - Everything here is a pure function of its inputs, except file staging
//!   through the injected transaction cache
//! - No chunked transfer, no keep-alive handling; framing belongs to the host

pub mod body;
pub mod form;
pub mod header;
pub mod header_map;
pub mod multipart;
pub mod negotiate;

pub use body::{FormMarshaller, JsonMarshaller, Marshaller};
pub use header::HeaderData;
pub use header_map::HeaderMap;
