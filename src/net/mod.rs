//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (header block + Content-Length body)
//!     → server::Pipeline (blocking pool)
//!     → response bytes written, connection closed
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Framing errors are answered with a 400 before the pipeline runs

pub mod connection;
pub mod listener;

pub use connection::{read_request, serve_connection, ConnectionError, FramingLimits, RawRequest};
pub use listener::{ConnectionPermit, Listener, ListenerError};
