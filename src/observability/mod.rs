//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (transaction_id, verb, path)
//!     → logging.rs (subscriber with env filter + fmt layer)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Transaction id flows through every event of a transaction as a span
//! - Lookup failures log at error, registration overwrites at debug

pub mod logging;

pub use logging::init_logging;
