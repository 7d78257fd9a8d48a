//! Resource routing subsystem.
//!
//! # Data Flow
//! ```text
//! Router construction (at startup):
//!     Interface[]
//!     → resource.rs (descriptors: verb, path, visibility)
//!     → router.rs (registry insert, last write wins)
//!     → Freeze as immutable Router
//!
//! Verb command (GET/POST/PUT/PATCH/DELETE):
//!     kwargs + _header_data
//!     → router.rs (path extraction, (verb, path) lookup)
//!     → resource call
//!     → (result, ReturnCode)
//! ```
//!
//! # Design Decisions
//! - Explicit descriptors instead of runtime discovery
//! - Deterministic: same (verb, path) always reaches the same resource

pub mod resource;
pub mod router;

pub use resource::{Handler, Interface, Resource, ResourceDescriptor, ResourceKey, Verb, Visibility};
pub use router::{ResourceRegistry, RouteBuilder, Router, HEADER_DATA_KWARG};
