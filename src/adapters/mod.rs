//! Pipeline adapters.
//!
//! # Data Flow
//! ```text
//! decoded header + body
//!     → pre_digest (header_kwargs: query/body kwargs into one map)
//!     → command execution
//!     → post_digest (content_type: negotiated Content-Type)
//!     → pre_respond (content_type: header data exists)
//!     → pre_encode_package (header_kwargs: kwargs promoted to fields)
//!     → body encode
//! ```
//!
//! # Design Decisions
//! - Every hook defaults to a no-op; adapters override only what they need
//! - Adapters are stateless and shared across transactions

pub mod content_type;
pub mod header_kwargs;

use crate::error::WireResult;
use crate::http::HeaderData;
use crate::package::{Kwargs, Package};

pub use content_type::ContentTypeAdapter;
pub use header_kwargs::HeaderKwargsAdapter;

/// A hook set invoked by the pipeline for every transaction.
pub trait Adapter: Send + Sync + std::fmt::Debug {
    /// Identifier used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Before the command runs, with the decoded header and body payload.
    fn pre_digest(&self, _transaction_id: &str, _header: &mut HeaderData, _payload: &mut Kwargs) -> WireResult<()> {
        Ok(())
    }

    /// After the command ran, with the response about to be sent.
    fn post_digest(&self, _transaction_id: &str, _header: &HeaderData, _response: &mut Package) -> WireResult<()> {
        Ok(())
    }

    fn pre_respond(&self, _transaction_id: &str, _response: &mut Package) -> WireResult<()> {
        Ok(())
    }

    /// Right before the marshaller encodes the package body.
    fn pre_encode_package(&self, _transaction_id: &str, _package: &mut Package) -> WireResult<()> {
        Ok(())
    }
}

/// Adapter set for HTTP transports, in pipeline order.
pub fn http_adapters() -> Vec<std::sync::Arc<dyn Adapter>> {
    vec![
        std::sync::Arc::new(HeaderKwargsAdapter),
        std::sync::Arc::new(ContentTypeAdapter),
    ]
}
