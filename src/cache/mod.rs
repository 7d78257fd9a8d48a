//! Transaction-scoped staging for uploaded files.
//!
//! # Data Flow
//! ```text
//! multipart part with filename
//!     → TransactionCache::store(transaction_id, filename, bytes)
//!     → <root>/<transaction_id>/<filename>
//!     → path handed to the command as the kwarg value
//!
//! End of transaction:
//!     → TransactionCache::clear(transaction_id)
//! ```
//!
//! # Design Decisions
//! - Keyed by transaction id, so concurrent transactions never share a directory
//! - Directories are created lazily, on the first stored file
//! - Clearing is idempotent
//! - No internal locking: clearing a transaction while it is still
//!   decoding is the caller's problem

pub mod fs;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{CacheBackend, CacheConfig};
use crate::error::WireResult;

pub use fs::FsTransactionCache;
pub use memory::MemoryTransactionCache;

/// Storage for files uploaded during a transaction.
pub trait TransactionCache: Send + Sync + std::fmt::Debug {
    /// Location of the transaction's staging area, created on demand.
    fn get(&self, transaction_id: &str) -> WireResult<PathBuf>;

    /// Stage `body` under `filename`, returning the path handed to commands.
    fn store(&self, transaction_id: &str, filename: &str, body: &[u8]) -> WireResult<PathBuf>;

    /// Remove everything staged for the transaction.
    fn clear(&self, transaction_id: &str) -> WireResult<()>;
}

/// Build the configured cache backend.
pub fn from_config(config: &CacheConfig) -> Arc<dyn TransactionCache> {
    match config.backend {
        CacheBackend::Filesystem => Arc::new(FsTransactionCache::in_temp_dir(&config.directory_name)),
        CacheBackend::Memory => Arc::new(MemoryTransactionCache::new()),
    }
}

/// Location of the `attempt`-th upload called `filename` inside a
/// transaction: `filename`, then `1/filename`, `2/filename` and so on.
pub(crate) fn staged_name(filename: &str, attempt: usize) -> PathBuf {
    if attempt == 0 {
        PathBuf::from(filename)
    } else {
        PathBuf::from(attempt.to_string()).join(filename)
    }
}

/// Reduce a client-supplied name to a single safe path component.
///
/// Browsers may send full client paths with either separator.
pub(crate) fn sanitize_component(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => "upload".to_string(),
        other => other.to_string(),
    }
}
