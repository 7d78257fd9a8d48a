//! In-memory transaction cache.
//!
//! Paths returned by this cache are virtual (`memory/<transaction>/<file>`)
//! and only resolve through [`MemoryTransactionCache::read`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::{sanitize_component, staged_name, TransactionCache};
use crate::error::WireResult;

const VIRTUAL_ROOT: &str = "memory";

/// Map key of a path relative to the transaction area.
fn staged_key(relative: &Path) -> String {
    relative
        .iter()
        .map(|component| component.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTransactionCache {
    inner: Arc<DashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryTransactionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents previously staged at `path`.
    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        let mut components = path.strip_prefix(VIRTUAL_ROOT).ok()?.iter();
        let transaction_id = components.next()?.to_str()?;
        let key = staged_key(components.as_path());
        self.inner
            .get(transaction_id)
            .and_then(|files| files.get(&key).cloned())
    }

    /// Whether a staging area exists for the transaction.
    pub fn contains(&self, transaction_id: &str) -> bool {
        self.inner.contains_key(&sanitize_component(transaction_id))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl TransactionCache for MemoryTransactionCache {
    fn get(&self, transaction_id: &str) -> WireResult<PathBuf> {
        let key = sanitize_component(transaction_id);
        self.inner.entry(key.clone()).or_default();
        Ok(Path::new(VIRTUAL_ROOT).join(key))
    }

    fn store(&self, transaction_id: &str, filename: &str, body: &[u8]) -> WireResult<PathBuf> {
        let key = sanitize_component(transaction_id);
        let filename = sanitize_component(filename);

        let mut files = self.inner.entry(key.clone()).or_default();
        let mut attempt = 0;
        let relative = loop {
            let candidate = staged_name(&filename, attempt);
            if !files.contains_key(&staged_key(&candidate)) {
                break candidate;
            }
            attempt += 1;
        };
        files.insert(staged_key(&relative), body.to_vec());
        Ok(Path::new(VIRTUAL_ROOT).join(key).join(relative))
    }

    fn clear(&self, transaction_id: &str) -> WireResult<()> {
        self.inner.remove(&sanitize_component(transaction_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_operations() {
        let cache = MemoryTransactionCache::new();
        assert!(cache.is_empty());

        let path = cache.store("tx", "upload.bin", &[1, 2, 3]).unwrap();
        assert_eq!(path, Path::new("memory/tx/upload.bin"));
        assert_eq!(cache.read(&path), Some(vec![1, 2, 3]));
        assert!(cache.contains("tx"));

        cache.clear("tx").unwrap();
        cache.clear("tx").unwrap();
        assert!(!cache.contains("tx"));
        assert_eq!(cache.read(&path), None);
    }

    #[test]
    fn test_same_filename_twice_in_one_transaction() {
        let cache = MemoryTransactionCache::new();

        let first = cache.store("tx", "f.txt", b"AAA").unwrap();
        let second = cache.store("tx", "f.txt", b"BBB").unwrap();

        assert_eq!(first, Path::new("memory/tx/f.txt"));
        assert_eq!(second, Path::new("memory/tx/1/f.txt"));
        assert_eq!(cache.read(&first), Some(b"AAA".to_vec()));
        assert_eq!(cache.read(&second), Some(b"BBB".to_vec()));
    }
}
