//! Filesystem-backed transaction cache.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::cache::{sanitize_component, staged_name, TransactionCache};
use crate::error::WireResult;

/// Stages uploads under `<root>/<transaction_id>/`.
#[derive(Debug, Clone)]
pub struct FsTransactionCache {
    root: PathBuf,
}

impl FsTransactionCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// A cache rooted at `<process temp dir>/<dir_name>`.
    pub fn in_temp_dir(dir_name: &str) -> Self {
        Self::new(std::env::temp_dir().join(dir_name))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn transaction_dir(&self, transaction_id: &str) -> PathBuf {
        self.root.join(sanitize_component(transaction_id))
    }
}

impl TransactionCache for FsTransactionCache {
    fn get(&self, transaction_id: &str) -> WireResult<PathBuf> {
        let path = self.transaction_dir(transaction_id);
        if !path.is_dir() {
            fs::create_dir_all(&path)?;
            tracing::debug!(transaction_id, path = ?path, "Created transaction cache");
        }
        Ok(path)
    }

    fn store(&self, transaction_id: &str, filename: &str, body: &[u8]) -> WireResult<PathBuf> {
        let dir = self.get(transaction_id)?;
        let filename = sanitize_component(filename);

        let mut attempt = 0;
        let path = loop {
            let candidate = dir.join(staged_name(&filename, attempt));
            if !candidate.exists() {
                break candidate;
            }
            attempt += 1;
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, body)?;
        tracing::debug!(transaction_id, path = ?path, bytes = body.len(), "Staged upload");
        Ok(path)
    }

    fn clear(&self, transaction_id: &str) -> WireResult<()> {
        let path = self.transaction_dir(transaction_id);
        match fs::remove_dir_all(&path) {
            Ok(()) => {
                tracing::debug!(transaction_id, path = ?path, "Cleared transaction cache");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsTransactionCache::new(dir.path().join("cache"));

        let path = cache.store("tx-1", "notes.txt", b"hello\x00world").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello\x00world");
        assert!(dir.path().join("cache").join("tx-1").is_dir());

        cache.clear("tx-1").unwrap();
        assert!(!dir.path().join("cache").join("tx-1").exists());

        // already gone
        cache.clear("tx-1").unwrap();
    }

    #[test]
    fn test_clear_removes_nested_content() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsTransactionCache::new(dir.path());

        let tx_dir = cache.get("tx-2").unwrap();
        fs::create_dir_all(tx_dir.join("nested/deeper")).unwrap();
        fs::write(tx_dir.join("nested/deeper/file.bin"), b"x").unwrap();

        cache.clear("tx-2").unwrap();
        assert!(!tx_dir.exists());
    }

    #[test]
    fn test_transactions_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsTransactionCache::new(dir.path());

        let a = cache.store("a", "same.txt", b"a").unwrap();
        let b = cache.store("b", "same.txt", b"b").unwrap();
        assert_ne!(a, b);

        cache.clear("a").unwrap();
        assert_eq!(fs::read(&b).unwrap(), b"b");
    }

    #[test]
    fn test_same_filename_twice_in_one_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsTransactionCache::new(dir.path());

        let first = cache.store("tx", "f.txt", b"AAA").unwrap();
        let second = cache.store("tx", "f.txt", b"BBB").unwrap();

        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "f.txt");
        assert_eq!(fs::read(&first).unwrap(), b"AAA");
        assert_eq!(fs::read(&second).unwrap(), b"BBB");

        cache.clear("tx").unwrap();
        assert!(!second.exists());
    }
}
