//! Upload directory access.
//!
//! Records store paths relative to the upload root (`documents/doc-<uuid>.pdf`),
//! so the root can move without rewriting rows.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Sub-directory for document uploads.
pub const DOCUMENTS_DIR: &str = "documents";
/// Sub-directory for profile images.
pub const PROFILES_DIR: &str = "profiles";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a stored path. Only normal components are kept,
    /// so a stored value can never point outside the root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let mut path = self.root.clone();
        for component in Path::new(relative).components() {
            if let Component::Normal(part) = component {
                path.push(part);
            }
        }
        path
    }

    /// Write `bytes` under `subdir/name` and return the stored relative path.
    pub async fn save(&self, subdir: &str, name: &str, bytes: &[u8]) -> io::Result<String> {
        let dir = self.root.join(subdir);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(name), bytes).await?;
        Ok(format!("{subdir}/{name}"))
    }

    pub async fn open(&self, relative: &str) -> io::Result<tokio::fs::File> {
        tokio::fs::File::open(self.resolve(relative)).await
    }

    /// Delete a stored file. Failures are logged and otherwise ignored: the
    /// owning record is already gone at this point.
    pub async fn remove(&self, relative: &str) {
        match tokio::fs::remove_file(self.resolve(relative)).await {
            Ok(()) => tracing::debug!(path = relative, "Removed stored file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = relative, "Stored file already absent");
            }
            Err(e) => tracing::warn!(path = relative, error = %e, "Failed to remove stored file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_drops_parent_components() {
        let store = FileStore::new("/srv/uploads");
        assert_eq!(
            store.resolve("documents/a.pdf"),
            PathBuf::from("/srv/uploads/documents/a.pdf")
        );
        assert_eq!(
            store.resolve("../../etc/passwd"),
            PathBuf::from("/srv/uploads/etc/passwd")
        );
        assert_eq!(
            store.resolve("/etc/passwd"),
            PathBuf::from("/srv/uploads/etc/passwd")
        );
    }

    #[tokio::test]
    async fn test_save_open_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let stored = store.save(DOCUMENTS_DIR, "doc-1.txt", b"hello").await.unwrap();
        assert_eq!(stored, "documents/doc-1.txt");
        assert!(store.open(&stored).await.is_ok());

        store.remove(&stored).await;
        let err = store.open(&stored).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        // Removing twice is harmless.
        store.remove(&stored).await;
    }
}
