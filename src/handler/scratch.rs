//! Per-object scratch storage for downloaded documents.

use super::HandlerError;
use super::event::ObjectRef;
use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FALLBACK_FILE_NAME: &str = "document.pdf";

/// Uniquely named directory holding one downloaded object.
///
/// The directory and its contents are removed when the value is dropped, so every exit path
/// releases the space. Call [`ScratchDir::close`] to observe removal errors.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh directory under `root`, creating `root` if needed.
    pub fn create(root: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix("pdf-ingest-")
            .tempdir_in(root)?;
        tracing::debug!(path = %dir.path().display(), "Created scratch directory");
        Ok(Self { dir })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Local path an object with `key` is stored at.
    pub fn file_path(&self, key: &str) -> PathBuf {
        self.dir.path().join(local_file_name(key))
    }

    /// Fetch `object` from `store` into this directory.
    pub async fn download(
        &self,
        store: &dyn ObjectStore,
        object: &ObjectRef,
    ) -> Result<PathBuf, HandlerError> {
        let location = ObjectPath::from(object.key.as_str());
        let result = store
            .get(&location)
            .await
            .map_err(|source| HandlerError::download(&object.key, source))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|source| HandlerError::download(&object.key, source))?;

        let path = self.file_path(&object.key);
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!(
            key = %object.key,
            path = %path.display(),
            bytes = bytes.len(),
            "Downloaded object"
        );
        Ok(path)
    }

    /// Remove the directory, reporting failures instead of ignoring them.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// Base name of an object key, usable as a local file name.
fn local_file_name(key: &str) -> &str {
    match key.rsplit('/').next().map(str::trim) {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name,
        _ => FALLBACK_FILE_NAME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::{ObjectStore, PutPayload};

    #[test]
    fn file_names_follow_the_key_base_name() {
        assert_eq!(local_file_name("uploads/2024/report.pdf"), "report.pdf");
        assert_eq!(local_file_name("plain.pdf"), "plain.pdf");
        assert_eq!(local_file_name("dir/"), FALLBACK_FILE_NAME);
        assert_eq!(local_file_name("dir/.."), FALLBACK_FILE_NAME);
    }

    #[test]
    fn directories_are_unique_and_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let first = ScratchDir::create(root.path()).unwrap();
        let second = ScratchDir::create(root.path()).unwrap();
        assert_ne!(first.path(), second.path());
        assert_ne!(first.file_path("a/x.pdf"), second.file_path("b/x.pdf"));

        let kept = first.path().to_path_buf();
        drop(first);
        assert!(!kept.exists());
        second.close().unwrap();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn downloads_object_bytes() {
        let store = InMemory::new();
        store
            .put(
                &ObjectPath::from("uploads/report.pdf"),
                PutPayload::from(b"%PDF-1.4 body".to_vec()),
            )
            .await
            .unwrap();
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create(root.path()).unwrap();
        let object = ObjectRef {
            bucket: "inbox".into(),
            key: "uploads/report.pdf".into(),
        };

        let path = scratch.download(&store, &object).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "report.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = InMemory::new();
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create(root.path()).unwrap();
        let object = ObjectRef {
            bucket: "inbox".into(),
            key: "ghost.pdf".into(),
        };

        let error = scratch.download(&store, &object).await.unwrap_err();
        assert!(matches!(error, HandlerError::ObjectNotFound { .. }));
    }
}
