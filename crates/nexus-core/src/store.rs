//! Root-confined document store
//!
//! `DocumentStore` reads and writes documents under a single root directory.
//! Paths are validated with [`crate::paths`] and then checked against the
//! canonical root so symlinks cannot lead outside it.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{StorageError, StorageResult};
use crate::paths::{normalize_document, normalize_relative, DOCUMENT_EXTENSION};

/// Async access to the documents under one root directory
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Open a store, creating the root directory when it is missing
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();
        let display = root.display().to_string();

        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| StorageError::io(&display, e))?;

        let metadata = tokio::fs::metadata(root)
            .await
            .map_err(|e| StorageError::io(&display, e))?;
        if !metadata.is_dir() {
            return Err(StorageError::io(
                &display,
                std::io::Error::new(std::io::ErrorKind::Other, "root is not a directory"),
            ));
        }

        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| StorageError::io(&display, e))?;
        debug!("Opened document store at {}", root.display());

        Ok(Self { root })
    }

    /// Canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize a user-supplied document path without touching the disk
    pub fn document_path(&self, path: &str) -> StorageResult<String> {
        normalize_document(path)
    }

    /// Read and parse one document
    pub async fn read(&self, path: &str) -> StorageResult<Document> {
        let relative = normalize_document(path)?;
        let full_path = self.confine(&relative).await?;

        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(relative));
            }
            Err(e) => return Err(StorageError::io(relative, e)),
        };

        Document::parse(relative, &content)
    }

    /// Whether a document exists at `path`
    pub async fn exists(&self, path: &str) -> StorageResult<bool> {
        let relative = normalize_document(path)?;
        let full_path = self.confine(&relative).await?;
        tokio::fs::try_exists(&full_path)
            .await
            .map_err(|e| StorageError::io(relative, e))
    }

    /// Create a new document; fails if one already exists at its path
    pub async fn create(&self, document: &Document) -> StorageResult<String> {
        if self.exists(&document.path).await? {
            return Err(StorageError::AlreadyExists(
                normalize_document(&document.path)?,
            ));
        }
        self.write(document).await
    }

    /// Write a document, overwriting any existing file. Returns the
    /// normalized path it was written to.
    pub async fn write(&self, document: &Document) -> StorageResult<String> {
        let relative = normalize_document(&document.path)?;
        let full_path = self.confine(&relative).await?;
        let content = document.to_markdown()?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(&relative, e))?;
        }

        tokio::fs::write(&full_path, content)
            .await
            .map_err(|e| StorageError::io(&relative, e))?;
        debug!("Wrote document {}", relative);

        Ok(relative)
    }

    /// Delete a document
    pub async fn delete(&self, path: &str) -> StorageResult<String> {
        let relative = normalize_document(path)?;
        let full_path = self.confine(&relative).await?;

        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!("Deleted document {}", relative);
                Ok(relative)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(relative))
            }
            Err(e) => Err(StorageError::io(relative, e)),
        }
    }

    /// Recursively list document paths under `folder` (empty = whole store),
    /// sorted. Hidden files and directories are skipped.
    pub async fn list(&self, folder: &str) -> StorageResult<Vec<String>> {
        let relative = normalize_relative(folder)?;
        let dir = self.confine(&relative).await?;

        let is_dir = tokio::fs::metadata(&dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(StorageError::NotFound(relative));
        }

        let root = self.root.clone();
        tokio::task::spawn_blocking(move || walk_documents(&root, &dir))
            .await
            .map_err(|e| {
                StorageError::io(relative, std::io::Error::new(std::io::ErrorKind::Other, e))
            })
    }

    /// Join a normalized relative path onto the root and make sure the
    /// nearest existing ancestor still resolves inside the root.
    async fn confine(&self, relative: &str) -> StorageResult<PathBuf> {
        let full_path = self.root.join(relative);

        let mut existing = full_path.as_path();
        while !tokio::fs::try_exists(existing).await.unwrap_or(false) {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => break,
            }
        }

        let canonical = tokio::fs::canonicalize(existing)
            .await
            .map_err(|e| StorageError::io(relative, e))?;
        if !canonical.starts_with(&self.root) {
            return Err(StorageError::access_denied(
                relative,
                "path resolves outside the document root",
            ));
        }

        Ok(full_path)
    }
}

fn walk_documents(root: &Path, dir: &Path) -> Vec<String> {
    let mut paths = Vec::new();

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry during scan: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let is_document = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == DOCUMENT_EXTENSION);
        if !is_document {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            paths.push(joined);
        }
    }

    paths.sort();
    paths
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Metadata;
    use serde_json::json;
    use tempfile::TempDir;

    async fn store() -> (TempDir, DocumentStore) {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::open(temp.path()).await.unwrap();
        (temp, store)
    }

    fn doc(path: &str, title: &str) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("title".into(), json!(title));
        Document::new(path, metadata, "body\n")
    }

    #[tokio::test]
    async fn test_open_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("vault");
        let store = DocumentStore::open(&root).await.unwrap();
        assert!(root.is_dir());
        assert!(store.root().is_absolute());
    }

    #[tokio::test]
    async fn test_open_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        assert!(DocumentStore::open(&file).await.is_err());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_temp, store) = store().await;
        let path = store.write(&doc("notes/first", "First")).await.unwrap();
        assert_eq!(path, "notes/first.md");

        let read = store.read("notes/first").await.unwrap();
        assert_eq!(read.path, "notes/first.md");
        assert_eq!(read.metadata["title"], "First");
        assert_eq!(read.body, "body\n");
    }

    #[tokio::test]
    async fn test_create_refuses_overwrite() {
        let (_temp, store) = store().await;
        store.create(&doc("a.md", "A")).await.unwrap();
        let err = store.create(&doc("a.md", "again")).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(p) if p == "a.md"));
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_temp, store) = store().await;
        assert!(store.read("nope.md").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp, store) = store().await;
        store.write(&doc("gone.md", "Gone")).await.unwrap();
        store.delete("gone").await.unwrap();
        assert!(!store.exists("gone.md").await.unwrap());
        assert!(store.delete("gone").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_traversal_is_denied() {
        let (_temp, store) = store().await;
        let err = store.write(&doc("../escape.md", "x")).await.unwrap_err();
        assert!(err.is_access_denied());
        assert!(store.read(".hidden/a.md").await.unwrap_err().is_access_denied());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_is_denied() {
        let (temp, store) = store().await;
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();

        let err = store.write(&doc("link/evil.md", "x")).await.unwrap_err();
        assert!(err.is_access_denied());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nested_paths_and_inner_symlinks_are_confined() {
        let (temp, store) = store().await;
        let path = store.write(&doc("a/b/c/deep", "x")).await.unwrap();
        assert_eq!(path, "a/b/c/deep.md");

        std::os::unix::fs::symlink(temp.path().join("a"), temp.path().join("alias")).unwrap();
        let through_link = store.read("alias/b/c/deep.md").await.unwrap();
        assert_eq!(through_link.path, "alias/b/c/deep.md");

        store.write(&doc("alias/new/e.md", "y")).await.unwrap();
        assert!(temp.path().join("a/new/e.md").is_file());
    }

    #[tokio::test]
    async fn test_list_is_recursive_sorted_and_skips_hidden() {
        let (temp, store) = store().await;
        store.write(&doc("b.md", "B")).await.unwrap();
        store.write(&doc("goals/a.md", "A")).await.unwrap();
        store.write(&doc("goals/deep/c.md", "C")).await.unwrap();
        std::fs::create_dir_all(temp.path().join(".trash")).unwrap();
        std::fs::write(temp.path().join(".trash/old.md"), "x").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "x").unwrap();

        let all = store.list("").await.unwrap();
        assert_eq!(all, vec!["b.md", "goals/a.md", "goals/deep/c.md"]);

        let goals = store.list("goals").await.unwrap();
        assert_eq!(goals, vec!["goals/a.md", "goals/deep/c.md"]);
    }

    #[tokio::test]
    async fn test_list_missing_folder() {
        let (_temp, store) = store().await;
        assert!(store.list("nowhere").await.unwrap_err().is_not_found());
    }
}
