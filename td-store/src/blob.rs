//! Filesystem-backed blob store.
//!
//! Objects are files addressed by slash-separated names under a single
//! root directory. The store only supports the operations the backend
//! needs: write, prefix listing, and per-object deletion. Per-user bulk
//! removal is a prefix listing followed by concurrent deletes driven by
//! the caller.

use std::path::{Path, PathBuf};

use tracing::debug;

use td_core::error::{TdError, TdResult};

/// Blob store rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open (creating if needed) a blob store rooted at `root`.
    pub fn open(root: &Path) -> TdResult<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an object, creating parent directories as needed.
    pub fn put_object(&self, name: &str, bytes: &[u8]) -> TdResult<()> {
        let path = self.object_path(name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        debug!("wrote object {name} ({} bytes)", bytes.len());
        Ok(())
    }

    /// List every object name beginning with `prefix`.
    ///
    /// A prefix that maps to no directory yields an empty list, matching
    /// the semantics of listing an unused bucket prefix.
    pub fn list_prefix(&self, prefix: &str) -> TdResult<Vec<String>> {
        let dir = self.object_path(prefix.trim_end_matches('/'))?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        collect_files(&dir, &self.root, &mut names)?;
        names.sort();
        Ok(names)
    }

    /// Delete a single object. Missing objects are not an error.
    pub async fn delete_object(&self, name: &str) -> TdResult<()> {
        let path = self.object_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("deleted object {name}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TdError::Storage(format!("delete {name}: {e}"))),
        }
    }

    /// Resolve an object name to its filesystem path, rejecting names that
    /// would escape the root.
    fn object_path(&self, name: &str) -> TdResult<PathBuf> {
        let trimmed = name.trim_matches('/');
        if trimmed.is_empty() {
            return Err(TdError::Storage("empty object name".into()));
        }
        for segment in trimmed.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(TdError::Storage(format!("invalid object name: {name}")));
            }
        }
        Ok(self.root.join(trimmed))
    }
}

/// Recursively collect file names under `dir` relative to `root`.
fn collect_files(dir: &Path, root: &Path, out: &mut Vec<String>) -> TdResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, root, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}
