//! Product photo files.
//!
//! A product owns at most one photo file, referenced by a path relative to the media
//! root. Mutations that drop a reference collect it in [`StaleAssets`]; the caller
//! releases those files once the store write has committed.

use std::{
    io,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use tokio::fs;
use uuid::Uuid;

/// Sub-directory of the media root holding product photos.
pub const PRODUCT_PHOTO_DIR: &str = "products";

#[derive(Debug, Clone)]
pub struct PhotoStorage {
    root: Arc<PathBuf>,
}

impl PhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a stored reference to a file path. References escaping the media root
    /// resolve to nothing.
    pub fn path_of(&self, reference: &str) -> Option<PathBuf> {
        let relative = Path::new(reference);
        if reference.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Writes a new photo file and returns its reference.
    pub async fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> io::Result<String> {
        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase());
        let file_name = match extension {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let reference = format!("{PRODUCT_PHOTO_DIR}/{file_name}");

        fs::create_dir_all(self.root.join(PRODUCT_PHOTO_DIR)).await?;
        fs::write(self.root.join(&reference), bytes).await?;
        tracing::debug!(photo = %reference, size = bytes.len(), "stored product photo");
        Ok(reference)
    }

    /// Removes a photo file. A file that is already gone counts as removed.
    pub async fn remove(&self, reference: &str) -> io::Result<()> {
        let Some(path) = self.path_of(reference) else {
            tracing::warn!(photo = %reference, "ignoring photo reference outside media root");
            return Ok(());
        };
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(photo = %reference, "removed product photo");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Photo files that lost their owner in a store mutation.
#[must_use = "stale photo files are only removed by calling `release`"]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StaleAssets(Vec<String>);

impl StaleAssets {
    pub fn none() -> Self {
        Self::default()
    }

    /// The old reference is stale when the product now points elsewhere (or nowhere).
    pub fn on_change(old: Option<String>, new: Option<&str>) -> Self {
        match old {
            Some(old) if !old.is_empty() && Some(old.as_str()) != new => Self(vec![old]),
            _ => Self::none(),
        }
    }

    pub fn on_delete(current: Option<String>) -> Self {
        Self(current.into_iter().filter(|r| !r.is_empty()).collect())
    }

    pub fn extend(&mut self, other: StaleAssets) {
        self.0.extend(other.0);
    }

    pub fn references(&self) -> &[String] {
        &self.0
    }

    /// Post-commit hook. Failures are logged and never undo the committed write.
    /// Returns how many references are gone from disk afterwards.
    pub async fn release(self, storage: &PhotoStorage) -> usize {
        let mut released = 0;
        for reference in self.0 {
            match storage.remove(&reference).await {
                Ok(()) => released += 1,
                Err(err) => {
                    tracing::warn!(photo = %reference, error = %err, "failed to remove stale product photo");
                }
            }
        }
        released
    }
}
