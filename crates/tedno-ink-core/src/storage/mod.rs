//! Storage abstraction for stroke persistence.

mod autosave;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use autosave::{AutoSave, AutoSaveConfig, DEFAULT_DEBOUNCE_MS, PendingSave};
pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::stroke::{SavedStroke, StrokeId, StrokeRecord};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for stroke storage backends.
///
/// Strokes are scoped to a document id; nothing a backend does for one
/// document may touch another.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Load the strokes of a document, bottom to top.
    ///
    /// Fails with [`StorageError::NotFound`] for a document that was never saved.
    fn load_strokes(&self, document_id: &str) -> BoxFuture<'_, StorageResult<Vec<StrokeRecord>>>;

    /// Upsert `strokes` and delete every stored stroke of the document whose
    /// id is absent from them. Afterwards the document holds exactly `strokes`.
    fn save_strokes(
        &self,
        document_id: &str,
        strokes: &[SavedStroke],
    ) -> BoxFuture<'_, StorageResult<()>>;

    /// List the ids of all stored documents.
    fn list_documents(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Delete a document and its strokes.
    fn delete_document(&self, document_id: &str) -> BoxFuture<'_, StorageResult<()>>;
}

/// Trait for stroke storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Load the strokes of a document, bottom to top.
    fn load_strokes(&self, document_id: &str) -> BoxFuture<'_, StorageResult<Vec<StrokeRecord>>>;

    /// Upsert `strokes` and delete stored strokes absent from them.
    fn save_strokes(
        &self,
        document_id: &str,
        strokes: &[SavedStroke],
    ) -> BoxFuture<'_, StorageResult<()>>;

    /// List the ids of all stored documents.
    fn list_documents(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Delete a document and its strokes.
    fn delete_document(&self, document_id: &str) -> BoxFuture<'_, StorageResult<()>>;
}

/// Count how many stored strokes a save leaves out.
pub(crate) fn count_deleted<'a>(
    stored: &[StrokeRecord],
    kept: impl IntoIterator<Item = &'a StrokeId>,
) -> usize {
    let kept: HashSet<&StrokeId> = kept.into_iter().collect();
    stored.iter().filter(|r| !kept.contains(&r.id)).count()
}
