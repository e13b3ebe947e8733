//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult, count_deleted};
use crate::stroke::{SavedStroke, StrokeRecord};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, Vec<StrokeRecord>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with one document.
    pub fn with_document(document_id: &str, strokes: Vec<StrokeRecord>) -> Self {
        let storage = Self::new();
        if let Ok(mut docs) = storage.documents.write() {
            docs.insert(document_id.to_string(), strokes);
        }
        storage
    }
}

impl Storage for MemoryStorage {
    fn load_strokes(&self, document_id: &str) -> BoxFuture<'_, StorageResult<Vec<StrokeRecord>>> {
        let id = document_id.to_string();
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            docs.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn save_strokes(
        &self,
        document_id: &str,
        strokes: &[SavedStroke],
    ) -> BoxFuture<'_, StorageResult<()>> {
        let id = document_id.to_string();
        let strokes = strokes.to_vec();
        Box::pin(async move {
            let mut docs = self
                .documents
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            let stored = docs.entry(id.clone()).or_default();
            let deleted = count_deleted(stored, strokes.iter().map(|s| &s.id));
            log::debug!("Saving {} strokes to {} ({} deleted)", strokes.len(), id, deleted);
            *stored = strokes.into_iter().map(StrokeRecord::from).collect();
            Ok(())
        })
    }

    fn list_documents(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            Ok(docs.keys().cloned().collect())
        })
    }

    fn delete_document(&self, document_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = document_id.to_string();
        Box::pin(async move {
            let mut docs = self
                .documents
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            docs.remove(&id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_util::block_on;
    use crate::stroke::{Rgb, StrokeData, StrokeId};

    fn saved(id: &str) -> SavedStroke {
        SavedStroke {
            id: StrokeId::from(id),
            stroke_data: StrokeData {
                path: "M 0.00 0.00 L 4.00 0.00 L 4.00 4.00 Z".to_string(),
                color: Rgb::INK,
                width: 8.0,
            },
        }
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        block_on(storage.save_strokes("doc", &[saved("a"), saved("b")])).unwrap();

        let loaded = block_on(storage.load_strokes("doc")).unwrap();
        let ids: Vec<_> = loaded.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(loaded[0].color.as_deref(), Some("#37352f"));
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load_strokes("nonexistent"));

        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_save_deletes_absent_ids() {
        let storage = MemoryStorage::new();
        block_on(storage.save_strokes("doc", &[saved("a"), saved("b"), saved("c")])).unwrap();
        block_on(storage.save_strokes("doc", &[saved("c"), saved("d")])).unwrap();

        let loaded = block_on(storage.load_strokes("doc")).unwrap();
        let ids: Vec<_> = loaded.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[test]
    fn test_documents_are_isolated() {
        let storage = MemoryStorage::new();
        block_on(storage.save_strokes("one", &[saved("a")])).unwrap();
        block_on(storage.save_strokes("two", &[])).unwrap();

        assert_eq!(block_on(storage.load_strokes("one")).unwrap().len(), 1);
        assert!(block_on(storage.load_strokes("two")).unwrap().is_empty());
    }

    #[test]
    fn test_delete_and_list() {
        let storage = MemoryStorage::new();
        block_on(storage.save_strokes("doc1", &[saved("a")])).unwrap();
        block_on(storage.save_strokes("doc2", &[saved("b")])).unwrap();

        let list = block_on(storage.list_documents()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&"doc1".to_string()));

        block_on(storage.delete_document("doc1")).unwrap();
        let list = block_on(storage.list_documents()).unwrap();
        assert_eq!(list, vec!["doc2".to_string()]);
    }
}
