//! File-based storage implementation for native platforms.

use super::{BoxFuture, Storage, StorageError, StorageResult, count_deleted};
use crate::stroke::{SavedStroke, StrokeRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk layout of one document.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentFile {
    document_id: String,
    #[serde(default)]
    strokes: Vec<StrokeRecord>,
}

/// File-based storage for native platforms.
///
/// Stores each document's strokes as a JSON file in a specified directory.
pub struct FileStorage {
    /// Base directory for document storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/tedno/ink/`
    /// On Windows: `%LOCALAPPDATA%\tedno\ink\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("tedno").join("ink"))
    }

    /// Get the file path for a document ID.
    ///
    /// The ID is hex encoded byte by byte, so distinct IDs never share a file,
    /// even on case-insensitive file systems.
    fn document_path(&self, id: &str) -> PathBuf {
        let encoded: String = id.bytes().map(|b| format!("{:02x}", b)).collect();
        self.base_path.join(format!("{}.json", encoded))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

fn read_document(path: &Path) -> StorageResult<DocumentFile> {
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json)
        .map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
}

impl Storage for FileStorage {
    fn load_strokes(&self, document_id: &str) -> BoxFuture<'_, StorageResult<Vec<StrokeRecord>>> {
        let path = self.document_path(document_id);
        let id_owned = document_id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id_owned));
            }
            let file = read_document(&path)?;
            if file.document_id != id_owned {
                log::warn!("{} holds document {}", path.display(), file.document_id);
                return Err(StorageError::NotFound(id_owned));
            }
            Ok(file.strokes)
        })
    }

    fn save_strokes(
        &self,
        document_id: &str,
        strokes: &[SavedStroke],
    ) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(document_id);
        let file = DocumentFile {
            document_id: document_id.to_string(),
            strokes: strokes.iter().cloned().map(StrokeRecord::from).collect(),
        };

        Box::pin(async move {
            if path.exists() {
                if let Ok(previous) = read_document(&path) {
                    log::debug!(
                        "Saving {} strokes to {} ({} deleted)",
                        file.strokes.len(),
                        file.document_id,
                        count_deleted(&previous.strokes, file.strokes.iter().map(|r| &r.id))
                    );
                }
            }
            let json = serde_json::to_string_pretty(&file)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            fs::write(&path, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn list_documents(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut ids = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "json") {
                    match read_document(&path) {
                        Ok(file) => ids.push(file.document_id),
                        Err(e) => log::warn!("Skipping unreadable document file: {}", e),
                    }
                }
            }
            Ok(ids)
        })
    }

    fn delete_document(&self, document_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(document_id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_util::block_on;
    use crate::stroke::{Rgb, StrokeData, StrokeId};
    use tempfile::tempdir;

    fn saved(id: &str, width: f64) -> SavedStroke {
        SavedStroke {
            id: StrokeId::from(id),
            stroke_data: StrokeData {
                path: "M 0.00 0.00 L 4.00 0.00 L 4.00 4.00 Z".to_string(),
                color: Rgb::new(0xef, 0x44, 0x44),
                width,
            },
        }
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save_strokes("note-1", &[saved("a", 4.0), saved("b", 12.0)])).unwrap();
        let loaded = block_on(storage.load_strokes("note-1")).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].id, StrokeId::from("b"));
        assert_eq!(loaded[1].width, Some(12.0));
        assert_eq!(loaded[0].color.as_deref(), Some("#ef4444"));
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.load_strokes("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_replaces_snapshot() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save_strokes("doc", &[saved("a", 4.0), saved("b", 4.0)])).unwrap();
        block_on(storage.save_strokes("doc", &[saved("b", 6.0)])).unwrap();

        let loaded = block_on(storage.load_strokes("doc")).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].width, Some(6.0));
    }

    #[test]
    fn test_file_storage_list_and_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save_strokes("doc1", &[])).unwrap();
        block_on(storage.save_strokes("doc:2", &[saved("a", 4.0)])).unwrap();

        let list = block_on(storage.list_documents()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&"doc:2".to_string()));

        block_on(storage.delete_document("doc1")).unwrap();
        assert!(matches!(
            block_on(storage.load_strokes("doc1")),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_storage_similar_ids_stay_apart() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save_strokes("a/b", &[saved("x", 4.0)])).unwrap();
        assert!(matches!(
            block_on(storage.load_strokes("a:b")),
            Err(StorageError::NotFound(_))
        ));

        block_on(storage.save_strokes("a:b", &[saved("y", 6.0)])).unwrap();
        block_on(storage.save_strokes("A_B", &[])).unwrap();
        let loaded = block_on(storage.load_strokes("a/b")).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, StrokeId::from("x"));

        block_on(storage.delete_document("a:b")).unwrap();
        assert_eq!(block_on(storage.load_strokes("a/b")).unwrap().len(), 1);
        assert!(matches!(
            block_on(storage.load_strokes("a:b")),
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(block_on(storage.list_documents()).unwrap().len(), 2);
    }

    #[test]
    fn test_file_storage_tolerates_legacy_records() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let json = r#"{"document_id": "old", "strokes": [{"id": 17, "path": "M 0 0 L 1 1 Z"}]}"#;
        fs::write(storage.document_path("old"), json).unwrap();

        let loaded = block_on(storage.load_strokes("old")).unwrap();
        assert_eq!(loaded[0].id, StrokeId::from("17"));
        assert_eq!(loaded[0].color, None);
    }
}
