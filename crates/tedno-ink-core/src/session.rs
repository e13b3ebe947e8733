//! Ties a canvas to a storage backend.

use crate::canvas::InkCanvas;
use crate::config::{ConfigError, InkConfig};
use crate::gesture::{PointerEvent, TouchEvent};
use crate::storage::{AutoSave, PendingSave, Storage, StorageError, StorageResult};
use std::sync::Arc;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// A canvas plus the debounced persistence of its strokes.
///
/// Every change to the committed strokes schedules a save of the current
/// document; switching documents cancels the previous document's pending save
/// before anything is loaded.
pub struct InkSession<S: Storage> {
    storage: Arc<S>,
    canvas: InkCanvas,
    autosave: AutoSave,
    /// Canvas revision already handed to the autosave.
    seen_revision: u64,
}

impl<S: Storage> InkSession<S> {
    pub fn new(storage: Arc<S>, config: &InkConfig) -> Result<Self, ConfigError> {
        let canvas = InkCanvas::new(config)?;
        let seen_revision = canvas.revision();
        Ok(Self {
            storage,
            canvas,
            autosave: AutoSave::new(config.autosave),
            seen_revision,
        })
    }

    pub fn canvas(&self) -> &InkCanvas {
        &self.canvas
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn has_pending_save(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Switch to another document and load its strokes.
    ///
    /// A pending save of the previous document is written to that document
    /// first (or dropped, with `flush_on_switch` off). A document that was
    /// never saved opens empty. On any failure the canvas keeps showing the
    /// previous document and its pending save stays scheduled.
    pub async fn open_document(&mut self, document_id: &str) -> StorageResult<()> {
        if self.autosave.config().flush_on_switch {
            if let Some(pending) = self.autosave.cancel() {
                if let Err(e) = self.write(&pending).await {
                    self.autosave.rearm(pending);
                    return Err(e);
                }
            }
        }

        let records = match self.storage.load_strokes(document_id).await {
            Ok(records) => records,
            Err(StorageError::NotFound(_)) => Vec::new(),
            Err(e) => {
                log::error!("Failed to load document {}: {}", document_id, e);
                return Err(e);
            }
        };

        if let Some(pending) = self.autosave.cancel() {
            log::debug!("Dropping unsaved changes of {}", pending.document_id);
        }
        self.canvas.load_document(document_id, records);
        self.seen_revision = self.canvas.revision();
        Ok(())
    }

    /// Apply an edit to the canvas and schedule a save if strokes changed.
    pub fn edit<R>(&mut self, now: Instant, f: impl FnOnce(&mut InkCanvas) -> R) -> R {
        let result = f(&mut self.canvas);
        self.note_changes(now);
        result
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant) {
        self.edit(now, |canvas| canvas.handle_pointer(event, now));
    }

    pub fn handle_touch(&mut self, event: &TouchEvent, now: Instant) {
        self.edit(now, |canvas| canvas.handle_touch(event, now));
    }

    pub fn undo(&mut self, now: Instant) -> bool {
        self.edit(now, |canvas| canvas.undo(now))
    }

    pub fn redo(&mut self, now: Instant) -> bool {
        self.edit(now, |canvas| canvas.redo(now))
    }

    fn note_changes(&mut self, now: Instant) {
        if self.canvas.revision() == self.seen_revision {
            return;
        }
        self.seen_revision = self.canvas.revision();
        if let Some(document_id) = self.canvas.document_id() {
            self.autosave.schedule(document_id, self.canvas.saved_records(), now);
        }
    }

    /// Write the pending snapshot once its quiet period is over.
    ///
    /// Returns true if a save was performed. Failures are logged and
    /// returned; the canvas is never rolled back.
    pub async fn poll(&mut self, now: Instant) -> StorageResult<bool> {
        let Some(pending) = self.autosave.take_due(now) else {
            return Ok(false);
        };
        self.write(&pending).await?;
        Ok(true)
    }

    /// Write the pending snapshot immediately.
    pub async fn flush(&mut self) -> StorageResult<bool> {
        let Some(pending) = self.autosave.cancel() else {
            return Ok(false);
        };
        self.write(&pending).await?;
        Ok(true)
    }

    async fn write(&self, pending: &PendingSave) -> StorageResult<()> {
        match self.storage.save_strokes(&pending.document_id, &pending.strokes).await {
            Ok(()) => {
                log::info!("Saved {} strokes to {}", pending.strokes.len(), pending.document_id);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to save {}: {}", pending.document_id, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{PointerKind, PointerSample};
    use crate::storage::test_util::block_on;
    use crate::storage::{AutoSaveConfig, BoxFuture, MemoryStorage};
    use crate::stroke::{SavedStroke, StrokeRecord};
    use kurbo::Point;
    use std::time::Duration;

    fn session(storage: Arc<MemoryStorage>, config: &InkConfig) -> InkSession<MemoryStorage> {
        let mut session = InkSession::new(storage, config).unwrap();
        session.edit(Instant::now(), |canvas| canvas.toggle_drawing_mode());
        session
    }

    fn draw<S: Storage>(session: &mut InkSession<S>, y: f64, now: Instant) {
        let pen = |x| PointerSample::new(PointerKind::Pen, Point::new(x, y));
        session.handle_pointer(&PointerEvent::Down(pen(0.0)), now);
        session.handle_pointer(&PointerEvent::Move(pen(40.0)), now);
        session.handle_pointer(&PointerEvent::Move(pen(80.0)), now);
        session.handle_pointer(&PointerEvent::Up(pen(80.0)), now);
    }

    fn stored(storage: &MemoryStorage, document_id: &str) -> Option<Vec<StrokeRecord>> {
        block_on(storage.load_strokes(document_id)).ok()
    }

    #[test]
    fn test_save_after_debounce() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(storage.clone(), &InkConfig::default());
        let t0 = Instant::now();
        block_on(session.open_document("a")).unwrap();

        draw(&mut session, 10.0, t0);
        assert!(session.has_pending_save());
        assert!(!block_on(session.poll(t0 + Duration::from_millis(100))).unwrap());
        assert!(stored(&storage, "a").is_none());

        assert!(block_on(session.poll(t0 + Duration::from_millis(400))).unwrap());
        assert_eq!(stored(&storage, "a").unwrap().len(), 1);
    }

    #[test]
    fn test_changes_rearm_debounce() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(storage.clone(), &InkConfig::default());
        let t0 = Instant::now();
        block_on(session.open_document("a")).unwrap();

        draw(&mut session, 10.0, t0);
        draw(&mut session, 60.0, t0 + Duration::from_millis(300));
        assert!(!block_on(session.poll(t0 + Duration::from_millis(500))).unwrap());
        assert!(block_on(session.poll(t0 + Duration::from_millis(700))).unwrap());
        assert_eq!(stored(&storage, "a").unwrap().len(), 2);
    }

    #[test]
    fn test_switch_saves_previous_document() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(storage.clone(), &InkConfig::default());
        let t0 = Instant::now();
        block_on(session.open_document("a")).unwrap();

        draw(&mut session, 10.0, t0);
        draw(&mut session, 60.0, t0 + Duration::from_millis(50));
        let drawn = session.canvas().strokes().to_vec();

        block_on(session.open_document("b")).unwrap();
        assert!(!session.has_pending_save());
        assert!(session.canvas().strokes().is_empty());
        assert_eq!(stored(&storage, "a").unwrap().len(), 2);
        assert!(stored(&storage, "b").is_none());

        block_on(session.open_document("a")).unwrap();
        assert_eq!(session.canvas().strokes(), drawn.as_slice());
    }

    #[test]
    fn test_switch_without_flush_drops_pending() {
        let storage = Arc::new(MemoryStorage::new());
        let config = InkConfig {
            autosave: AutoSaveConfig {
                flush_on_switch: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = session(storage.clone(), &config);
        let t0 = Instant::now();
        block_on(session.open_document("a")).unwrap();

        draw(&mut session, 10.0, t0);
        block_on(session.open_document("b")).unwrap();
        assert!(!session.has_pending_save());

        assert!(!block_on(session.poll(t0 + Duration::from_secs(5))).unwrap());
        assert!(stored(&storage, "a").is_none());
        assert!(stored(&storage, "b").is_none());
    }

    #[test]
    fn test_reload_restores_strokes() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(storage.clone(), &InkConfig::default());
        let t0 = Instant::now();
        block_on(session.open_document("a")).unwrap();
        draw(&mut session, 10.0, t0);
        let drawn = session.canvas().strokes().to_vec();
        assert!(block_on(session.flush()).unwrap());

        block_on(session.open_document("b")).unwrap();
        block_on(session.open_document("a")).unwrap();
        assert_eq!(session.canvas().strokes(), drawn.as_slice());
        assert!(!session.canvas().history().can_undo());
        assert!(!session.has_pending_save());
    }

    #[test]
    fn test_undo_schedules_save() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(storage.clone(), &InkConfig::default());
        let t0 = Instant::now();
        block_on(session.open_document("a")).unwrap();
        draw(&mut session, 10.0, t0);
        block_on(session.flush()).unwrap();

        assert!(session.undo(t0));
        assert!(block_on(session.poll(t0 + Duration::from_secs(1))).unwrap());
        assert!(stored(&storage, "a").unwrap().is_empty());
    }

    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_loads: bool,
        fail_saves: bool,
    }

    impl Storage for FlakyStorage {
        fn load_strokes(
            &self,
            document_id: &str,
        ) -> BoxFuture<'_, StorageResult<Vec<StrokeRecord>>> {
            if self.fail_loads {
                return Box::pin(async { Err(StorageError::Other("offline".to_string())) });
            }
            self.inner.load_strokes(document_id)
        }

        fn save_strokes(
            &self,
            document_id: &str,
            strokes: &[SavedStroke],
        ) -> BoxFuture<'_, StorageResult<()>> {
            if self.fail_saves {
                return Box::pin(async { Err(StorageError::Io("disk full".to_string())) });
            }
            self.inner.save_strokes(document_id, strokes)
        }

        fn list_documents(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            self.inner.list_documents()
        }

        fn delete_document(&self, document_id: &str) -> BoxFuture<'_, StorageResult<()>> {
            self.inner.delete_document(document_id)
        }
    }

    fn flaky_session(storage: FlakyStorage, config: &InkConfig) -> InkSession<FlakyStorage> {
        let mut session = InkSession::new(Arc::new(storage), config).unwrap();
        session.edit(Instant::now(), |canvas| canvas.toggle_drawing_mode());
        block_on(session.open_document("a")).unwrap();
        session
    }

    #[test]
    fn test_failed_save_keeps_canvas() {
        let storage = FlakyStorage {
            fail_saves: true,
            ..Default::default()
        };
        let mut session = flaky_session(storage, &InkConfig::default());
        let t0 = Instant::now();
        draw(&mut session, 10.0, t0);

        let result = block_on(session.poll(t0 + Duration::from_secs(1)));
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(session.canvas().strokes().len(), 1);

        // The next change schedules another attempt.
        draw(&mut session, 60.0, t0 + Duration::from_secs(2));
        assert!(session.has_pending_save());
    }

    #[test]
    fn test_failed_flush_on_switch_stays_on_document() {
        let storage = FlakyStorage {
            fail_saves: true,
            ..Default::default()
        };
        let mut session = flaky_session(storage, &InkConfig::default());
        let t0 = Instant::now();
        draw(&mut session, 10.0, t0);

        let result = block_on(session.open_document("b"));
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(session.canvas().document_id(), Some("a"));
        assert_eq!(session.canvas().strokes().len(), 1);
        assert!(session.has_pending_save());
    }

    #[test]
    fn test_failed_load_keeps_pending_save() {
        let config = InkConfig {
            autosave: AutoSaveConfig {
                flush_on_switch: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = flaky_session(FlakyStorage::default(), &config);
        let t0 = Instant::now();
        draw(&mut session, 10.0, t0);

        session.storage = Arc::new(FlakyStorage {
            fail_loads: true,
            ..Default::default()
        });

        let result = block_on(session.open_document("b"));
        assert!(matches!(result, Err(StorageError::Other(_))));
        assert_eq!(session.canvas().document_id(), Some("a"));
        assert!(session.has_pending_save());
        assert!(block_on(session.poll(t0 + Duration::from_secs(1))).unwrap());
        assert!(!session.has_pending_save());
    }
}
