//! Eraser gestures: mark strokes while moving, remove them in one batch.

use crate::store::{RemovedStroke, StrokeStore};
use crate::stroke::StrokeId;
use kurbo::Point;
use std::collections::HashSet;

/// Strokes hit during the current eraser gesture.
///
/// Marked strokes stay in the store until [`EraseGesture::commit`], so the
/// whole gesture becomes a single undo step.
#[derive(Debug, Clone, Default)]
pub struct EraseGesture {
    erased: HashSet<StrokeId>,
}

impl EraseGesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget marks from a previous gesture.
    pub fn reset(&mut self) {
        self.erased.clear();
    }

    /// Test a document-space sample against every unmarked stroke.
    ///
    /// Returns how many strokes were newly marked.
    pub fn erase_at(&mut self, store: &StrokeStore, point: Point) -> usize {
        let mut hits = 0;
        for stroke in store.strokes() {
            if self.erased.contains(stroke.id()) {
                continue;
            }
            if stroke.contains(point) {
                self.erased.insert(stroke.id().clone());
                hits += 1;
            }
        }
        hits
    }

    pub fn is_marked(&self, id: &StrokeId) -> bool {
        self.erased.contains(id)
    }

    /// Ids marked so far.
    pub fn marked(&self) -> &HashSet<StrokeId> {
        &self.erased
    }

    /// Remove all marked strokes from the store and reset the marks.
    ///
    /// Returns `None` when nothing was marked (or nothing marked is still in
    /// the store), in which case the store is untouched.
    pub fn commit(&mut self, store: &mut StrokeStore) -> Option<Vec<RemovedStroke>> {
        if self.erased.is_empty() {
            return None;
        }
        let removed = store.delete_strokes(&self.erased);
        self.erased.clear();
        if removed.is_empty() { None } else { Some(removed) }
    }
}
