//! Undo/redo over stroke store operations.
//!
//! Entries describe what happened rather than snapshotting the whole store,
//! so undoing a single stroke costs one removal.

use crate::store::{RemovedStroke, StrokeStore};
use crate::stroke::{Stroke, StrokeId};
use std::collections::HashSet;

/// A recorded action on the stroke store.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    /// A stroke was committed.
    Add { stroke_id: StrokeId },
    /// An eraser gesture removed these strokes.
    Erase { removed: Vec<RemovedStroke> },
    /// Everything was cleared; this was the list before.
    Clear { previous: Vec<Stroke> },
}

/// An undone action, carrying what redo needs to replay it.
#[derive(Debug, Clone, PartialEq)]
pub enum RedoEntry {
    /// The original stroke object, never re-smoothed.
    Add { stroke: Stroke },
    Erase { removed_ids: Vec<StrokeId> },
    Clear,
}

/// Undo and redo stacks, most recent last.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<RedoEntry>,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `limit` undo steps.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Record a new action; any redo history is invalidated.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        self.redo_stack.clear();

        if let Some(limit) = self.limit {
            if self.undo_stack.len() > limit {
                let excess = self.undo_stack.len() - limit;
                self.undo_stack.drain(..excess);
            }
        }
    }

    /// Revert the most recent action.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self, store: &mut StrokeStore) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };

        match entry {
            HistoryEntry::Add { stroke_id } => match store.remove(&stroke_id) {
                Some(stroke) => self.redo_stack.push(RedoEntry::Add { stroke }),
                None => log::warn!("Undo: stroke {} no longer in store", stroke_id),
            },
            HistoryEntry::Erase { removed } => {
                store.restore(&removed);
                let removed_ids = removed.into_iter().map(|r| r.stroke.id().clone()).collect();
                self.redo_stack.push(RedoEntry::Erase { removed_ids });
            }
            HistoryEntry::Clear { previous } => {
                store.replace_all(previous);
                self.redo_stack.push(RedoEntry::Clear);
            }
        }
        true
    }

    /// Replay the most recently undone action.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self, store: &mut StrokeStore) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };

        let replayed = match entry {
            RedoEntry::Add { stroke } => {
                let stroke_id = stroke.id().clone();
                store.push(stroke);
                HistoryEntry::Add { stroke_id }
            }
            RedoEntry::Erase { removed_ids } => {
                let ids: HashSet<StrokeId> = removed_ids.into_iter().collect();
                HistoryEntry::Erase {
                    removed: store.delete_strokes(&ids),
                }
            }
            RedoEntry::Clear => HistoryEntry::Clear {
                previous: store.replace_all(Vec::new()),
            },
        };
        self.undo_stack.push(replayed);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
