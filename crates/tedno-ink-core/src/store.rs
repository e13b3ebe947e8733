//! Committed strokes of the open document plus the live stroke buffer.

use crate::geometry::{StrokeOptions, smooth};
use crate::stroke::{InkPoint, SavedStroke, Stroke, StrokeId, StrokeRecord, StrokeStyle};
use kurbo::Point;
use std::collections::HashSet;

/// A stroke taken out of the store together with where it sat.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedStroke {
    /// Position in the committed list before removal.
    pub index: usize,
    pub stroke: Stroke,
}

/// Ordered list of committed strokes and the in-progress sample buffer.
#[derive(Debug, Clone, Default)]
pub struct StrokeStore {
    strokes: Vec<Stroke>,
    live: Vec<InkPoint>,
    live_outline: Vec<Point>,
}

impl StrokeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from persisted records, keeping their order.
    pub fn from_records(records: impl IntoIterator<Item = StrokeRecord>) -> Self {
        Self {
            strokes: records.into_iter().map(Stroke::from_record).collect(),
            ..Self::default()
        }
    }

    /// Start a live stroke at `point`, dropping any previous buffer.
    pub fn begin_stroke(&mut self, point: InkPoint, options: &StrokeOptions) {
        self.live.clear();
        self.live.push(point);
        self.live_outline = smooth(&self.live, options);
    }

    /// Append a sample and recompute the live outline.
    pub fn extend_stroke(&mut self, point: InkPoint, options: &StrokeOptions) {
        self.live.push(point);
        self.live_outline = smooth(&self.live, options);
    }

    /// Finalize the live buffer into a committed stroke.
    ///
    /// Returns `None` without touching the committed list when the buffer is
    /// empty or too short to produce an outline. The buffer is cleared either way.
    pub fn commit_stroke(&mut self, style: StrokeStyle, options: &StrokeOptions) -> Option<Stroke> {
        if self.live.is_empty() {
            return None;
        }

        let final_options = StrokeOptions {
            size: style.width,
            ..*options
        };
        let outline = smooth(&self.live, &final_options);
        self.clear_live();

        if outline.is_empty() {
            log::debug!("Discarding stroke without an outline");
            return None;
        }

        let stroke = Stroke::from_outline(StrokeId::generate(), &outline, style);
        self.strokes.push(stroke.clone());
        Some(stroke)
    }

    /// Drop the live buffer without committing it.
    pub fn clear_live(&mut self) {
        self.live.clear();
        self.live_outline.clear();
    }

    /// Samples of the stroke being drawn.
    pub fn live_points(&self) -> &[InkPoint] {
        &self.live
    }

    /// Outline of the stroke being drawn.
    pub fn live_outline(&self) -> &[Point] {
        &self.live_outline
    }

    pub fn is_drawing(&self) -> bool {
        !self.live.is_empty()
    }

    /// Remove every stroke whose id is in `ids`, in list order.
    pub fn delete_strokes(&mut self, ids: &HashSet<StrokeId>) -> Vec<RemovedStroke> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.strokes.len());
        for (index, stroke) in std::mem::take(&mut self.strokes).into_iter().enumerate() {
            if ids.contains(stroke.id()) {
                removed.push(RemovedStroke { index, stroke });
            } else {
                kept.push(stroke);
            }
        }
        self.strokes = kept;
        removed
    }

    /// Remove a single stroke by id.
    pub fn remove(&mut self, id: &StrokeId) -> Option<Stroke> {
        let pos = self.strokes.iter().position(|s| s.id() == id)?;
        Some(self.strokes.remove(pos))
    }

    /// Put previously removed strokes back where they were.
    ///
    /// Expects `removed` in ascending index order, as [`Self::delete_strokes`]
    /// returns it.
    pub fn restore(&mut self, removed: &[RemovedStroke]) {
        for r in removed {
            self.insert_at(r.index, r.stroke.clone());
        }
    }

    /// Insert a stroke at `index`, or at the top when past the end.
    pub fn insert_at(&mut self, index: usize, stroke: Stroke) {
        let index = index.min(self.strokes.len());
        self.strokes.insert(index, stroke);
    }

    /// Append a stroke at the top.
    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Replace the whole committed list, returning the old one.
    pub fn replace_all(&mut self, strokes: Vec<Stroke>) -> Vec<Stroke> {
        std::mem::replace(&mut self.strokes, strokes)
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn get(&self, id: &StrokeId) -> Option<&Stroke> {
        self.strokes.iter().find(|s| s.id() == id)
    }

    pub fn ids(&self) -> Vec<StrokeId> {
        self.strokes.iter().map(|s| s.id().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Snapshot of the committed list in save shape.
    pub fn saved_records(&self) -> Vec<SavedStroke> {
        self.strokes.iter().map(Stroke::to_saved).collect()
    }

    /// Snapshot of the committed list in load shape.
    pub fn records(&self) -> Vec<StrokeRecord> {
        self.strokes.iter().map(Stroke::to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> StrokeOptions {
        StrokeOptions::default()
    }

    fn draw(store: &mut StrokeStore, from: f64) -> Stroke {
        store.begin_stroke(InkPoint::new(from, 0.0, 0.5), &options());
        store.extend_stroke(InkPoint::new(from + 20.0, 5.0, 0.5), &options());
        store.extend_stroke(InkPoint::new(from + 40.0, 0.0, 0.5), &options());
        store.commit_stroke(StrokeStyle::default(), &options()).unwrap()
    }

    #[test]
    fn test_empty_commit_is_noop() {
        let mut store = StrokeStore::new();
        assert!(store.commit_stroke(StrokeStyle::default(), &options()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_single_sample_is_discarded() {
        let mut store = StrokeStore::new();
        store.begin_stroke(InkPoint::new(1.0, 1.0, 0.5), &options());
        assert!(store.is_drawing());
        assert!(store.commit_stroke(StrokeStyle::default(), &options()).is_none());
        assert!(store.is_empty());
        assert!(!store.is_drawing());
    }

    #[test]
    fn test_commit_appends_and_clears_live() {
        let mut store = StrokeStore::new();
        store.begin_stroke(InkPoint::new(0.0, 0.0, 0.5), &options());
        store.extend_stroke(InkPoint::new(30.0, 0.0, 0.5), &options());
        assert!(!store.live_outline().is_empty());

        let stroke = store.commit_stroke(StrokeStyle::default(), &options()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.strokes()[0].id(), stroke.id());
        assert!(!stroke.path().is_empty());
        assert!(store.live_points().is_empty());
        assert!(store.live_outline().is_empty());
    }

    #[test]
    fn test_begin_resets_buffer() {
        let mut store = StrokeStore::new();
        store.begin_stroke(InkPoint::new(0.0, 0.0, 0.5), &options());
        store.extend_stroke(InkPoint::new(5.0, 0.0, 0.5), &options());
        store.begin_stroke(InkPoint::new(9.0, 9.0, 0.5), &options());
        assert_eq!(store.live_points(), &[InkPoint::new(9.0, 9.0, 0.5)]);
    }

    #[test]
    fn test_delete_and_restore_keeps_order() {
        let mut store = StrokeStore::new();
        let a = draw(&mut store, 0.0);
        let b = draw(&mut store, 100.0);
        let c = draw(&mut store, 200.0);
        let before = store.strokes().to_vec();

        let ids: HashSet<StrokeId> = [a.id().clone(), c.id().clone()].into_iter().collect();
        let removed = store.delete_strokes(&ids);
        assert_eq!(removed.len(), 2);
        assert_eq!(store.ids(), vec![b.id().clone()]);

        store.restore(&removed);
        assert_eq!(store.strokes(), before.as_slice());
    }

    #[test]
    fn test_records_round_trip() {
        let mut store = StrokeStore::new();
        draw(&mut store, 0.0);
        draw(&mut store, 50.0);

        let reloaded = StrokeStore::from_records(store.records());
        assert_eq!(reloaded.strokes(), store.strokes());
    }
}
