//! Drawing surface state for one open document.

use crate::config::{ConfigError, InkConfig};
use crate::eraser::EraseGesture;
use crate::geometry::StrokeOptions;
use crate::gesture::{
    GestureCommand, GestureContext, GestureDisambiguator, GestureMode, PointerEvent, TouchEvent,
};
use crate::history::{History, HistoryEntry};
use crate::store::StrokeStore;
use crate::stroke::{InkPoint, Rgb, SavedStroke, Stroke, StrokeRecord};
use crate::tools::{ClearConfirm, ClearOutcome, ToolKind, ToolManager};
use crate::viewport::{FrameScheduler, Viewport};
use kurbo::{Affine, Point};
use std::time::Duration;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Runtime state of the drawing layer (not persisted).
///
/// Input events go in through [`InkCanvas::handle_pointer`] and
/// [`InkCanvas::handle_touch`]; every change to the committed strokes bumps
/// [`InkCanvas::revision`].
#[derive(Debug, Clone)]
pub struct InkCanvas {
    document_id: Option<String>,
    store: StrokeStore,
    history: History,
    /// Viewport for the pan/zoom transform.
    pub viewport: Viewport,
    gesture: GestureDisambiguator,
    eraser: EraseGesture,
    /// Tool manager.
    pub tool_manager: ToolManager,
    clear_confirm: ClearConfirm,
    drawing_enabled: bool,
    frames: FrameScheduler,
    options: StrokeOptions,
    history_limit: Option<usize>,
    revision: u64,
}

impl Default for InkCanvas {
    fn default() -> Self {
        Self::with_viewport(&InkConfig::default(), Viewport::default())
    }
}

impl InkCanvas {
    /// Create a canvas with no document loaded. Drawing mode starts off.
    pub fn new(config: &InkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let viewport = Viewport::new(config.viewport)?;
        Ok(Self::with_viewport(config, viewport))
    }

    fn with_viewport(config: &InkConfig, viewport: Viewport) -> Self {
        Self {
            document_id: None,
            store: StrokeStore::new(),
            history: History::with_limit(config.history_limit),
            viewport,
            gesture: GestureDisambiguator::new(),
            eraser: EraseGesture::new(),
            tool_manager: ToolManager::new(),
            clear_confirm: ClearConfirm::new(Duration::from_millis(config.clear_confirm_ms)),
            drawing_enabled: false,
            frames: FrameScheduler::new(),
            options: config.smoothing,
            history_limit: config.history_limit,
            revision: 0,
        }
    }

    /// Replace the canvas content with another document's strokes.
    ///
    /// Live buffers, history and the viewport are reset; nothing from the
    /// previous document survives.
    pub fn load_document(&mut self, document_id: &str, records: Vec<StrokeRecord>) {
        self.gesture.reset();
        self.eraser.reset();
        self.store = StrokeStore::from_records(records);
        self.history = History::with_limit(self.history_limit);
        self.clear_confirm.disarm();
        self.viewport.reset();
        self.frames.take();
        self.document_id = Some(document_id.to_string());
        self.revision += 1;
        log::info!("Loaded {} strokes for document {}", self.store.len(), document_id);
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Counter bumped on every change to the committed strokes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn strokes(&self) -> &[Stroke] {
        self.store.strokes()
    }

    /// Outline of the stroke currently being drawn, in document space.
    pub fn live_outline(&self) -> &[Point] {
        self.store.live_outline()
    }

    /// Stroke ids marked by the eraser gesture in progress.
    pub fn is_marked_for_erase(&self, stroke: &Stroke) -> bool {
        self.eraser.is_marked(stroke.id())
    }

    pub fn gesture_mode(&self) -> GestureMode {
        self.gesture.mode()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Snapshot of the committed list in load shape.
    pub fn records(&self) -> Vec<StrokeRecord> {
        self.store.records()
    }

    /// Snapshot of the committed list in save shape.
    pub fn saved_records(&self) -> Vec<SavedStroke> {
        self.store.saved_records()
    }

    pub fn is_drawing_enabled(&self) -> bool {
        self.drawing_enabled
    }

    fn context(&self) -> GestureContext {
        GestureContext {
            tool: self.tool_manager.current_tool,
            zoomed: self.viewport.is_zoomed(),
            enabled: self.drawing_enabled,
        }
    }

    fn stroke_options(&self) -> StrokeOptions {
        self.options.with_size(self.tool_manager.width())
    }

    /// Handle a pointer (stylus or mouse) event.
    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant) {
        let commands = self.gesture.handle_pointer(event, self.context());
        self.apply_all(commands, now);
    }

    /// Handle a touch (finger) event.
    pub fn handle_touch(&mut self, event: &TouchEvent, now: Instant) {
        let commands = self.gesture.handle_touch(event, self.context());
        self.apply_all(commands, now);
    }

    fn apply_all(&mut self, commands: Vec<GestureCommand>, now: Instant) {
        for command in commands {
            self.apply(command, now);
        }
    }

    fn apply(&mut self, command: GestureCommand, now: Instant) {
        match command {
            GestureCommand::BeginStroke { position, pressure } => {
                let point = self.ink_point(position, pressure);
                let options = self.stroke_options();
                self.store.begin_stroke(point, &options);
            }
            GestureCommand::ExtendStroke { position, pressure } => {
                let point = self.ink_point(position, pressure);
                let options = self.stroke_options();
                self.store.extend_stroke(point, &options);
            }
            GestureCommand::CommitStroke => {
                let options = self.stroke_options();
                let style = self.tool_manager.style();
                if let Some(stroke) = self.store.commit_stroke(style, &options) {
                    log::debug!("Committed stroke {}", stroke.id());
                    self.history.record(HistoryEntry::Add {
                        stroke_id: stroke.id().clone(),
                    });
                    self.revision += 1;
                }
            }
            GestureCommand::BeginErase { position } => {
                self.eraser.reset();
                self.erase_at(position);
            }
            GestureCommand::EraseAt { position } => self.erase_at(position),
            GestureCommand::CommitErase => {
                if let Some(removed) = self.eraser.commit(&mut self.store) {
                    log::debug!("Erased {} strokes", removed.len());
                    self.history.record(HistoryEntry::Erase { removed });
                    self.revision += 1;
                }
            }
            GestureCommand::BeginPan { position } => self.viewport.begin_pan(position, now),
            GestureCommand::UpdatePan { position } => {
                self.viewport.update_pan(position, now);
                self.request_frame();
            }
            GestureCommand::EndPan { fling } => self.viewport.end_pan(fling),
            GestureCommand::BeginPinch { a, b } => self.viewport.begin_pinch(a, b),
            GestureCommand::UpdatePinch { a, b } => {
                self.viewport.update_pinch(a, b);
                self.request_frame();
            }
            GestureCommand::EndPinch => self.viewport.end_pinch(),
        }
    }

    fn ink_point(&self, screen: Point, pressure: Option<f64>) -> InkPoint {
        InkPoint::from_device(self.viewport.screen_to_document(screen), pressure)
    }

    fn erase_at(&mut self, screen: Point) {
        let point = self.viewport.screen_to_document(screen);
        self.eraser.erase_at(&self.store, point);
    }

    fn request_frame(&mut self) {
        self.frames.request(self.viewport.transform());
    }

    /// Commit whatever gesture is in flight.
    fn finish_gesture(&mut self, now: Instant) {
        let commands = self.gesture.finish();
        self.apply_all(commands, now);
    }

    /// Advance viewport momentum by one animation frame.
    /// Returns true while momentum is still running.
    pub fn tick(&mut self) -> bool {
        let moving = self.viewport.tick();
        if moving {
            self.request_frame();
        }
        moving
    }

    /// Transform to apply in this animation frame, if the view changed.
    pub fn take_frame(&mut self) -> Option<Affine> {
        self.frames.take()
    }

    /// Select a tool, committing any gesture made with the previous one.
    pub fn set_tool(&mut self, tool: ToolKind, now: Instant) {
        if tool != self.tool_manager.current_tool {
            self.finish_gesture(now);
        }
        self.tool_manager.set_tool(tool);
    }

    /// Pick an ink color (selects the pen).
    pub fn set_color(&mut self, color: Rgb, now: Instant) {
        self.finish_gesture(now);
        self.tool_manager.set_color(color);
    }

    /// Pick a brush width (selects the pen).
    pub fn set_width(&mut self, width: f64, now: Instant) {
        self.finish_gesture(now);
        self.tool_manager.set_width(width);
    }

    /// Undo the last action. Returns true if anything changed.
    pub fn undo(&mut self, now: Instant) -> bool {
        self.finish_gesture(now);
        let changed = self.history.undo(&mut self.store);
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Redo the last undone action. Returns true if anything changed.
    pub fn redo(&mut self, now: Instant) -> bool {
        self.finish_gesture(now);
        let changed = self.history.redo(&mut self.store);
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Clear everything, but only when invoked twice within the confirmation window.
    pub fn clear_all(&mut self, now: Instant) -> ClearOutcome {
        if !self.clear_confirm.tap(now) {
            return ClearOutcome::Armed;
        }
        self.finish_gesture(now);
        if self.store.is_empty() {
            return ClearOutcome::NothingToClear;
        }

        let previous = self.store.replace_all(Vec::new());
        log::debug!("Cleared {} strokes", previous.len());
        self.history.record(HistoryEntry::Clear { previous });
        self.revision += 1;
        ClearOutcome::Cleared
    }

    /// Switch drawing mode on or off, abandoning any gesture in progress.
    pub fn toggle_drawing_mode(&mut self) -> bool {
        self.drawing_enabled = !self.drawing_enabled;
        self.gesture.reset();
        self.eraser.reset();
        self.store.clear_live();
        self.viewport.end_pan(false);
        self.viewport.end_pinch();
        self.drawing_enabled
    }

    /// Back to zoom 1 with no pan. A pan or pinch in progress is dropped.
    pub fn reset_viewport(&mut self) {
        if matches!(self.gesture.mode(), GestureMode::Panning | GestureMode::Pinching) {
            self.gesture.reset();
        }
        self.viewport.reset();
        self.request_frame();
    }
}
