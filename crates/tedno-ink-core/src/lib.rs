//! Tedno Ink Core Library
//!
//! Platform-agnostic freehand drawing engine for Tedno notes: stroke
//! smoothing, gesture classification, pan/zoom, erasing, undo/redo and
//! debounced persistence.

pub mod canvas;
pub mod config;
pub mod eraser;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod session;
pub mod storage;
pub mod store;
pub mod stroke;
pub mod tools;
pub mod viewport;

pub use canvas::InkCanvas;
pub use config::{ConfigError, InkConfig};
pub use eraser::EraseGesture;
pub use geometry::{StrokeOptions, parse_path, point_in_polygon, smooth, to_path_string};
pub use gesture::{
    GestureCommand, GestureDisambiguator, GestureMode, PointerEvent, PointerKind, PointerSample,
    TouchEvent, TouchPoint,
};
pub use history::{History, HistoryEntry};
pub use session::InkSession;
pub use storage::{Storage, StorageError, StorageResult};
pub use store::StrokeStore;
pub use stroke::{InkPoint, Rgb, SavedStroke, Stroke, StrokeId, StrokeRecord, StrokeStyle};
pub use tools::{ClearOutcome, PALETTE, ToolKind, ToolManager};
pub use viewport::{FrameScheduler, Viewport};
