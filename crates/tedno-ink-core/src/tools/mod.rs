//! Toolbar state: active tool, brush style and the clear confirmation.

use crate::stroke::{DEFAULT_WIDTH, MAX_WIDTH, MIN_WIDTH, Rgb, StrokeStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Colors offered by the toolbar, first one is the default ink.
pub const PALETTE: [Rgb; 6] = [
    Rgb::new(0x37, 0x35, 0x2f),
    Rgb::new(0xef, 0x44, 0x44),
    Rgb::new(0xf9, 0x73, 0x16),
    Rgb::new(0x3b, 0x82, 0xf6),
    Rgb::new(0x22, 0xc5, 0x5e),
    Rgb::new(0xa8, 0x55, 0xf7),
];

/// Default window for confirming a clear.
pub const DEFAULT_CLEAR_CONFIRM_MS: u64 = 2000;

/// Available drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Eraser,
}

/// Current tool and the style new strokes get.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    color: Rgb,
    width: f64,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self {
            current_tool: ToolKind::default(),
            color: PALETTE[0],
            width: DEFAULT_WIDTH,
        }
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
    }

    /// Pick an ink color; switches back to the pen.
    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
        self.current_tool = ToolKind::Pen;
    }

    /// Pick a brush width (clamped); switches back to the pen.
    pub fn set_width(&mut self, width: f64) {
        if width.is_finite() {
            self.width = width.clamp(MIN_WIDTH, MAX_WIDTH);
        }
        self.current_tool = ToolKind::Pen;
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color,
            width: self.width,
        }
    }
}

/// Diameter in pixels of the toolbar's width preview dot.
pub fn width_preview_size(width: f64) -> u32 {
    let t = (width.clamp(MIN_WIDTH, MAX_WIDTH) - MIN_WIDTH) / (MAX_WIDTH - MIN_WIDTH);
    (4.0 + t * 12.0).round() as u32
}

/// Result of invoking "clear all".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// First tap: waiting for confirmation.
    Armed,
    /// Confirmed within the window; strokes were removed.
    Cleared,
    /// Confirmed, but there was nothing to remove.
    NothingToClear,
}

/// Double-invocation guard for destructive clears.
#[derive(Debug, Clone)]
pub struct ClearConfirm {
    window: Duration,
    armed_at: Option<Instant>,
}

impl Default for ClearConfirm {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_CLEAR_CONFIRM_MS))
    }
}

impl ClearConfirm {
    pub fn new(window: Duration) -> Self {
        Self { window, armed_at: None }
    }

    /// Register a tap. Returns true when it confirms an earlier one.
    pub fn tap(&mut self, now: Instant) -> bool {
        match self.armed_at.take() {
            Some(armed) if now.saturating_duration_since(armed) < self.window => true,
            _ => {
                self.armed_at = Some(now);
                false
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn disarm(&mut self) {
        self.armed_at = None;
    }
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// History actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
}

/// Map a key press to a history action.
///
/// The platform modifier is Cmd on macOS and Ctrl elsewhere; adding Shift
/// turns undo into redo.
pub fn shortcut_for(key: &str, modifiers: Modifiers, is_mac: bool) -> Option<ShortcutAction> {
    let platform_modifier = if is_mac { modifiers.meta } else { modifiers.ctrl };
    if !platform_modifier || !key.eq_ignore_ascii_case("z") {
        return None;
    }
    Some(if modifiers.shift {
        ShortcutAction::Redo
    } else {
        ShortcutAction::Undo
    })
}
