//! Renderer trait abstraction.

use kurbo::{Affine, BezPath, Size};
use peniko::Color;
use tedno_ink_core::canvas::InkCanvas;
use tedno_ink_core::stroke::Rgb;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Nothing to export")]
    NothingToExport,
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The canvas to render.
    pub canvas: &'a InkCanvas,
    /// Drawing surface size in logical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Background color.
    pub background_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(canvas: &'a InkCanvas, viewport_size: Size) -> Self {
        Self {
            canvas,
            viewport_size,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(255, 255, 255, 255),
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Document → physical pixel transform for on-screen frames.
    pub fn view_transform(&self) -> Affine {
        Affine::scale(self.scale_factor) * self.canvas.viewport.transform()
    }

    /// Document → physical pixel transform for exports, which ignore pan and zoom.
    pub fn export_transform(&self) -> Affine {
        Affine::scale(self.scale_factor)
    }

    /// Surface size in physical pixels, rounded up.
    pub fn pixel_size(&self) -> (u32, u32) {
        let w = (self.viewport_size.width * self.scale_factor).ceil().max(0.0);
        let h = (self.viewport_size.height * self.scale_factor).ceil().max(0.0);
        (w as u32, h as u32)
    }
}

/// Convert an ink color to a renderer color.
pub fn ink_color(color: Rgb) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, 255)
}

/// Closed kurbo path through an outline polygon.
pub fn outline_path(outline: &[kurbo::Point]) -> BezPath {
    let mut path = BezPath::new();
    let mut points = outline.iter();
    if let Some(&first) = points.next() {
        path.move_to(first);
        for &p in points {
            path.line_to(p);
        }
        path.close_path();
    }
    path
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Build the scene/command buffer for a frame.
    ///
    /// This method is called once per frame and should prepare all drawing commands.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
