//! Vector scene of the drawing layer and SVG export.

use crate::renderer::{RenderContext, Renderer, ink_color, outline_path};
use kurbo::{Affine, BezPath};
use peniko::Color;
use std::fmt::Write;
use tedno_ink_core::geometry::to_path_string;

/// One filled outline, in document space.
#[derive(Debug, Clone)]
pub struct SceneItem {
    pub path: BezPath,
    pub color: Color,
    /// True for the stroke still being drawn.
    pub live: bool,
}

/// Retained list of filled paths, bottom to top.
#[derive(Debug, Clone)]
pub struct VectorScene {
    items: Vec<SceneItem>,
    transform: Affine,
    background: Color,
}

impl Default for VectorScene {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorScene {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            transform: Affine::IDENTITY,
            background: Color::from_rgba8(255, 255, 255, 255),
        }
    }

    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }

    /// Document → physical pixel transform of the last built frame.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn background(&self) -> Color {
        self.background
    }
}

impl Renderer for VectorScene {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.items.clear();
        self.transform = ctx.view_transform();
        self.background = self.background_color(ctx);

        for stroke in ctx.canvas.strokes() {
            if stroke.outline().is_empty() {
                continue;
            }
            self.items.push(SceneItem {
                path: outline_path(stroke.outline()),
                color: ink_color(stroke.color()),
                live: false,
            });
        }

        let live = ctx.canvas.live_outline();
        if !live.is_empty() {
            self.items.push(SceneItem {
                path: outline_path(live),
                color: ink_color(ctx.canvas.tool_manager.color()),
                live: true,
            });
        }
    }
}

/// Standalone SVG document of the committed strokes.
///
/// Like the PNG export, pan and zoom are ignored: the document is drawn at
/// logical size in its own coordinates.
pub fn svg_document(ctx: &RenderContext) -> String {
    let size = ctx.viewport_size;
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = size.width,
        h = size.height,
    );
    for stroke in ctx.canvas.strokes() {
        if stroke.outline().is_empty() {
            continue;
        }
        let _ = writeln!(
            svg,
            r#"  <path d="{}" fill="{}" stroke="none"/>"#,
            to_path_string(stroke.outline()),
            stroke.color()
        );
    }
    svg.push_str("</svg>\n");
    svg
}
