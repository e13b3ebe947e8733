//! CPU rasterization and PNG export.

use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use kurbo::{Affine, Point};
use peniko::Color;
use tedno_ink_core::stroke::Rgb;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

/// Result of rendering to pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngRenderResult {
    /// RGBA pixel data (4 bytes per pixel, straight alpha).
    pub rgba_data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl PngRenderResult {
    /// RGBA value at a pixel, if inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let px = self.rgba_data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Encode as a PNG file.
    pub fn encode(&self) -> RenderResult<Vec<u8>> {
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder
                .write_header()
                .map_err(|e| RendererError::Encode(format!("header: {}", e)))?;
            writer
                .write_image_data(&self.rgba_data)
                .map_err(|e| RendererError::Encode(format!("image data: {}", e)))?;
        }
        Ok(png_data)
    }
}

/// Download name for an export taken at `unix_millis`.
pub fn export_file_name(unix_millis: u128) -> String {
    format!("tedno-drawing-{}.png", unix_millis)
}

/// Download name for an export taken now.
pub fn export_file_name_now() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    export_file_name(millis)
}

fn skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn skia_color(color: Color) -> tiny_skia::Color {
    let rgba = color.to_rgba8();
    tiny_skia::Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

fn fill_outline(pixmap: &mut Pixmap, outline: &[Point], color: Rgb, transform: Transform) {
    let mut points = outline.iter();
    let Some(first) = points.next() else {
        return;
    };
    let mut builder = PathBuilder::new();
    builder.move_to(first.x as f32, first.y as f32);
    for p in points {
        builder.line_to(p.x as f32, p.y as f32);
    }
    builder.close();
    let Some(path) = builder.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
}

fn rasterize(ctx: &RenderContext, transform: Affine, include_live: bool) -> RenderResult<Pixmap> {
    let (width, height) = ctx.pixel_size();
    let mut pixmap =
        Pixmap::new(width, height).ok_or(RendererError::InvalidSize { width, height })?;
    pixmap.fill(skia_color(ctx.background_color));

    let transform = skia_transform(transform);
    for stroke in ctx.canvas.strokes() {
        fill_outline(&mut pixmap, stroke.outline(), stroke.color(), transform);
    }
    if include_live {
        fill_outline(
            &mut pixmap,
            ctx.canvas.live_outline(),
            ctx.canvas.tool_manager.color(),
            transform,
        );
    }
    Ok(pixmap)
}

fn to_rgba(pixmap: &Pixmap) -> PngRenderResult {
    let mut rgba_data = Vec::with_capacity(pixmap.pixels().len() * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba_data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    PngRenderResult {
        rgba_data,
        width: pixmap.width(),
        height: pixmap.height(),
    }
}

/// Rasterize the committed strokes for export.
///
/// Pan and zoom are ignored; the image covers the surface at the context's
/// device pixel ratio.
pub fn export_image(ctx: &RenderContext) -> RenderResult<PngRenderResult> {
    if ctx.canvas.strokes().is_empty() {
        return Err(RendererError::NothingToExport);
    }
    let pixmap = rasterize(ctx, ctx.export_transform(), false)
        .inspect_err(|e| log::error!("Export failed: {}", e))?;
    Ok(to_rgba(&pixmap))
}

/// Rasterize and encode the committed strokes as PNG.
pub fn export_png(ctx: &RenderContext) -> RenderResult<Vec<u8>> {
    export_image(ctx)?.encode()
}

/// Software renderer producing the on-screen frame.
#[derive(Default)]
pub struct RasterRenderer {
    frame: Option<Pixmap>,
}

impl RasterRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pixels of the last built frame.
    pub fn frame(&self) -> Option<PngRenderResult> {
        self.frame.as_ref().map(to_rgba)
    }
}

impl Renderer for RasterRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.frame = match rasterize(ctx, ctx.view_transform(), true) {
            Ok(pixmap) => Some(pixmap),
            Err(e) => {
                log::error!("Failed to rasterize frame: {}", e);
                None
            }
        };
    }
}
