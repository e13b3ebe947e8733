//! Tedno Ink Render Library
//!
//! Renderer abstraction for the ink layer, a retained vector scene with SVG
//! output, and a CPU rasterizer for PNG export.

mod raster;
mod renderer;
mod scene;

pub use raster::{
    PngRenderResult, RasterRenderer, export_file_name, export_file_name_now, export_image,
    export_png,
};
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError, ink_color, outline_path};
pub use scene::{SceneItem, VectorScene, svg_document};
