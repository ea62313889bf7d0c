//! Kakitori Render Library
//!
//! Renderer abstraction, a CPU raster implementation, the stroke-order
//! animation timeline and still-image export.

pub mod animation;
pub mod export;
mod raster_impl;
mod renderer;
pub mod surface;

pub use animation::{AnimationFrame, StrokeAnimation};
pub use export::{ExportError, ExportOptions, RasterImage};
pub use raster_impl::RasterRenderer;
pub use renderer::{Flash, GridStyle, RenderContext, RenderResult, Renderer, RendererError, StrokeRenderer};
pub use surface::RasterSurface;
