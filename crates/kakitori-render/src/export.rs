//! Still-image export of the learner's drawing.

use crate::renderer::RendererError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use peniko::Color;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// No glyph is attached, so there is nothing to export.
    #[error("Writer is not ready: no glyph attached")]
    NotReady,
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error(transparent)]
    Render(#[from] RendererError),
}

/// Options for [`crate::RasterRenderer::render_image`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Draw the practice grid under the ink.
    pub include_grid: bool,
    pub background_color: Color,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_grid: false,
            background_color: Color::WHITE,
        }
    }
}

/// Result of offscreen rendering - raw RGBA pixel data and dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba_data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Encode as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>, ExportError> {
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder
                .write_header()
                .map_err(|e| ExportError::Encode(e.to_string()))?;
            writer
                .write_image_data(&self.rgba_data)
                .map_err(|e| ExportError::Encode(e.to_string()))?;
        }
        Ok(png_data)
    }

    /// Encode as a `data:image/png;base64,` URL.
    pub fn to_data_url(&self) -> Result<String, ExportError> {
        let png = self.to_png()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}
