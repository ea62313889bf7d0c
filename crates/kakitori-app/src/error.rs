//! Application-level errors.

use kakitori_core::{ConfigError, GlyphError};
use kakitori_render::{ExportError, RendererError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Glyph error: {0}")]
    Glyph(#[from] GlyphError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("Render error: {0}")]
    Render(#[from] RendererError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid verdict: {0}")]
    Verdict(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
