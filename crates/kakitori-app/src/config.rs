//! Application configuration.

use kakitori_core::{ConfigError, EngineConfig, SerializableColor};
use kakitori_render::GridStyle;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Surface size in pixels.
    pub width: u32,
    pub height: u32,
    /// Directory of KanjiVG (`<hex>.svg`) or JSON (`<hex>.json`) files.
    pub glyph_dir: PathBuf,
    pub grid_style: GridStyle,
    pub background_color: SerializableColor,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            glyph_dir: PathBuf::from("kanji"),
            grid_style: GridStyle::Cross,
            background_color: SerializableColor::white(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn surface_size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kakitori.json");
        std::fs::write(
            &path,
            r#"{ "width": 400, "grid_style": "star", "engine": { "timings": { "peek_duration_ms": 1500 } } }"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.surface_size(), Size::new(400.0, 300.0));
        assert_eq!(config.grid_style, GridStyle::Star);
        assert_eq!(config.engine.timings.peek_duration_ms, 1500);
        assert_eq!(config.engine.timings.step_duration_ms, 400);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = AppConfig::from_file(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
