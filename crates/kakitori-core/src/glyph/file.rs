//! File-based glyph source for native platforms.

use super::{BoxFuture, GlyphDefinition, GlyphError, GlyphReference, GlyphResult, GlyphSource, glyph_key, parse_kanjivg};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads stroke definitions from a directory.
///
/// Files are looked up by [`glyph_key`]: `<key>.svg` (KanjiVG) first, then
/// `<key>.json` ([`GlyphDefinition`]).
pub struct FileGlyphSource {
    /// Directory holding the definition files.
    base_path: PathBuf,
}

impl FileGlyphSource {
    /// Create a source over an existing directory.
    pub fn new(base_path: PathBuf) -> GlyphResult<Self> {
        if !base_path.is_dir() {
            return Err(GlyphError::Io(format!(
                "Glyph directory does not exist: {}",
                base_path.display()
            )));
        }
        Ok(Self { base_path })
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn svg_path(&self, character: char) -> PathBuf {
        self.base_path.join(format!("{}.svg", glyph_key(character)))
    }

    fn json_path(&self, character: char) -> PathBuf {
        self.base_path.join(format!("{}.json", glyph_key(character)))
    }

    /// Read a file, mapping absence to `None`.
    fn read_optional(path: &Path) -> GlyphResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GlyphError::Io(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn load_sync(&self, character: char) -> GlyphResult<GlyphReference> {
        let svg_path = self.svg_path(character);
        if let Some(svg) = Self::read_optional(&svg_path)? {
            log::debug!("Loading {character} from {}", svg_path.display());
            return parse_kanjivg(character, &svg);
        }

        let json_path = self.json_path(character);
        if let Some(json) = Self::read_optional(&json_path)? {
            log::debug!("Loading {character} from {}", json_path.display());
            let definition = GlyphDefinition::from_json(&json)?;
            if definition.character != character {
                return Err(GlyphError::MalformedData(format!(
                    "{} defines {:?}, expected {:?}",
                    json_path.display(),
                    definition.character,
                    character
                )));
            }
            return definition.into_reference();
        }

        Err(GlyphError::NotFound(character.to_string()))
    }
}

impl GlyphSource for FileGlyphSource {
    fn load(&self, character: char) -> BoxFuture<'_, GlyphResult<GlyphReference>> {
        Box::pin(async move { self.load_sync(character) })
    }

    fn exists(&self, character: char) -> BoxFuture<'_, GlyphResult<bool>> {
        let found = self.svg_path(character).exists() || self.json_path(character).exists();
        Box::pin(async move { Ok(found) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::kanjivg::tests::KI_SVG;
    use crate::glyph::test_util::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_file_source_loads_kanjivg() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("06728.svg"), KI_SVG).unwrap();
        let source = FileGlyphSource::new(dir.path().to_path_buf()).unwrap();

        let glyph = block_on(source.load('木')).unwrap();
        assert_eq!(glyph.character(), '木');
        assert_eq!(glyph.len(), 4);
        assert!(block_on(source.exists('木')).unwrap());
    }

    #[test]
    fn test_file_source_loads_json() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("04e00.json"),
            r#"{ "character": "一", "strokes": [ { "points": [[12, 54], [97, 54]] } ] }"#,
        )
        .unwrap();
        let source = FileGlyphSource::new(dir.path().to_path_buf()).unwrap();

        let glyph = block_on(source.load('一')).unwrap();
        assert_eq!(glyph.len(), 1);
    }

    #[test]
    fn test_file_source_not_found() {
        let dir = tempdir().unwrap();
        let source = FileGlyphSource::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(source.load('木'));
        assert!(matches!(result, Err(GlyphError::NotFound(_))));
        assert!(!block_on(source.exists('木')).unwrap());
    }

    #[test]
    fn test_file_source_malformed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("06728.svg"), "<svg></svg>").unwrap();
        let source = FileGlyphSource::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(source.load('木'));
        assert!(matches!(result, Err(GlyphError::MalformedData(_))));
    }

    #[test]
    fn test_file_source_rejects_mismatched_character() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("04e00.json"),
            r#"{ "character": "二", "strokes": [ { "points": [[12, 54], [97, 54]] } ] }"#,
        )
        .unwrap();
        let source = FileGlyphSource::new(dir.path().to_path_buf()).unwrap();

        assert!(matches!(block_on(source.load('一')), Err(GlyphError::MalformedData(_))));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(FileGlyphSource::new(missing), Err(GlyphError::Io(_))));
    }
}
