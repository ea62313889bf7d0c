//! In-memory glyph source.

use super::{BoxFuture, GlyphError, GlyphReference, GlyphResult, GlyphSource, parse_kanjivg};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory glyph source for testing and embedded data sets.
#[derive(Default)]
pub struct MemoryGlyphSource {
    glyphs: RwLock<HashMap<char, GlyphReference>>,
}

impl MemoryGlyphSource {
    /// Create a new empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already-decoded glyph, replacing any previous entry.
    pub fn insert(&self, glyph: GlyphReference) -> GlyphResult<()> {
        let mut glyphs = self
            .glyphs
            .write()
            .map_err(|e| GlyphError::Io(format!("Lock error: {}", e)))?;
        glyphs.insert(glyph.character(), glyph);
        Ok(())
    }

    /// Decode a KanjiVG document and insert it.
    pub fn insert_kanjivg(&self, character: char, svg: &str) -> GlyphResult<()> {
        self.insert(parse_kanjivg(character, svg)?)
    }

    /// Number of stored glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GlyphSource for MemoryGlyphSource {
    fn load(&self, character: char) -> BoxFuture<'_, GlyphResult<GlyphReference>> {
        Box::pin(async move {
            let glyphs = self
                .glyphs
                .read()
                .map_err(|e| GlyphError::Io(format!("Lock error: {}", e)))?;
            glyphs
                .get(&character)
                .cloned()
                .ok_or_else(|| GlyphError::NotFound(character.to_string()))
        })
    }

    fn exists(&self, character: char) -> BoxFuture<'_, GlyphResult<bool>> {
        Box::pin(async move {
            let glyphs = self
                .glyphs
                .read()
                .map_err(|e| GlyphError::Io(format!("Lock error: {}", e)))?;
            Ok(glyphs.contains_key(&character))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::kanjivg::tests::KI_SVG;
    use crate::glyph::test_util::block_on;

    #[test]
    fn test_memory_load() {
        let source = MemoryGlyphSource::new();
        source.insert_kanjivg('木', KI_SVG).unwrap();

        let glyph = block_on(source.load('木')).unwrap();
        assert_eq!(glyph.len(), 4);
        assert!(block_on(source.exists('木')).unwrap());
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_memory_not_found() {
        let source = MemoryGlyphSource::new();
        let result = block_on(source.load('林'));
        assert!(matches!(result, Err(GlyphError::NotFound(c)) if c == "林"));
    }
}
