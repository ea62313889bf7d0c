//! JSON glyph definitions.
//!
//! A lighter alternative to KanjiVG for hosts that ship pre-flattened
//! stroke data:
//!
//! ```json
//! { "character": "一", "view_box": [0, 0, 109, 109],
//!   "strokes": [ { "points": [[12, 54], [97, 54]], "kind": "㇐" } ] }
//! ```

use super::{GlyphError, GlyphReference, GlyphResult, StrokeGroup, StrokePath};
use crate::transform::{canonical_box, fit_rect};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// One stroke as stored in a definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrokeDefinition {
    pub points: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Serializable glyph definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphDefinition {
    pub character: char,
    /// Source coordinate box `[x, y, width, height]`; canonical when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_box: Option<[f64; 4]>,
    pub strokes: Vec<StrokeDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<StrokeGroup>,
}

impl GlyphDefinition {
    /// Parse a definition from JSON.
    pub fn from_json(json: &str) -> GlyphResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| GlyphError::MalformedData(format!("glyph definition: {e}")))
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> GlyphResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GlyphError::MalformedData(format!("glyph definition: {e}")))
    }

    /// Capture an already-loaded glyph (canonical coordinates).
    pub fn from_reference(glyph: &GlyphReference) -> Self {
        Self {
            character: glyph.character(),
            view_box: None,
            strokes: glyph
                .strokes()
                .iter()
                .map(|s| StrokeDefinition {
                    points: s.points().iter().map(|p| [p.x, p.y]).collect(),
                    kind: s.kind().map(str::to_string),
                })
                .collect(),
            groups: glyph.groups().to_vec(),
        }
    }

    /// Convert to a canonical glyph reference.
    pub fn into_reference(self) -> GlyphResult<GlyphReference> {
        let to_canonical = match self.view_box {
            Some([x, y, w, h]) if w > 0.0 && h > 0.0 => {
                fit_rect(Rect::new(x, y, x + w, y + h), canonical_box())
            }
            Some(vb) => {
                return Err(GlyphError::MalformedData(format!(
                    "{}: invalid view box {vb:?}",
                    self.character
                )));
            }
            None => kurbo::Affine::IDENTITY,
        };

        let strokes = self
            .strokes
            .into_iter()
            .map(|s| {
                let points = s
                    .points
                    .into_iter()
                    .map(|[x, y]| to_canonical * Point::new(x, y))
                    .collect();
                StrokePath::new(points).with_kind(s.kind)
            })
            .collect();

        GlyphReference::new(self.character, strokes, self.groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_definition() {
        let json = r#"{
            "character": "二",
            "strokes": [
                { "points": [[30, 35], [80, 35]] },
                { "points": [[15, 80], [95, 80]], "kind": "㇐" }
            ]
        }"#;
        let glyph = GlyphDefinition::from_json(json).unwrap().into_reference().unwrap();
        assert_eq!(glyph.character(), '二');
        assert_eq!(glyph.len(), 2);
        assert_eq!(glyph.stroke(1).unwrap().kind(), Some("㇐"));
    }

    #[test]
    fn test_view_box_scaling() {
        let json = r#"{
            "character": "一",
            "view_box": [0, 0, 1, 1],
            "strokes": [ { "points": [[0.1, 0.5], [0.9, 0.5]] } ]
        }"#;
        let glyph = GlyphDefinition::from_json(json).unwrap().into_reference().unwrap();
        let s = glyph.stroke(0).unwrap();
        assert!((s.start().x - 10.9).abs() < 1e-9);
        assert!((s.end().y - 54.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(
            GlyphDefinition::from_json("{ not json"),
            Err(GlyphError::MalformedData(_))
        ));
    }

    #[test]
    fn test_single_point_strokes_are_malformed() {
        let json = r#"{ "character": "丶", "strokes": [ { "points": [[50, 50]] } ] }"#;
        let result = GlyphDefinition::from_json(json).unwrap().into_reference();
        assert!(matches!(result, Err(GlyphError::MalformedData(_))));
    }

    #[test]
    fn test_reference_roundtrip_preserves_order() {
        let json = r#"{ "character": "十", "strokes": [
            { "points": [[15, 50], [95, 50]] },
            { "points": [[55, 10], [55, 100]] } ] }"#;
        let glyph = GlyphDefinition::from_json(json).unwrap().into_reference().unwrap();
        let back = GlyphDefinition::from_reference(&glyph).to_json().unwrap();
        let again = GlyphDefinition::from_json(&back).unwrap().into_reference().unwrap();
        assert_eq!(glyph, again);
    }
}
