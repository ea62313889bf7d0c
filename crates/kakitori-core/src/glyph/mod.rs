//! Glyph reference model and stroke-data sources.

mod definition;
mod kanjivg;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use definition::{GlyphDefinition, StrokeDefinition};
pub use kanjivg::parse_kanjivg;
pub use memory::MemoryGlyphSource;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileGlyphSource;

use crate::geometry;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Minimum arc length (canonical units) for a stroke to be usable.
const MIN_STROKE_LENGTH: f64 = 0.5;

/// Glyph loading errors.
#[derive(Debug, Error)]
pub enum GlyphError {
    #[error("No stroke data for character: {0}")]
    NotFound(String),
    #[error("Malformed stroke data: {0}")]
    MalformedData(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for glyph operations.
pub type GlyphResult<T> = Result<T, GlyphError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// File key used by KanjiVG: five lowercase hex digits of the code point.
pub fn glyph_key(character: char) -> String {
    format!("{:05x}", character as u32)
}

/// One canonical stroke: a centerline polyline in canonical space.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePath {
    points: Vec<Point>,
    /// Stroke-type label from the source data (e.g. `㇐`), if any.
    kind: Option<String>,
    length: f64,
}

impl StrokePath {
    /// Create a stroke from canonical points.
    pub fn new(mut points: Vec<Point>) -> Self {
        geometry::dedup_points(&mut points, 1e-6);
        let length = geometry::path_length(&points);
        Self {
            points,
            kind: None,
            length,
        }
    }

    /// Attach a stroke-type label.
    pub fn with_kind(mut self, kind: Option<String>) -> Self {
        self.kind = kind;
        self
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Where the pen goes down.
    pub fn start(&self) -> Point {
        self.points.first().copied().unwrap_or(Point::ZERO)
    }

    /// Where the pen lifts.
    pub fn end(&self) -> Point {
        self.points.last().copied().unwrap_or(Point::ZERO)
    }

    /// Start-to-end vector.
    pub fn direction(&self) -> Vec2 {
        self.end() - self.start()
    }

    /// Arc length in canonical units.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn bounds(&self) -> Rect {
        geometry::bounds(&self.points)
    }

    /// At least two distinct points and a measurable length.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2 && self.length >= MIN_STROKE_LENGTH
    }
}

/// A structural group of strokes (a radical or component).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrokeGroup {
    /// Component label, e.g. `木`.
    pub element: String,
    /// Indices into the glyph's stroke list.
    pub strokes: Vec<usize>,
}

/// One character's canonical stroke decomposition.
///
/// Strokes are in taught writing order. The list is never empty and is not
/// modified after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphReference {
    character: char,
    strokes: Vec<StrokePath>,
    groups: Vec<StrokeGroup>,
}

impl GlyphReference {
    /// Build a reference, dropping unusable strokes.
    ///
    /// Fails with [`GlyphError::MalformedData`] when no valid stroke remains.
    pub fn new(character: char, strokes: Vec<StrokePath>, groups: Vec<StrokeGroup>) -> GlyphResult<Self> {
        let total = strokes.len();
        let mut remap = Vec::with_capacity(total);
        let mut kept = Vec::with_capacity(total);
        for stroke in strokes {
            if stroke.is_valid() {
                remap.push(Some(kept.len()));
                kept.push(stroke);
            } else {
                remap.push(None);
            }
        }

        if kept.is_empty() {
            return Err(GlyphError::MalformedData(format!(
                "{character}: no valid strokes in definition"
            )));
        }
        if kept.len() < total {
            log::warn!(
                "{character}: dropped {} degenerate stroke(s) of {total}",
                total - kept.len()
            );
        }

        let groups = groups
            .into_iter()
            .map(|g| StrokeGroup {
                element: g.element,
                strokes: g
                    .strokes
                    .iter()
                    .filter_map(|&i| remap.get(i).copied().flatten())
                    .collect(),
            })
            .filter(|g| !g.strokes.is_empty())
            .collect();

        Ok(Self {
            character,
            strokes: kept,
            groups,
        })
    }

    pub fn character(&self) -> char {
        self.character
    }

    pub fn strokes(&self) -> &[StrokePath] {
        &self.strokes
    }

    pub fn stroke(&self, index: usize) -> Option<&StrokePath> {
        self.strokes.get(index)
    }

    /// Number of strokes (always at least one).
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn groups(&self) -> &[StrokeGroup] {
        &self.groups
    }

    /// Union of all stroke bounds.
    pub fn bounds(&self) -> Rect {
        self.strokes
            .iter()
            .map(StrokePath::bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }
}

/// Trait for glyph definition providers.
///
/// A load is a single attempt: absence is reported as
/// [`GlyphError::NotFound`] and never retried.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait GlyphSource: Send + Sync {
    /// Load and decode the stroke definition for a character.
    fn load(&self, character: char) -> BoxFuture<'_, GlyphResult<GlyphReference>>;

    /// Check if a definition exists for a character.
    fn exists(&self, character: char) -> BoxFuture<'_, GlyphResult<bool>>;
}

/// Trait for glyph definition providers (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait GlyphSource {
    /// Load and decode the stroke definition for a character.
    fn load(&self, character: char) -> BoxFuture<'_, GlyphResult<GlyphReference>>;

    /// Check if a definition exists for a character.
    fn exists(&self, character: char) -> BoxFuture<'_, GlyphResult<bool>>;
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::future::Future;

    /// Drive a future that never actually suspends.
    pub fn block_on<F: Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
                return result;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(points: &[(f64, f64)]) -> StrokePath {
        StrokePath::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn test_glyph_key() {
        assert_eq!(glyph_key('木'), "06728");
        assert_eq!(glyph_key('一'), "04e00");
    }

    #[test]
    fn test_stroke_direction_and_length() {
        let s = stroke(&[(10.0, 10.0), (40.0, 50.0)]);
        assert_eq!(s.start(), Point::new(10.0, 10.0));
        assert_eq!(s.end(), Point::new(40.0, 50.0));
        assert!((s.length() - 50.0).abs() < 1e-10);
        assert!(s.is_valid());
    }

    #[test]
    fn test_duplicate_points_collapse() {
        let s = stroke(&[(5.0, 5.0), (5.0, 5.0), (5.0, 5.0)]);
        assert_eq!(s.points().len(), 1);
        assert!(!s.is_valid());
    }

    #[test]
    fn test_empty_glyph_is_malformed() {
        let result = GlyphReference::new('木', vec![], vec![]);
        assert!(matches!(result, Err(GlyphError::MalformedData(_))));
    }

    #[test]
    fn test_degenerate_strokes_dropped_and_groups_remapped() {
        let glyph = GlyphReference::new(
            '二',
            vec![
                stroke(&[(1.0, 1.0), (1.0, 1.0)]),
                stroke(&[(20.0, 40.0), (80.0, 40.0)]),
                stroke(&[(10.0, 80.0), (95.0, 80.0)]),
            ],
            vec![StrokeGroup {
                element: "二".to_string(),
                strokes: vec![0, 1, 2],
            }],
        )
        .unwrap();

        assert_eq!(glyph.len(), 2);
        assert_eq!(glyph.groups()[0].strokes, vec![0, 1]);
        assert_eq!(glyph.stroke(0).unwrap().start(), Point::new(20.0, 40.0));
    }
}
