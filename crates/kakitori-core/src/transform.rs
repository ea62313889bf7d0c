//! Canonical coordinate space and the uniform transform into a render box.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Side length of the canonical glyph box (the KanjiVG view box).
///
/// Every loaded glyph is rescaled into `0..CANONICAL_SIZE` on both axes, so
/// matcher thresholds are expressed against this size regardless of the
/// display surface.
pub const CANONICAL_SIZE: f64 = 109.0;

/// The canonical box as a rectangle.
pub fn canonical_box() -> Rect {
    Rect::new(0.0, 0.0, CANONICAL_SIZE, CANONICAL_SIZE)
}

/// Uniform scale + translation from canonical space into a surface box.
///
/// Aspect ratio is preserved and the glyph box is centered in the target;
/// there is never any skew.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTransform {
    /// Translation applied after scaling (surface units).
    pub offset: Vec2,
    /// Surface units per canonical unit.
    pub scale: f64,
}

impl Default for CanonicalTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl CanonicalTransform {
    /// Identity mapping (canonical == surface).
    pub fn identity() -> Self {
        Self::default()
    }

    /// Fit the canonical box into `target`, centered.
    pub fn fit(target: Rect) -> Self {
        let affine = fit_rect(canonical_box(), target);
        let coeffs = affine.as_coeffs();
        Self {
            offset: Vec2::new(coeffs[4], coeffs[5]),
            scale: coeffs[0],
        }
    }

    /// Fit the canonical box into a surface of the given pixel size.
    pub fn for_surface(size: Size) -> Self {
        Self::fit(Rect::from_origin_size(Point::ZERO, size))
    }

    /// Canonical -> surface.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Surface -> canonical. Used for mapping captured input back.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    /// Map a surface point into canonical space.
    pub fn surface_to_canonical(&self, surface_point: Point) -> Point {
        self.inverse_transform() * surface_point
    }

    /// Map a canonical point onto the surface.
    pub fn canonical_to_surface(&self, canonical_point: Point) -> Point {
        self.transform() * canonical_point
    }
}

/// Uniform, centered mapping of `from` into `to`.
///
/// Degenerate rectangles map with the identity scale so callers never
/// receive a non-invertible transform.
pub fn fit_rect(from: Rect, to: Rect) -> Affine {
    if from.width() <= f64::EPSILON || from.height() <= f64::EPSILON {
        return Affine::IDENTITY;
    }
    if to.width() <= f64::EPSILON || to.height() <= f64::EPSILON {
        return Affine::translate(to.origin().to_vec2() - from.origin().to_vec2());
    }

    let scale = (to.width() / from.width()).min(to.height() / from.height());
    let from_center = from.center();
    let to_center = to.center();

    Affine::translate(Vec2::new(
        to_center.x - from_center.x * scale,
        to_center.y - from_center.y * scale,
    )) * Affine::scale(scale)
}
