//! Synthetic pointer gestures that trace reference strokes.

use kakitori_core::geometry::resample;
use kakitori_core::{CanonicalTransform, PointerEvent, StrokePath};
use kurbo::Point;

/// Samples per traced stroke.
pub const TRACE_SAMPLES: usize = 32;

/// Surface-space polyline following `stroke`, optionally backwards.
pub fn trace_stroke(stroke: &StrokePath, transform: &CanonicalTransform, reversed: bool) -> Vec<Point> {
    let mut points: Vec<Point> = resample(stroke.points(), TRACE_SAMPLES)
        .into_iter()
        .map(|p| transform.canonical_to_surface(p))
        .collect();
    if reversed {
        points.reverse();
    }
    points
}

/// Press, moves and release along `points`.
pub fn pointer_gesture(points: &[Point]) -> Vec<PointerEvent> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let mut events = Vec::with_capacity(points.len() + 1);
    events.push(PointerEvent::Down { position: first });
    events.extend(
        points[1..]
            .iter()
            .map(|&position| PointerEvent::Move { position }),
    );
    events.push(PointerEvent::Up { position: last });
    events
}
