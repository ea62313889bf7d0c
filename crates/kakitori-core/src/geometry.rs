//! Polyline helpers shared by the loader, matcher and renderer.

use kurbo::{Point, Rect, Vec2};

/// Total arc length of a polyline.
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Resample a polyline to `n` points evenly spaced by arc length.
///
/// The first and last points are preserved. A zero-length path yields `n`
/// copies of its first point.
pub fn resample(points: &[Point], n: usize) -> Vec<Point> {
    if points.is_empty() || n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![points[0]];
    }

    let mut cumulative = Vec::with_capacity(points.len());
    cumulative.push(0.0);
    for w in points.windows(2) {
        let last = cumulative[cumulative.len() - 1];
        cumulative.push(last + w[0].distance(w[1]));
    }
    let total = cumulative[cumulative.len() - 1];
    if total < 1e-9 {
        return vec![points[0]; n];
    }

    let mut out = Vec::with_capacity(n);
    let mut j = 1;
    for i in 0..n {
        let target = (i as f64 / (n - 1) as f64) * total;
        while j < cumulative.len() - 1 && cumulative[j] < target {
            j += 1;
        }
        let span = (cumulative[j] - cumulative[j - 1]).max(1e-9);
        let t = ((target - cumulative[j - 1]) / span).clamp(0.0, 1.0);
        out.push(points[j - 1].lerp(points[j], t));
    }
    // Guard against accumulated rounding on the final sample.
    if let (Some(last_out), Some(last_in)) = (out.last_mut(), points.last()) {
        *last_out = *last_in;
    }
    out
}

/// Leading portion of a polyline covering `fraction` of its arc length.
pub fn truncate_path(points: &[Point], fraction: f64) -> Vec<Point> {
    if points.len() < 2 || fraction >= 1.0 {
        return points.to_vec();
    }
    if fraction <= 0.0 {
        return points.first().map(|p| vec![*p]).unwrap_or_default();
    }

    let target = path_length(points) * fraction;
    let mut out = vec![points[0]];
    let mut walked = 0.0;
    for w in points.windows(2) {
        let seg = w[0].distance(w[1]);
        if walked + seg >= target {
            let t = if seg > 0.0 { (target - walked) / seg } else { 0.0 };
            out.push(w[0].lerp(w[1], t));
            return out;
        }
        walked += seg;
        out.push(w[1]);
    }
    out
}

/// Arithmetic mean of the points.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ZERO;
    }
    let sum = points
        .iter()
        .fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    (sum / points.len() as f64).to_point()
}

/// Root-mean-square distance of the points from their centroid.
pub fn rms_radius(points: &[Point]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let c = centroid(points);
    let sum_sq: f64 = points.iter().map(|p| (*p - c).hypot2()).sum();
    (sum_sq / points.len() as f64).sqrt()
}

/// Axis-aligned bounds of the points.
pub fn bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

/// Mean distance between corresponding points of two equally sized sequences.
///
/// Returns `f64::INFINITY` when the lengths differ or are zero.
pub fn mean_distance(a: &[Point], b: &[Point]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return f64::INFINITY;
    }
    a.iter().zip(b).map(|(p, q)| p.distance(*q)).sum::<f64>() / a.len() as f64
}

/// Split a (resampled) polyline into `count` consecutive chords.
pub fn chord_vectors(points: &[Point], count: usize) -> Vec<Vec2> {
    if points.len() < 2 || count == 0 {
        return Vec::new();
    }
    let last = points.len() - 1;
    (0..count)
        .map(|k| {
            let from = k * last / count;
            let to = (k + 1) * last / count;
            points[to] - points[from]
        })
        .collect()
}

/// Cosine of the angle between two vectors, `None` if either is degenerate.
pub fn cosine(a: Vec2, b: Vec2) -> Option<f64> {
    let denom = a.hypot() * b.hypot();
    if denom < 1e-9 {
        return None;
    }
    Some((a.dot(b) / denom).clamp(-1.0, 1.0))
}

/// Remove consecutive duplicate points (closer than `epsilon`).
pub fn dedup_points(points: &mut Vec<Point>, epsilon: f64) {
    points.dedup_by(|b, a| a.distance(*b) < epsilon);
}
