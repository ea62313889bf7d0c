//! Pointer input capture and stroke segmentation.
//!
//! Raw pointer events in surface coordinates are turned into discrete
//! [`UserStroke`]s, each bounded by press and release.

use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Pointer event type for unified mouse/touch/pen handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
    /// The platform aborted the gesture (e.g. touch cancel).
    Cancel,
}

/// A sampled pointer position with its capture time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedPoint {
    pub position: Point,
    /// Time since the owning writer was created.
    pub at: Duration,
}

/// One stroke drawn by the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStroke {
    id: Uuid,
    points: Vec<TimedPoint>,
}

impl Default for UserStroke {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStroke {
    /// Create an empty stroke.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            points: Vec::new(),
        }
    }

    /// Create from untimed points (replays, tests).
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points: points
                .into_iter()
                .map(|position| TimedPoint {
                    position,
                    at: Duration::ZERO,
                })
                .collect(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Add a sample.
    pub fn add_point(&mut self, position: Point, at: Duration) {
        self.points.push(TimedPoint { position, at });
    }

    pub fn samples(&self) -> &[TimedPoint] {
        &self.points
    }

    /// Positions only, in capture order.
    pub fn positions(&self) -> Vec<Point> {
        self.points.iter().map(|p| p.position).collect()
    }

    pub fn last_position(&self) -> Option<Point> {
        self.points.last().map(|p| p.position)
    }

    /// Get the number of samples.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the stroke is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time from first to last sample.
    pub fn duration(&self) -> Duration {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) => b.at.saturating_sub(a.at),
            _ => Duration::ZERO,
        }
    }

    /// Map every sample through `affine`, keeping timestamps and id.
    pub fn transformed(&self, affine: Affine) -> Self {
        Self {
            id: self.id,
            points: self
                .points
                .iter()
                .map(|p| TimedPoint {
                    position: affine * p.position,
                    at: p.at,
                })
                .collect(),
        }
    }
}

/// Segmenter tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Moves closer than this to the last sample (surface pixels) are dropped.
    pub min_sample_distance: f64,
    /// Strokes with fewer samples are treated as noise (taps).
    pub min_points: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_sample_distance: 2.0,
            min_points: 3,
        }
    }
}

/// What a pointer event did to the capture state.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// No stroke affected (capture disabled, or move/up without press).
    Ignored,
    /// A new stroke began.
    Started,
    /// The in-progress stroke gained a sample.
    Extended,
    /// A sample was throttled away.
    Throttled,
    /// A stroke was finished and is ready for matching.
    Finished(UserStroke),
    /// A stroke ended but was too short to submit, or was cancelled.
    Discarded,
}

/// Converts pointer events into strokes.
#[derive(Debug, Clone)]
pub struct StrokeCapture {
    config: CaptureConfig,
    enabled: bool,
    current: Option<UserStroke>,
}

impl StrokeCapture {
    /// Create a new, enabled capture.
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            enabled: true,
            current: None,
        }
    }

    /// Enable or disable capture. Disabling drops any in-progress stroke.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.current = None;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the pointer is currently down on a stroke.
    pub fn is_capturing(&self) -> bool {
        self.current.is_some()
    }

    /// The stroke being drawn, if any (surface coordinates).
    pub fn current(&self) -> Option<&UserStroke> {
        self.current.as_ref()
    }

    /// Drop the in-progress stroke.
    pub fn cancel(&mut self) {
        self.current = None;
    }

    /// Process a pointer event.
    pub fn handle(&mut self, event: PointerEvent, at: Duration) -> CaptureOutcome {
        if !self.enabled {
            return CaptureOutcome::Ignored;
        }

        match event {
            PointerEvent::Down { position } => {
                // A second press without release restarts the stroke.
                let mut stroke = UserStroke::new();
                stroke.add_point(position, at);
                self.current = Some(stroke);
                CaptureOutcome::Started
            }
            PointerEvent::Move { position } => {
                let min_distance = self.config.min_sample_distance;
                let Some(stroke) = self.current.as_mut() else {
                    return CaptureOutcome::Ignored;
                };
                match stroke.last_position() {
                    Some(last) if last.distance(position) < min_distance => {
                        CaptureOutcome::Throttled
                    }
                    _ => {
                        stroke.add_point(position, at);
                        CaptureOutcome::Extended
                    }
                }
            }
            PointerEvent::Up { position } => {
                let Some(mut stroke) = self.current.take() else {
                    return CaptureOutcome::Ignored;
                };
                // Keep the true lift point even if it was throttled.
                if stroke
                    .last_position()
                    .is_some_and(|last| last.distance(position) > f64::EPSILON)
                {
                    stroke.add_point(position, at);
                }
                if stroke.len() < self.config.min_points {
                    log::trace!("Discarding {}-point stroke as noise", stroke.len());
                    CaptureOutcome::Discarded
                } else {
                    CaptureOutcome::Finished(stroke)
                }
            }
            PointerEvent::Cancel => {
                if self.current.take().is_some() {
                    CaptureOutcome::Discarded
                } else {
                    CaptureOutcome::Ignored
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
        }
    }

    fn mv(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
        }
    }

    #[test]
    fn test_press_move_release_finishes_stroke() {
        let mut capture = StrokeCapture::new(CaptureConfig::default());

        assert_eq!(capture.handle(down(10.0, 10.0), ms(0)), CaptureOutcome::Started);
        assert!(capture.is_capturing());
        assert_eq!(capture.handle(mv(20.0, 10.0), ms(16)), CaptureOutcome::Extended);
        assert_eq!(capture.handle(mv(30.0, 10.0), ms(32)), CaptureOutcome::Extended);

        let CaptureOutcome::Finished(stroke) = capture.handle(up(30.0, 10.0), ms(40)) else {
            panic!("expected a finished stroke");
        };
        assert_eq!(stroke.len(), 3);
        assert_eq!(stroke.duration(), ms(32));
        assert!(!capture.is_capturing());
    }

    #[test]
    fn test_moves_are_throttled() {
        let mut capture = StrokeCapture::new(CaptureConfig::default());
        capture.handle(down(10.0, 10.0), ms(0));

        assert_eq!(capture.handle(mv(10.5, 10.0), ms(5)), CaptureOutcome::Throttled);
        assert_eq!(capture.current().unwrap().len(), 1);
    }

    #[test]
    fn test_release_keeps_lift_point() {
        let mut capture = StrokeCapture::new(CaptureConfig::default());
        capture.handle(down(0.0, 0.0), ms(0));
        capture.handle(mv(10.0, 0.0), ms(10));
        capture.handle(mv(11.0, 0.0), ms(20)); // throttled

        let CaptureOutcome::Finished(stroke) = capture.handle(up(11.0, 0.0), ms(30)) else {
            panic!("expected a finished stroke");
        };
        assert_eq!(stroke.last_position(), Some(Point::new(11.0, 0.0)));
    }

    #[test]
    fn test_tap_is_discarded() {
        let mut capture = StrokeCapture::new(CaptureConfig::default());
        capture.handle(down(50.0, 50.0), ms(0));
        assert_eq!(capture.handle(up(50.0, 50.0), ms(60)), CaptureOutcome::Discarded);
    }

    #[test]
    fn test_disabled_capture_ignores_everything() {
        let mut capture = StrokeCapture::new(CaptureConfig::default());
        capture.set_enabled(false);

        assert_eq!(capture.handle(down(0.0, 0.0), ms(0)), CaptureOutcome::Ignored);
        assert_eq!(capture.handle(mv(40.0, 0.0), ms(10)), CaptureOutcome::Ignored);
        assert_eq!(capture.handle(up(80.0, 0.0), ms(20)), CaptureOutcome::Ignored);
    }

    #[test]
    fn test_move_without_press_ignored() {
        let mut capture = StrokeCapture::new(CaptureConfig::default());
        assert_eq!(capture.handle(mv(40.0, 0.0), ms(10)), CaptureOutcome::Ignored);
    }

    #[test]
    fn test_cancel_discards_in_progress() {
        let mut capture = StrokeCapture::new(CaptureConfig::default());
        capture.handle(down(0.0, 0.0), ms(0));
        capture.handle(mv(40.0, 0.0), ms(10));
        assert_eq!(capture.handle(PointerEvent::Cancel, ms(20)), CaptureOutcome::Discarded);
        assert_eq!(capture.handle(PointerEvent::Cancel, ms(30)), CaptureOutcome::Ignored);
    }

    #[test]
    fn test_transformed_keeps_identity() {
        let stroke = UserStroke::from_points([Point::new(2.0, 4.0), Point::new(6.0, 8.0)]);
        let scaled = stroke.transformed(Affine::scale(0.5));
        assert_eq!(scaled.id(), stroke.id());
        assert_eq!(scaled.positions(), vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }
}
