//! Stroke-order animation timeline.

use std::time::Duration;

/// How much of the glyph is drawn at one instant of an animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    /// Strokes drawn in full.
    pub completed: usize,
    /// Stroke being drawn and the fraction of its length shown.
    pub partial: Option<(usize, f64)>,
}

impl AnimationFrame {
    /// Whether stroke `index` should be visible, and how much of it.
    pub fn progress(&self, index: usize) -> Option<f64> {
        if index < self.completed {
            Some(1.0)
        } else {
            match self.partial {
                Some((i, t)) if i == index => Some(t),
                _ => None,
            }
        }
    }
}

/// Timeline that draws each stroke in turn, pausing between strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeAnimation {
    stroke_count: usize,
    step: Duration,
    pause: Duration,
}

impl StrokeAnimation {
    pub fn new(stroke_count: usize, step: Duration, pause: Duration) -> Self {
        Self {
            stroke_count,
            step,
            pause,
        }
    }

    pub fn stroke_count(&self) -> usize {
        self.stroke_count
    }

    /// Offset at which stroke `index` starts drawing.
    pub fn stroke_start(&self, index: usize) -> Duration {
        (self.step + self.pause) * index as u32
    }

    pub fn total_duration(&self) -> Duration {
        match self.stroke_count {
            0 => Duration::ZERO,
            n => self.step * n as u32 + self.pause * (n as u32 - 1),
        }
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.total_duration()
    }

    pub fn frame_at(&self, elapsed: Duration) -> AnimationFrame {
        if self.is_finished(elapsed) {
            return AnimationFrame {
                completed: self.stroke_count,
                partial: None,
            };
        }

        let slot = self.step + self.pause;
        let index = if slot.is_zero() {
            0
        } else {
            (elapsed.as_nanos() / slot.as_nanos()) as usize
        };
        let into = elapsed.saturating_sub(self.stroke_start(index));
        if into >= self.step {
            // Pausing after stroke `index`.
            return AnimationFrame {
                completed: index + 1,
                partial: None,
            };
        }
        AnimationFrame {
            completed: index,
            partial: Some((index, into.as_secs_f64() / self.step.as_secs_f64())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn four_strokes() -> StrokeAnimation {
        StrokeAnimation::new(4, ms(400), ms(150))
    }

    #[test]
    fn test_timeline_lengths() {
        let anim = four_strokes();
        assert_eq!(anim.stroke_start(0), ms(0));
        assert_eq!(anim.stroke_start(2), ms(1100));
        assert_eq!(anim.total_duration(), ms(2050));
        assert_eq!(StrokeAnimation::new(0, ms(400), ms(150)).total_duration(), ms(0));
    }

    #[test]
    fn test_frames() {
        let anim = four_strokes();

        let start = anim.frame_at(ms(0));
        assert_eq!(start.completed, 0);
        assert_eq!(start.partial, Some((0, 0.0)));

        let mid = anim.frame_at(ms(200));
        assert_eq!(mid.progress(0), Some(0.5));
        assert_eq!(mid.progress(1), None);

        let pause = anim.frame_at(ms(450));
        assert_eq!(pause.completed, 1);
        assert_eq!(pause.partial, None);

        let second = anim.frame_at(ms(650));
        assert_eq!(second.progress(0), Some(1.0));
        assert_eq!(second.partial, Some((1, 0.25)));

        let done = anim.frame_at(ms(5000));
        assert_eq!(done.completed, 4);
        assert!(anim.is_finished(ms(2050)));
    }
}
