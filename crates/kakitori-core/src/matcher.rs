//! Stroke matching: decides whether a drawn stroke is the expected one.
//!
//! Both strokes are compared in canonical space after arc-length
//! resampling. Shape distance is orientation-free (the better of forward and
//! reversed correspondence) so that a stroke drawn backwards is reported as
//! a direction problem rather than a shape problem; direction is judged
//! separately from the start-to-end vector and a few intermediate chords.

use crate::geometry::{self, chord_vectors, cosine, resample};
use crate::glyph::StrokePath;
use crate::session::Mode;
use crate::transform::CANONICAL_SIZE;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Matcher thresholds and tuning knobs.
///
/// Distances are fractions of the canonical box size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Points per stroke after resampling.
    pub resample_count: usize,
    /// Candidate/expected arc-length ratio bounds for the early exit.
    pub min_length_ratio: f64,
    pub max_length_ratio: f64,
    /// Accepted shape distances must be below this.
    pub shape_threshold: f64,
    /// Accepted direction agreement (cosine) must be above this.
    pub direction_threshold: f64,
    /// Scores within this margin of a threshold are rejected.
    pub tie_margin: f64,
    /// Largest translation the alignment step may absorb.
    pub max_offset: f64,
    /// Largest uniform scale factor (and its inverse) alignment may absorb.
    pub max_scale: f64,
    /// Penalty per unit of centroid offset.
    pub placement_weight: f64,
    /// Penalty per unit of |ln(scale)|.
    pub scale_weight: f64,
    /// Intermediate chords compared in addition to start-to-end.
    pub chord_count: usize,
    /// Shape tolerance multiplier in challenge mode (no guide shown).
    pub challenge_tolerance: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            resample_count: 32,
            min_length_ratio: 0.3,
            max_length_ratio: 3.0,
            shape_threshold: 0.10,
            direction_threshold: 0.5,
            tie_margin: 0.005,
            max_offset: 0.15,
            max_scale: 1.5,
            placement_weight: 0.3,
            scale_weight: 0.05,
            chord_count: 3,
            challenge_tolerance: 1.25,
        }
    }
}

impl MatcherConfig {
    /// Shape threshold adjusted for the practice mode.
    pub fn shape_threshold_for(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Challenge => self.shape_threshold * self.challenge_tolerance,
            Mode::Practice | Mode::View => self.shape_threshold,
        }
    }
}

/// Why a stroke was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    ShapeMismatch,
    WrongDirection,
    Both,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::ShapeMismatch => "ShapeMismatch",
            RejectReason::WrongDirection => "WrongDirection",
            RejectReason::Both => "Both",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurements behind a decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Shape distance including placement penalty (fraction of box size).
    pub shape_distance: f64,
    /// Mean cosine between candidate and expected direction vectors.
    pub direction_agreement: f64,
    /// Candidate arc length / expected arc length.
    pub length_ratio: f64,
}

/// Result of matching a candidate against an expected stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    Accept(MatchScore),
    /// `score` is `None` when the length early exit fired.
    Reject {
        reason: RejectReason,
        score: Option<MatchScore>,
    },
}

impl MatchOutcome {
    pub fn is_accept(&self) -> bool {
        matches!(self, MatchOutcome::Accept(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            MatchOutcome::Accept(_) => None,
            MatchOutcome::Reject { reason, .. } => Some(*reason),
        }
    }
}

/// Compares candidate strokes with reference strokes.
#[derive(Debug, Clone, Default)]
pub struct StrokeMatcher {
    config: MatcherConfig,
}

impl StrokeMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Match canonical candidate points against `expected`.
    pub fn match_stroke(&self, candidate: &[Point], expected: &StrokePath, mode: Mode) -> MatchOutcome {
        let cfg = &self.config;
        let expected_len = expected.length();
        let candidate_len = geometry::path_length(candidate);

        if candidate.len() < 2 || expected_len <= f64::EPSILON || candidate_len <= f64::EPSILON {
            return MatchOutcome::Reject {
                reason: RejectReason::ShapeMismatch,
                score: None,
            };
        }

        let length_ratio = candidate_len / expected_len;
        if length_ratio < cfg.min_length_ratio || length_ratio > cfg.max_length_ratio {
            log::debug!("Stroke rejected early: length ratio {length_ratio:.2}");
            return MatchOutcome::Reject {
                reason: RejectReason::ShapeMismatch,
                score: None,
            };
        }

        let n = cfg.resample_count.max(2);
        let cand = resample(candidate, n);
        let exp = resample(expected.points(), n);

        let score = MatchScore {
            shape_distance: self.shape_distance(&cand, &exp),
            direction_agreement: self.direction_agreement(&cand, &exp),
            length_ratio,
        };

        let shape_ok = score.shape_distance < cfg.shape_threshold_for(mode) - cfg.tie_margin;
        let direction_ok = score.direction_agreement > cfg.direction_threshold + cfg.tie_margin;

        log::debug!(
            "Stroke match: shape {:.4} dir {:.3} ratio {:.2} -> shape_ok={shape_ok} dir_ok={direction_ok}",
            score.shape_distance,
            score.direction_agreement,
            score.length_ratio
        );

        match (shape_ok, direction_ok) {
            (true, true) => MatchOutcome::Accept(score),
            (false, true) => MatchOutcome::Reject {
                reason: RejectReason::ShapeMismatch,
                score: Some(score),
            },
            (true, false) => MatchOutcome::Reject {
                reason: RejectReason::WrongDirection,
                score: Some(score),
            },
            (false, false) => MatchOutcome::Reject {
                reason: RejectReason::Both,
                score: Some(score),
            },
        }
    }

    /// Bounded alignment followed by mean point distance plus placement penalty.
    fn shape_distance(&self, cand: &[Point], exp: &[Point]) -> f64 {
        let cfg = &self.config;
        let cand_center = geometry::centroid(cand);
        let exp_center = geometry::centroid(exp);

        let offset = exp_center - cand_center;
        let max_offset = cfg.max_offset * CANONICAL_SIZE;
        let applied_offset = if offset.hypot() > max_offset {
            offset * (max_offset / offset.hypot())
        } else {
            offset
        };

        let cand_radius = geometry::rms_radius(cand);
        let exp_radius = geometry::rms_radius(exp);
        let scale = if cand_radius > 1e-6 && exp_radius > 1e-6 {
            exp_radius / cand_radius
        } else {
            1.0
        };
        let max_scale = cfg.max_scale.max(1.0);
        let applied_scale = scale.clamp(1.0 / max_scale, max_scale);

        let aligned: Vec<Point> = cand
            .iter()
            .map(|p| cand_center + (*p - cand_center) * applied_scale + applied_offset)
            .collect();

        let forward = geometry::mean_distance(&aligned, exp);
        let reversed: Vec<Point> = aligned.iter().rev().copied().collect();
        let backward = geometry::mean_distance(&reversed, exp);

        let raw = forward.min(backward) / CANONICAL_SIZE;
        let penalty = cfg.placement_weight * offset.hypot() / CANONICAL_SIZE
            + cfg.scale_weight * scale.ln().abs();
        raw + penalty
    }

    /// Mean cosine over the start-to-end vector and intermediate chords.
    fn direction_agreement(&self, cand: &[Point], exp: &[Point]) -> f64 {
        let mut pairs: Vec<(Vec2, Vec2)> = Vec::with_capacity(self.config.chord_count + 1);

        let exp_span = exp[exp.len() - 1] - exp[0];
        // Nearly closed strokes have no meaningful start-to-end direction.
        if exp_span.hypot() > 0.2 * geometry::path_length(exp) {
            pairs.push((cand[cand.len() - 1] - cand[0], exp_span));
        }
        pairs.extend(
            chord_vectors(cand, self.config.chord_count)
                .into_iter()
                .zip(chord_vectors(exp, self.config.chord_count)),
        );

        let cosines: Vec<f64> = pairs.into_iter().filter_map(|(a, b)| cosine(a, b)).collect();
        if cosines.is_empty() {
            return 0.0;
        }
        cosines.iter().sum::<f64>() / cosines.len() as f64
    }
}
