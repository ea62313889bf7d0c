//! Verdicts from an external handwriting recognizer.
//!
//! The recognizer itself lives outside this crate. Its reply is a JSON
//! object, possibly wrapped in prose or a code fence, which is decoded here
//! and fed back to the session with [`crate::PracticeSession::apply_verdict`].

use serde::{Deserialize, Serialize};

/// Confidence (0-100) at or above which a verdict counts as a pass.
pub const DEFAULT_PASS_CONFIDENCE: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringVerdict {
    pub is_recognizable: bool,
    /// 0-100.
    pub confidence: f64,
    pub stroke_order_issues: Vec<String>,
    pub stroke_form_issues: Vec<String>,
    pub shape_issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ScoringVerdict {
    /// Decode a recognizer reply, taking the first `{` to the last `}`.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let body = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if end > start => &text[start..=end],
            _ => text,
        };
        let mut verdict: Self = serde_json::from_str(body)?;
        verdict.confidence = verdict.confidence.clamp(0.0, 100.0);
        Ok(verdict)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn passes(&self, cutoff: f64) -> bool {
        self.is_recognizable && self.confidence >= cutoff
    }

    /// Total number of reported issues across all categories.
    pub fn issue_count(&self) -> usize {
        self.stroke_order_issues.len() + self.stroke_form_issues.len() + self.shape_issues.len()
    }
}
