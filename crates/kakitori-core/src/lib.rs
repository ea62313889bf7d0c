//! Kakitori Core Library
//!
//! Platform-agnostic glyph model, stroke matching and practice session logic
//! for the Kakitori stroke-order trainer.

pub mod capture;
pub mod config;
pub mod geometry;
pub mod glyph;
pub mod matcher;
pub mod session;
pub mod timer;
pub mod transform;
pub mod verdict;

pub use capture::{CaptureConfig, CaptureOutcome, PointerEvent, StrokeCapture, TimedPoint, UserStroke};
pub use config::{ConfigError, EngineConfig, ModeStyle, SerializableColor, Timings, VerdictConfig, WriterStyle};
pub use glyph::{GlyphError, GlyphReference, GlyphResult, GlyphSource, MemoryGlyphSource, StrokeGroup, StrokePath};
pub use matcher::{MatchOutcome, MatchScore, MatcherConfig, RejectReason, StrokeMatcher};
pub use session::{EventBus, Mode, PracticeSession, SessionEvent, SessionPhase, SubmitResult, SubscriptionId};
pub use timer::{TimerEvent, TimerId, TimerKind, TimerQueue};
pub use transform::{CANONICAL_SIZE, CanonicalTransform};
pub use verdict::{DEFAULT_PASS_CONFIDENCE, ScoringVerdict};

#[cfg(not(target_arch = "wasm32"))]
pub use glyph::FileGlyphSource;
