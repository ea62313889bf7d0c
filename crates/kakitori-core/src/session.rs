//! Practice session state machine and its event bus.

use crate::capture::UserStroke;
use crate::glyph::{GlyphReference, StrokePath};
use crate::matcher::{MatchOutcome, MatchScore, MatcherConfig, RejectReason, StrokeMatcher};
use crate::verdict::ScoringVerdict;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Practice mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Watch only: strokes are shown and animated, input is disabled.
    View,
    /// Draw over visible guide strokes.
    #[default]
    Practice,
    /// Draw from memory without guides.
    Challenge,
}

impl Mode {
    /// Whether the learner can draw in this mode.
    pub fn accepts_input(self) -> bool {
        !matches!(self, Mode::View)
    }

    /// Whether a mismatched stroke holds the learner on the same stroke.
    ///
    /// Challenge mode keeps the mismatched ink and moves on; the result is
    /// left to an external verdict.
    pub fn blocks_on_mistake(self) -> bool {
        !matches!(self, Mode::Challenge)
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::View => "view",
            Mode::Practice => "practice",
            Mode::Challenge => "challenge",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "view" => Ok(Mode::View),
            "practice" => Ok(Mode::Practice),
            "challenge" => Ok(Mode::Challenge),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the stroke with this index.
    AwaitingStroke(usize),
    /// Every stroke is drawn but some missed; only a verdict can complete it.
    AwaitingVerdict,
    /// Every stroke has been accepted (or an external verdict passed).
    Complete,
}

/// Signals surfaced to the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StrokeAccepted { index: usize },
    Mistake { index: usize, reason: RejectReason },
    /// Fired once per completion.
    Complete { mistakes: usize },
    /// An external verdict came back below the pass cutoff.
    VerdictFailed { confidence: f64 },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&SessionEvent)>;

/// Explicit observer registry for session events.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Observers run in registration order.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&SessionEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Drop every observer.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver an event to every observer.
    pub fn emit(&mut self, event: &SessionEvent) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }
}

/// Immediate result of submitting a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitResult {
    Accepted {
        index: usize,
        score: MatchScore,
        complete: bool,
    },
    Rejected {
        index: usize,
        reason: RejectReason,
    },
    /// View mode, or no stroke is left to draw.
    Ignored,
}

/// Per-character practice progress.
#[derive(Debug)]
pub struct PracticeSession {
    glyph: Arc<GlyphReference>,
    mode: Mode,
    matcher: StrokeMatcher,
    expected_index: usize,
    ink: Vec<UserStroke>,
    mistake_count: usize,
    total_mistakes: usize,
    hints_used: usize,
    completed: bool,
    events: EventBus,
}

impl PracticeSession {
    /// Start a session at the first stroke.
    pub fn new(glyph: Arc<GlyphReference>, mode: Mode, matcher: MatcherConfig) -> Self {
        Self {
            glyph,
            mode,
            matcher: StrokeMatcher::new(matcher),
            expected_index: 0,
            ink: Vec::new(),
            mistake_count: 0,
            total_mistakes: 0,
            hints_used: 0,
            completed: false,
            events: EventBus::new(),
        }
    }

    pub fn glyph(&self) -> &Arc<GlyphReference> {
        &self.glyph
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        if self.completed {
            SessionPhase::Complete
        } else if self.expected_index >= self.glyph.len() {
            SessionPhase::AwaitingVerdict
        } else {
            SessionPhase::AwaitingStroke(self.expected_index)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Index of the next stroke to draw.
    pub fn expected_index(&self) -> usize {
        self.expected_index
    }

    /// The stroke the learner must draw next.
    pub fn expected_stroke(&self) -> Option<&StrokePath> {
        if self.completed {
            return None;
        }
        self.glyph.stroke(self.expected_index)
    }

    /// Strokes kept on the surface, parallel to `strokes[..expected_index]`.
    ///
    /// Only accepted strokes when the mode blocks on mistakes; otherwise
    /// mismatched strokes are kept too.
    pub fn ink_strokes(&self) -> &[UserStroke] {
        &self.ink
    }

    /// Rejections since the last accept.
    pub fn mistake_count(&self) -> usize {
        self.mistake_count
    }

    /// Rejections since the session started or was reset.
    pub fn total_mistakes(&self) -> usize {
        self.total_mistakes
    }

    pub fn hints_used(&self) -> usize {
        self.hints_used
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&SessionEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.len()
    }

    /// Switch mode for the same glyph. Progress restarts; observers stay.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset();
    }

    /// Classify a finished stroke (canonical coordinates) against the
    /// expected stroke only.
    pub fn submit(&mut self, stroke: UserStroke) -> SubmitResult {
        if !self.mode.accepts_input() || self.completed {
            return SubmitResult::Ignored;
        }
        let index = self.expected_index;
        let Some(expected) = self.glyph.stroke(index) else {
            return SubmitResult::Ignored;
        };

        match self.matcher.match_stroke(&stroke.positions(), expected, self.mode) {
            MatchOutcome::Accept(score) => {
                self.ink.push(stroke);
                self.expected_index += 1;
                self.mistake_count = 0;
                log::debug!("{}: stroke {} accepted", self.glyph.character(), index + 1);
                self.events.emit(&SessionEvent::StrokeAccepted { index });

                let complete = self.reached_end();
                SubmitResult::Accepted {
                    index,
                    score,
                    complete,
                }
            }
            MatchOutcome::Reject { reason, .. } => {
                self.mistake_count += 1;
                self.total_mistakes += 1;
                log::debug!(
                    "{}: stroke {} rejected ({reason})",
                    self.glyph.character(),
                    index + 1
                );
                self.events.emit(&SessionEvent::Mistake { index, reason });
                if !self.mode.blocks_on_mistake() {
                    self.ink.push(stroke);
                    self.expected_index += 1;
                    self.reached_end();
                }
                SubmitResult::Rejected { index, reason }
            }
        }
    }

    /// Index of the stroke to highlight as a hint, if any remain.
    pub fn hint(&mut self) -> Option<usize> {
        if self.completed || self.expected_index >= self.glyph.len() {
            return None;
        }
        self.hints_used += 1;
        Some(self.expected_index)
    }

    /// Back to the first stroke with all progress and counters cleared.
    pub fn reset(&mut self) {
        self.expected_index = 0;
        self.ink.clear();
        self.mistake_count = 0;
        self.total_mistakes = 0;
        self.hints_used = 0;
        self.completed = false;
    }

    /// Feed back an external recognizer verdict.
    ///
    /// A passing verdict completes the character; a failing one emits
    /// [`SessionEvent::VerdictFailed`]. Returns whether the verdict passed.
    pub fn apply_verdict(&mut self, verdict: &ScoringVerdict, pass_confidence: f64) -> bool {
        if self.completed {
            return true;
        }
        if verdict.passes(pass_confidence) {
            log::info!(
                "{}: completed by external verdict ({:.0}%)",
                self.glyph.character(),
                verdict.confidence
            );
            self.finish();
            true
        } else {
            self.events.emit(&SessionEvent::VerdictFailed {
                confidence: verdict.confidence,
            });
            false
        }
    }

    /// Complete once every stroke is drawn, unless a kept stroke missed.
    fn reached_end(&mut self) -> bool {
        if self.expected_index < self.glyph.len() {
            return false;
        }
        if self.mode.blocks_on_mistake() || self.total_mistakes == 0 {
            self.finish();
            true
        } else {
            log::info!(
                "{}: all strokes drawn with {} miss(es); awaiting verdict",
                self.glyph.character(),
                self.total_mistakes
            );
            false
        }
    }

    fn finish(&mut self) {
        self.completed = true;
        log::info!(
            "{}: complete with {} mistake(s)",
            self.glyph.character(),
            self.total_mistakes
        );
        self.events.emit(&SessionEvent::Complete {
            mistakes: self.total_mistakes,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::StrokePath;
    use kurbo::Point;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ki() -> Arc<GlyphReference> {
        let s = |pts: &[(f64, f64)]| StrokePath::new(pts.iter().map(|&(x, y)| Point::new(x, y)).collect());
        Arc::new(
            GlyphReference::new(
                '木',
                vec![
                    s(&[(18.0, 40.0), (50.0, 38.0), (86.0, 35.0)]),
                    s(&[(54.0, 11.0), (55.0, 50.0), (55.0, 98.0)]),
                    s(&[(53.0, 41.0), (48.0, 52.0), (38.0, 63.0), (19.0, 75.0)]),
                    s(&[(56.0, 41.0), (64.0, 49.0), (76.0, 61.0), (88.0, 70.0)]),
                ],
                vec![],
            )
            .unwrap(),
        )
    }

    fn trace(glyph: &GlyphReference, index: usize) -> UserStroke {
        UserStroke::from_points(glyph.stroke(index).unwrap().points().iter().copied())
    }

    fn reversed(glyph: &GlyphReference, index: usize) -> UserStroke {
        UserStroke::from_points(glyph.stroke(index).unwrap().points().iter().rev().copied())
    }

    fn recorder(session: &mut PracticeSession) -> Rc<RefCell<Vec<SessionEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        session.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        log
    }

    #[test]
    fn test_full_trace_completes_without_mistakes() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Practice, MatcherConfig::default());
        let events = recorder(&mut session);

        assert_eq!(session.phase(), SessionPhase::AwaitingStroke(0));
        for i in 0..glyph.len() {
            assert!(matches!(session.submit(trace(&glyph, i)), SubmitResult::Accepted { .. }));
        }

        assert_eq!(session.phase(), SessionPhase::Complete);
        assert_eq!(session.mistake_count(), 0);
        assert_eq!(session.ink_strokes().len(), 4);
        let completes = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SessionEvent::Complete { .. }))
            .count();
        assert_eq!(completes, 1);
    }

    #[test]
    fn test_skipping_ahead_is_rejected() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Practice, MatcherConfig::default());

        let result = session.submit(trace(&glyph, 1));
        assert!(matches!(result, SubmitResult::Rejected { index: 0, .. }));
        assert_eq!(session.expected_index(), 0);
        assert_eq!(session.mistake_count(), 1);
    }

    #[test]
    fn test_reversed_then_correct() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Practice, MatcherConfig::default());
        let events = recorder(&mut session);

        let result = session.submit(reversed(&glyph, 0));
        assert_eq!(
            result,
            SubmitResult::Rejected {
                index: 0,
                reason: RejectReason::WrongDirection
            }
        );
        assert_eq!(session.expected_index(), 0);

        session.submit(trace(&glyph, 0));
        assert_eq!(session.expected_index(), 1);
        assert_eq!(session.mistake_count(), 0);
        assert_eq!(session.total_mistakes(), 1);

        let events = events.borrow();
        assert_eq!(
            events[0],
            SessionEvent::Mistake {
                index: 0,
                reason: RejectReason::WrongDirection
            }
        );
        assert_eq!(events[1], SessionEvent::StrokeAccepted { index: 0 });
    }

    #[test]
    fn test_reset_after_progress() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Practice, MatcherConfig::default());
        session.submit(trace(&glyph, 0));
        session.submit(reversed(&glyph, 1));
        session.submit(reversed(&glyph, 1));

        session.reset();
        assert_eq!(session.phase(), SessionPhase::AwaitingStroke(0));
        assert!(session.ink_strokes().is_empty());
        assert_eq!(session.mistake_count(), 0);
    }

    #[test]
    fn test_view_mode_ignores_strokes() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::View, MatcherConfig::default());
        assert_eq!(session.submit(trace(&glyph, 0)), SubmitResult::Ignored);
        assert_eq!(session.expected_index(), 0);
    }

    #[test]
    fn test_complete_is_terminal() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Challenge, MatcherConfig::default());
        let events = recorder(&mut session);
        for i in 0..glyph.len() {
            session.submit(trace(&glyph, i));
        }
        assert_eq!(session.submit(trace(&glyph, 0)), SubmitResult::Ignored);
        assert_eq!(session.hint(), None);
        assert_eq!(events.borrow().len(), 5);
    }

    #[test]
    fn test_hint_does_not_change_phase() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Practice, MatcherConfig::default());
        session.submit(trace(&glyph, 0));
        assert_eq!(session.hint(), Some(1));
        assert_eq!(session.phase(), SessionPhase::AwaitingStroke(1));
        assert_eq!(session.hints_used(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Practice, MatcherConfig::default());
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = session.subscribe(move |_| *sink.borrow_mut() += 1);

        session.submit(reversed(&glyph, 0));
        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
        session.submit(reversed(&glyph, 0));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_verdict_completion() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Challenge, MatcherConfig::default());
        let events = recorder(&mut session);

        let mut verdict = ScoringVerdict {
            is_recognizable: true,
            confidence: 59.0,
            ..ScoringVerdict::default()
        };
        assert!(!session.apply_verdict(&verdict, 60.0));
        assert!(!session.is_complete());

        verdict.confidence = 60.0;
        assert!(session.apply_verdict(&verdict, 60.0));
        assert!(session.is_complete());

        let events = events.borrow();
        assert_eq!(events[0], SessionEvent::VerdictFailed { confidence: 59.0 });
        assert_eq!(events[1], SessionEvent::Complete { mistakes: 0 });
    }

    #[test]
    fn test_challenge_keeps_missed_ink() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Challenge, MatcherConfig::default());
        let events = recorder(&mut session);

        let result = session.submit(trace(&glyph, 1));
        assert!(matches!(result, SubmitResult::Rejected { index: 0, .. }));
        assert_eq!(session.expected_index(), 1);
        assert_eq!(session.ink_strokes().len(), 1);
        assert_eq!(session.total_mistakes(), 1);

        for i in 1..glyph.len() {
            session.submit(trace(&glyph, i));
        }
        assert_eq!(session.phase(), SessionPhase::AwaitingVerdict);
        assert_eq!(session.ink_strokes().len(), 4);
        assert_eq!(session.submit(trace(&glyph, 0)), SubmitResult::Ignored);
        assert_eq!(session.hint(), None);
        assert!(!events.borrow().iter().any(|e| matches!(e, SessionEvent::Complete { .. })));

        let verdict = ScoringVerdict {
            is_recognizable: true,
            confidence: 80.0,
            ..ScoringVerdict::default()
        };
        assert!(session.apply_verdict(&verdict, 60.0));
        assert_eq!(events.borrow().last(), Some(&SessionEvent::Complete { mistakes: 1 }));
    }

    #[test]
    fn test_practice_blocks_on_mistake() {
        assert!(Mode::Practice.blocks_on_mistake());
        assert!(!Mode::Challenge.blocks_on_mistake());

        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Practice, MatcherConfig::default());
        session.submit(trace(&glyph, 1));
        assert!(session.ink_strokes().is_empty());
        assert_eq!(session.phase(), SessionPhase::AwaitingStroke(0));
    }

    #[test]
    fn test_set_mode_keeps_observers() {
        let glyph = ki();
        let mut session = PracticeSession::new(Arc::clone(&glyph), Mode::Practice, MatcherConfig::default());
        let events = recorder(&mut session);
        session.submit(trace(&glyph, 0));

        session.set_mode(Mode::Challenge);
        assert_eq!(session.mode(), Mode::Challenge);
        assert_eq!(session.phase(), SessionPhase::AwaitingStroke(0));
        assert_eq!(session.subscriber_count(), 1);

        for i in 0..glyph.len() {
            session.submit(trace(&glyph, i));
        }
        assert_eq!(events.borrow().last(), Some(&SessionEvent::Complete { mistakes: 0 }));
    }
}
