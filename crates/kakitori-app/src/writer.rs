//! The writer engine: one glyph, one session and one surface at a time.

use kakitori_core::{
    CanonicalTransform, CaptureOutcome, EngineConfig, GlyphReference, GlyphResult, GlyphSource, Mode,
    PointerEvent, PracticeSession, ScoringVerdict, SessionEvent, SessionPhase, StrokeCapture, SubmitResult,
    SubscriptionId, TimerEvent, TimerKind, TimerQueue,
};
use kakitori_render::{
    ExportError, ExportOptions, Flash, GridStyle, RasterImage, RasterRenderer, RasterSurface, RenderContext,
    RenderResult, Renderer, StrokeAnimation,
};
use kurbo::{Point, Size};
use peniko::Color;
use std::sync::Arc;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Imperative handle exposed to host UIs.
pub trait WriterHandle {
    /// Play the stroke-order animation from the first stroke.
    fn animate(&mut self);
    /// Erase the learner's ink and restart the session.
    fn clear(&mut self);
    /// Briefly highlight the next expected stroke.
    fn hint(&mut self);
    /// Rasterize the learner's ink.
    fn export_image(&self, options: &ExportOptions) -> Result<RasterImage, ExportError>;
}

#[derive(Debug, Clone, Copy)]
struct AnimationRun {
    timeline: StrokeAnimation,
    started: Duration,
}

#[derive(Debug, Clone)]
struct FlashState {
    points: Vec<Point>,
    correct: bool,
}

/// Per-character state, dropped as a whole on detach.
struct Attachment {
    glyph: Arc<GlyphReference>,
    session: PracticeSession,
    capture: StrokeCapture,
    animation: Option<AnimationRun>,
    highlight: Option<usize>,
    flash: Option<FlashState>,
    peek: bool,
}

/// Stroke-order writer bound to a drawing surface.
///
/// Delayed effects run from an internal [`TimerQueue`]; the host drives it
/// by calling [`KanjiWriter::tick`] every frame. Operations that start a
/// timer take the current instant (`*_at`), or read the wall clock when
/// called through [`WriterHandle`].
pub struct KanjiWriter {
    config: EngineConfig,
    size: Size,
    transform: CanonicalTransform,
    grid_style: GridStyle,
    background: Color,
    epoch: Instant,
    now: Duration,
    timers: TimerQueue,
    attachment: Option<Attachment>,
    renderer: RasterRenderer,
}

impl KanjiWriter {
    pub fn new(config: EngineConfig, size: Size) -> Self {
        Self {
            config,
            size,
            transform: CanonicalTransform::for_surface(size),
            grid_style: GridStyle::default(),
            background: Color::WHITE,
            epoch: Instant::now(),
            now: Duration::ZERO,
            timers: TimerQueue::new(),
            attachment: None,
            renderer: RasterRenderer::new(),
        }
    }

    pub fn with_grid(mut self, grid_style: GridStyle) -> Self {
        self.grid_style = grid_style;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reference instant for the writer clock.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn transform(&self) -> &CanonicalTransform {
        &self.transform
    }

    /// Change the surface size. Any stroke in progress is dropped.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
        self.transform = CanonicalTransform::for_surface(size);
        if let Some(att) = self.attachment.as_mut() {
            att.capture.cancel();
        }
    }

    /// Bind to a glyph, replacing any previous one.
    pub fn attach(&mut self, glyph: impl Into<Arc<GlyphReference>>, mode: Mode) {
        self.detach();
        let glyph = glyph.into();
        let session = PracticeSession::new(Arc::clone(&glyph), mode, self.config.matcher.clone());
        let mut capture = StrokeCapture::new(self.config.capture.clone());
        capture.set_enabled(mode.accepts_input());

        log::info!(
            "Attached {} ({} strokes, {} mode)",
            glyph.character(),
            glyph.len(),
            mode
        );
        self.attachment = Some(Attachment {
            glyph,
            session,
            capture,
            animation: None,
            highlight: None,
            flash: None,
            peek: false,
        });
    }

    /// Detach, then load `character` from `source` and attach it.
    pub async fn load_and_attach(&mut self, source: &dyn GlyphSource, character: char, mode: Mode) -> GlyphResult<()> {
        self.detach();
        let glyph = source.load(character).await?;
        self.attach(glyph, mode);
        Ok(())
    }

    /// Cancel every timer and drop the session with its subscribers.
    pub fn detach(&mut self) {
        self.timers.cancel_all();
        if let Some(att) = self.attachment.take() {
            log::debug!("Detached {}", att.glyph.character());
        }
    }

    /// Restart the current glyph in another mode.
    ///
    /// Timers and overlays are dropped; subscribers stay attached.
    pub fn set_mode(&mut self, mode: Mode) {
        let Some(att) = self.attachment.as_mut() else {
            return;
        };
        self.timers.cancel_all();
        att.session.set_mode(mode);
        att.capture.cancel();
        att.capture.set_enabled(mode.accepts_input());
        att.animation = None;
        att.highlight = None;
        att.flash = None;
        att.peek = false;
        log::info!("{} switched to {mode} mode", att.glyph.character());
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn glyph(&self) -> Option<Arc<GlyphReference>> {
        self.attachment.as_ref().map(|att| Arc::clone(&att.glyph))
    }

    pub fn session(&self) -> Option<&PracticeSession> {
        self.attachment.as_ref().map(|att| &att.session)
    }

    pub fn phase(&self) -> Option<SessionPhase> {
        self.session().map(PracticeSession::phase)
    }

    /// Observe session events until the next detach.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&SessionEvent) + 'static) -> Option<SubscriptionId> {
        self.attachment
            .as_mut()
            .map(|att| att.session.subscribe(subscriber))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.attachment
            .as_mut()
            .is_some_and(|att| att.session.unsubscribe(id))
    }

    fn clock(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.epoch);
        if elapsed > self.now {
            self.now = elapsed;
        }
        self.now
    }

    /// Feed a pointer event in surface coordinates.
    ///
    /// Returns the classification when the event finished a stroke.
    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) -> Option<SubmitResult> {
        let at = self.clock(now);
        let att = self.attachment.as_mut()?;
        let CaptureOutcome::Finished(stroke) = att.capture.handle(event, at) else {
            return None;
        };

        let canonical = stroke.transformed(self.transform.inverse_transform());
        let points = canonical.positions();
        let result = att.session.submit(canonical);
        let correct = match result {
            SubmitResult::Accepted { .. } => true,
            SubmitResult::Rejected { .. } => false,
            SubmitResult::Ignored => return Some(result),
        };

        att.flash = Some(FlashState { points, correct });
        self.timers.cancel_kind(TimerKind::Flash);
        self.timers
            .schedule(TimerKind::Flash, at + self.config.timings.flash_duration(), 0);
        Some(result)
    }

    /// Advance the writer clock and run every timer that came due.
    pub fn tick(&mut self, now: Instant) -> Vec<TimerEvent> {
        let now = self.clock(now);
        let fired = self.timers.poll(now);
        let Some(att) = self.attachment.as_mut() else {
            return fired;
        };

        for event in &fired {
            match event.kind {
                TimerKind::Animation => {
                    let total = att.animation.map(|run| run.timeline.stroke_count());
                    if total == Some(event.tag) {
                        log::debug!("Animation of {} finished", att.glyph.character());
                        att.animation = None;
                    } else {
                        log::trace!("Animating stroke {}", event.tag + 1);
                    }
                }
                TimerKind::Hint => att.highlight = None,
                TimerKind::Flash => att.flash = None,
                TimerKind::Peek => att.peek = false,
            }
        }
        fired
    }

    /// Stop a running animation.
    pub fn stop_animation(&mut self) {
        self.timers.cancel_kind(TimerKind::Animation);
        if let Some(att) = self.attachment.as_mut() {
            att.animation = None;
        }
    }

    pub fn is_animating(&self) -> bool {
        self.attachment
            .as_ref()
            .is_some_and(|att| att.animation.is_some())
    }

    /// Show the whole reference for a moment.
    pub fn peek(&mut self) {
        self.peek_at(Instant::now());
    }

    pub fn peek_at(&mut self, now: Instant) {
        let now = self.clock(now);
        let Some(att) = self.attachment.as_mut() else {
            return;
        };
        att.peek = true;
        self.timers.cancel_kind(TimerKind::Peek);
        self.timers
            .schedule(TimerKind::Peek, now + self.config.timings.peek_duration(), 0);
    }

    /// [`WriterHandle::animate`] starting at `now`.
    pub fn animate_at(&mut self, now: Instant) {
        let now = self.clock(now);
        self.timers.cancel_kind(TimerKind::Animation);
        let Some(att) = self.attachment.as_mut() else {
            log::warn!("animate() called with no glyph attached");
            return;
        };

        let timings = &self.config.timings;
        let timeline = StrokeAnimation::new(att.glyph.len(), timings.step_duration(), timings.stroke_pause());
        for index in 0..timeline.stroke_count() {
            self.timers
                .schedule(TimerKind::Animation, now + timeline.stroke_start(index), index);
        }
        self.timers.schedule(
            TimerKind::Animation,
            now + timeline.total_duration(),
            timeline.stroke_count(),
        );
        att.animation = Some(AnimationRun {
            timeline,
            started: now,
        });
    }

    /// [`WriterHandle::hint`] starting at `now`.
    pub fn hint_at(&mut self, now: Instant) {
        let now = self.clock(now);
        let Some(att) = self.attachment.as_mut() else {
            return;
        };
        let Some(index) = att.session.hint() else {
            return;
        };
        att.highlight = Some(index);
        self.timers.cancel_kind(TimerKind::Hint);
        self.timers
            .schedule(TimerKind::Hint, now + self.config.timings.hint_duration(), index);
    }

    pub fn is_peeking(&self) -> bool {
        self.attachment.as_ref().is_some_and(|att| att.peek)
    }

    /// Stroke currently highlighted as a hint.
    pub fn highlighted(&self) -> Option<usize> {
        self.attachment.as_ref().and_then(|att| att.highlight)
    }

    /// Whether a correct/incorrect flash is showing, and which.
    pub fn flash(&self) -> Option<bool> {
        self.attachment
            .as_ref()
            .and_then(|att| att.flash.as_ref().map(|f| f.correct))
    }

    /// Feed back a recognizer verdict on the exported image.
    ///
    /// Returns whether the verdict passed.
    pub fn apply_verdict(&mut self, verdict: &ScoringVerdict) -> bool {
        let cutoff = self.config.verdict.pass_confidence;
        if !self.config.verdict.completes_session {
            return verdict.passes(cutoff);
        }
        self.attachment
            .as_mut()
            .is_some_and(|att| att.session.apply_verdict(verdict, cutoff))
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn pending_timers_of(&self, kind: TimerKind) -> usize {
        self.timers.pending(kind)
    }

    /// Draw the current frame.
    pub fn render(&mut self) -> RenderResult<&RasterSurface> {
        let live = self
            .attachment
            .as_ref()
            .and_then(|att| att.capture.current())
            .map(|stroke| stroke.positions());
        let mut renderer = std::mem::take(&mut self.renderer);
        let result = renderer.render(&self.context(live.as_deref()));
        self.renderer = renderer;
        result?;
        Ok(self.renderer.surface())
    }

    fn context<'a>(&'a self, live: Option<&'a [Point]>) -> RenderContext<'a> {
        let mode = self
            .attachment
            .as_ref()
            .map(|att| att.session.mode())
            .unwrap_or_default();
        let style = &self.config.style;
        let ctx = RenderContext::new(self.size)
            .with_transform(self.transform)
            .with_background(self.background)
            .with_grid(self.grid_style)
            .with_style(style, style.for_mode(mode));

        let Some(att) = self.attachment.as_ref() else {
            return ctx;
        };
        let animation = att
            .animation
            .map(|run| run.timeline.frame_at(self.now.saturating_sub(run.started)));
        ctx.with_glyph(&att.glyph)
            .with_ink(att.session.ink_strokes())
            .with_live_stroke(live)
            .with_highlight(att.highlight)
            .with_animation(animation)
            .with_flash(att.flash.as_ref().map(|f| Flash {
                points: &f.points,
                correct: f.correct,
            }))
            .with_peek(att.peek)
    }
}

impl WriterHandle for KanjiWriter {
    fn animate(&mut self) {
        self.animate_at(Instant::now());
    }

    fn clear(&mut self) {
        self.timers.cancel_kind(TimerKind::Hint);
        self.timers.cancel_kind(TimerKind::Flash);
        let Some(att) = self.attachment.as_mut() else {
            return;
        };
        att.session.reset();
        att.capture.cancel();
        att.highlight = None;
        att.flash = None;
    }

    fn hint(&mut self) {
        self.hint_at(Instant::now());
    }

    fn export_image(&self, options: &ExportOptions) -> Result<RasterImage, ExportError> {
        if self.attachment.is_none() {
            log::warn!("export_image() called before a glyph was attached");
            return Err(ExportError::NotReady);
        }
        let mut offscreen = RasterRenderer::new();
        Ok(offscreen.render_image(self.context(None), options)?)
    }
}
