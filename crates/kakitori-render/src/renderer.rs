//! Renderer trait abstraction.

use crate::animation::AnimationFrame;
use kakitori_core::{CanonicalTransform, GlyphReference, ModeStyle, UserStroke, WriterStyle};
use kurbo::{Affine, Point, Rect, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Practice grid drawn behind the glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStyle {
    /// Plain background.
    None,
    /// Center cross (田字格 without the diagonals).
    #[default]
    Cross,
    /// Center cross plus both diagonals (米字格).
    Star,
    /// Dots at the quarter points.
    Dots,
}

impl GridStyle {
    /// Cycle to the next grid style.
    pub fn next(self) -> Self {
        match self {
            GridStyle::None => GridStyle::Cross,
            GridStyle::Cross => GridStyle::Star,
            GridStyle::Star => GridStyle::Dots,
            GridStyle::Dots => GridStyle::None,
        }
    }

    /// Get display name for this grid style.
    pub fn name(self) -> &'static str {
        match self {
            GridStyle::None => "None",
            GridStyle::Cross => "Cross",
            GridStyle::Star => "Star",
            GridStyle::Dots => "Dots",
        }
    }
}

/// Brief colour feedback on a stroke.
#[derive(Debug, Clone, Copy)]
pub struct Flash<'a> {
    /// Stroke to recolour, in canonical coordinates.
    pub points: &'a [Point],
    pub correct: bool,
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// Glyph being practised, if one is attached.
    pub glyph: Option<&'a GlyphReference>,
    /// Output size in pixels.
    pub size: Size,
    /// Canonical to surface mapping.
    pub transform: CanonicalTransform,
    pub background_color: Color,
    pub grid_style: GridStyle,
    /// Colours and widths for the active mode.
    pub mode_style: ModeStyle,
    pub correct_color: Color,
    pub incorrect_color: Color,
    pub hint_color: Color,
    /// Learner strokes kept on the surface (canonical), parallel to the
    /// first reference strokes.
    pub ink: &'a [UserStroke],
    /// Stroke being drawn right now, in surface coordinates.
    pub live_stroke: Option<&'a [Point]>,
    /// Reference stroke to highlight as a hint.
    pub highlight: Option<usize>,
    /// Current stroke-order animation frame.
    pub animation: Option<AnimationFrame>,
    pub flash: Option<Flash<'a>>,
    /// Show every reference stroke at full strength.
    pub peek: bool,
    /// Draw only the learner's ink (no grid, ghosts or overlays).
    pub ink_only: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context with the default practice style.
    pub fn new(size: Size) -> Self {
        let style = WriterStyle::default();
        Self {
            glyph: None,
            size,
            transform: CanonicalTransform::for_surface(size),
            background_color: Color::WHITE,
            grid_style: GridStyle::Cross,
            mode_style: style.practice.clone(),
            correct_color: style.correct_color.into(),
            incorrect_color: style.incorrect_color.into(),
            hint_color: style.hint_color.into(),
            ink: &[],
            live_stroke: None,
            highlight: None,
            animation: None,
            flash: None,
            peek: false,
            ink_only: false,
        }
    }

    pub fn with_glyph(mut self, glyph: &'a GlyphReference) -> Self {
        self.glyph = Some(glyph);
        self
    }

    /// Set the canonical to surface transform.
    pub fn with_transform(mut self, transform: CanonicalTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the grid style.
    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }

    /// Use `mode_style` plus the shared feedback colours of `style`.
    pub fn with_style(mut self, style: &WriterStyle, mode_style: &ModeStyle) -> Self {
        self.mode_style = mode_style.clone();
        self.correct_color = style.correct_color.into();
        self.incorrect_color = style.incorrect_color.into();
        self.hint_color = style.hint_color.into();
        self
    }

    pub fn with_ink(mut self, ink: &'a [UserStroke]) -> Self {
        self.ink = ink;
        self
    }

    pub fn with_live_stroke(mut self, points: Option<&'a [Point]>) -> Self {
        self.live_stroke = points;
        self
    }

    pub fn with_highlight(mut self, index: Option<usize>) -> Self {
        self.highlight = index;
        self
    }

    pub fn with_animation(mut self, frame: Option<AnimationFrame>) -> Self {
        self.animation = frame;
        self
    }

    pub fn with_flash(mut self, flash: Option<Flash<'a>>) -> Self {
        self.flash = flash;
        self
    }

    pub fn with_peek(mut self, peek: bool) -> Self {
        self.peek = peek;
        self
    }

    pub fn with_ink_only(mut self, ink_only: bool) -> Self {
        self.ink_only = ink_only;
        self
    }

    /// Surface-space stroke width for the active mode.
    pub fn stroke_width(&self) -> f64 {
        self.mode_style.stroke_width * self.transform.scale
    }

    /// The canonical box in surface coordinates.
    pub fn glyph_frame(&self) -> Rect {
        self.transform.transform().transform_rect_bbox(kakitori_core::transform::canonical_box())
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Draw one frame.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

/// Drawing primitives shared by renderer implementations.
pub trait StrokeRenderer {
    /// Stroke an open polyline with round caps and joins.
    fn render_polyline(&mut self, points: &[Point], transform: Affine, width: f64, color: Color);

    /// Render the practice grid inside `frame` (surface coordinates).
    fn render_grid(&mut self, frame: Rect, style: GridStyle, color: Color);
}
