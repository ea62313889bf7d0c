//! Engine configuration: matcher tuning, colours and timings.

use crate::capture::CaptureConfig;
use crate::matcher::MatcherConfig;
use crate::session::Mode;
use crate::verdict::DEFAULT_PASS_CONFIDENCE;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serializable color (RGBA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            3 => {
                let mut c = digits.chars().map(|ch| ch.to_digit(16).map(|v| (v * 17) as u8));
                Some(Self::rgb(c.next()??, c.next()??, c.next()??))
            }
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Same colour with alpha scaled by `opacity` (0.0-1.0).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let a = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Visual settings for one mode.
///
/// Missing fields take the practice defaults when deserialized on its own;
/// inside a [`WriterStyle`] they take the defaults of their own mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeStyle {
    /// Stroke width in canonical units.
    pub stroke_width: f64,
    pub stroke_color: SerializableColor,
    /// Guide strokes drawn under the learner's ink.
    pub show_ghost: bool,
    pub ghost_color: SerializableColor,
    pub ghost_opacity: f64,
    pub show_grid: bool,
    pub grid_color: SerializableColor,
    /// Replace accepted ink with the reference stroke.
    pub snap_to_reference: bool,
}

impl Default for ModeStyle {
    fn default() -> Self {
        Self::practice()
    }
}

impl ModeStyle {
    /// Ghost colour with its opacity applied.
    pub fn ghost(&self) -> SerializableColor {
        self.ghost_color.with_opacity(self.ghost_opacity)
    }

    fn view() -> Self {
        Self {
            stroke_width: 4.0,
            stroke_color: SerializableColor::rgb(0x33, 0x33, 0x33),
            show_ghost: true,
            ghost_color: SerializableColor::rgb(0x88, 0x88, 0x88),
            ghost_opacity: 0.8,
            show_grid: true,
            grid_color: SerializableColor::rgb(0xdd, 0xdd, 0xdd),
            snap_to_reference: true,
        }
    }

    fn practice() -> Self {
        Self {
            stroke_width: 6.0,
            ghost_color: SerializableColor::rgb(0x3b, 0x82, 0xf6),
            ghost_opacity: 0.4,
            ..Self::view()
        }
    }

    fn challenge() -> Self {
        Self {
            show_ghost: false,
            grid_color: SerializableColor::rgb(0x55, 0x55, 0x55),
            snap_to_reference: false,
            ..Self::practice()
        }
    }
}

/// Per-mode styles plus the feedback colours shared by every mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WriterStyleFile")]
pub struct WriterStyle {
    pub view: ModeStyle,
    pub practice: ModeStyle,
    pub challenge: ModeStyle,
    pub correct_color: SerializableColor,
    pub incorrect_color: SerializableColor,
    pub hint_color: SerializableColor,
}

impl Default for WriterStyle {
    fn default() -> Self {
        Self {
            view: ModeStyle::view(),
            practice: ModeStyle::practice(),
            challenge: ModeStyle::challenge(),
            correct_color: SerializableColor::rgb(0x22, 0xc5, 0x5e),
            incorrect_color: SerializableColor::rgb(0xef, 0x44, 0x44),
            hint_color: SerializableColor::rgb(0x06, 0xb6, 0xd4),
        }
    }
}

/// Partial [`ModeStyle`] as written in a config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModeStylePatch {
    stroke_width: Option<f64>,
    stroke_color: Option<SerializableColor>,
    show_ghost: Option<bool>,
    ghost_color: Option<SerializableColor>,
    ghost_opacity: Option<f64>,
    show_grid: Option<bool>,
    grid_color: Option<SerializableColor>,
    snap_to_reference: Option<bool>,
}

impl ModeStylePatch {
    fn apply(self, base: ModeStyle) -> ModeStyle {
        ModeStyle {
            stroke_width: self.stroke_width.unwrap_or(base.stroke_width),
            stroke_color: self.stroke_color.unwrap_or(base.stroke_color),
            show_ghost: self.show_ghost.unwrap_or(base.show_ghost),
            ghost_color: self.ghost_color.unwrap_or(base.ghost_color),
            ghost_opacity: self.ghost_opacity.unwrap_or(base.ghost_opacity),
            show_grid: self.show_grid.unwrap_or(base.show_grid),
            grid_color: self.grid_color.unwrap_or(base.grid_color),
            snap_to_reference: self.snap_to_reference.unwrap_or(base.snap_to_reference),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WriterStyleFile {
    view: ModeStylePatch,
    practice: ModeStylePatch,
    challenge: ModeStylePatch,
    correct_color: Option<SerializableColor>,
    incorrect_color: Option<SerializableColor>,
    hint_color: Option<SerializableColor>,
}

impl From<WriterStyleFile> for WriterStyle {
    fn from(file: WriterStyleFile) -> Self {
        let defaults = Self::default();
        Self {
            view: file.view.apply(defaults.view),
            practice: file.practice.apply(defaults.practice),
            challenge: file.challenge.apply(defaults.challenge),
            correct_color: file.correct_color.unwrap_or(defaults.correct_color),
            incorrect_color: file.incorrect_color.unwrap_or(defaults.incorrect_color),
            hint_color: file.hint_color.unwrap_or(defaults.hint_color),
        }
    }
}

impl WriterStyle {
    pub fn for_mode(&self, mode: Mode) -> &ModeStyle {
        match mode {
            Mode::View => &self.view,
            Mode::Practice => &self.practice,
            Mode::Challenge => &self.challenge,
        }
    }
}

/// Animation and feedback durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Time to draw one stroke during animation.
    pub step_duration_ms: u64,
    /// Pause between animated strokes.
    pub stroke_pause_ms: u64,
    pub hint_duration_ms: u64,
    pub flash_duration_ms: u64,
    pub peek_duration_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            step_duration_ms: 400,
            stroke_pause_ms: 150,
            hint_duration_ms: 1000,
            flash_duration_ms: 300,
            peek_duration_ms: 1000,
        }
    }
}

impl Timings {
    pub fn step_duration(&self) -> Duration {
        Duration::from_millis(self.step_duration_ms)
    }

    pub fn stroke_pause(&self) -> Duration {
        Duration::from_millis(self.stroke_pause_ms)
    }

    pub fn hint_duration(&self) -> Duration {
        Duration::from_millis(self.hint_duration_ms)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }

    pub fn peek_duration(&self) -> Duration {
        Duration::from_millis(self.peek_duration_ms)
    }
}

/// Everything the writer needs besides the glyph itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matcher: MatcherConfig,
    pub capture: CaptureConfig,
    pub style: WriterStyle,
    pub timings: Timings,
    pub verdict: VerdictConfig,
}

/// How external verdicts are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// Confidence (0-100) needed to pass.
    pub pass_confidence: f64,
    /// Let a passing verdict complete the character.
    pub completes_session: bool,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            pass_confidence: DEFAULT_PASS_CONFIDENCE,
            completes_session: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded engine config from {}", path.display());
        Self::from_json(&text)
    }
}
