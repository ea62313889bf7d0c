//! Command-line shell: replays a character's reference strokes through the
//! writer as pointer input and writes the resulting ink as a PNG.

use crate::replay::{pointer_gesture, trace_stroke};
use crate::{AppConfig, AppResult, KanjiWriter, WriterHandle};
use clap::Parser;
use kakitori_core::{FileGlyphSource, GlyphSource, Mode, ScoringVerdict, SessionPhase};
use kakitori_render::ExportOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Gap between synthetic pointer samples.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(8);

#[derive(Parser, Debug)]
#[command(name = "kakitori", version, about = "Kanji stroke-order practice engine")]
pub struct Cli {
    /// Character to load
    pub character: char,

    /// Directory of KanjiVG or JSON stroke files (overrides the config)
    #[arg(long = "glyphs", value_name = "DIR")]
    pub glyph_dir: Option<PathBuf>,

    /// view, practice or challenge
    #[arg(long, default_value_t = Mode::Practice)]
    pub mode: Mode,

    /// JSON application config
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Recognizer verdict JSON to apply after drawing
    #[arg(long, value_name = "FILE")]
    pub verdict: Option<PathBuf>,

    /// Draw the guide grid into the exported image
    #[arg(long = "grid", default_value_t = false)]
    pub include_grid: bool,

    /// Output PNG path
    #[arg(long, default_value = "kakitori.png")]
    pub out: PathBuf,
}

pub fn run(cli: Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    let glyph_dir = cli.glyph_dir.clone().unwrap_or_else(|| config.glyph_dir.clone());

    let source = FileGlyphSource::new(glyph_dir)?;
    let glyph = Arc::new(pollster::block_on(source.load(cli.character))?);
    let mut writer = KanjiWriter::new(config.engine.clone(), config.surface_size())
        .with_grid(config.grid_style)
        .with_background(config.background_color.into());
    writer.attach(Arc::clone(&glyph), cli.mode);
    writer.subscribe(|event| log::info!("{event:?}"));

    let mut now = Instant::now();
    for stroke in glyph.strokes() {
        let points = trace_stroke(stroke, writer.transform(), false);
        for event in pointer_gesture(&points) {
            now += SAMPLE_INTERVAL;
            writer.handle_pointer(event, now);
            writer.tick(now);
        }
    }

    if let Some(path) = &cli.verdict {
        let text = std::fs::read_to_string(path)?;
        let verdict = ScoringVerdict::from_json(&text)?;
        let passed = writer.apply_verdict(&verdict);
        log::info!("Verdict {:.0}% -> {}", verdict.confidence, if passed { "pass" } else { "fail" });
    }

    if writer.phase() != Some(SessionPhase::Complete) {
        log::warn!("{} was not completed", cli.character);
    }

    let options = ExportOptions {
        include_grid: cli.include_grid,
        background_color: config.background_color.into(),
    };
    let png = writer.export_image(&options)?.to_png()?;
    std::fs::write(&cli.out, &png)?;
    log::info!("Wrote {} ({} bytes)", cli.out.display(), png.len());
    Ok(())
}
