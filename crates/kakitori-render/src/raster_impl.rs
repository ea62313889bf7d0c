//! Software renderer implementation.

use crate::export::{ExportOptions, RasterImage};
use crate::renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError, StrokeRenderer};
use crate::surface::RasterSurface;
use kakitori_core::geometry::truncate_path;
use kurbo::{Affine, Point, Rect};
use peniko::Color;

/// Grid lines are drawn this wide, in surface pixels.
const GRID_LINE_WIDTH: f64 = 1.0;

/// CPU renderer drawing into a [`RasterSurface`].
///
/// Layers, bottom to top: background, grid, reference ghosts (or the full
/// reference while peeking), hint highlight, animation, learner ink,
/// flash, live stroke.
pub struct RasterRenderer {
    surface: RasterSurface,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterRenderer {
    pub fn new() -> Self {
        Self {
            surface: RasterSurface::new(0, 0),
        }
    }

    /// The last rendered frame.
    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    /// Copy the last rendered frame out as an image.
    pub fn snapshot(&self) -> RasterImage {
        RasterImage {
            rgba_data: self.surface.to_rgba(),
            width: self.surface.width(),
            height: self.surface.height(),
        }
    }

    /// Render the learner's ink offscreen, without ghosts or overlays.
    pub fn render_image(&mut self, ctx: RenderContext, options: &ExportOptions) -> RenderResult<RasterImage> {
        let grid = if options.include_grid {
            ctx.grid_style
        } else {
            GridStyle::None
        };
        let ctx = ctx
            .with_ink_only(true)
            .with_background(options.background_color)
            .with_grid(grid);
        self.render(&ctx)?;
        log::debug!(
            "Rendered {} ink stroke(s) to a {}x{} image",
            ctx.ink.len(),
            self.surface.width(),
            self.surface.height()
        );
        Ok(self.snapshot())
    }

    fn render_reference(&mut self, ctx: &RenderContext, color: Color) {
        let Some(glyph) = ctx.glyph else { return };
        let transform = ctx.transform.transform();
        for stroke in glyph.strokes() {
            self.render_polyline(stroke.points(), transform, ctx.stroke_width(), color);
        }
    }

    fn render_ghosts(&mut self, ctx: &RenderContext) {
        if ctx.peek {
            self.render_reference(ctx, ctx.mode_style.ghost_color.into());
        } else if ctx.mode_style.show_ghost && ctx.animation.is_none() {
            self.render_reference(ctx, ctx.mode_style.ghost().into());
        }
    }

    fn render_highlight(&mut self, ctx: &RenderContext) {
        let (Some(glyph), Some(index)) = (ctx.glyph, ctx.highlight) else {
            return;
        };
        if let Some(stroke) = glyph.stroke(index) {
            let transform = ctx.transform.transform();
            self.render_polyline(stroke.points(), transform, ctx.stroke_width(), ctx.hint_color);
            // Mark where the stroke begins.
            let start = transform * stroke.start();
            self.surface
                .fill_circle(start, ctx.stroke_width() * 0.75, ctx.hint_color);
        }
    }

    fn render_animation(&mut self, ctx: &RenderContext) {
        let (Some(glyph), Some(frame)) = (ctx.glyph, ctx.animation) else {
            return;
        };
        let transform = ctx.transform.transform();
        let color: Color = ctx.mode_style.stroke_color.into();
        for (index, stroke) in glyph.strokes().iter().enumerate() {
            match frame.progress(index) {
                Some(t) if t >= 1.0 => {
                    self.render_polyline(stroke.points(), transform, ctx.stroke_width(), color)
                }
                Some(t) => {
                    let partial = truncate_path(stroke.points(), t);
                    self.render_polyline(&partial, transform, ctx.stroke_width(), color);
                }
                None => {}
            }
        }
    }

    fn render_ink(&mut self, ctx: &RenderContext) {
        let transform = ctx.transform.transform();
        let color: Color = ctx.mode_style.stroke_color.into();
        for (index, stroke) in ctx.ink.iter().enumerate() {
            let reference = ctx
                .glyph
                .filter(|_| ctx.mode_style.snap_to_reference && !ctx.ink_only)
                .and_then(|g| g.stroke(index));
            match reference {
                Some(reference) => {
                    self.render_polyline(reference.points(), transform, ctx.stroke_width(), color)
                }
                None => self.render_polyline(&stroke.positions(), transform, ctx.stroke_width(), color),
            }
        }
    }

    fn render_flash(&mut self, ctx: &RenderContext) {
        let Some(flash) = ctx.flash else { return };
        let color = if flash.correct {
            ctx.correct_color
        } else {
            ctx.incorrect_color
        };
        self.render_polyline(flash.points, ctx.transform.transform(), ctx.stroke_width(), color);
    }

    fn render_live(&mut self, ctx: &RenderContext) {
        if let Some(points) = ctx.live_stroke {
            let color: Color = ctx.mode_style.stroke_color.into();
            self.render_polyline(points, Affine::IDENTITY, ctx.stroke_width(), color);
        }
    }
}

impl Renderer for RasterRenderer {
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        let width = ctx.size.width.round();
        let height = ctx.size.height.round();
        if width < 1.0 || height < 1.0 || !width.is_finite() || !height.is_finite() {
            log::warn!("Refusing to render a {}x{} surface", ctx.size.width, ctx.size.height);
            return Err(RendererError::InvalidSize {
                width: width.max(0.0) as u32,
                height: height.max(0.0) as u32,
            });
        }
        self.surface.resize(width as u32, height as u32);
        self.surface.clear(self.background_color(ctx));

        if ctx.mode_style.show_grid && ctx.grid_style != GridStyle::None {
            self.render_grid(ctx.glyph_frame(), ctx.grid_style, ctx.mode_style.grid_color.into());
        }

        if !ctx.ink_only {
            self.render_ghosts(ctx);
            self.render_highlight(ctx);
            self.render_animation(ctx);
        }
        self.render_ink(ctx);
        if !ctx.ink_only {
            self.render_flash(ctx);
            self.render_live(ctx);
        }
        Ok(())
    }
}

impl StrokeRenderer for RasterRenderer {
    fn render_polyline(&mut self, points: &[Point], transform: Affine, width: f64, color: Color) {
        let mapped: Vec<Point> = points.iter().map(|p| transform * *p).collect();
        self.surface.stroke_polyline(&mapped, width, color);
    }

    fn render_grid(&mut self, frame: Rect, style: GridStyle, color: Color) {
        let center = frame.center();
        let w = GRID_LINE_WIDTH;
        match style {
            GridStyle::None => {}
            GridStyle::Cross | GridStyle::Star => {
                self.surface.fill_rect(
                    Rect::new(frame.x0, center.y - w / 2.0, frame.x1, center.y + w / 2.0),
                    color,
                );
                self.surface.fill_rect(
                    Rect::new(center.x - w / 2.0, frame.y0, center.x + w / 2.0, frame.y1),
                    color,
                );
                if style == GridStyle::Star {
                    self.surface.stroke_polyline(&[frame.origin(), Point::new(frame.x1, frame.y1)], w, color);
                    self.surface.stroke_polyline(&[Point::new(frame.x1, frame.y0), Point::new(frame.x0, frame.y1)], w, color);
                }
            }
            GridStyle::Dots => {
                for i in 1..4 {
                    for j in 1..4 {
                        let p = Point::new(
                            frame.x0 + frame.width() * i as f64 / 4.0,
                            frame.y0 + frame.height() * j as f64 / 4.0,
                        );
                        self.surface.fill_circle(p, w * 1.5, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationFrame;
    use crate::renderer::Flash;
    use kakitori_core::{GlyphReference, StrokePath, UserStroke, WriterStyle};
    use kurbo::Size;

    fn one() -> GlyphReference {
        GlyphReference::new(
            '一',
            vec![StrokePath::new(vec![Point::new(12.0, 54.5), Point::new(97.0, 54.5)])],
            vec![],
        )
        .unwrap()
    }

    fn is_white(px: [u8; 4]) -> bool {
        px == [255, 255, 255, 255]
    }

    /// Surface pixel at a canonical point for a 218 px surface (scale 2).
    fn at(image: &RasterImage, x: f64, y: f64) -> [u8; 4] {
        image.pixel((x * 2.0) as u32, (y * 2.0) as u32).unwrap()
    }

    fn ctx(glyph: &GlyphReference) -> RenderContext<'_> {
        RenderContext::new(Size::new(218.0, 218.0))
            .with_glyph(glyph)
            .with_grid(GridStyle::None)
    }

    #[test]
    fn test_ghost_drawn_in_practice() {
        let glyph = one();
        let mut renderer = RasterRenderer::new();
        renderer.render(&ctx(&glyph)).unwrap();
        let image = renderer.snapshot();

        assert!(!is_white(at(&image, 50.0, 54.5)));
        assert!(is_white(at(&image, 50.0, 20.0)));
    }

    #[test]
    fn test_no_ghost_in_challenge() {
        let glyph = one();
        let style = WriterStyle::default();
        let mut renderer = RasterRenderer::new();
        renderer
            .render(&ctx(&glyph).with_style(&style, &style.challenge))
            .unwrap();

        assert!(is_white(at(&renderer.snapshot(), 50.0, 54.5)));
    }

    #[test]
    fn test_peek_shows_reference_in_challenge() {
        let glyph = one();
        let style = WriterStyle::default();
        let mut renderer = RasterRenderer::new();
        renderer
            .render(&ctx(&glyph).with_style(&style, &style.challenge).with_peek(true))
            .unwrap();

        assert!(!is_white(at(&renderer.snapshot(), 50.0, 54.5)));
    }

    #[test]
    fn test_export_is_ink_only() {
        let glyph = one();
        let mut renderer = RasterRenderer::new();

        let blank = renderer
            .render_image(ctx(&glyph).with_highlight(Some(0)), &ExportOptions::default())
            .unwrap();
        assert_eq!((blank.width, blank.height), (218, 218));
        assert!(blank.rgba_data.chunks_exact(4).all(|p| p == [255, 255, 255, 255]));

        let ink = [UserStroke::from_points([Point::new(12.0, 30.0), Point::new(97.0, 30.0)])];
        let inked = renderer
            .render_image(ctx(&glyph).with_ink(&ink), &ExportOptions::default())
            .unwrap();
        let ink = at(&inked, 50.0, 30.0);
        assert_eq!(ink, [0x33, 0x33, 0x33, 255]);
        assert!(is_white(at(&inked, 50.0, 54.5)));
    }

    #[test]
    fn test_practice_ink_snaps_to_reference() {
        let glyph = one();
        let style = WriterStyle::default();
        let ink = [UserStroke::from_points([Point::new(12.0, 30.0), Point::new(97.0, 30.0)])];
        let mut renderer = RasterRenderer::new();

        renderer
            .render(&ctx(&glyph).with_style(&style, &style.challenge).with_ink(&ink))
            .unwrap();
        let raw = renderer.snapshot();
        assert_eq!(at(&raw, 50.0, 30.0), [0x33, 0x33, 0x33, 255]);
        assert!(is_white(at(&raw, 50.0, 54.5)));

        renderer
            .render(&ctx(&glyph).with_style(&style, &style.practice).with_ink(&ink))
            .unwrap();
        let snapped = renderer.snapshot();
        assert_eq!(at(&snapped, 50.0, 54.5), [0x33, 0x33, 0x33, 255]);
        assert!(is_white(at(&snapped, 50.0, 30.0)));

        // Export keeps what was drawn.
        let exported = renderer
            .render_image(ctx(&glyph).with_style(&style, &style.practice).with_ink(&ink), &ExportOptions::default())
            .unwrap();
        assert_eq!(at(&exported, 50.0, 30.0), [0x33, 0x33, 0x33, 255]);
    }

    #[test]
    fn test_flash_colors_stroke() {
        let glyph = one();
        let points = [Point::new(12.0, 80.0), Point::new(97.0, 80.0)];
        let mut renderer = RasterRenderer::new();
        renderer
            .render(&ctx(&glyph).with_flash(Some(Flash {
                points: &points,
                correct: false,
            })))
            .unwrap();

        assert_eq!(at(&renderer.snapshot(), 50.0, 80.0), [0xef, 0x44, 0x44, 255]);
    }

    #[test]
    fn test_animation_hides_unstarted_strokes() {
        let glyph = one();
        let style = WriterStyle::default();
        let mut renderer = RasterRenderer::new();
        let frame = AnimationFrame {
            completed: 0,
            partial: Some((0, 0.25)),
        };
        renderer
            .render(&ctx(&glyph).with_style(&style, &style.challenge).with_animation(Some(frame)))
            .unwrap();
        let image = renderer.snapshot();

        assert_eq!(at(&image, 20.0, 54.5), [0x33, 0x33, 0x33, 255]);
        assert!(is_white(at(&image, 80.0, 54.5)));
    }

    #[test]
    fn test_grid_drawn_through_center() {
        let glyph = one();
        let mut renderer = RasterRenderer::new();
        let style = WriterStyle::default();
        renderer
            .render(&ctx(&glyph).with_style(&style, &style.challenge).with_grid(GridStyle::Cross))
            .unwrap();
        let image = renderer.snapshot();

        assert!(!is_white(image.pixel(109, 20).unwrap()));
        assert!(is_white(image.pixel(60, 20).unwrap()));
    }

    #[test]
    fn test_zero_size_is_error() {
        let glyph = one();
        let mut renderer = RasterRenderer::new();
        let result = renderer.render(&RenderContext::new(Size::ZERO).with_glyph(&glyph));
        assert!(matches!(result, Err(RendererError::InvalidSize { .. })));
    }
}
