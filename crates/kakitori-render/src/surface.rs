//! CPU raster target backed by a tiny-skia pixmap.

use kurbo::{Point, Rect};
use peniko::Color;
use std::fmt;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// RGBA8 drawing surface.
///
/// Pixels are stored premultiplied; everything read back through
/// [`RasterSurface::pixel`] and [`RasterSurface::to_rgba`] is straight alpha.
#[derive(Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    /// `None` while either dimension is zero.
    pixmap: Option<Pixmap>,
}

impl fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

fn paint(color: Color) -> Paint<'static> {
    let c = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;
    paint
}

impl RasterSurface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixmap: Pixmap::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Straight-alpha RGBA bytes, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        let Some(pixmap) = &self.pixmap else {
            return Vec::new();
        };
        pixmap
            .pixels()
            .iter()
            .flat_map(|px| {
                let c = px.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    /// Reallocate for a new size if it changed.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            *self = Self::new(width, height);
        }
    }

    /// Overwrite every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            let c = color.to_rgba8();
            pixmap.fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a));
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.as_ref()?.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let Some(rect) = tiny_skia::Rect::from_ltrb(rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32)
        else {
            return;
        };
        pixmap.fill_rect(rect, &paint(color), Transform::identity(), None);
    }

    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32) else {
            return;
        };
        pixmap.fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
    }

    /// Stroke a polyline with round caps and joins.
    ///
    /// The whole polyline is one path, so translucent strokes do not darken
    /// at joints. A single point draws a dot.
    pub fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Color) {
        let Some(&first) = points.first() else {
            return;
        };
        if width <= 0.0 {
            return;
        }
        if points.iter().all(|p| *p == first) {
            self.fill_circle(first, width / 2.0, color);
            return;
        }
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };

        let mut builder = PathBuilder::new();
        builder.move_to(first.x as f32, first.y as f32);
        for p in &points[1..] {
            builder.line_to(p.x as f32, p.y as f32);
        }
        let Some(path) = builder.finish() else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }
}
