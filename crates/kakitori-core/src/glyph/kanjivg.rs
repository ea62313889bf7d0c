//! KanjiVG stroke file decoding.
//!
//! KanjiVG stores one `<path>` per stroke, with ids of the form
//! `kvg:06728-s1`, nested inside `<g kvg:element="...">` component groups.
//! Only the stroke paths and their grouping are read; the stroke-number
//! text layer is ignored.

use super::{GlyphError, GlyphReference, GlyphResult, StrokeGroup, StrokePath};
use crate::transform::{canonical_box, fit_rect};
use kurbo::{BezPath, PathEl, Point, Rect};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Flattening tolerance for curve segments, in source units.
const FLATTEN_TOLERANCE: f64 = 0.25;

fn malformed(msg: impl std::fmt::Display) -> GlyphError {
    GlyphError::MalformedData(format!("KanjiVG: {msg}"))
}

/// Unescaped value of attribute `name`, if present.
fn attr(tag: &BytesStart<'_>, name: &str) -> GlyphResult<Option<String>> {
    let Some(attribute) = tag.try_get_attribute(name).map_err(malformed)? else {
        return Ok(None);
    };
    let value = attribute.unescape_value().map_err(malformed)?;
    Ok(Some(value.into_owned()))
}

/// Stroke number from an id like `kvg:06728-s3`.
fn stroke_number(id: &str) -> Option<u32> {
    let idx = id.rfind("-s")?;
    id[idx + 2..].parse().ok()
}

fn parse_view_box(value: &str) -> Option<Rect> {
    let nums: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match nums.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some(Rect::new(*x, *y, x + w, y + h)),
        _ => None,
    }
}

/// Flatten an SVG path into a single polyline.
fn flatten_path(d: &str) -> GlyphResult<Vec<Point>> {
    let path = BezPath::from_svg(d).map_err(|e| malformed(format!("bad path data: {e}")))?;
    let mut points = Vec::new();
    kurbo::flatten(&path, FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => points.push(p),
        _ => {}
    });
    Ok(points)
}

struct RawStroke {
    number: Option<u32>,
    order: usize,
    points: Vec<Point>,
    kind: Option<String>,
}

/// Parse a KanjiVG SVG document into a canonical glyph reference.
pub fn parse_kanjivg(character: char, svg: &str) -> GlyphResult<GlyphReference> {
    let mut reader = Reader::from_str(svg);
    let mut view_box = canonical_box();
    let mut raw: Vec<RawStroke> = Vec::new();
    // Open <g> elements; `Some(i)` when the group is a labelled component.
    let mut open_groups: Vec<Option<usize>> = Vec::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();

    loop {
        let (tag, empty) = match reader.read_event().map_err(malformed)? {
            Event::Start(tag) => (tag, false),
            Event::Empty(tag) => (tag, true),
            Event::End(tag) => {
                if tag.name().as_ref() == b"g" {
                    open_groups.pop();
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match tag.name().as_ref() {
            b"svg" => {
                if let Some(vb) = attr(&tag, "viewBox")?.as_deref().and_then(parse_view_box) {
                    view_box = vb;
                }
            }
            b"g" if !empty => {
                let slot = attr(&tag, "kvg:element")?.map(|element| {
                    groups.push((element, Vec::new()));
                    groups.len() - 1
                });
                open_groups.push(slot);
            }
            b"path" => {
                let Some(d) = attr(&tag, "d")? else {
                    continue;
                };
                let order = raw.len();
                raw.push(RawStroke {
                    number: attr(&tag, "id")?.as_deref().and_then(stroke_number),
                    order,
                    points: flatten_path(&d)?,
                    kind: attr(&tag, "kvg:type")?,
                });
                for slot in open_groups.iter().flatten() {
                    groups[*slot].1.push(order);
                }
            }
            _ => {}
        }
    }

    if raw.is_empty() {
        return Err(GlyphError::MalformedData(format!(
            "{character}: KanjiVG document has no stroke paths"
        )));
    }

    // Numbered strokes in stroke-number order; unnumbered ones keep document order after them.
    raw.sort_by_key(|s| (s.number.is_none(), s.number, s.order));
    let mut position = vec![0; raw.len()];
    for (pos, s) in raw.iter().enumerate() {
        position[s.order] = pos;
    }

    let to_canonical = fit_rect(view_box, canonical_box());
    let strokes = raw
        .into_iter()
        .map(|s| {
            let points = s.points.into_iter().map(|p| to_canonical * p).collect();
            StrokePath::new(points).with_kind(s.kind)
        })
        .collect();

    let groups = groups
        .into_iter()
        .map(|(element, members)| {
            let mut strokes: Vec<usize> = members.into_iter().map(|o| position[o]).collect();
            strokes.sort_unstable();
            StrokeGroup { element, strokes }
        })
        .collect();

    let glyph = GlyphReference::new(character, strokes, groups)?;
    log::debug!("Parsed KanjiVG {character}: {} strokes", glyph.len());
    Ok(glyph)
}
