//! The closed set of region kinds and their value-field mapping.
//!
//! Every region owns exactly one [`Shape`]. The shape knows which fields of
//! a result's `value` object are geometry, how to read and write them, and
//! which [`Transform`]s it accepts.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::brush::BrushMask;
use super::coord::Coord;
use super::geometry::{
    AudioSegment, BBoxXYXY, EllipseGeometry, HtmlRange, KeyPointGeometry, PolygonGeometry,
    RectGeometry, TextSpan, TimePoint, TimeRange,
};
use super::label_config::ObjectTag;
use super::space::Percent;
use super::video::{Keyframe, VideoSequence};

/// Discriminant of [`Shape`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Polygon,
    Brush,
    KeyPoint,
    TextSpan,
    HtmlRange,
    TimeSeries,
    Audio,
    VideoRectangle,
    Classification,
}

impl ShapeKind {
    /// The keys of a result `value` that hold this kind's geometry.
    pub fn geometry_keys(&self) -> &'static [&'static str] {
        match self {
            ShapeKind::Rectangle => &["x", "y", "width", "height", "rotation"],
            ShapeKind::Ellipse => &["x", "y", "radiusX", "radiusY", "rotation"],
            ShapeKind::Polygon => &["points", "closed"],
            ShapeKind::Brush => &["format", "rle"],
            ShapeKind::KeyPoint => &["x", "y", "width"],
            ShapeKind::TextSpan => &["start", "end", "text"],
            ShapeKind::HtmlRange => &["start", "end", "startOffset", "endOffset", "text"],
            ShapeKind::TimeSeries => &["start", "end", "instant"],
            ShapeKind::Audio => &["start", "end", "channel"],
            ShapeKind::VideoRectangle => &["sequence", "framesCount", "duration"],
            ShapeKind::Classification => &[],
        }
    }

    /// True for kinds drawn on an image canvas in percent units.
    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            ShapeKind::Rectangle
                | ShapeKind::Ellipse
                | ShapeKind::Polygon
                | ShapeKind::Brush
                | ShapeKind::KeyPoint
                | ShapeKind::VideoRectangle
        )
    }

    /// Guesses the kind from the keys present in a `value` object, using
    /// the target object's tag to break ties between span kinds.
    pub fn infer(value: &Map<String, Value>, object: Option<ObjectTag>) -> ShapeKind {
        let has = |key: &str| value.contains_key(key);
        let has_span = has("start") && has("end");
        // Character offsets are integers; audio times are written as floats.
        let integer_span = ["start", "end"]
            .iter()
            .all(|key| value.get(*key).is_some_and(Value::is_u64));

        match object {
            Some(ObjectTag::Text) if has_span => return ShapeKind::TextSpan,
            Some(ObjectTag::HyperText) if has_span => return ShapeKind::HtmlRange,
            Some(ObjectTag::Audio) if has_span => return ShapeKind::Audio,
            Some(ObjectTag::TimeSeries) if has_span => return ShapeKind::TimeSeries,
            _ => {}
        }

        if has("sequence") {
            ShapeKind::VideoRectangle
        } else if has("points") {
            ShapeKind::Polygon
        } else if has("radiusX") {
            ShapeKind::Ellipse
        } else if has("rle") {
            ShapeKind::Brush
        } else if has("x") && has("y") && has("height") {
            ShapeKind::Rectangle
        } else if has("x") && has("y") {
            ShapeKind::KeyPoint
        } else if has_span && has("startOffset") {
            ShapeKind::HtmlRange
        } else if has_span && has("instant") {
            ShapeKind::TimeSeries
        } else if has_span && (has("text") || integer_span) {
            ShapeKind::TextSpan
        } else if has_span {
            ShapeKind::Audio
        } else {
            ShapeKind::Classification
        }
    }
}

/// A geometry delta applied to a region.
#[derive(Clone, Debug, PartialEq)]
pub enum Transform {
    /// Moves any spatial shape; video tracks move every keyframe.
    Translate { dx: f64, dy: f64 },
    SetRect(RectGeometry),
    SetEllipse(EllipseGeometry),
    /// Sets rectangle width/height or ellipse radii.
    Resize { width: f64, height: f64 },
    Rotate { degrees: f64 },
    AddVertex { x: f64, y: f64 },
    MoveVertex { index: usize, x: f64, y: f64 },
    ClosePolygon,
    SetPoint { x: f64, y: f64 },
    PaintStroke {
        points: Vec<Coord<Percent>>,
        radius_px: f64,
        erase: bool,
    },
    /// Character offsets of a text span.
    SetOffsets { start: u64, end: u64 },
    /// Start/end of an audio segment or a numeric time-series range.
    SetInterval { start: f64, end: f64 },
    SetKeyframe(Keyframe),
    RemoveKeyframe { frame: u64 },
    ToggleKeyframe { frame: u64 },
}

/// Geometry or content payload of one region.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rectangle(RectGeometry),
    Ellipse(EllipseGeometry),
    Polygon(PolygonGeometry),
    Brush(BrushMask),
    KeyPoint(KeyPointGeometry),
    TextSpan(TextSpan),
    HtmlRange(HtmlRange),
    TimeSeries(TimeRange),
    Audio(AudioSegment),
    VideoRectangle(VideoSequence),
    /// Classification-only region with no geometry.
    Classification,
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Ellipse(_) => ShapeKind::Ellipse,
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Brush(_) => ShapeKind::Brush,
            Shape::KeyPoint(_) => ShapeKind::KeyPoint,
            Shape::TextSpan(_) => ShapeKind::TextSpan,
            Shape::HtmlRange(_) => ShapeKind::HtmlRange,
            Shape::TimeSeries(_) => ShapeKind::TimeSeries,
            Shape::Audio(_) => ShapeKind::Audio,
            Shape::VideoRectangle(_) => ShapeKind::VideoRectangle,
            Shape::Classification => ShapeKind::Classification,
        }
    }

    /// Writes the geometry fields into a result `value` object.
    pub fn write_fields(&self, out: &mut Map<String, Value>) {
        match self {
            Shape::Rectangle(rect) => merge(out, rect),
            Shape::Ellipse(ellipse) => merge(out, ellipse),
            Shape::Polygon(polygon) => merge(out, polygon),
            Shape::KeyPoint(point) => merge(out, point),
            Shape::TextSpan(span) => merge(out, span),
            Shape::HtmlRange(range) => merge(out, range),
            Shape::TimeSeries(range) => merge(out, range),
            Shape::Audio(segment) => merge(out, segment),
            Shape::Brush(mask) => {
                out.insert("format".to_string(), Value::from("rle"));
                out.insert("rle".to_string(), serde_json::json!(mask.encode_rle()));
            }
            Shape::VideoRectangle(track) => {
                out.insert(
                    "sequence".to_string(),
                    serde_json::json!(track.keyframes()),
                );
                if let Some(frames) = track.frames_count {
                    out.insert("framesCount".to_string(), Value::from(frames));
                }
                if let Some(duration) = track.duration {
                    out.insert("duration".to_string(), serde_json::json!(duration));
                }
            }
            Shape::Classification => {}
        }
    }

    /// Reads a shape of `kind` from a result `value` object.
    ///
    /// Brush masks need the original image size from the result entry.
    pub fn read_fields(
        kind: ShapeKind,
        value: &Map<String, Value>,
        original_size: Option<(u32, u32)>,
    ) -> Result<Shape, String> {
        let shape = match kind {
            ShapeKind::Rectangle => Shape::Rectangle(pick(kind, value)?),
            ShapeKind::Ellipse => Shape::Ellipse(pick(kind, value)?),
            ShapeKind::Polygon => Shape::Polygon(pick(kind, value)?),
            ShapeKind::KeyPoint => Shape::KeyPoint(pick(kind, value)?),
            ShapeKind::TextSpan => Shape::TextSpan(pick(kind, value)?),
            ShapeKind::HtmlRange => Shape::HtmlRange(pick(kind, value)?),
            ShapeKind::TimeSeries => Shape::TimeSeries(pick(kind, value)?),
            ShapeKind::Audio => Shape::Audio(pick(kind, value)?),
            ShapeKind::Brush => {
                let format = value.get("format").and_then(Value::as_str).unwrap_or("rle");
                if format != "rle" {
                    return Err(format!("unsupported brush format '{format}'"));
                }
                let rle: Vec<u32> = value
                    .get("rle")
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|source| format!("invalid rle: {source}"))?
                    .ok_or_else(|| "brush value is missing 'rle'".to_string())?;
                let (width, height) = original_size.ok_or_else(|| {
                    "brush result needs original_width/original_height".to_string()
                })?;
                let mask = BrushMask::decode_rle(width, height, &rle)
                    .map_err(|source| format!("invalid rle: {source}"))?;
                Shape::Brush(mask)
            }
            ShapeKind::VideoRectangle => {
                let keyframes: Vec<Keyframe> = value
                    .get("sequence")
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|source| format!("invalid sequence: {source}"))?
                    .unwrap_or_default();
                let mut track = VideoSequence::new(keyframes);
                track.frames_count = value.get("framesCount").and_then(Value::as_u64);
                track.duration = value.get("duration").and_then(Value::as_f64);
                Shape::VideoRectangle(track)
            }
            ShapeKind::Classification => Shape::Classification,
        };
        Ok(shape)
    }

    /// Applies a geometry delta. Deltas that make no sense for this kind
    /// are rejected without touching the shape.
    pub fn apply(&mut self, transform: &Transform) -> Result<(), String> {
        match (self, transform) {
            (Shape::Rectangle(rect), Transform::Translate { dx, dy }) => rect.translate(*dx, *dy),
            (Shape::Ellipse(ellipse), Transform::Translate { dx, dy }) => {
                ellipse.x += dx;
                ellipse.y += dy;
            }
            (Shape::Polygon(polygon), Transform::Translate { dx, dy }) => {
                polygon.translate(*dx, *dy)
            }
            (Shape::KeyPoint(point), Transform::Translate { dx, dy }) => {
                point.x += dx;
                point.y += dy;
            }
            (Shape::VideoRectangle(track), Transform::Translate { dx, dy }) => {
                track.translate(*dx, *dy)
            }
            (Shape::Rectangle(rect), Transform::SetRect(next)) => *rect = *next,
            (Shape::Ellipse(ellipse), Transform::SetEllipse(next)) => *ellipse = *next,
            (Shape::Rectangle(rect), Transform::Resize { width, height }) => {
                rect.width = *width;
                rect.height = *height;
            }
            (Shape::Ellipse(ellipse), Transform::Resize { width, height }) => {
                ellipse.radius_x = *width;
                ellipse.radius_y = *height;
            }
            (Shape::Rectangle(rect), Transform::Rotate { degrees }) => rect.rotation = *degrees,
            (Shape::Ellipse(ellipse), Transform::Rotate { degrees }) => {
                ellipse.rotation = *degrees
            }
            (Shape::Polygon(polygon), Transform::AddVertex { x, y }) => {
                if polygon.closed {
                    return Err("cannot add a vertex to a closed polygon".to_string());
                }
                polygon.points.push([*x, *y]);
            }
            (Shape::Polygon(polygon), Transform::MoveVertex { index, x, y }) => {
                let point = polygon
                    .points
                    .get_mut(*index)
                    .ok_or_else(|| format!("polygon has no vertex {index}"))?;
                *point = [*x, *y];
            }
            (Shape::Polygon(polygon), Transform::ClosePolygon) => {
                if polygon.points.len() < 3 {
                    return Err(format!(
                        "polygon needs at least 3 vertices to close, has {}",
                        polygon.points.len()
                    ));
                }
                polygon.closed = true;
            }
            (Shape::KeyPoint(point), Transform::SetPoint { x, y }) => {
                point.x = *x;
                point.y = *y;
            }
            (
                Shape::Brush(mask),
                Transform::PaintStroke {
                    points,
                    radius_px,
                    erase,
                },
            ) => mask.paint_stroke(points, *radius_px, *erase),
            (Shape::TextSpan(span), Transform::SetOffsets { start, end }) => {
                if start > end {
                    return Err(format!("span start {start} is after end {end}"));
                }
                span.start = *start;
                span.end = *end;
            }
            (Shape::Audio(segment), Transform::SetInterval { start, end }) => {
                if start > end {
                    return Err(format!("segment start {start} is after end {end}"));
                }
                segment.start = *start;
                segment.end = *end;
            }
            (Shape::TimeSeries(range), Transform::SetInterval { start, end }) => {
                if start > end {
                    return Err(format!("range start {start} is after end {end}"));
                }
                range.start = TimePoint::Number(*start);
                range.end = TimePoint::Number(*end);
                range.instant = start == end;
            }
            (Shape::VideoRectangle(track), Transform::SetKeyframe(keyframe)) => {
                track.upsert(*keyframe)
            }
            (Shape::VideoRectangle(track), Transform::RemoveKeyframe { frame }) => {
                if !track.remove(*frame) {
                    return Err(format!("no keyframe on frame {frame}"));
                }
            }
            (Shape::VideoRectangle(track), Transform::ToggleKeyframe { frame }) => {
                if !track.toggle_enabled(*frame) {
                    return Err(format!("no keyframe on frame {frame}"));
                }
            }
            (shape, transform) => {
                return Err(format!(
                    "{:?} cannot apply {}",
                    shape.kind(),
                    transform_name(transform)
                ))
            }
        }
        Ok(())
    }

    /// True if a percent position falls on this shape. `frame` selects the
    /// keyframe-interpolated box of video rectangles.
    pub fn hit_test(&self, point: Coord<Percent>, frame: Option<u64>) -> bool {
        match self {
            Shape::Rectangle(rect) => rect.contains(point),
            Shape::Ellipse(ellipse) => ellipse.contains(point),
            Shape::Polygon(polygon) => polygon.contains(point),
            Shape::KeyPoint(keypoint) => keypoint.contains(point),
            Shape::Brush(mask) => mask.contains(point),
            Shape::VideoRectangle(track) => frame
                .and_then(|frame| track.shape_at(frame))
                .is_some_and(|rect| rect.contains(point)),
            _ => false,
        }
    }

    /// Axis-aligned percent envelope of spatial shapes.
    pub fn envelope(&self) -> Option<BBoxXYXY<Percent>> {
        match self {
            Shape::Rectangle(rect) => Some(rect.envelope()),
            Shape::Ellipse(ellipse) => Some(ellipse.envelope()),
            Shape::Polygon(polygon) => polygon.envelope(),
            Shape::KeyPoint(point) => Some(BBoxXYXY::from_xyxy(point.x, point.y, point.x, point.y)),
            _ => None,
        }
    }

    /// False if any numeric geometry is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        match self {
            Shape::Rectangle(rect) => rect.is_finite(),
            Shape::Ellipse(ellipse) => ellipse.is_finite(),
            Shape::Polygon(polygon) => polygon.is_finite(),
            Shape::KeyPoint(point) => point.x.is_finite() && point.y.is_finite(),
            Shape::Audio(segment) => segment.start.is_finite() && segment.end.is_finite(),
            Shape::VideoRectangle(track) => track.keyframes().iter().all(Keyframe::is_finite),
            _ => true,
        }
    }
}

fn transform_name(transform: &Transform) -> &'static str {
    match transform {
        Transform::Translate { .. } => "translate",
        Transform::SetRect(_) => "set-rect",
        Transform::SetEllipse(_) => "set-ellipse",
        Transform::Resize { .. } => "resize",
        Transform::Rotate { .. } => "rotate",
        Transform::AddVertex { .. } => "add-vertex",
        Transform::MoveVertex { .. } => "move-vertex",
        Transform::ClosePolygon => "close-polygon",
        Transform::SetPoint { .. } => "set-point",
        Transform::PaintStroke { .. } => "paint-stroke",
        Transform::SetOffsets { .. } => "set-offsets",
        Transform::SetInterval { .. } => "set-interval",
        Transform::SetKeyframe(_) => "set-keyframe",
        Transform::RemoveKeyframe { .. } => "remove-keyframe",
        Transform::ToggleKeyframe { .. } => "toggle-keyframe",
    }
}

fn merge<T: Serialize>(out: &mut Map<String, Value>, geometry: &T) {
    if let Ok(Value::Object(fields)) = serde_json::to_value(geometry) {
        out.extend(fields);
    }
}

fn pick<T: DeserializeOwned>(kind: ShapeKind, value: &Map<String, Value>) -> Result<T, String> {
    let fields: Map<String, Value> = kind
        .geometry_keys()
        .iter()
        .filter_map(|key| value.get(*key).map(|v| (*key, v)))
        // `text` doubles as the textarea value key; only a string is a span.
        .filter(|(key, v)| *key != "text" || v.is_string())
        .map(|(key, v)| (key.to_string(), v.clone()))
        .collect();
    serde_json::from_value(Value::Object(fields))
        .map_err(|source| format!("invalid {kind:?} geometry: {source}"))
}
