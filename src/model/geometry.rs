//! Geometry payloads of the spatial and span region kinds.
//!
//! Spatial values are in percent-of-canvas units (see [`Percent`]). Span
//! values are character offsets, range anchors or time points, depending on
//! the object they select from.

use serde::{Deserialize, Serialize};

use super::coord::Coord;
use super::space::Percent;

/// An axis-aligned envelope in XYXY format (xmin, ymin, xmax, ymax).
///
/// Like the region geometry it is derived from, this type does NOT enforce
/// min < max; validation reports such boxes instead.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    /// Creates a new box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Creates a box from a top-left corner plus size.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// True if the box lies inside `[lo, hi]` on both axes.
    pub fn is_within(&self, lo: f64, hi: f64) -> bool {
        self.min.x >= lo && self.min.y >= lo && self.max.x <= hi && self.max.y <= hi
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

/// Rotates `point` around `pivot` by `degrees`.
fn rotate_around(point: (f64, f64), pivot: (f64, f64), degrees: f64) -> (f64, f64) {
    let theta = degrees.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let dx = point.0 - pivot.0;
    let dy = point.1 - pivot.1;
    (
        pivot.0 + dx * cos_t - dy * sin_t,
        pivot.1 + dx * sin_t + dy * cos_t,
    )
}

/// A (possibly rotated) box. `x`/`y` is the top-left corner, which is also
/// the rotation pivot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl RectGeometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
        }
    }

    /// The unrotated box spanned by two drag corners, in any order.
    pub fn from_corners(a: Coord<Percent>, b: Coord<Percent>) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        )
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.rotation]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Axis-aligned envelope of the rotated box.
    pub fn envelope(&self) -> BBoxXYXY<Percent> {
        if self.rotation == 0.0 {
            return BBoxXYXY::from_xywh(self.x, self.y, self.width, self.height);
        }

        let pivot = (self.x, self.y);
        let corners = [
            (self.x, self.y),
            (self.x + self.width, self.y),
            (self.x + self.width, self.y + self.height),
            (self.x, self.y + self.height),
        ];

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for corner in corners {
            let (rx, ry) = rotate_around(corner, pivot, self.rotation);
            min_x = min_x.min(rx);
            min_y = min_y.min(ry);
            max_x = max_x.max(rx);
            max_y = max_y.max(ry);
        }

        BBoxXYXY::from_xyxy(min_x, min_y, max_x, max_y)
    }

    pub fn contains(&self, point: Coord<Percent>) -> bool {
        let (px, py) = rotate_around((point.x, point.y), (self.x, self.y), -self.rotation);
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// An ellipse centred on `x`/`y`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EllipseGeometry {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "radiusX")]
    pub radius_x: f64,
    #[serde(rename = "radiusY")]
    pub radius_y: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl EllipseGeometry {
    pub fn new(x: f64, y: f64, radius_x: f64, radius_y: f64) -> Self {
        Self {
            x,
            y,
            radius_x,
            radius_y,
            rotation: 0.0,
        }
    }

    /// Ellipse drawn from its centre out to a drag point.
    pub fn from_center_and_edge(center: Coord<Percent>, edge: Coord<Percent>) -> Self {
        Self::new(
            center.x,
            center.y,
            (edge.x - center.x).abs(),
            (edge.y - center.y).abs(),
        )
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.radius_x, self.radius_y, self.rotation]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn envelope(&self) -> BBoxXYXY<Percent> {
        BBoxXYXY::from_xyxy(
            self.x - self.radius_x,
            self.y - self.radius_y,
            self.x + self.radius_x,
            self.y + self.radius_y,
        )
    }

    pub fn contains(&self, point: Coord<Percent>) -> bool {
        if self.radius_x <= 0.0 || self.radius_y <= 0.0 {
            return false;
        }
        let (px, py) = rotate_around((point.x, point.y), (self.x, self.y), -self.rotation);
        let nx = (px - self.x) / self.radius_x;
        let ny = (py - self.y) / self.radius_y;
        nx * nx + ny * ny <= 1.0
    }
}

/// A polygon, serialized as `points: [[x, y], ...]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonGeometry {
    pub points: Vec<[f64; 2]>,
    #[serde(default = "default_closed")]
    pub closed: bool,
}

fn default_closed() -> bool {
    true
}

impl PolygonGeometry {
    /// An open polygon with a single starting vertex.
    pub fn start(point: Coord<Percent>) -> Self {
        Self {
            points: vec![[point.x, point.y]],
            closed: false,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.points
            .iter()
            .all(|[x, y]| x.is_finite() && y.is_finite())
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for point in &mut self.points {
            point[0] += dx;
            point[1] += dy;
        }
    }

    pub fn first(&self) -> Option<Coord<Percent>> {
        self.points.first().map(|[x, y]| Coord::new(*x, *y))
    }

    pub fn envelope(&self) -> Option<BBoxXYXY<Percent>> {
        let mut iter = self.points.iter();
        let [x0, y0] = *iter.next()?;
        let mut bbox = BBoxXYXY::from_xyxy(x0, y0, x0, y0);
        for [x, y] in iter {
            bbox.min.x = bbox.min.x.min(*x);
            bbox.min.y = bbox.min.y.min(*y);
            bbox.max.x = bbox.max.x.max(*x);
            bbox.max.y = bbox.max.y.max(*y);
        }
        Some(bbox)
    }

    /// Even-odd ray casting. Open polygons contain nothing.
    pub fn contains(&self, point: Coord<Percent>) -> bool {
        if !self.closed || self.points.len() < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let [xi, yi] = self.points[i];
            let [xj, yj] = self.points[j];
            if (yi > point.y) != (yj > point.y)
                && point.x < (xj - xi) * (point.y - yi) / (yj - yi) + xi
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// A single point marker; `width` is its drawn radius in percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyPointGeometry {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
}

impl KeyPointGeometry {
    pub fn contains(&self, point: Coord<Percent>) -> bool {
        Coord::<Percent>::new(self.x, self.y).distance_to(&point) <= self.width.max(0.5)
    }
}

/// A character-offset span over plain text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: u64,
    pub end: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A DOM range over hypertext: container anchors plus offsets inside them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HtmlRange {
    pub start: String,
    pub end: String,
    #[serde(rename = "startOffset")]
    pub start_offset: u64,
    #[serde(rename = "endOffset")]
    pub end_offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A time-series boundary: either a numeric axis value or a timestamp
/// string, depending on how the series is indexed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimePoint {
    Number(f64),
    Timestamp(String),
}

/// An interval (or an instant) on a time series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimePoint,
    pub end: TimePoint,
    #[serde(default)]
    pub instant: bool,
}

/// A segment of an audio track, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioSegment {
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
}
