//! Raster masks drawn with the brush tool and their run-length codec.
//!
//! A mask is one byte per pixel of the original image (0 = empty,
//! 255 = painted). On the wire it is `format: "rle"` plus a flat
//! `[run, value, run, value, ...]` array whose runs sum to
//! `width * height`.

use super::coord::Coord;
use super::space::Percent;

/// Value written for painted pixels.
pub const PAINTED: u8 = 255;

/// A decoded brush mask.
#[derive(Clone, PartialEq, Eq)]
pub struct BrushMask {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for BrushMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrushMask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("painted", &self.painted_count())
            .finish()
    }
}

/// Largest mask accepted, in pixels (a 16384 x 16384 image).
pub const MAX_MASK_PIXELS: u64 = 1 << 28;

/// Errors from building or decoding a mask.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RleError {
    #[error("rle array has an odd number of entries")]
    Unpaired,

    #[error("rle value {0} exceeds 255")]
    ValueOutOfRange(u32),

    #[error("rle runs cover {actual} pixels, mask needs {expected}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("mask of {width}x{height} exceeds {max} pixels", max = MAX_MASK_PIXELS)]
    TooLarge { width: u32, height: u32 },
}

/// Pixel count of a `width` x `height` mask, if it is within bounds.
fn pixel_count(width: u32, height: u32) -> Result<u64, RleError> {
    (width as u64)
        .checked_mul(height as u64)
        .filter(|&count| count <= MAX_MASK_PIXELS)
        .ok_or(RleError::TooLarge { width, height })
}

impl BrushMask {
    /// An empty mask of the given size.
    pub fn empty(width: u32, height: u32) -> Result<Self, RleError> {
        let count = pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; count as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn painted_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != 0).count()
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }

    /// Encodes the mask as `[run, value, ...]` pairs.
    pub fn encode_rle(&self) -> Vec<u32> {
        let mut out = Vec::new();
        let mut iter = self.pixels.iter();
        let Some(&first) = iter.next() else {
            return out;
        };

        let mut current = first;
        let mut run: u32 = 1;
        for &pixel in iter {
            if pixel == current {
                run += 1;
            } else {
                out.push(run);
                out.push(current as u32);
                current = pixel;
                run = 1;
            }
        }
        out.push(run);
        out.push(current as u32);
        out
    }

    /// Decodes a run-length array for a mask of the given size.
    pub fn decode_rle(width: u32, height: u32, rle: &[u32]) -> Result<Self, RleError> {
        if rle.len() % 2 != 0 {
            return Err(RleError::Unpaired);
        }

        let expected = pixel_count(width, height)?;

        // Runs are totalled before anything is allocated.
        let mut actual: u64 = 0;
        for pair in rle.chunks_exact(2) {
            u8::try_from(pair[1]).map_err(|_| RleError::ValueOutOfRange(pair[1]))?;
            actual = actual.saturating_add(pair[0] as u64);
        }
        if actual != expected {
            return Err(RleError::LengthMismatch { expected, actual });
        }

        let mut pixels = Vec::with_capacity(expected as usize);
        for pair in rle.chunks_exact(2) {
            pixels.extend(std::iter::repeat(pair[1] as u8).take(pair[0] as usize));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Paints (or erases) a stroke given in percent coordinates.
    ///
    /// Discs of `radius_px` are stamped along every segment at half-radius
    /// spacing so fast pointer moves leave no gaps.
    pub fn paint_stroke(&mut self, points: &[Coord<Percent>], radius_px: f64, erase: bool) {
        let value = if erase { 0 } else { PAINTED };
        let (width, height) = (self.width, self.height);
        let to_px = |p: &Coord<Percent>| {
            (
                p.x / 100.0 * width as f64,
                p.y / 100.0 * height as f64,
            )
        };

        let Some(first) = points.first() else {
            return;
        };
        let mut prev = to_px(first);
        self.stamp(prev, radius_px, value);

        let step = (radius_px / 2.0).max(0.5);
        for point in &points[1..] {
            let next = to_px(point);
            let distance = (next.0 - prev.0).hypot(next.1 - prev.1);
            let steps = (distance / step).ceil().max(1.0) as usize;
            for i in 1..=steps {
                let t = i as f64 / steps as f64;
                self.stamp(
                    (prev.0 + (next.0 - prev.0) * t, prev.1 + (next.1 - prev.1) * t),
                    radius_px,
                    value,
                );
            }
            prev = next;
        }
    }

    fn stamp(&mut self, center: (f64, f64), radius: f64, value: u8) {
        let radius = radius.max(0.5);
        let x0 = (center.0 - radius).floor().max(0.0) as i64;
        let y0 = (center.1 - radius).floor().max(0.0) as i64;
        let x1 = ((center.0 + radius).ceil() as i64).min(self.width as i64 - 1);
        let y1 = ((center.1 + radius).ceil() as i64).min(self.height as i64 - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - center.0;
                let dy = y as f64 + 0.5 - center.1;
                if dx * dx + dy * dy <= radius * radius {
                    let idx = y as usize * self.width as usize + x as usize;
                    self.pixels[idx] = value;
                }
            }
        }
    }

    /// True if the pixel under a percent position is painted.
    pub fn contains(&self, point: Coord<Percent>) -> bool {
        if point.x < 0.0 || point.y < 0.0 {
            return false;
        }
        let x = (point.x / 100.0 * self.width as f64) as u32;
        let y = (point.y / 100.0 * self.height as f64) as u32;
        self.pixel(x, y).is_some_and(|p| p != 0)
    }
}
