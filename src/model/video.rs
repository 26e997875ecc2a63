//! Keyframed video rectangles.

use serde::{Deserialize, Serialize};

use super::geometry::RectGeometry;

/// One keyframe of a video rectangle.
///
/// `enabled == false` marks the end of the region's lifespan: the box is
/// still drawn on this frame but not after it, until the next keyframe.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: u64,
    pub enabled: bool,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub time: f64,
}

impl Keyframe {
    pub fn new(frame: u64, time: f64, rect: RectGeometry) -> Self {
        Self {
            frame,
            enabled: true,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            rotation: rect.rotation,
            time,
        }
    }

    pub fn rect(&self) -> RectGeometry {
        RectGeometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.rect().is_finite() && self.time.is_finite()
    }
}

/// The keyframe track of a video rectangle, kept sorted by frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoSequence {
    sequence: Vec<Keyframe>,
    pub frames_count: Option<u64>,
    pub duration: Option<f64>,
}

impl VideoSequence {
    /// Builds a track from keyframes in any order. Later duplicates of a
    /// frame replace earlier ones.
    pub fn new(keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut track = Self::default();
        for keyframe in keyframes {
            track.upsert(keyframe);
        }
        track
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.sequence
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Inserts a keyframe, replacing any existing one on the same frame.
    pub fn upsert(&mut self, keyframe: Keyframe) {
        match self
            .sequence
            .binary_search_by_key(&keyframe.frame, |k| k.frame)
        {
            Ok(idx) => self.sequence[idx] = keyframe,
            Err(idx) => self.sequence.insert(idx, keyframe),
        }
    }

    /// Removes the keyframe on `frame`; returns whether one existed.
    pub fn remove(&mut self, frame: u64) -> bool {
        match self.sequence.binary_search_by_key(&frame, |k| k.frame) {
            Ok(idx) => {
                self.sequence.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    /// Flips the lifespan flag of the keyframe on `frame`.
    pub fn toggle_enabled(&mut self, frame: u64) -> bool {
        match self.sequence.binary_search_by_key(&frame, |k| k.frame) {
            Ok(idx) => {
                self.sequence[idx].enabled = !self.sequence[idx].enabled;
                true
            }
            Err(_) => false,
        }
    }

    /// Moves every keyframe by the same offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for keyframe in &mut self.sequence {
            keyframe.x += dx;
            keyframe.y += dy;
        }
    }

    /// The box on `frame`, linearly interpolated between the enclosing
    /// keyframes, or `None` when the region is not alive on that frame.
    pub fn shape_at(&self, frame: u64) -> Option<RectGeometry> {
        let after = self.sequence.partition_point(|k| k.frame <= frame);
        let prev = self.sequence.get(after.checked_sub(1)?)?;

        if prev.frame == frame {
            return Some(prev.rect());
        }
        if !prev.enabled {
            return None;
        }

        let Some(next) = self.sequence.get(after) else {
            return Some(prev.rect());
        };

        let t = (frame - prev.frame) as f64 / (next.frame - prev.frame) as f64;
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        Some(RectGeometry {
            x: lerp(prev.x, next.x),
            y: lerp(prev.y, next.y),
            width: lerp(prev.width, next.width),
            height: lerp(prev.height, next.height),
            rotation: lerp(prev.rotation, next.rotation),
        })
    }
}
