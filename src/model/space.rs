//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! between on-screen pixel positions and the percentage units regions are
//! stored in.

use std::fmt;

/// Marker type for pixel coordinates on the rendered canvas.
///
/// Pointer events arrive in this space. They depend on the current zoom and
/// window size and are never stored.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for percent-of-canvas coordinates (0.0 to 100.0).
///
/// All spatial geometry is stored and serialized in this space, which makes
/// results independent of the resolution they were drawn at.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Percent {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Percent {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
