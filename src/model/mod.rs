//! The annotation data model.
//!
//! Regions, the results attached to them, and the geometry each region
//! kind owns. Everything here is plain data plus the mutations a single
//! region can perform on itself; cross-region concerns (selection,
//! relations, history) live in [`crate::annotation`].
//!
//! # Design Principles
//!
//! 1. **Closed set of kinds**: [`Shape`] is a sum type with one variant per
//!    region kind, so behaviour is dispatched by `match` and adding a kind
//!    is a compile error everywhere it needs handling.
//!
//! 2. **Resolution independence**: spatial geometry is stored in percent of
//!    the canvas ([`Percent`]); pointer positions ([`Pixel`]) must be
//!    converted explicitly.
//!
//! 3. **Permissive construction**: out-of-range or inverted geometry can be
//!    represented, so that validation can report it instead of panicking.
//!
//! # Example
//!
//! ```
//! use labelstate::model::{AreaResult, RectGeometry, Region, RegionId, ResultType, Shape};
//!
//! let region = Region::new(
//!     RegionId::new("a1b2c3d4e5"),
//!     "image",
//!     Shape::Rectangle(RectGeometry::new(10.0, 10.0, 20.0, 20.0)),
//! )
//! .with_result(AreaResult::labels("label", "image", ResultType::RectangleLabels, &["Car"]));
//!
//! assert_eq!(region.labels(), vec!["Car"]);
//! ```

mod brush;
mod choices;
mod coord;
mod geometry;
mod ids;
mod label_config;
mod region;
mod result;
mod shape;
mod space;
mod video;

pub use brush::{BrushMask, RleError, MAX_MASK_PIXELS, PAINTED};
pub use choices::{toggle_flat, ChoiceNode, ChoiceTree};
pub use coord::{CanvasSize, Coord};
pub use geometry::{
    AudioSegment, BBoxXYXY, EllipseGeometry, HtmlRange, KeyPointGeometry, PolygonGeometry,
    RectGeometry, TextSpan, TimePoint, TimeRange,
};
pub use ids::{
    AnnotationId, CommentId, DraftId, IdGenerator, RegionId, RelationId, TaskId,
};
pub use label_config::{
    AcceptAll, Capability, ControlResolver, ControlSpec, LabelConfig, ObjectSpec, ObjectTag,
};
pub use region::Region;
pub use result::{AreaResult, ChoiceSelection, ControlValue, Origin, ResultType};
pub use shape::{Shape, ShapeKind, Transform};
pub use space::{Percent, Pixel};
pub use video::{Keyframe, VideoSequence};
