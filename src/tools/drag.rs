//! Press-drag-release drawing of rectangles, ellipses and video boxes.

use super::{DrawTarget, Key, Tool, ToolContext, ToolEvent, ToolOutcome};
use crate::error::LabelError;
use crate::model::{
    ControlSpec, Coord, EllipseGeometry, Keyframe, Percent, RectGeometry, RegionId, Shape,
    ShapeKind, Transform, VideoSequence,
};

#[derive(Clone, Debug)]
struct Drag {
    start: Coord<Percent>,
    region: RegionId,
}

/// Draws a box from the press point to the release point. Rectangles span
/// both corners; ellipses are centered on the press point.
#[derive(Clone, Debug)]
pub struct DragShapeTool {
    target: DrawTarget,
    kind: ShapeKind,
    drag: Option<Drag>,
}

impl DragShapeTool {
    /// `None` for controls that do not draw boxes.
    pub fn new(control: &ControlSpec) -> Option<Self> {
        let kind = control.tag.shape_kind()?;
        if !matches!(
            kind,
            ShapeKind::Rectangle | ShapeKind::Ellipse | ShapeKind::VideoRectangle
        ) {
            return None;
        }
        Some(Self {
            target: DrawTarget::new(control),
            kind,
            drag: None,
        })
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.target.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    fn keyframe(ctx: &ToolContext<'_>, rect: RectGeometry) -> Keyframe {
        let (frame, time) = ctx
            .viewport
            .video
            .map(|v| (v.frame, v.time))
            .unwrap_or((1, 0.0));
        Keyframe::new(frame, time, rect)
    }

    fn initial_shape(&self, ctx: &ToolContext<'_>, at: Coord<Percent>) -> Shape {
        let rect = RectGeometry::from_corners(at, at);
        match self.kind {
            ShapeKind::Ellipse => Shape::Ellipse(EllipseGeometry::from_center_and_edge(at, at)),
            ShapeKind::VideoRectangle => {
                Shape::VideoRectangle(VideoSequence::new([Self::keyframe(ctx, rect)]))
            }
            _ => Shape::Rectangle(rect),
        }
    }

    fn transform(&self, ctx: &ToolContext<'_>, start: Coord<Percent>, at: Coord<Percent>) -> Transform {
        match self.kind {
            ShapeKind::Ellipse => Transform::SetEllipse(EllipseGeometry::from_center_and_edge(start, at)),
            ShapeKind::VideoRectangle => {
                Transform::SetKeyframe(Self::keyframe(ctx, RectGeometry::from_corners(start, at)))
            }
            _ => Transform::SetRect(RectGeometry::from_corners(start, at)),
        }
    }

    /// Width and height of the drawn box.
    fn drawn_size(start: Coord<Percent>, end: Coord<Percent>, kind: ShapeKind) -> (f64, f64) {
        let (w, h) = ((end.x - start.x).abs(), (end.y - start.y).abs());
        match kind {
            ShapeKind::Ellipse => (w * 2.0, h * 2.0),
            _ => (w, h),
        }
    }
}

impl Tool for DragShapeTool {
    fn handle(
        &mut self,
        event: &ToolEvent,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolOutcome, LabelError> {
        match (event, self.drag.clone()) {
            (ToolEvent::PointerDown(at), None) => {
                let start = ctx.to_percent(*at)?;
                ctx.annotation.begin_gesture()?;
                let id = ctx.annotation.next_region_id();
                let region = self.target.region(id, self.initial_shape(ctx, start));
                let id = ctx.annotation.add_region(region)?;
                self.drag = Some(Drag { start, region: id });
                Ok(ToolOutcome::Handled)
            }
            (ToolEvent::PointerMove(at), Some(drag)) => {
                let at = ctx.to_percent(*at)?;
                let transform = self.transform(ctx, drag.start, at);
                ctx.annotation.update_region(&drag.region, &transform)?;
                Ok(ToolOutcome::Handled)
            }
            (ToolEvent::PointerUp(at), Some(drag)) => {
                let end = ctx.to_percent(*at)?;
                let transform = self.transform(ctx, drag.start, end);
                ctx.annotation.update_region(&drag.region, &transform)?;

                let (width, height) = Self::drawn_size(drag.start, end, self.kind);
                let region = drag.region;
                self.drag = None;
                let min = ctx.options.min_region_size;
                if width < min || height < min {
                    tracing::debug!(region = %region, width, height, "discarding undersized box");
                    ctx.annotation.cancel_gesture();
                    return Ok(ToolOutcome::Cancelled);
                }
                ctx.annotation.end_gesture();
                Ok(ToolOutcome::Created(region))
            }
            (ToolEvent::KeyDown(Key::Escape), Some(_)) => {
                self.drag = None;
                ctx.annotation.cancel_gesture();
                Ok(ToolOutcome::Cancelled)
            }
            _ => Ok(ToolOutcome::Ignored),
        }
    }

    fn reset(&mut self) {
        self.drag = None;
    }

    fn set_labels(&mut self, labels: Vec<String>) {
        self.target.labels = labels;
    }
}
