//! Click-by-click polygon drawing.

use super::{DrawTarget, Key, Tool, ToolContext, ToolEvent, ToolOutcome};
use crate::error::LabelError;
use crate::model::{ControlSpec, Coord, Percent, PolygonGeometry, RegionId, Shape, Transform};

/// Each press adds a vertex. Pressing near the first vertex, double
/// clicking or pressing Enter closes the polygon once it has three
/// vertices; Escape discards it. The whole polygon is one history entry.
#[derive(Clone, Debug)]
pub struct PolygonTool {
    target: DrawTarget,
    drawing: Option<RegionId>,
}

impl PolygonTool {
    pub fn new(control: &ControlSpec) -> Self {
        Self {
            target: DrawTarget::new(control),
            drawing: None,
        }
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.target.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    fn polygon<'a>(ctx: &'a ToolContext<'_>, id: &RegionId) -> Option<&'a PolygonGeometry> {
        match &ctx.annotation.region(id)?.shape {
            Shape::Polygon(polygon) => Some(polygon),
            _ => None,
        }
    }

    fn close(&mut self, ctx: &mut ToolContext<'_>, id: RegionId) -> Result<ToolOutcome, LabelError> {
        let vertices = Self::polygon(ctx, &id).map_or(0, |p| p.points.len());
        if vertices < 3 {
            return Ok(ToolOutcome::Ignored);
        }
        ctx.annotation.update_region(&id, &Transform::ClosePolygon)?;
        ctx.annotation.end_gesture();
        self.drawing = None;
        Ok(ToolOutcome::Created(id))
    }

    fn add_vertex(
        &mut self,
        ctx: &mut ToolContext<'_>,
        id: RegionId,
        at: Coord<Percent>,
    ) -> Result<ToolOutcome, LabelError> {
        let closes = Self::polygon(ctx, &id)
            .filter(|p| p.points.len() >= 3)
            .and_then(|p| p.first())
            .is_some_and(|first| first.distance_to(&at) <= ctx.options.polygon_close_distance);
        if closes {
            return self.close(ctx, id);
        }
        ctx.annotation
            .update_region(&id, &Transform::AddVertex { x: at.x, y: at.y })?;
        Ok(ToolOutcome::Handled)
    }
}

impl Tool for PolygonTool {
    fn handle(
        &mut self,
        event: &ToolEvent,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolOutcome, LabelError> {
        match (event, self.drawing.clone()) {
            (ToolEvent::PointerDown(at), None) => {
                let at = ctx.to_percent(*at)?;
                ctx.annotation.begin_gesture()?;
                let id = ctx.annotation.next_region_id();
                let region = self
                    .target
                    .region(id, Shape::Polygon(PolygonGeometry::start(at)));
                self.drawing = Some(ctx.annotation.add_region(region)?);
                Ok(ToolOutcome::Handled)
            }
            (ToolEvent::PointerDown(at), Some(id)) => {
                let at = ctx.to_percent(*at)?;
                self.add_vertex(ctx, id, at)
            }
            (ToolEvent::DoubleClick(_) | ToolEvent::KeyDown(Key::Enter), Some(id)) => {
                self.close(ctx, id)
            }
            (ToolEvent::KeyDown(Key::Escape), Some(_)) => {
                self.drawing = None;
                ctx.annotation.cancel_gesture();
                Ok(ToolOutcome::Cancelled)
            }
            _ => Ok(ToolOutcome::Ignored),
        }
    }

    fn reset(&mut self) {
        self.drawing = None;
    }

    fn set_labels(&mut self, labels: Vec<String>) {
        self.target.labels = labels;
    }
}
