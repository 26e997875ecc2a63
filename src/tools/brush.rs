//! Freehand mask painting and erasing.

use super::{DrawTarget, Key, Tool, ToolContext, ToolEvent, ToolOutcome};
use crate::error::LabelError;
use crate::model::{BrushMask, ControlSpec, Coord, Percent, RegionId, Shape, Transform};

#[derive(Clone, Debug)]
struct Stroke {
    region: RegionId,
    last: Coord<Percent>,
    created: bool,
}

/// Paints strokes into a brush mask. A stroke on a selected brush region
/// of the same object extends it; otherwise a new region is started. The
/// eraser variant only ever works on the selected region.
#[derive(Clone, Debug)]
pub struct BrushTool {
    target: DrawTarget,
    radius_px: f64,
    erase: bool,
    stroke: Option<Stroke>,
}

impl BrushTool {
    pub fn new(control: &ControlSpec, radius_px: f64, erase: bool) -> Self {
        Self {
            target: DrawTarget::new(control),
            radius_px,
            erase,
            stroke: None,
        }
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.target.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn is_eraser(&self) -> bool {
        self.erase
    }

    fn paint(&self, ctx: &mut ToolContext<'_>, region: &RegionId, points: Vec<Coord<Percent>>) -> Result<(), LabelError> {
        ctx.annotation.update_region(
            region,
            &Transform::PaintStroke {
                points,
                radius_px: self.radius_px,
                erase: self.erase,
            },
        )
    }

    /// The selected brush region this tool may paint on.
    fn selected_mask(&self, ctx: &ToolContext<'_>) -> Option<RegionId> {
        ctx.annotation
            .selected_region()
            .filter(|r| matches!(r.shape, Shape::Brush(_)))
            .filter(|r| r.object == self.target.to_name && r.is_mutable())
            .map(|r| r.id.clone())
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>, at: Coord<Percent>) -> Result<ToolOutcome, LabelError> {
        let existing = self.selected_mask(ctx);
        if existing.is_none() && self.erase {
            return Ok(ToolOutcome::Ignored);
        }

        let (region, created) = match existing {
            Some(region) => {
                ctx.annotation.begin_gesture()?;
                (region, false)
            }
            None => {
                let (width, height) = ctx.viewport.image_size.unwrap_or((
                    ctx.viewport.canvas.width.round().max(1.0) as u32,
                    ctx.viewport.canvas.height.round().max(1.0) as u32,
                ));
                let mask = BrushMask::empty(width, height)
                    .map_err(|err| LabelError::invalid("brush", err.to_string()))?;

                ctx.annotation.begin_gesture()?;
                let id = ctx.annotation.next_region_id();
                let region = self
                    .target
                    .region(id, Shape::Brush(mask))
                    .with_original_size(width, height);
                let id = ctx.annotation.add_region(region)?;
                // The next stroke extends this mask.
                ctx.annotation.select_region(Some(&id))?;
                (id, true)
            }
        };

        self.paint(ctx, &region, vec![at])?;
        self.stroke = Some(Stroke {
            region,
            last: at,
            created,
        });
        Ok(ToolOutcome::Handled)
    }

    fn finish(&mut self, ctx: &mut ToolContext<'_>, stroke: Stroke) -> ToolOutcome {
        self.stroke = None;
        let blank = ctx
            .annotation
            .region(&stroke.region)
            .is_some_and(|r| matches!(&r.shape, Shape::Brush(mask) if mask.is_blank()));
        if stroke.created && blank {
            ctx.annotation.cancel_gesture();
            return ToolOutcome::Cancelled;
        }
        ctx.annotation.end_gesture();
        if stroke.created {
            ToolOutcome::Created(stroke.region)
        } else {
            ToolOutcome::Handled
        }
    }
}

impl Tool for BrushTool {
    fn handle(
        &mut self,
        event: &ToolEvent,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolOutcome, LabelError> {
        match (event, self.stroke.clone()) {
            (ToolEvent::PointerDown(at), None) => {
                let at = ctx.to_percent(*at)?;
                self.start(ctx, at)
            }
            (ToolEvent::PointerMove(at), Some(mut stroke)) => {
                let at = ctx.to_percent(*at)?;
                self.paint(ctx, &stroke.region, vec![stroke.last, at])?;
                stroke.last = at;
                self.stroke = Some(stroke);
                Ok(ToolOutcome::Handled)
            }
            (ToolEvent::PointerUp(at), Some(stroke)) => {
                let at = ctx.to_percent(*at)?;
                self.paint(ctx, &stroke.region, vec![stroke.last, at])?;
                Ok(self.finish(ctx, stroke))
            }
            (ToolEvent::KeyDown(Key::Escape), Some(_)) => {
                self.stroke = None;
                ctx.annotation.cancel_gesture();
                Ok(ToolOutcome::Cancelled)
            }
            _ => Ok(ToolOutcome::Ignored),
        }
    }

    fn reset(&mut self) {
        self.stroke = None;
    }

    fn set_labels(&mut self, labels: Vec<String>) {
        self.target.labels = labels;
    }
}
