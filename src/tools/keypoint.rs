//! Single-click point markers.

use super::{DrawTarget, Tool, ToolContext, ToolEvent, ToolOutcome};
use crate::error::LabelError;
use crate::model::{ControlSpec, KeyPointGeometry, Shape};

/// Places a keypoint where the pointer is pressed.
#[derive(Clone, Debug)]
pub struct KeyPointTool {
    target: DrawTarget,
}

impl KeyPointTool {
    pub fn new(control: &ControlSpec) -> Self {
        Self {
            target: DrawTarget::new(control),
        }
    }
}

impl Tool for KeyPointTool {
    fn handle(
        &mut self,
        event: &ToolEvent,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolOutcome, LabelError> {
        let ToolEvent::PointerDown(at) = event else {
            return Ok(ToolOutcome::Ignored);
        };
        let at = ctx.to_percent(*at)?;
        let shape = Shape::KeyPoint(KeyPointGeometry {
            x: at.x,
            y: at.y,
            width: ctx.options.keypoint_width,
        });
        let id = ctx.annotation.next_region_id();
        let id = ctx.annotation.add_region(self.target.region(id, shape))?;
        Ok(ToolOutcome::Created(id))
    }

    fn set_labels(&mut self, labels: Vec<String>) {
        self.target.labels = labels;
    }
}
