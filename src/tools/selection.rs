//! Picking, moving and deleting regions.

use super::{Key, Tool, ToolContext, ToolEvent, ToolOutcome};
use crate::annotation::ClickOutcome;
use crate::error::LabelError;
use crate::model::{Coord, Percent, RegionId, Transform};

#[derive(Clone, Debug)]
struct Move {
    region: RegionId,
    last: Coord<Percent>,
}

/// The default tool. A press selects the topmost visible region under the
/// pointer (or clears the selection on empty canvas) and dragging moves
/// it. In relation mode a press on a region completes the relation.
#[derive(Clone, Debug, Default)]
pub struct SelectionTool {
    moving: Option<Move>,
}

impl SelectionTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn press(&mut self, ctx: &mut ToolContext<'_>, at: Coord<Percent>) -> Result<ToolOutcome, LabelError> {
        let hit = ctx.hit(at);

        if ctx.annotation.relation_mode() {
            return match hit {
                Some(id) => match ctx.annotation.click_region(&id)? {
                    ClickOutcome::Related(relation) => Ok(ToolOutcome::Related(relation)),
                    ClickOutcome::Selected(selected) => Ok(ToolOutcome::Selected(selected)),
                },
                None => {
                    ctx.annotation.stop_relation_mode();
                    Ok(ToolOutcome::Handled)
                }
            };
        }

        let Some(id) = hit else {
            ctx.annotation.select_region(None)?;
            return Ok(ToolOutcome::Selected(None));
        };
        ctx.annotation.select_region(Some(&id))?;

        let movable = !ctx.annotation.is_read_only()
            && ctx.annotation.region(&id).is_some_and(|r| r.is_mutable());
        if movable {
            ctx.annotation.begin_gesture()?;
            self.moving = Some(Move {
                region: id.clone(),
                last: at,
            });
        }
        Ok(ToolOutcome::Selected(Some(id)))
    }
}

impl Tool for SelectionTool {
    fn handle(
        &mut self,
        event: &ToolEvent,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolOutcome, LabelError> {
        match (event, self.moving.clone()) {
            (ToolEvent::PointerDown(at), None) => {
                let at = ctx.to_percent(*at)?;
                self.press(ctx, at)
            }
            (ToolEvent::PointerMove(at), Some(mut moving)) => {
                let at = ctx.to_percent(*at)?;
                let (dx, dy) = (at.x - moving.last.x, at.y - moving.last.y);
                if dx != 0.0 || dy != 0.0 {
                    ctx.annotation
                        .update_region(&moving.region, &Transform::Translate { dx, dy })?;
                }
                moving.last = at;
                self.moving = Some(moving);
                Ok(ToolOutcome::Handled)
            }
            (ToolEvent::PointerUp(_), Some(_)) => {
                self.moving = None;
                ctx.annotation.end_gesture();
                Ok(ToolOutcome::Handled)
            }
            (ToolEvent::KeyDown(Key::Escape), Some(_)) => {
                self.moving = None;
                ctx.annotation.cancel_gesture();
                Ok(ToolOutcome::Cancelled)
            }
            (ToolEvent::KeyDown(Key::Escape), None) => {
                if ctx.annotation.relation_mode() {
                    ctx.annotation.stop_relation_mode();
                    return Ok(ToolOutcome::Handled);
                }
                ctx.annotation.select_region(None)?;
                Ok(ToolOutcome::Selected(None))
            }
            (ToolEvent::KeyDown(Key::Delete), None) => {
                let Some(id) = ctx.annotation.selected().cloned() else {
                    return Ok(ToolOutcome::Ignored);
                };
                ctx.annotation.delete_region(&id)?;
                Ok(ToolOutcome::Deleted(id))
            }
            _ => Ok(ToolOutcome::Ignored),
        }
    }

    fn reset(&mut self) {
        self.moving = None;
    }
}
