//! Drawing and selection tools.
//!
//! A [`ToolsManager`] holds named tools; at most one is selected, and when
//! none is the default tool (if any) receives events. Tools translate raw
//! pointer and key events into [`Annotation`] operations, bracketing
//! multi-event interactions in a gesture so they undo as one step.

mod brush;
mod drag;
mod keypoint;
mod polygon;
mod selection;

pub use brush::BrushTool;
pub use drag::DragShapeTool;
pub use keypoint::KeyPointTool;
pub use polygon::PolygonTool;
pub use selection::SelectionTool;

use crate::annotation::Annotation;
use crate::config::EngineOptions;
use crate::error::LabelError;
use crate::model::{
    AreaResult, CanvasSize, ControlSpec, ControlValue, Coord, LabelConfig, Percent, Pixel, Region,
    RegionId, RelationId, ResultType, Shape, ShapeKind,
};

/// Name of the selection tool registered by [`ToolsManager::from_config`].
pub const SELECTION_TOOL: &str = "selection";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
    Enter,
}

/// Raw input, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToolEvent {
    PointerDown(Coord<Pixel>),
    PointerMove(Coord<Pixel>),
    PointerUp(Coord<Pixel>),
    DoubleClick(Coord<Pixel>),
    KeyDown(Key),
}

/// What handling an event did.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutcome {
    /// The event meant nothing to the tool.
    Ignored,
    Handled,
    Created(RegionId),
    Cancelled,
    Selected(Option<RegionId>),
    Related(RelationId),
    Deleted(RegionId),
}

/// Playback position of a video object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoPosition {
    pub frame: u64,
    pub time: f64,
}

/// How the object is currently displayed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub canvas: CanvasSize,
    /// Natural size of the displayed image, needed for brush masks.
    pub image_size: Option<(u32, u32)>,
    pub video: Option<VideoPosition>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::new(0.0, 0.0),
            image_size: None,
            video: None,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            canvas: CanvasSize::new(width, height),
            ..Self::default()
        }
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = Some((width, height));
        self
    }

    pub fn with_video(mut self, frame: u64, time: f64) -> Self {
        self.video = Some(VideoPosition { frame, time });
        self
    }

    pub fn frame(&self) -> Option<u64> {
        self.video.map(|v| v.frame)
    }
}

/// What a tool works on while handling one event.
pub struct ToolContext<'a> {
    pub annotation: &'a mut Annotation,
    pub viewport: &'a Viewport,
    pub options: &'a EngineOptions,
}

impl ToolContext<'_> {
    /// Converts a pointer position to percent units, clamped to the canvas.
    pub fn to_percent(&self, at: Coord<Pixel>) -> Result<Coord<Percent>, LabelError> {
        at.to_percent(self.viewport.canvas)
            .map(|p| p.clamped())
            .ok_or_else(|| LabelError::invalid("viewport", "canvas has no usable size"))
    }

    /// Topmost visible region under `point`.
    pub fn hit(&self, point: Coord<Percent>) -> Option<RegionId> {
        let frame = self.viewport.frame();
        self.annotation
            .regions()
            .iter()
            .rev()
            .find(|r| !r.hidden && r.shape.hit_test(point, frame))
            .map(|r| r.id.clone())
    }
}

/// An interaction mode turning input events into annotation operations.
pub trait Tool {
    fn handle(
        &mut self,
        event: &ToolEvent,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolOutcome, LabelError>;

    /// Forgets any in-progress interaction. The owner cancels the gesture
    /// the interaction opened.
    fn reset(&mut self) {}

    /// Sets the labels new regions get, for tools that draw.
    fn set_labels(&mut self, _labels: Vec<String>) {}
}

/// The control a drawing tool creates results for.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DrawTarget {
    pub from_name: String,
    pub to_name: String,
    pub result_type: ResultType,
    pub labels: Vec<String>,
}

impl DrawTarget {
    pub fn new(control: &ControlSpec) -> Self {
        Self {
            from_name: control.name.clone(),
            to_name: control.to_name.clone(),
            result_type: control.tag,
            labels: Vec::new(),
        }
    }

    /// A fresh region with this control's result: the selected labels for
    /// label-carrying controls, otherwise a geometry-only region.
    pub fn region(&self, id: RegionId, shape: Shape) -> Region {
        let region = Region::new(id, self.to_name.clone(), shape);
        if self.result_type.carries_labels() {
            region.with_result(AreaResult::new(
                self.from_name.clone(),
                self.to_name.clone(),
                self.result_type,
                ControlValue::Labels(self.labels.clone()),
            ))
        } else {
            region.with_source(self.from_name.clone())
        }
    }
}

struct Entry {
    name: String,
    tool: Box<dyn Tool>,
}

/// Named tools with one selected.
#[derive(Default)]
pub struct ToolsManager {
    tools: Vec<Entry>,
    selected: Option<usize>,
    default: Option<usize>,
}

impl ToolsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same name is replaced in place.
    pub fn add_tool(&mut self, name: impl Into<String>, tool: Box<dyn Tool>, is_default: bool) {
        let name = name.into();
        let idx = match self.tools.iter().position(|e| e.name == name) {
            Some(idx) => {
                if self.selected == Some(idx) {
                    self.selected = None;
                }
                self.tools[idx].tool = tool;
                idx
            }
            None => {
                self.tools.push(Entry { name, tool });
                self.tools.len() - 1
            }
        };
        if is_default {
            self.default = Some(idx);
        }
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|e| e.name.as_str())
    }

    pub fn tool_mut(&mut self, name: &str) -> Option<&mut (dyn Tool + 'static)> {
        self.tools
            .iter_mut()
            .find(|e| e.name == name)
            .map(|e| e.tool.as_mut())
    }

    /// Selects a tool, deselecting the previous one.
    pub fn select_tool(&mut self, name: &str) -> Result<(), LabelError> {
        let idx = self
            .tools
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| LabelError::not_found("tool", name))?;
        self.unselect_all();
        self.selected = Some(idx);
        tracing::debug!(tool = name, "selected tool");
        Ok(())
    }

    pub fn unselect_all(&mut self) {
        if let Some(idx) = self.selected.take() {
            self.tools[idx].tool.reset();
        }
    }

    /// The explicitly selected tool.
    pub fn find_selected_tool(&self) -> Option<&str> {
        self.selected.map(|idx| self.tools[idx].name.as_str())
    }

    /// The tool events go to: the selected one, else the default.
    pub fn active_tool(&self) -> Option<&str> {
        self.selected
            .or(self.default)
            .map(|idx| self.tools[idx].name.as_str())
    }

    pub fn reset_all(&mut self) {
        for entry in &mut self.tools {
            entry.tool.reset();
        }
    }

    /// Forwards an event to the active tool. Without one the event is
    /// ignored.
    pub fn event(
        &mut self,
        event: &ToolEvent,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolOutcome, LabelError> {
        let Some(idx) = self.selected.or(self.default) else {
            tracing::trace!(?event, "no active tool");
            return Ok(ToolOutcome::Ignored);
        };
        let entry = &mut self.tools[idx];
        let result = entry.tool.handle(event, ctx);
        if let Err(err) = &result {
            // A failed event leaves no half-finished interaction behind.
            entry.tool.reset();
            ctx.annotation.cancel_gesture();
            tracing::debug!(tool = %entry.name, error = %err, "tool event failed");
        }
        result
    }

    /// The selection tool (default) plus one drawing tool per drawing
    /// control, named after the control. Brush controls also get an
    /// eraser named `<control>-eraser`.
    pub fn from_config(config: &LabelConfig, options: &EngineOptions) -> Self {
        let mut manager = Self::new();
        manager.add_tool(SELECTION_TOOL, Box::new(SelectionTool::new()), true);

        for control in config.drawing_controls() {
            let Some(kind) = control.tag.shape_kind() else {
                continue;
            };
            match kind {
                ShapeKind::Rectangle | ShapeKind::Ellipse | ShapeKind::VideoRectangle => {
                    if let Some(tool) = DragShapeTool::new(control) {
                        manager.add_tool(control.name.clone(), Box::new(tool), false);
                    }
                }
                ShapeKind::Polygon => {
                    manager.add_tool(control.name.clone(), Box::new(PolygonTool::new(control)), false);
                }
                ShapeKind::KeyPoint => {
                    manager.add_tool(control.name.clone(), Box::new(KeyPointTool::new(control)), false);
                }
                ShapeKind::Brush => {
                    let brush = BrushTool::new(control, options.brush_radius_px, false);
                    let eraser = BrushTool::new(control, options.brush_radius_px, true);
                    manager.add_tool(control.name.clone(), Box::new(brush), false);
                    manager.add_tool(format!("{}-eraser", control.name), Box::new(eraser), false);
                }
                // Spans are selected in the rendered content, not drawn.
                _ => {}
            }
        }
        manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnotationId, ObjectTag};

    #[derive(Default)]
    struct Counter {
        events: usize,
        resets: usize,
    }

    impl Tool for Counter {
        fn handle(
            &mut self,
            _event: &ToolEvent,
            _ctx: &mut ToolContext<'_>,
        ) -> Result<ToolOutcome, LabelError> {
            self.events += 1;
            Ok(ToolOutcome::Handled)
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    fn down() -> ToolEvent {
        ToolEvent::PointerDown(Coord::new(1.0, 1.0))
    }

    #[test]
    fn test_event_without_tools_is_ignored() {
        let options = EngineOptions::default();
        let mut annotation = Annotation::new(AnnotationId::new(1), &options);
        let viewport = Viewport::new(100.0, 100.0);
        let mut ctx = ToolContext {
            annotation: &mut annotation,
            viewport: &viewport,
            options: &options,
        };
        let mut manager = ToolsManager::new();
        assert_eq!(manager.event(&down(), &mut ctx).expect("event"), ToolOutcome::Ignored);
    }

    #[test]
    fn test_selection_is_exclusive_and_falls_back_to_default() {
        let options = EngineOptions::default();
        let mut annotation = Annotation::new(AnnotationId::new(1), &options);
        let viewport = Viewport::new(100.0, 100.0);
        let mut ctx = ToolContext {
            annotation: &mut annotation,
            viewport: &viewport,
            options: &options,
        };

        let mut manager = ToolsManager::new();
        manager.add_tool("a", Box::<Counter>::default(), true);
        manager.add_tool("b", Box::<Counter>::default(), false);
        assert_eq!(manager.find_selected_tool(), None);
        assert_eq!(manager.active_tool(), Some("a"));

        manager.select_tool("b").expect("select");
        manager.select_tool("a").expect("select");
        assert_eq!(manager.find_selected_tool(), Some("a"));
        manager.event(&down(), &mut ctx).expect("event");

        manager.unselect_all();
        assert_eq!(manager.active_tool(), Some("a"));
        assert!(manager.select_tool("missing").is_err());
    }

    #[test]
    fn test_add_tool_replaces_same_name() {
        let mut manager = ToolsManager::new();
        manager.add_tool("a", Box::<Counter>::default(), false);
        manager.add_tool("a", Box::<Counter>::default(), false);
        assert_eq!(manager.tool_names().count(), 1);
    }

    #[test]
    fn test_from_config_registers_drawing_tools() {
        let config = LabelConfig::default()
            .with_object("image", ObjectTag::Image)
            .with_control(ControlSpec::new("box", ResultType::RectangleLabels, "image"))
            .with_control(ControlSpec::new("mask", ResultType::BrushLabels, "image"))
            .with_control(ControlSpec::new("kind", ResultType::Choices, "image"));
        let manager = ToolsManager::from_config(&config, &EngineOptions::default());
        let names: Vec<&str> = manager.tool_names().collect();
        assert_eq!(names, vec![SELECTION_TOOL, "box", "mask", "mask-eraser"]);
        assert_eq!(manager.active_tool(), Some(SELECTION_TOOL));
    }
}
