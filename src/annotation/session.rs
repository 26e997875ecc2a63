//! The labeling session of one task: annotations, predictions and the
//! active tool.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Annotation;
use crate::config::EngineOptions;
use crate::error::LabelError;
use crate::model::{AnnotationId, LabelConfig, Origin, TaskId};
use crate::serialize::{self, ResultEntry};
use crate::tools::{ToolContext, ToolEvent, ToolOutcome, ToolsManager, Viewport};
use crate::validation::ValidationReport;

/// The item being labeled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Task {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            data: Map::new(),
        }
    }
}

/// Owns every annotation of a task. At most one annotation (or
/// prediction) is selected; tool input goes to it.
pub struct Session {
    task: Task,
    config: LabelConfig,
    options: EngineOptions,
    annotations: Vec<Annotation>,
    predictions: Vec<Annotation>,
    selected: Option<AnnotationId>,
    tools: ToolsManager,
    viewport: Viewport,
    next_id: u64,
}

impl Session {
    pub fn new(task: Task, config: LabelConfig, options: EngineOptions) -> Self {
        let tools = ToolsManager::from_config(&config, &options);
        Self {
            task,
            config,
            options,
            annotations: Vec::new(),
            predictions: Vec::new(),
            selected: None,
            tools,
            viewport: Viewport::default(),
            next_id: 1,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn tools(&self) -> &ToolsManager {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolsManager {
        &mut self.tools
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn predictions(&self) -> &[Annotation] {
        &self.predictions
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations
            .iter()
            .chain(&self.predictions)
            .find(|a| a.id() == id)
    }

    pub fn annotation_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations
            .iter_mut()
            .chain(&mut self.predictions)
            .find(|a| a.id() == id)
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected.and_then(|id| self.annotation(id))
    }

    pub fn selected_annotation_mut(&mut self) -> Option<&mut Annotation> {
        let id = self.selected?;
        self.annotation_mut(id)
    }

    fn next_annotation_id(&mut self) -> AnnotationId {
        let id = AnnotationId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Creates an empty annotation and selects it.
    pub fn create_annotation(&mut self) -> AnnotationId {
        let id = self.next_annotation_id();
        self.annotations.push(Annotation::new(id, &self.options));
        self.switch_to(id);
        tracing::debug!(task = %self.task.id, annotation = %id, "created annotation");
        id
    }

    /// Loads a result array as an annotation.
    pub fn load_annotation(&mut self, entries: &[ResultEntry]) -> (AnnotationId, ValidationReport) {
        let id = self.next_annotation_id();
        let mut import = serialize::from_results(entries, &self.config);
        let report = std::mem::take(&mut import.report);
        self.annotations
            .push(Annotation::from_import(id, import, &self.options));
        (id, report)
    }

    /// Loads a model prediction. Predictions are readonly; their regions
    /// are marked as prediction-originated.
    pub fn add_prediction(&mut self, entries: &[ResultEntry]) -> (AnnotationId, ValidationReport) {
        let id = self.next_annotation_id();
        let mut import = serialize::from_results(entries, &self.config);
        let report = std::mem::take(&mut import.report);
        for region in &mut import.regions {
            if region.origin == Origin::Manual {
                region.origin = Origin::Prediction;
            }
        }
        let mut prediction = Annotation::from_import(id, import, &self.options);
        prediction.set_read_only(true);
        self.predictions.push(prediction);
        tracing::debug!(task = %self.task.id, prediction = %id, "added prediction");
        (id, report)
    }

    /// Copies an annotation or prediction into a new editable annotation
    /// with its own history, and selects it.
    pub fn duplicate_annotation(&mut self, source: AnnotationId) -> Result<AnnotationId, LabelError> {
        let entries = self
            .annotation(source)
            .ok_or_else(|| LabelError::not_found("annotation", source))?
            .serialize();

        let id = self.next_annotation_id();
        let import = serialize::from_results(&entries, &self.config);
        self.annotations
            .push(Annotation::from_import(id, import, &self.options));
        self.switch_to(id);
        Ok(id)
    }

    /// Selects an annotation. Any gesture in progress on the previous one
    /// is cancelled.
    pub fn select_annotation(&mut self, id: AnnotationId) -> Result<(), LabelError> {
        if self.annotation(id).is_none() {
            return Err(LabelError::not_found("annotation", id));
        }
        self.switch_to(id);
        Ok(())
    }

    fn switch_to(&mut self, id: AnnotationId) {
        if self.selected == Some(id) {
            return;
        }
        self.interrupt();
        self.selected = Some(id);
    }

    /// Cancels in-flight tool state and the gesture it opened.
    fn interrupt(&mut self) {
        self.tools.reset_all();
        if let Some(annotation) = self.selected_annotation_mut() {
            if annotation.cancel_gesture() {
                tracing::debug!(annotation = %annotation.id(), "cancelled gesture");
            }
        }
    }

    /// Activates a tool by name, interrupting any gesture in progress.
    pub fn select_tool(&mut self, name: &str) -> Result<(), LabelError> {
        self.interrupt();
        self.tools.select_tool(name)
    }

    pub fn unselect_tools(&mut self) {
        self.interrupt();
        self.tools.unselect_all();
    }

    /// Routes an input event to the active tool and the selected
    /// annotation. Without either the event is ignored.
    pub fn dispatch(&mut self, event: &ToolEvent) -> Result<ToolOutcome, LabelError> {
        let Some(id) = self.selected else {
            return Ok(ToolOutcome::Ignored);
        };
        let Some(annotation) = self
            .annotations
            .iter_mut()
            .chain(&mut self.predictions)
            .find(|a| a.id() == id)
        else {
            return Ok(ToolOutcome::Ignored);
        };

        let mut ctx = ToolContext {
            annotation,
            viewport: &self.viewport,
            options: &self.options,
        };
        self.tools.event(event, &mut ctx)
    }

    /// Submits the selected annotation.
    pub fn submit(&mut self) -> Result<Vec<ResultEntry>, LabelError> {
        let annotation = self
            .selected_annotation_mut()
            .ok_or_else(|| LabelError::not_found("annotation", "selected"))?;
        annotation.submit()?;
        Ok(annotation.serialize())
    }

    /// Drops every annotation and tool state. The session can be reused
    /// for `task`.
    pub fn switch_task(&mut self, task: Task) {
        self.teardown();
        self.task = task;
    }

    pub fn teardown(&mut self) {
        self.interrupt();
        self.annotations.clear();
        self.predictions.clear();
        self.selected = None;
        tracing::debug!(task = %self.task.id, "session torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ControlSpec, ObjectTag, ResultType};

    fn config() -> LabelConfig {
        LabelConfig::default()
            .with_object("image", ObjectTag::Image)
            .with_control(
                ControlSpec::new("label", ResultType::RectangleLabels, "image")
                    .with_labels(&["Car"]),
            )
    }

    fn prediction() -> Vec<ResultEntry> {
        serialize::parse_result_document(
            r#"[{"id": "p1", "from_name": "label", "to_name": "image",
                 "type": "rectanglelabels",
                 "value": {"x": 1, "y": 1, "width": 5, "height": 5,
                           "rectanglelabels": ["Car"]}}]"#,
        )
        .expect("parse")
    }

    #[test]
    fn test_prediction_is_readonly_and_duplicable() {
        let mut session = Session::new(Task::new(TaskId::new(7)), config(), EngineOptions::default());
        let (pred, report) = session.add_prediction(&prediction());
        assert!(report.is_clean());

        let prediction = session.annotation(pred).expect("prediction");
        assert!(prediction.is_read_only());
        assert_eq!(prediction.regions()[0].origin, Origin::Prediction);

        let copy = session.duplicate_annotation(pred).expect("duplicate");
        let annotation = session.selected_annotation_mut().expect("selected");
        assert_eq!(annotation.id(), copy);
        assert!(!annotation.is_read_only());
        assert!(!annotation.can_undo());
    }

    #[test]
    fn test_dispatch_without_annotation_is_ignored() {
        let mut session = Session::new(Task::new(TaskId::new(1)), config(), EngineOptions::default());
        let outcome = session
            .dispatch(&ToolEvent::PointerDown(crate::model::Coord::new(1.0, 1.0)))
            .expect("dispatch");
        assert_eq!(outcome, ToolOutcome::Ignored);
    }

    #[test]
    fn test_teardown_clears_everything() {
        let mut session = Session::new(Task::new(TaskId::new(1)), config(), EngineOptions::default());
        session.create_annotation();
        session.add_prediction(&prediction());
        session.switch_task(Task::new(TaskId::new(2)));
        assert!(session.annotations().is_empty());
        assert!(session.predictions().is_empty());
        assert!(session.selected_annotation().is_none());
        assert_eq!(session.task().id, TaskId::new(2));
    }
}
