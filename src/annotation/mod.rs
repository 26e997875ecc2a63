//! The annotation aggregate and the session that owns annotations.
//!
//! An [`Annotation`] is the single owner of its regions and relations.
//! Every mutation goes through one of its methods, bumps [`version`] and,
//! outside of a gesture, records a history snapshot.
//!
//! [`version`]: Annotation::version

mod session;

pub use session::{Session, Task};

use crate::config::EngineOptions;
use crate::error::LabelError;
use crate::history::History;
use crate::model::{
    toggle_flat, AnnotationId, AreaResult, ChoiceSelection, ChoiceTree, ControlResolver,
    ControlSpec, ControlValue, IdGenerator, Region, RegionId, RelationId, ResultType, Shape,
    Transform,
};
use crate::relations::{Relation, RelationDirection, RelationMeta, RelationStore};
use crate::serialize::{self, Import, ResultEntry};
use crate::validation::ValidationReport;

/// State captured by one history entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    regions: Vec<Region>,
    relations: Vec<Relation>,
    selected: Option<RegionId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Draft,
    Submitted,
}

/// What a click on a region did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Selected(Option<RegionId>),
    Related(RelationId),
}

#[derive(Clone, Debug)]
struct Gesture {
    before: Snapshot,
    version: u64,
}

/// One labeling attempt on a task.
#[derive(Clone, Debug)]
pub struct Annotation {
    id: AnnotationId,
    regions: Vec<Region>,
    relations: RelationStore,
    selected: Option<RegionId>,
    relation_mode: bool,
    readonly: bool,
    state: SubmissionState,
    history: History<Snapshot>,
    gesture: Option<Gesture>,
    version: u64,
    ids: IdGenerator,
}

impl Annotation {
    pub fn new(id: AnnotationId, options: &EngineOptions) -> Self {
        let empty = Snapshot {
            regions: Vec::new(),
            relations: Vec::new(),
            selected: None,
        };
        Self {
            id,
            regions: Vec::new(),
            relations: RelationStore::new(),
            selected: None,
            relation_mode: false,
            readonly: false,
            state: SubmissionState::Draft,
            history: History::new(empty, options.history_limit),
            gesture: None,
            version: 0,
            ids: IdGenerator::new(),
        }
    }

    /// Uses a deterministic id generator for new regions.
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// An annotation holding the result of an import, with a fresh history.
    pub fn from_import(id: AnnotationId, import: Import, options: &EngineOptions) -> Self {
        let mut annotation = Self::new(id, options);
        annotation.load(import);
        annotation
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| &r.id == id)
    }

    pub fn relations(&self) -> &RelationStore {
        &self.relations
    }

    pub fn selected(&self) -> Option<&RegionId> {
        self.selected.as_ref()
    }

    pub fn selected_region(&self) -> Option<&Region> {
        self.selected.as_ref().and_then(|id| self.region(id))
    }

    pub fn is_read_only(&self) -> bool {
        self.readonly
    }

    pub fn set_read_only(&mut self, readonly: bool) {
        self.readonly = readonly;
        self.version += 1;
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Bumped by every applied change, including selection changes.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn relation_mode(&self) -> bool {
        self.relation_mode
    }

    pub fn in_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn next_region_id(&mut self) -> RegionId {
        loop {
            let id = self.ids.next_region_id();
            if self.region(&id).is_none() {
                return id;
            }
        }
    }

    // ========================================================================
    // Regions
    // ========================================================================

    /// Adds a region. Rejected outright on a readonly annotation.
    pub fn add_region(&mut self, region: Region) -> Result<RegionId, LabelError> {
        self.ensure_writable()?;
        if self.region(&region.id).is_some() {
            return Err(LabelError::invalid(
                format!("annotation {}", self.id),
                format!("region id {} is already in use", region.id),
            ));
        }
        let id = region.id.clone();
        self.regions.push(region);
        self.commit();
        Ok(id)
    }

    /// Creates a region with a fresh id.
    pub fn create_region(
        &mut self,
        object: impl Into<String>,
        shape: Shape,
        results: Vec<AreaResult>,
    ) -> Result<RegionId, LabelError> {
        self.ensure_writable()?;
        let mut region = Region::new(self.next_region_id(), object, shape);
        region.results = results;
        self.add_region(region)
    }

    /// Deletes a region together with every relation touching it. Child
    /// regions keep existing with their parent link cleared.
    pub fn delete_region(&mut self, id: &RegionId) -> Result<(), LabelError> {
        self.ensure_writable()?;
        let idx = self.index_of(id)?;
        self.regions[idx].ensure_mutable()?;

        let region = self.regions.remove(idx);
        self.detach(&region.id);
        tracing::debug!(region = %region.id, "deleted region");
        self.commit();
        Ok(())
    }

    /// Deletes every region that is neither readonly nor locked. Needs an
    /// explicit confirmation from the caller.
    pub fn delete_all_regions(&mut self, confirm: bool) -> Result<usize, LabelError> {
        if !confirm {
            return Err(LabelError::ConfirmationRequired(format!(
                "deleting all regions of annotation {}",
                self.id
            )));
        }
        self.ensure_writable()?;

        let (keep, removed): (Vec<Region>, Vec<Region>) =
            self.regions.drain(..).partition(|r| !r.is_mutable());
        self.regions = keep;
        for region in &removed {
            self.detach(&region.id);
        }
        if !removed.is_empty() {
            self.commit();
        }
        Ok(removed.len())
    }

    /// Drops relations, parent links and selection pointing at a removed
    /// region.
    fn detach(&mut self, id: &RegionId) {
        let dropped = self.relations.remove_for_region(id);
        if dropped > 0 {
            tracing::debug!(region = %id, dropped, "removed relations of deleted region");
        }
        for region in &mut self.regions {
            if region.parent_id.as_ref() == Some(id) {
                region.parent_id = None;
            }
        }
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
            self.relation_mode = false;
        }
    }

    pub fn update_region(&mut self, id: &RegionId, transform: &Transform) -> Result<(), LabelError> {
        self.ensure_writable()?;
        let idx = self.index_of(id)?;
        self.regions[idx].apply(transform)?;
        self.commit();
        Ok(())
    }

    pub fn set_result_value(
        &mut self,
        id: &RegionId,
        from_name: &str,
        result_type: ResultType,
        value: ControlValue,
    ) -> Result<(), LabelError> {
        self.ensure_writable()?;
        let idx = self.index_of(id)?;
        self.regions[idx].set_result_value(from_name, result_type, value)?;
        self.commit();
        Ok(())
    }

    pub fn remove_result(&mut self, id: &RegionId, from_name: &str) -> Result<bool, LabelError> {
        self.ensure_writable()?;
        let idx = self.index_of(id)?;
        let removed = self.regions[idx].remove_result(from_name)?;
        if removed {
            self.commit();
        }
        Ok(removed)
    }

    /// Toggles one label of a label-carrying control on a region.
    pub fn toggle_label(
        &mut self,
        id: &RegionId,
        control: &ControlSpec,
        label: &str,
    ) -> Result<(), LabelError> {
        if !control.tag.carries_labels() {
            return Err(LabelError::invalid(
                format!("control {}", control.name),
                format!("'{}' controls carry no labels", control.tag),
            ));
        }
        if !control.labels.is_empty() && !control.labels.iter().any(|l| l == label) {
            return Err(LabelError::invalid(
                format!("control {}", control.name),
                format!("unknown label '{label}'"),
            ));
        }
        self.ensure_writable()?;
        let idx = self.index_of(id)?;

        let current: Vec<String> = self.regions[idx]
            .result(&control.name)
            .map(|r| r.value.labels().to_vec())
            .unwrap_or_default();
        let next = toggle_flat(&current, label, control.multiple);
        self.regions[idx].set_result_value(&control.name, control.tag, ControlValue::Labels(next))?;
        self.commit();
        Ok(())
    }

    /// Toggles a choice of a `choices` or `taxonomy` control.
    ///
    /// With `region` the choice is a per-region result of that region.
    /// Without it the choice belongs to the annotation's classification
    /// region for this control, which is created on first selection and
    /// removed once nothing is selected.
    pub fn toggle_choice(
        &mut self,
        region: Option<&RegionId>,
        control: &ControlSpec,
        value: &str,
    ) -> Result<(), LabelError> {
        if !matches!(control.tag, ResultType::Choices | ResultType::Taxonomy) {
            return Err(LabelError::invalid(
                format!("control {}", control.name),
                format!("'{}' controls have no choices", control.tag),
            ));
        }
        let tree = ChoiceTree::new(&control.choices);
        if !control.choices.is_empty() && tree.path_of(value).is_none() {
            return Err(LabelError::invalid(
                format!("control {}", control.name),
                format!("unknown choice '{value}'"),
            ));
        }
        self.ensure_writable()?;

        let idx = match region {
            Some(id) => Some(self.index_of(id)?),
            None => self.regions.iter().position(|r| {
                matches!(r.shape, Shape::Classification) && r.result(&control.name).is_some()
            }),
        };
        if let Some(idx) = idx {
            self.regions[idx].ensure_mutable()?;
        }

        let current = idx
            .and_then(|idx| self.regions[idx].result(&control.name))
            .map(|r| r.value.clone());
        let next = next_choice_value(control, &tree, current.as_ref(), value);

        match (idx, next) {
            (Some(idx), Some(next)) => {
                self.regions[idx].set_result_value(&control.name, control.tag, next)?;
            }
            (Some(idx), None) => {
                self.regions[idx].remove_result(&control.name)?;
                let region = &self.regions[idx];
                if region.results.is_empty() && matches!(region.shape, Shape::Classification) {
                    let removed = self.regions.remove(idx);
                    self.detach(&removed.id);
                }
            }
            (None, Some(next)) => {
                let region = Region::new(self.next_region_id(), control.to_name.clone(), Shape::Classification)
                    .with_result(AreaResult::new(
                        control.name.clone(),
                        control.to_name.clone(),
                        control.tag,
                        next,
                    ));
                self.regions.push(region);
            }
            (None, None) => return Ok(()),
        }
        self.commit();
        Ok(())
    }

    pub fn set_region_locked(&mut self, id: &RegionId, locked: bool) -> Result<(), LabelError> {
        self.ensure_writable()?;
        let idx = self.index_of(id)?;
        if self.regions[idx].locked != locked {
            self.regions[idx].locked = locked;
            self.commit();
        }
        Ok(())
    }

    pub fn set_region_readonly(&mut self, id: &RegionId, readonly: bool) -> Result<(), LabelError> {
        self.ensure_writable()?;
        let idx = self.index_of(id)?;
        if self.regions[idx].readonly != readonly {
            self.regions[idx].readonly = readonly;
            self.commit();
        }
        Ok(())
    }

    /// Visibility is a view concern: allowed on readonly data and not
    /// recorded in history.
    pub fn set_region_hidden(&mut self, id: &RegionId, hidden: bool) -> Result<(), LabelError> {
        let idx = self.index_of(id)?;
        self.regions[idx].hidden = hidden;
        self.version += 1;
        Ok(())
    }

    // ========================================================================
    // Selection and relation mode
    // ========================================================================

    /// Selects one region (or none). The previous selection is replaced in
    /// the same step.
    pub fn select_region(&mut self, id: Option<&RegionId>) -> Result<(), LabelError> {
        if let Some(id) = id {
            self.index_of(id)?;
        }
        if self.selected.as_ref() != id {
            self.selected = id.cloned();
            self.version += 1;
        }
        Ok(())
    }

    /// The next region click links the selected region to the clicked one.
    pub fn start_relation_mode(&mut self) -> Result<(), LabelError> {
        self.ensure_writable()?;
        if self.selected.is_none() {
            return Err(LabelError::invalid(
                format!("annotation {}", self.id),
                "relation mode needs a selected region",
            ));
        }
        self.relation_mode = true;
        self.version += 1;
        Ok(())
    }

    pub fn stop_relation_mode(&mut self) {
        if self.relation_mode {
            self.relation_mode = false;
            self.version += 1;
        }
    }

    /// A click on a region: completes a relation in relation mode,
    /// otherwise toggles its selection.
    pub fn click_region(&mut self, id: &RegionId) -> Result<ClickOutcome, LabelError> {
        self.index_of(id)?;

        if self.relation_mode {
            let from = self
                .selected
                .clone()
                .ok_or_else(|| LabelError::invalid("relation mode", "no region selected"))?;
            let relation = self.add_relation(&from, id, RelationMeta::default())?;
            self.relation_mode = false;
            return Ok(ClickOutcome::Related(relation));
        }

        if self.selected.as_ref() == Some(id) {
            self.select_region(None)?;
            Ok(ClickOutcome::Selected(None))
        } else {
            self.select_region(Some(id))?;
            Ok(ClickOutcome::Selected(Some(id.clone())))
        }
    }

    // ========================================================================
    // Relations
    // ========================================================================

    pub fn add_relation(
        &mut self,
        from: &RegionId,
        to: &RegionId,
        meta: RelationMeta,
    ) -> Result<RelationId, LabelError> {
        self.ensure_writable()?;
        for endpoint in [from, to] {
            if self.region(endpoint).is_none() {
                return Err(LabelError::RelationIntegrity {
                    from: from.to_string(),
                    to: to.to_string(),
                    reason: format!("region {endpoint} does not exist"),
                });
            }
        }
        let id = self.relations.add(from.clone(), to.clone(), meta)?;
        self.commit();
        Ok(id)
    }

    pub fn remove_relation(&mut self, id: RelationId) -> Result<(), LabelError> {
        self.ensure_writable()?;
        self.relations
            .remove(id)
            .ok_or_else(|| LabelError::not_found("relation", id))?;
        self.commit();
        Ok(())
    }

    pub fn rotate_relation_direction(
        &mut self,
        id: RelationId,
    ) -> Result<RelationDirection, LabelError> {
        self.ensure_writable()?;
        let direction = self.relations.rotate_direction(id)?;
        self.commit();
        Ok(direction)
    }

    pub fn set_relation_labels(
        &mut self,
        id: RelationId,
        labels: Vec<String>,
    ) -> Result<(), LabelError> {
        self.ensure_writable()?;
        self.relations.set_labels(id, labels)?;
        self.commit();
        Ok(())
    }

    pub fn set_relation_note(
        &mut self,
        id: RelationId,
        note: Option<String>,
    ) -> Result<(), LabelError> {
        self.ensure_writable()?;
        self.relations.set_note(id, note)?;
        self.commit();
        Ok(())
    }

    /// Flips the relation list view order. Not recorded in history.
    pub fn toggle_relation_order(&mut self) {
        self.relations.toggle_order();
        self.version += 1;
    }

    // ========================================================================
    // Gestures and history
    // ========================================================================

    /// Opens a gesture: mutations until [`end_gesture`] form one history
    /// entry. Only one gesture can be open at a time.
    ///
    /// [`end_gesture`]: Annotation::end_gesture
    pub fn begin_gesture(&mut self) -> Result<(), LabelError> {
        self.ensure_writable()?;
        if self.gesture.is_some() {
            return Err(LabelError::invalid(
                format!("annotation {}", self.id),
                "another gesture is in progress",
            ));
        }
        self.gesture = Some(Gesture {
            before: self.snapshot(),
            version: self.version,
        });
        Ok(())
    }

    /// Closes the gesture; returns whether it recorded a history entry.
    pub fn end_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        if gesture.version == self.version {
            return false;
        }
        self.record()
    }

    /// Aborts the gesture and restores the state from before it.
    pub fn cancel_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        if gesture.version != self.version {
            self.apply_snapshot(gesture.before);
            self.version += 1;
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.readonly && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.readonly && self.history.can_redo()
    }

    /// Steps back one entry. An open gesture is cancelled first. Returns
    /// false when there is nothing to undo or the annotation is readonly.
    pub fn undo(&mut self) -> bool {
        if self.readonly {
            return false;
        }
        self.cancel_gesture();
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        tracing::debug!(annotation = %self.id, "undo");
        self.apply_snapshot(snapshot);
        self.version += 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.readonly {
            return false;
        }
        self.cancel_gesture();
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        tracing::debug!(annotation = %self.id, "redo");
        self.apply_snapshot(snapshot);
        self.version += 1;
        true
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    pub fn serialize(&self) -> Vec<ResultEntry> {
        serialize::to_results(self)
    }

    /// Replaces all regions and relations with those loaded from a result
    /// array and starts a new history. Dropped entries are reported.
    pub fn restore(
        &mut self,
        entries: &[ResultEntry],
        resolver: &dyn ControlResolver,
    ) -> ValidationReport {
        let mut import = serialize::from_results(entries, resolver);
        let report = std::mem::take(&mut import.report);
        self.load(import);
        report
    }

    fn load(&mut self, import: Import) {
        self.gesture = None;
        self.regions = import.regions;
        self.relations.replace(import.relations.snapshot());
        self.selected = None;
        self.relation_mode = false;
        self.history.reset(self.snapshot());
        self.version += 1;
    }

    /// Marks the annotation submitted.
    pub fn submit(&mut self) -> Result<(), LabelError> {
        self.ensure_writable()?;
        if self.gesture.is_some() {
            return Err(LabelError::invalid(
                format!("annotation {}", self.id),
                "cannot submit during a gesture",
            ));
        }
        self.state = SubmissionState::Submitted;
        self.version += 1;
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_writable(&self) -> Result<(), LabelError> {
        if self.readonly {
            return Err(LabelError::invalid(
                format!("annotation {}", self.id),
                "annotation is readonly",
            ));
        }
        Ok(())
    }

    fn index_of(&self, id: &RegionId) -> Result<usize, LabelError> {
        self.regions
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| LabelError::not_found("region", id))
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            regions: self.regions.clone(),
            relations: self.relations.snapshot(),
            selected: self.selected.clone(),
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.regions = snapshot.regions;
        self.relations.replace(snapshot.relations);
        self.selected = snapshot
            .selected
            .filter(|id| self.regions.iter().any(|r| &r.id == id));
        self.relation_mode = false;
    }

    /// Marks a change; outside a gesture it also lands in history.
    fn commit(&mut self) {
        self.version += 1;
        if self.gesture.is_none() {
            self.record();
        }
    }

    fn record(&mut self) -> bool {
        let pushed = self.history.push(self.snapshot());
        if pushed {
            tracing::debug!(
                annotation = %self.id,
                regions = self.regions.len(),
                "history entry recorded"
            );
        }
        pushed
    }
}

/// The value a choice control holds after toggling `value`, or `None` when
/// nothing stays selected.
fn next_choice_value(
    control: &ControlSpec,
    tree: &ChoiceTree<'_>,
    current: Option<&ControlValue>,
    value: &str,
) -> Option<ControlValue> {
    let nested = control.tag == ResultType::Taxonomy || tree.is_nested();

    if nested {
        let paths: Vec<Vec<String>> = match current {
            Some(ControlValue::Taxonomy(paths)) => paths.clone(),
            Some(ControlValue::Choices(ChoiceSelection::Nested(paths))) => paths.clone(),
            Some(ControlValue::Choices(ChoiceSelection::Flat(flat))) => {
                flat.iter().map(|v| vec![v.clone()]).collect()
            }
            _ => Vec::new(),
        };
        let next = tree.toggle(&paths, value);
        if next.is_empty() {
            return None;
        }
        return Some(if control.tag == ResultType::Taxonomy {
            ControlValue::Taxonomy(next)
        } else {
            ControlValue::Choices(ChoiceSelection::Nested(next))
        });
    }

    let flat: Vec<String> = match current {
        Some(ControlValue::Choices(ChoiceSelection::Flat(flat))) => flat.clone(),
        _ => Vec::new(),
    };
    let next = toggle_flat(&flat, value, control.multiple);
    (!next.is_empty()).then_some(ControlValue::Choices(ChoiceSelection::Flat(next)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChoiceNode, RectGeometry};

    fn annotation() -> Annotation {
        Annotation::new(AnnotationId::new(1), &EngineOptions::default())
            .with_id_generator(IdGenerator::seeded(1))
    }

    fn rect(x: f64) -> Shape {
        Shape::Rectangle(RectGeometry::new(x, 10.0, 20.0, 20.0))
    }

    #[test]
    fn test_draw_then_undo() {
        let mut ann = annotation();
        ann.create_region("image", rect(10.0), vec![]).expect("create");
        assert_eq!(ann.regions().len(), 1);
        assert!(ann.undo());
        assert!(ann.regions().is_empty());
        assert!(!ann.undo());
    }

    #[test]
    fn test_gesture_coalesces_into_one_entry() {
        let mut ann = annotation();
        ann.begin_gesture().expect("begin");
        let id = ann.create_region("image", rect(10.0), vec![]).expect("create");
        for step in 0..5 {
            ann.update_region(&id, &Transform::Translate { dx: step as f64, dy: 0.0 })
                .expect("move");
        }
        assert!(ann.end_gesture());
        assert!(ann.undo());
        assert!(ann.regions().is_empty());
        assert!(!ann.can_undo());
    }

    #[test]
    fn test_cancel_gesture_restores_state() {
        let mut ann = annotation();
        let id = ann.create_region("image", rect(10.0), vec![]).expect("create");
        let before = ann.serialize();
        ann.begin_gesture().expect("begin");
        ann.update_region(&id, &Transform::Translate { dx: 3.0, dy: 3.0 })
            .expect("move");
        assert!(ann.cancel_gesture());
        assert_eq!(ann.serialize(), before);
        assert!(!ann.can_redo());
    }

    #[test]
    fn test_readonly_annotation_rejects_creation() {
        let mut ann = annotation();
        ann.set_read_only(true);
        assert!(matches!(
            ann.create_region("image", rect(10.0), vec![]),
            Err(LabelError::InvalidMutation { .. })
        ));
        assert!(ann.regions().is_empty());
        assert!(ann.begin_gesture().is_err());
    }

    #[test]
    fn test_delete_all_needs_confirmation() {
        let mut ann = annotation();
        ann.create_region("image", rect(10.0), vec![]).expect("a");
        let locked = ann.create_region("image", rect(50.0), vec![]).expect("b");
        ann.set_region_locked(&locked, true).expect("lock");

        assert!(matches!(
            ann.delete_all_regions(false),
            Err(LabelError::ConfirmationRequired(_))
        ));
        assert_eq!(ann.delete_all_regions(true).expect("delete"), 1);
        assert_eq!(ann.regions().len(), 1);
        assert_eq!(ann.regions()[0].id, locked);
    }

    #[test]
    fn test_delete_clears_parent_links_and_selection() {
        let mut ann = annotation();
        let parent = ann.create_region("image", rect(10.0), vec![]).expect("parent");
        let child_id = ann.next_region_id();
        let child = Region::new(child_id.clone(), "image", rect(40.0)).with_parent(parent.clone());
        ann.add_region(child).expect("child");
        ann.select_region(Some(&parent)).expect("select");

        ann.delete_region(&parent).expect("delete");
        assert_eq!(ann.selected(), None);
        assert_eq!(ann.region(&child_id).and_then(|r| r.parent_id.clone()), None);
    }

    #[test]
    fn test_relation_mode_click_completes_relation() {
        let mut ann = annotation();
        let a = ann.create_region("image", rect(10.0), vec![]).expect("a");
        let b = ann.create_region("image", rect(50.0), vec![]).expect("b");

        assert!(ann.start_relation_mode().is_err());
        ann.select_region(Some(&a)).expect("select");
        ann.start_relation_mode().expect("mode");
        let outcome = ann.click_region(&b).expect("click");
        assert!(matches!(outcome, ClickOutcome::Related(_)));
        assert!(!ann.relation_mode());
        assert_eq!(ann.relations().len(), 1);
        assert_eq!(ann.selected(), Some(&a));

        // Back to normal selection semantics.
        assert_eq!(
            ann.click_region(&b).expect("click"),
            ClickOutcome::Selected(Some(b.clone()))
        );
    }

    #[test]
    fn test_failed_relation_click_stays_in_relation_mode() {
        let mut ann = annotation();
        let a = ann.create_region("image", rect(10.0), vec![]).expect("a");
        let b = ann.create_region("image", rect(50.0), vec![]).expect("b");
        ann.select_region(Some(&a)).expect("select");

        ann.start_relation_mode().expect("mode");
        assert!(matches!(
            ann.click_region(&a),
            Err(LabelError::RelationIntegrity { .. })
        ));
        assert!(ann.relation_mode());

        ann.click_region(&b).expect("relate");
        ann.start_relation_mode().expect("mode again");
        assert!(ann.click_region(&b).is_err());
        assert!(ann.relation_mode());
        assert_eq!(ann.relations().len(), 1);
    }

    #[test]
    fn test_annotation_level_choices_create_and_remove_region() {
        let mut ann = annotation();
        let control = ControlSpec::new("sentiment", ResultType::Choices, "text")
            .with_choices(vec![ChoiceNode::leaf("Positive"), ChoiceNode::leaf("Negative")]);

        ann.toggle_choice(None, &control, "Positive").expect("select");
        assert_eq!(ann.regions().len(), 1);
        ann.toggle_choice(None, &control, "Negative").expect("switch");
        assert_eq!(
            ann.regions()[0].result("sentiment").map(|r| &r.value),
            Some(&ControlValue::Choices(ChoiceSelection::Flat(vec![
                "Negative".to_string()
            ])))
        );
        ann.toggle_choice(None, &control, "Negative").expect("clear");
        assert!(ann.regions().is_empty());
        assert!(ann.toggle_choice(None, &control, "Neutral").is_err());
    }

    #[test]
    fn test_toggle_label_single_choice() {
        let mut ann = annotation();
        let control = ControlSpec::new("label", ResultType::RectangleLabels, "image")
            .with_labels(&["Car", "Bus"]);
        let id = ann.create_region("image", rect(10.0), vec![]).expect("create");
        ann.toggle_label(&id, &control, "Car").expect("car");
        ann.toggle_label(&id, &control, "Bus").expect("bus");
        assert_eq!(ann.region(&id).expect("region").labels(), vec!["Bus"]);
        assert!(ann.toggle_label(&id, &control, "Tram").is_err());
    }

    #[test]
    fn test_undo_restores_selection() {
        let mut ann = annotation();
        let a = ann.create_region("image", rect(10.0), vec![]).expect("a");
        ann.select_region(Some(&a)).expect("select");
        ann.update_region(&a, &Transform::Translate { dx: 1.0, dy: 0.0 })
            .expect("move");
        ann.select_region(None).expect("deselect");
        ann.update_region(&a, &Transform::Translate { dx: 1.0, dy: 0.0 })
            .expect("move");

        assert!(ann.undo());
        assert_eq!(ann.selected(), Some(&a));
    }
}
