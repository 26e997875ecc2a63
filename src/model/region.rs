//! Regions: one annotated object and the results attached to it.

use super::ids::RegionId;
use super::result::{AreaResult, ControlValue, Origin, ResultType};
use super::shape::{Shape, ShapeKind, Transform};
use crate::error::LabelError;

/// One region of an annotation.
///
/// `readonly` comes from data (e.g. a reviewed prediction) while `locked`
/// is a user toggle; both block mutation and deletion. `hidden` only
/// affects rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub id: RegionId,
    pub shape: Shape,
    /// Object the region is drawn on (`to_name`).
    pub object: String,
    /// Control that drew the geometry, used to export regions with no
    /// label results.
    pub source: Option<String>,
    pub results: Vec<AreaResult>,
    pub origin: Origin,
    pub readonly: bool,
    pub locked: bool,
    pub hidden: bool,
    pub parent_id: Option<RegionId>,
    pub score: Option<f64>,
    /// Image size in pixels, required by brush masks.
    pub original_size: Option<(u32, u32)>,
    pub image_rotation: Option<f64>,
}

impl Region {
    pub fn new(id: RegionId, object: impl Into<String>, shape: Shape) -> Self {
        Self {
            id,
            shape,
            object: object.into(),
            source: None,
            results: Vec::new(),
            origin: Origin::Manual,
            readonly: false,
            locked: false,
            hidden: false,
            parent_id: None,
            score: None,
            original_size: None,
            image_rotation: None,
        }
    }

    pub fn with_result(mut self, result: AreaResult) -> Self {
        self.results.push(result);
        self
    }

    pub fn with_source(mut self, from_name: impl Into<String>) -> Self {
        self.source = Some(from_name.into());
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_parent(mut self, parent_id: RegionId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_original_size(mut self, width: u32, height: u32) -> Self {
        self.original_size = Some((width, height));
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// False for readonly or locked regions.
    pub fn is_mutable(&self) -> bool {
        !self.readonly && !self.locked
    }

    pub(crate) fn ensure_mutable(&self) -> Result<(), LabelError> {
        if self.readonly {
            return Err(LabelError::invalid(
                format!("region {}", self.id),
                "region is readonly",
            ));
        }
        if self.locked {
            return Err(LabelError::invalid(
                format!("region {}", self.id),
                "region is locked",
            ));
        }
        Ok(())
    }

    /// Applies a geometry delta. Editing a prediction marks it changed.
    pub fn apply(&mut self, transform: &Transform) -> Result<(), LabelError> {
        self.ensure_mutable()?;
        self.shape
            .apply(transform)
            .map_err(|reason| LabelError::invalid(format!("region {}", self.id), reason))?;
        self.origin = self.origin.after_edit();
        Ok(())
    }

    pub fn result(&self, from_name: &str) -> Option<&AreaResult> {
        self.results.iter().find(|r| r.from_name == from_name)
    }

    /// Sets (or replaces) the value `from_name` contributes to this region.
    pub fn set_result_value(
        &mut self,
        from_name: &str,
        result_type: ResultType,
        value: ControlValue,
    ) -> Result<(), LabelError> {
        self.ensure_mutable()?;
        if !value.fits(result_type) {
            return Err(LabelError::invalid(
                format!("region {}", self.id),
                format!("{value:?} is not a valid {result_type} value"),
            ));
        }

        match self.results.iter_mut().find(|r| r.from_name == from_name) {
            Some(existing) => {
                existing.result_type = result_type;
                existing.value = value;
            }
            None => self.results.push(AreaResult::new(
                from_name,
                self.object.clone(),
                result_type,
                value,
            )),
        }
        self.origin = self.origin.after_edit();
        Ok(())
    }

    /// Drops the result of `from_name`; returns whether one existed.
    pub fn remove_result(&mut self, from_name: &str) -> Result<bool, LabelError> {
        self.ensure_mutable()?;
        let before = self.results.len();
        self.results.retain(|r| r.from_name != from_name);
        let removed = self.results.len() != before;
        if removed {
            self.origin = self.origin.after_edit();
        }
        Ok(removed)
    }

    /// All label names across the region's label-carrying results.
    pub fn labels(&self) -> Vec<&str> {
        self.results
            .iter()
            .flat_map(|r| r.value.labels())
            .map(String::as_str)
            .collect()
    }
}
