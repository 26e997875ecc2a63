//! Directed links between regions of one annotation.
//!
//! The store keeps relations in insertion order. The ascending/descending
//! toggle only changes the view returned by [`RelationStore::ordered`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LabelError;
use crate::model::{RegionId, RelationId};

/// Arrow direction as exported in relation results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationDirection {
    #[default]
    Right,
    Left,
    Bi,
}

impl RelationDirection {
    /// right -> left -> bi -> right.
    pub fn rotate(self) -> Self {
        match self {
            RelationDirection::Right => RelationDirection::Left,
            RelationDirection::Left => RelationDirection::Bi,
            RelationDirection::Bi => RelationDirection::Right,
        }
    }
}

/// Optional metadata attached when a relation is created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationMeta {
    pub direction: RelationDirection,
    pub labels: Vec<String>,
    pub note: Option<String>,
    /// Unknown fields of an imported relation entry, written back on export.
    pub extra: Map<String, Value>,
}

impl RelationMeta {
    pub fn labeled(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    pub id: RelationId,
    pub from: RegionId,
    pub to: RegionId,
    pub direction: RelationDirection,
    pub labels: Vec<String>,
    pub note: Option<String>,
    pub extra: Map<String, Value>,
}

impl Relation {
    pub fn touches(&self, region: &RegionId) -> bool {
        &self.from == region || &self.to == region
    }
}

/// Sort order of the relation list view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RelationOrder {
    /// Insertion order.
    #[default]
    Descending,
    /// Newest first.
    Ascending,
}

impl RelationOrder {
    pub fn toggled(self) -> Self {
        match self {
            RelationOrder::Descending => RelationOrder::Ascending,
            RelationOrder::Ascending => RelationOrder::Descending,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationStore {
    relations: Vec<Relation>,
    next_id: u64,
    order: RelationOrder,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Relations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    pub fn get(&self, id: RelationId) -> Option<&Relation> {
        self.relations.iter().find(|r| r.id == id)
    }

    pub fn find(&self, from: &RegionId, to: &RegionId) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|r| &r.from == from && &r.to == to)
    }

    /// Adds `from -> to`. Self-loops and exact duplicates are rejected.
    ///
    /// The store does not know which regions exist; callers check that
    /// both endpoints are present first.
    pub fn add(
        &mut self,
        from: RegionId,
        to: RegionId,
        meta: RelationMeta,
    ) -> Result<RelationId, LabelError> {
        if from == to {
            return Err(LabelError::RelationIntegrity {
                from: from.to_string(),
                to: to.to_string(),
                reason: "a region cannot relate to itself".to_string(),
            });
        }
        if self.find(&from, &to).is_some() {
            return Err(LabelError::RelationIntegrity {
                from: from.to_string(),
                to: to.to_string(),
                reason: "relation already exists".to_string(),
            });
        }

        self.next_id += 1;
        let id = RelationId::new(self.next_id);
        self.relations.push(Relation {
            id,
            from,
            to,
            direction: meta.direction,
            labels: meta.labels,
            note: meta.note,
            extra: meta.extra,
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: RelationId) -> Option<Relation> {
        let idx = self.relations.iter().position(|r| r.id == id)?;
        Some(self.relations.remove(idx))
    }

    /// Removes every relation touching `region`; returns how many.
    pub fn remove_for_region(&mut self, region: &RegionId) -> usize {
        let before = self.relations.len();
        self.relations.retain(|r| !r.touches(region));
        before - self.relations.len()
    }

    pub fn order(&self) -> RelationOrder {
        self.order
    }

    pub fn toggle_order(&mut self) {
        self.order = self.order.toggled();
    }

    /// The relation list as shown to the user.
    pub fn ordered(&self) -> Vec<&Relation> {
        self.ordered_by(self.order)
    }

    pub fn ordered_by(&self, order: RelationOrder) -> Vec<&Relation> {
        match order {
            RelationOrder::Descending => self.relations.iter().collect(),
            RelationOrder::Ascending => self.relations.iter().rev().collect(),
        }
    }

    pub fn rotate_direction(&mut self, id: RelationId) -> Result<RelationDirection, LabelError> {
        let relation = self.get_mut(id)?;
        relation.direction = relation.direction.rotate();
        Ok(relation.direction)
    }

    pub fn set_labels(&mut self, id: RelationId, labels: Vec<String>) -> Result<(), LabelError> {
        self.get_mut(id)?.labels = labels;
        Ok(())
    }

    pub fn set_note(&mut self, id: RelationId, note: Option<String>) -> Result<(), LabelError> {
        self.get_mut(id)?.note = note;
        Ok(())
    }

    /// A copy of the stored relations, for history snapshots.
    pub(crate) fn snapshot(&self) -> Vec<Relation> {
        self.relations.clone()
    }

    /// Replaces the stored relations, keeping the view order. Ids handed
    /// out later never collide with restored ones.
    pub(crate) fn replace(&mut self, relations: Vec<Relation>) {
        let max_id = relations.iter().map(|r| r.id.as_u64()).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id);
        self.relations = relations;
    }

    fn get_mut(&mut self, id: RelationId) -> Result<&mut Relation, LabelError> {
        self.relations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| LabelError::not_found("relation", id))
    }
}
