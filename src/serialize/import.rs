//! Result array -> regions.
//!
//! Entries are grouped by `id` regardless of their position in the array;
//! each group becomes one region, in order of the group's first entry.
//! Entries that cannot be loaded are dropped one by one and reported, the
//! rest of the array still loads.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::wire::ResultEntry;
use crate::error::LabelError;
use crate::model::{
    AreaResult, Capability, ControlResolver, ControlValue, IdGenerator, Origin, Region, RegionId,
    ResultType, Shape, ShapeKind,
};
use crate::relations::{RelationMeta, RelationStore};
use crate::validation::{IssueCode, IssueContext, ValidationIssue, ValidationReport};

/// Regions and relations rebuilt from a result array.
#[derive(Debug, Default)]
pub struct Import {
    pub regions: Vec<Region>,
    pub relations: RelationStore,
    /// One [`LabelError::SerializationMismatch`] per dropped entry.
    pub mismatches: Vec<LabelError>,
    /// The same drops, as a report.
    pub report: ValidationReport,
}

impl Import {
    fn drop_entry(&mut self, index: usize, entry: &ResultEntry, code: IssueCode, reason: String) {
        tracing::debug!(
            index,
            id = entry.id.as_deref().unwrap_or(""),
            from_name = %entry.from_name,
            reason = %reason,
            "dropping result"
        );
        self.report.add(ValidationIssue::error(
            code,
            reason.clone(),
            IssueContext::Result {
                index,
                id: entry.id.clone(),
            },
        ));
        self.mismatches.push(LabelError::SerializationMismatch {
            id: entry.id.clone().unwrap_or_default(),
            from_name: entry.from_name.clone(),
            to_name: entry.to_name.clone(),
            reason,
        });
    }
}

/// An entry whose control resolved.
struct Resolved<'a> {
    index: usize,
    entry: &'a ResultEntry,
    result_type: ResultType,
    capability: Capability,
}

/// Rebuilds regions and relations from a result array.
pub fn from_results(entries: &[ResultEntry], resolver: &dyn ControlResolver) -> Import {
    let mut import = Import::default();
    let mut ids = IdGenerator::new();

    // Group by id, first occurrence order.
    let mut group_of: BTreeMap<String, usize> = BTreeMap::new();
    let mut groups: Vec<(RegionId, Vec<Resolved<'_>>)> = Vec::new();
    let mut relation_entries = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.is_relation() {
            relation_entries.push((index, entry));
            continue;
        }
        let Some(resolved) = resolve_entry(index, entry, resolver, &mut import) else {
            continue;
        };

        let slot = match &entry.id {
            Some(id) => *group_of.entry(id.clone()).or_insert_with(|| {
                groups.push((RegionId::new(id.clone()), Vec::new()));
                groups.len() - 1
            }),
            None => {
                groups.push((ids.next_region_id(), Vec::new()));
                groups.len() - 1
            }
        };
        groups[slot].1.push(resolved);
    }

    for (id, members) in groups {
        if let Some(region) = build_region(id, members, &mut import) {
            import.regions.push(region);
        }
    }

    for (index, entry) in relation_entries {
        load_relation(index, entry, &mut import);
    }

    import
}

fn resolve_entry<'a>(
    index: usize,
    entry: &'a ResultEntry,
    resolver: &dyn ControlResolver,
    import: &mut Import,
) -> Option<Resolved<'a>> {
    let Some(result_type) = ResultType::from_name(&entry.result_type) else {
        import.drop_entry(
            index,
            entry,
            IssueCode::UnknownResultType,
            format!("unknown result type '{}'", entry.result_type),
        );
        return None;
    };

    let Some(capability) = resolver.resolve(&entry.from_name, &entry.to_name) else {
        import.drop_entry(
            index,
            entry,
            IssueCode::UnresolvedControl,
            format!(
                "no control '{}' targeting object '{}'",
                entry.from_name, entry.to_name
            ),
        );
        return None;
    };

    if !capability.accepts(result_type) {
        import.drop_entry(
            index,
            entry,
            IssueCode::ControlTypeMismatch,
            format!(
                "control '{}' does not produce '{}' results",
                entry.from_name, result_type
            ),
        );
        return None;
    }

    Some(Resolved {
        index,
        entry,
        result_type,
        capability,
    })
}

/// Picks the entry that defines the region's geometry and its kind.
fn geometry_source(members: &[Resolved<'_>]) -> Option<(usize, ShapeKind)> {
    if let Some((pos, kind)) = members
        .iter()
        .enumerate()
        .find_map(|(pos, m)| m.result_type.shape_kind().map(|kind| (pos, kind)))
    {
        return Some((pos, kind));
    }

    // `labels` results and per-region results alone carry geometry whose
    // kind depends on the object.
    members
        .iter()
        .enumerate()
        .find(|(_, m)| m.result_type == ResultType::Labels)
        .or_else(|| members.first().map(|m| (0, m)))
        .map(|(pos, m)| {
            (
                pos,
                ShapeKind::infer(&m.entry.value, m.capability.object),
            )
        })
}

fn build_region(id: RegionId, members: Vec<Resolved<'_>>, import: &mut Import) -> Option<Region> {
    let (source_pos, kind) = geometry_source(&members)?;
    let source = &members[source_pos];

    let shape = match Shape::read_fields(kind, &source.entry.value, source.entry.original_size()) {
        Ok(shape) => shape,
        Err(reason) => {
            for member in &members {
                import.drop_entry(member.index, member.entry, IssueCode::InvalidValue, reason.clone());
            }
            return None;
        }
    };

    let mut region = Region::new(id, source.entry.to_name.clone(), shape);
    region.origin = source.entry.origin.unwrap_or(Origin::Manual);
    region.score = source.entry.score;
    region.original_size = source.entry.original_size();
    region.image_rotation = source.entry.image_rotation;
    region.parent_id = source.entry.parent_id.clone().map(RegionId::new);

    for member in members {
        let entry = member.entry;

        if let Some(other) = member.result_type.shape_kind() {
            if other != kind {
                import.drop_entry(
                    member.index,
                    entry,
                    IssueCode::ConflictingShapes,
                    format!(
                        "'{}' draws a {:?} but region {} is a {:?}",
                        member.result_type, other, region.id, kind
                    ),
                );
                continue;
            }
        }

        if entry.readonly == Some(true) {
            region.readonly = true;
        }
        if region.parent_id.is_none() {
            region.parent_id = entry.parent_id.clone().map(RegionId::new);
        }

        if member.result_type.is_geometry_only() {
            region.source.get_or_insert_with(|| entry.from_name.clone());
            continue;
        }

        // A textarea on a text span stores its value under `text`, which
        // is also the span's geometry key; the control value wins.
        let own_key = member.result_type.value_key();
        let mut value: Map<String, Value> = entry.value.clone();
        for key in kind.geometry_keys() {
            if Some(*key) != own_key {
                value.remove(*key);
            }
        }

        let control_value = match ControlValue::take(member.result_type, &mut value) {
            Ok(control_value) => control_value,
            Err(reason) => {
                import.drop_entry(member.index, entry, IssueCode::InvalidValue, reason);
                continue;
            }
        };

        region.results.push(AreaResult {
            from_name: entry.from_name.clone(),
            to_name: entry.to_name.clone(),
            result_type: member.result_type,
            value: control_value,
            extra_value: value,
            extra: entry.extra.clone(),
            score: entry.score,
        });
    }

    if region.results.is_empty() && region.source.is_none() {
        tracing::debug!(region = %region.id, "region has no loadable results");
        return None;
    }
    Some(region)
}

fn load_relation(index: usize, entry: &ResultEntry, import: &mut Import) {
    let (Some(from), Some(to)) = (&entry.from_id, &entry.to_id) else {
        tracing::debug!(index, "dropping relation without endpoints");
        return;
    };
    let from = RegionId::new(from.clone());
    let to = RegionId::new(to.clone());

    let present = |id: &RegionId| import.regions.iter().any(|r| &r.id == id);
    if !present(&from) || !present(&to) {
        tracing::debug!(index, %from, %to, "dropping relation to a missing region");
        return;
    }

    let meta = RelationMeta {
        direction: entry.direction.unwrap_or_default(),
        labels: entry.labels.clone().unwrap_or_default(),
        note: entry.note.clone(),
        extra: entry.extra.clone(),
    };
    if let Err(err) = import.relations.add(from, to, meta) {
        tracing::debug!(index, error = %err, "dropping relation");
    }
}
