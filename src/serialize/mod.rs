//! Conversion between annotations and the portable result array.
//!
//! Export writes one entry per result, each carrying the region's id and a
//! copy of its geometry fields inside `value`; regions without results are
//! written as a single geometry-only entry. Relations follow the regions as
//! `type: "relation"` entries. Import is the inverse, see [`from_results`].

mod import;
mod wire;

pub use import::{from_results, Import};
pub use wire::{ResultEntry, RELATION_TYPE};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde_json::Map;

use crate::annotation::Annotation;
use crate::error::LabelError;
use crate::model::{Region, ResultType};
use crate::relations::{Relation, RelationStore};
use wire::ResultDocument;

// ============================================================================
// Export
// ============================================================================

/// Serializes an annotation to its result array.
pub fn to_results(annotation: &Annotation) -> Vec<ResultEntry> {
    regions_to_results(annotation.regions(), annotation.relations())
}

/// Serializes regions and relations in order.
pub fn regions_to_results(regions: &[Region], relations: &RelationStore) -> Vec<ResultEntry> {
    let mut out = Vec::with_capacity(regions.len() + relations.len());
    for region in regions {
        region_to_entries(region, &mut out);
    }
    out.extend(relations.iter().map(relation_to_entry));
    out
}

fn region_to_entries(region: &Region, out: &mut Vec<ResultEntry>) {
    let mut geometry = Map::new();
    region.shape.write_fields(&mut geometry);

    let base = ResultEntry {
        id: Some(region.id.to_string()),
        to_name: region.object.clone(),
        origin: Some(region.origin),
        readonly: region.readonly.then_some(true),
        parent_id: region.parent_id.as_ref().map(|p| p.to_string()),
        original_width: region.original_size.map(|(w, _)| w),
        original_height: region.original_size.map(|(_, h)| h),
        image_rotation: region.image_rotation,
        ..ResultEntry::default()
    };

    if region.results.is_empty() {
        let geometry_type = ResultType::geometry_type_for(region.kind());
        match (geometry_type, &region.source) {
            (Some(result_type), Some(source)) => out.push(ResultEntry {
                from_name: source.clone(),
                result_type: result_type.name().to_string(),
                value: geometry,
                score: region.score,
                ..base
            }),
            _ => tracing::debug!(region = %region.id, "region has nothing to export"),
        }
        return;
    }

    for result in &region.results {
        let mut value = geometry.clone();
        value.extend(result.extra_value.clone());
        result.value.write(result.result_type, &mut value);

        out.push(ResultEntry {
            from_name: result.from_name.clone(),
            to_name: result.to_name.clone(),
            result_type: result.result_type.name().to_string(),
            value,
            score: result.score,
            extra: result.extra.clone(),
            ..base.clone()
        });
    }
}

fn relation_to_entry(relation: &Relation) -> ResultEntry {
    ResultEntry {
        result_type: RELATION_TYPE.to_string(),
        from_id: Some(relation.from.to_string()),
        to_id: Some(relation.to.to_string()),
        direction: Some(relation.direction),
        labels: (!relation.labels.is_empty()).then(|| relation.labels.clone()),
        note: relation.note.clone(),
        extra: relation.extra.clone(),
        ..ResultEntry::default()
    }
}

// ============================================================================
// Documents and files
// ============================================================================

/// Parses a result array from a string: a bare array or `{"result": [...]}`.
pub fn parse_result_document(json: &str) -> Result<Vec<ResultEntry>, LabelError> {
    let doc: ResultDocument =
        serde_json::from_str(json).map_err(|source| LabelError::ResultJsonParse {
            path: Path::new("<string>").to_path_buf(),
            source,
        })?;
    Ok(doc.into_entries())
}

/// Parses a result array from bytes.
pub fn parse_result_slice(bytes: &[u8]) -> Result<Vec<ResultEntry>, LabelError> {
    let doc: ResultDocument =
        serde_json::from_slice(bytes).map_err(|source| LabelError::ResultJsonParse {
            path: Path::new("<bytes>").to_path_buf(),
            source,
        })?;
    Ok(doc.into_entries())
}

/// Reads a result array file.
pub fn read_result_file(path: &Path) -> Result<Vec<ResultEntry>, LabelError> {
    let file = File::open(path).map_err(LabelError::Io)?;
    let reader = BufReader::new(file);

    let doc: ResultDocument =
        serde_json::from_reader(reader).map_err(|source| LabelError::ResultJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(doc.into_entries())
}

/// Writes a result array as pretty JSON.
pub fn write_result_file(path: &Path, entries: &[ResultEntry]) -> Result<(), LabelError> {
    let file = File::create(path).map_err(LabelError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, entries).map_err(|source| LabelError::ResultJsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Serializes a result array to a pretty JSON string.
pub fn to_result_string(entries: &[ResultEntry]) -> Result<String, LabelError> {
    serde_json::to_string_pretty(entries).map_err(|source| LabelError::ResultJsonWrite {
        path: Path::new("<string>").to_path_buf(),
        source,
    })
}

/// Fuzz-only entrypoint: parse, import, export and re-import a result
/// array. Panics if the second import drops an entry the first kept.
#[cfg(feature = "fuzzing")]
pub fn fuzz_result_pipeline(bytes: &[u8]) -> Result<(), LabelError> {
    let entries = parse_result_slice(bytes)?;
    let import = from_results(&entries, &crate::model::AcceptAll);
    let exported = regions_to_results(&import.regions, &import.relations);
    let again = from_results(&exported, &crate::model::AcceptAll);
    assert!(
        again.mismatches.is_empty(),
        "exported entries failed to load: {:?}",
        again.mismatches
    );
    Ok(())
}
