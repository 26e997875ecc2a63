//! Result array validation.
//!
//! Checks a result array before (or instead of) loading it:
//! - Identity (ids present, names non-empty)
//! - Control resolution (known type, resolvable control, matching type)
//! - Values and geometry (parsable, finite, inside the canvas, positive sizes)
//! - Consistency (one shape kind per region id, relation endpoints exist)
//!
//! Errors mark entries that import would drop; warnings mark entries that
//! load but probably not as intended.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ControlResolver, ControlValue, ResultType, Shape, ShapeKind};
use crate::serialize::ResultEntry;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Tolerance in percent units for geometry touching the canvas edge.
const BOUNDS_TOLERANCE: f64 = 0.5;

/// Validates a result array and returns a report of all issues found.
pub fn validate_results(
    entries: &[ResultEntry],
    resolver: &dyn ControlResolver,
    _opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    if entries.is_empty() {
        return report;
    }

    let mut kinds: BTreeMap<&str, (ShapeKind, usize)> = BTreeMap::new();
    let mut region_ids: BTreeSet<&str> = BTreeSet::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.is_relation() {
            continue;
        }
        if let Some(id) = entry.id.as_deref() {
            region_ids.insert(id);
        }
        validate_entry(index, entry, resolver, &mut kinds, &mut report);
    }

    validate_relations(entries, &region_ids, &mut report);

    report
}

fn context(index: usize, entry: &ResultEntry) -> IssueContext {
    IssueContext::Result {
        index,
        id: entry.id.clone(),
    }
}

/// Validates one region result.
fn validate_entry<'a>(
    index: usize,
    entry: &'a ResultEntry,
    resolver: &dyn ControlResolver,
    kinds: &mut BTreeMap<&'a str, (ShapeKind, usize)>,
    report: &mut ValidationReport,
) {
    if entry.id.is_none() {
        report.add(ValidationIssue::warning(
            IssueCode::MissingId,
            "Result has no id; it will load as a separate region",
            context(index, entry),
        ));
    }

    if entry.from_name.is_empty() || entry.to_name.is_empty() {
        report.add(ValidationIssue::error(
            IssueCode::EmptyName,
            format!(
                "Empty control or object name (from_name '{}', to_name '{}')",
                entry.from_name, entry.to_name
            ),
            context(index, entry),
        ));
    }

    let Some(result_type) = ResultType::from_name(&entry.result_type) else {
        report.add(ValidationIssue::error(
            IssueCode::UnknownResultType,
            format!("Unknown result type '{}'", entry.result_type),
            context(index, entry),
        ));
        return;
    };

    let Some(capability) = resolver.resolve(&entry.from_name, &entry.to_name) else {
        report.add(ValidationIssue::error(
            IssueCode::UnresolvedControl,
            format!(
                "No control '{}' targeting object '{}'",
                entry.from_name, entry.to_name
            ),
            context(index, entry),
        ));
        return;
    };

    if !capability.accepts(result_type) {
        report.add(ValidationIssue::error(
            IssueCode::ControlTypeMismatch,
            format!(
                "Control '{}' does not produce '{}' results",
                entry.from_name, result_type
            ),
            context(index, entry),
        ));
        return;
    }

    // One shape kind per region id.
    if let (Some(id), Some(kind)) = (entry.id.as_deref(), result_type.shape_kind()) {
        match kinds.get(id) {
            Some((first, first_index)) if *first != kind => {
                report.add(ValidationIssue::error(
                    IssueCode::ConflictingShapes,
                    format!(
                        "Draws a {:?} but result[{}] with the same id draws a {:?}",
                        kind, first_index, first
                    ),
                    context(index, entry),
                ));
            }
            Some(_) => {}
            None => {
                kinds.insert(id, (kind, index));
            }
        }
    }

    let kind = result_type
        .shape_kind()
        .unwrap_or_else(|| ShapeKind::infer(&entry.value, capability.object));
    match Shape::read_fields(kind, &entry.value, entry.original_size()) {
        Ok(shape) => validate_geometry(index, entry, &shape, report),
        Err(reason) => {
            report.add(ValidationIssue::error(
                IssueCode::InvalidValue,
                format!("Invalid {:?} geometry: {}", kind, reason),
                context(index, entry),
            ));
        }
    }

    if !result_type.is_geometry_only() {
        let mut value = entry.value.clone();
        if let Err(reason) = ControlValue::take(result_type, &mut value) {
            report.add(ValidationIssue::error(
                IssueCode::InvalidValue,
                format!("Invalid '{}' value: {}", result_type, reason),
                context(index, entry),
            ));
        }
    }
}

/// Checks finiteness, sizes and canvas bounds of spatial geometry.
fn validate_geometry(index: usize, entry: &ResultEntry, shape: &Shape, report: &mut ValidationReport) {
    if !shape.is_finite() {
        report.add(ValidationIssue::error(
            IssueCode::GeometryNotFinite,
            "Geometry contains non-finite numbers",
            context(index, entry),
        ));
        return; // Skip further geometry checks
    }

    let sizes: Vec<(f64, f64)> = match shape {
        Shape::Rectangle(rect) => vec![(rect.width, rect.height)],
        Shape::Ellipse(ellipse) => vec![(ellipse.radius_x, ellipse.radius_y)],
        Shape::VideoRectangle(track) => track
            .keyframes()
            .iter()
            .map(|k| (k.width, k.height))
            .collect(),
        _ => Vec::new(),
    };
    for (width, height) in sizes {
        if width < 0.0 || height < 0.0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidGeometrySize,
                format!("Negative size {:.2}x{:.2}", width, height),
                context(index, entry),
            ));
        } else if width == 0.0 || height == 0.0 {
            report.add(ValidationIssue::warning(
                IssueCode::InvalidGeometrySize,
                format!("Zero size {:.2}x{:.2}", width, height),
                context(index, entry),
            ));
        }
    }

    if let Some(envelope) = shape.envelope() {
        if !envelope.is_within(-BOUNDS_TOLERANCE, 100.0 + BOUNDS_TOLERANCE) {
            report.add(ValidationIssue::warning(
                IssueCode::GeometryOutOfBounds,
                format!(
                    "Geometry ({:.1}, {:.1}, {:.1}, {:.1}) extends outside the canvas (0..100)",
                    envelope.min.x,
                    envelope.min.y,
                    envelope.max.x,
                    envelope.max.y
                ),
                context(index, entry),
            ));
        }
    }
}

/// Validates relation entries against the region ids of the array.
fn validate_relations(
    entries: &[ResultEntry],
    region_ids: &BTreeSet<&str>,
    report: &mut ValidationReport,
) {
    let mut seen: BTreeMap<(&str, &str), usize> = BTreeMap::new();

    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_relation() {
            continue;
        }
        let (Some(from), Some(to)) = (entry.from_id.as_deref(), entry.to_id.as_deref()) else {
            report.add(ValidationIssue::error(
                IssueCode::InvalidRelation,
                "Relation needs both from_id and to_id",
                IssueContext::Relation { index },
            ));
            continue;
        };

        for endpoint in [from, to] {
            if !region_ids.contains(endpoint) {
                report.add(ValidationIssue::warning(
                    IssueCode::DanglingRelation,
                    format!("References non-existent region {}", endpoint),
                    IssueContext::Relation { index },
                ));
            }
        }

        if from == to {
            report.add(ValidationIssue::error(
                IssueCode::InvalidRelation,
                format!("Relation links region {} to itself", from),
                IssueContext::Relation { index },
            ));
        } else if let Some(first) = seen.get(&(from, to)) {
            report.add(ValidationIssue::warning(
                IssueCode::InvalidRelation,
                format!("Duplicate of relation result[{}]", first),
                IssueContext::Relation { index },
            ));
        } else {
            seen.insert((from, to), index);
        }
    }
}
