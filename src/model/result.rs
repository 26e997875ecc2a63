//! Results: one control's contribution of a value to one region.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::shape::ShapeKind;

/// The `type` of a result, which is also the tag of the control that
/// produces it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    RectangleLabels,
    Rectangle,
    EllipseLabels,
    Ellipse,
    PolygonLabels,
    Polygon,
    BrushLabels,
    Brush,
    KeyPointLabels,
    KeyPoint,
    Labels,
    HyperTextLabels,
    TimeSeriesLabels,
    VideoRectangle,
    Choices,
    TextArea,
    Rating,
    Number,
    Taxonomy,
    DateTime,
}

impl ResultType {
    pub const ALL: [ResultType; 20] = [
        ResultType::RectangleLabels,
        ResultType::Rectangle,
        ResultType::EllipseLabels,
        ResultType::Ellipse,
        ResultType::PolygonLabels,
        ResultType::Polygon,
        ResultType::BrushLabels,
        ResultType::Brush,
        ResultType::KeyPointLabels,
        ResultType::KeyPoint,
        ResultType::Labels,
        ResultType::HyperTextLabels,
        ResultType::TimeSeriesLabels,
        ResultType::VideoRectangle,
        ResultType::Choices,
        ResultType::TextArea,
        ResultType::Rating,
        ResultType::Number,
        ResultType::Taxonomy,
        ResultType::DateTime,
    ];

    /// The wire name, e.g. `"rectanglelabels"`.
    pub fn name(&self) -> &'static str {
        match self {
            ResultType::RectangleLabels => "rectanglelabels",
            ResultType::Rectangle => "rectangle",
            ResultType::EllipseLabels => "ellipselabels",
            ResultType::Ellipse => "ellipse",
            ResultType::PolygonLabels => "polygonlabels",
            ResultType::Polygon => "polygon",
            ResultType::BrushLabels => "brushlabels",
            ResultType::Brush => "brush",
            ResultType::KeyPointLabels => "keypointlabels",
            ResultType::KeyPoint => "keypoint",
            ResultType::Labels => "labels",
            ResultType::HyperTextLabels => "hypertextlabels",
            ResultType::TimeSeriesLabels => "timeserieslabels",
            ResultType::VideoRectangle => "videorectangle",
            ResultType::Choices => "choices",
            ResultType::TextArea => "textarea",
            ResultType::Rating => "rating",
            ResultType::Number => "number",
            ResultType::Taxonomy => "taxonomy",
            ResultType::DateTime => "datetime",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// The region kind this result type draws, if it is a shape-producing
    /// type. `labels` returns `None`: its kind depends on the object.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            ResultType::RectangleLabels | ResultType::Rectangle => Some(ShapeKind::Rectangle),
            ResultType::EllipseLabels | ResultType::Ellipse => Some(ShapeKind::Ellipse),
            ResultType::PolygonLabels | ResultType::Polygon => Some(ShapeKind::Polygon),
            ResultType::BrushLabels | ResultType::Brush => Some(ShapeKind::Brush),
            ResultType::KeyPointLabels | ResultType::KeyPoint => Some(ShapeKind::KeyPoint),
            ResultType::HyperTextLabels => Some(ShapeKind::HtmlRange),
            ResultType::TimeSeriesLabels => Some(ShapeKind::TimeSeries),
            ResultType::VideoRectangle => Some(ShapeKind::VideoRectangle),
            _ => None,
        }
    }

    /// True for the label-carrying shape types (`rectanglelabels`,
    /// `labels`, ...), which determine the region's geometry.
    pub fn is_region_defining(&self) -> bool {
        self.shape_kind().is_some() || *self == ResultType::Labels
    }

    /// True for geometry-only types such as plain `rectangle`, which carry
    /// no control value.
    pub fn is_geometry_only(&self) -> bool {
        matches!(
            self,
            ResultType::Rectangle
                | ResultType::Ellipse
                | ResultType::Polygon
                | ResultType::Brush
                | ResultType::KeyPoint
        )
    }

    /// The geometry-only type drawing `kind`, used to export regions that
    /// have no results.
    pub fn geometry_type_for(kind: ShapeKind) -> Option<Self> {
        match kind {
            ShapeKind::Rectangle => Some(ResultType::Rectangle),
            ShapeKind::Ellipse => Some(ResultType::Ellipse),
            ShapeKind::Polygon => Some(ResultType::Polygon),
            ShapeKind::Brush => Some(ResultType::Brush),
            ShapeKind::KeyPoint => Some(ResultType::KeyPoint),
            ShapeKind::VideoRectangle => Some(ResultType::VideoRectangle),
            _ => None,
        }
    }

    /// The key holding this type's control value inside `value`.
    pub fn value_key(&self) -> Option<&'static str> {
        match self {
            ResultType::RectangleLabels => Some("rectanglelabels"),
            ResultType::EllipseLabels => Some("ellipselabels"),
            ResultType::PolygonLabels => Some("polygonlabels"),
            ResultType::BrushLabels => Some("brushlabels"),
            ResultType::KeyPointLabels => Some("keypointlabels"),
            ResultType::Labels | ResultType::VideoRectangle => Some("labels"),
            ResultType::HyperTextLabels => Some("hypertextlabels"),
            ResultType::TimeSeriesLabels => Some("timeserieslabels"),
            ResultType::Choices => Some("choices"),
            ResultType::TextArea => Some("text"),
            ResultType::Rating => Some("rating"),
            ResultType::Number => Some("number"),
            ResultType::Taxonomy => Some("taxonomy"),
            ResultType::DateTime => Some("datetime"),
            ResultType::Rectangle
            | ResultType::Ellipse
            | ResultType::Polygon
            | ResultType::Brush
            | ResultType::KeyPoint => None,
        }
    }

    /// True when the control value is a list of label names.
    pub fn carries_labels(&self) -> bool {
        self.is_region_defining() && !self.is_geometry_only()
    }
}

impl std::fmt::Display for ResultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Who produced a result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    #[default]
    Manual,
    Prediction,
    PredictionChanged,
}

impl Origin {
    /// The origin after a user edit.
    pub fn after_edit(self) -> Self {
        match self {
            Origin::Prediction => Origin::PredictionChanged,
            other => other,
        }
    }
}

/// Flat or nested choice selections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceSelection {
    Flat(Vec<String>),
    Nested(Vec<Vec<String>>),
}

/// The type-specific value a control contributes.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlValue {
    /// Geometry-only results.
    Empty,
    Labels(Vec<String>),
    Choices(ChoiceSelection),
    Text(Vec<String>),
    Rating(i64),
    Number(f64),
    Taxonomy(Vec<Vec<String>>),
    DateTime(String),
}

impl ControlValue {
    /// Removes and parses the control value of `result_type` from `value`.
    pub fn take(result_type: ResultType, value: &mut Map<String, Value>) -> Result<Self, String> {
        let Some(key) = result_type.value_key() else {
            return Ok(ControlValue::Empty);
        };
        let Some(raw) = value.remove(key) else {
            // Label lists may be omitted by older exporters.
            return if result_type.carries_labels() {
                Ok(ControlValue::Labels(Vec::new()))
            } else {
                Err(format!("value is missing '{key}'"))
            };
        };

        let parsed = match result_type {
            ResultType::Choices => serde_json::from_value(raw).map(ControlValue::Choices),
            ResultType::TextArea => {
                // A bare string is accepted and normalized to a list.
                if let Value::String(text) = raw {
                    Ok(ControlValue::Text(vec![text]))
                } else {
                    serde_json::from_value(raw).map(ControlValue::Text)
                }
            }
            ResultType::Rating => serde_json::from_value(raw).map(ControlValue::Rating),
            ResultType::Number => serde_json::from_value(raw).map(ControlValue::Number),
            ResultType::Taxonomy => serde_json::from_value(raw).map(ControlValue::Taxonomy),
            ResultType::DateTime => serde_json::from_value(raw).map(ControlValue::DateTime),
            _ => serde_json::from_value(raw).map(ControlValue::Labels),
        };

        parsed.map_err(|source| format!("invalid '{key}': {source}"))
    }

    /// Writes this value under the key of `result_type`.
    pub fn write(&self, result_type: ResultType, value: &mut Map<String, Value>) {
        let Some(key) = result_type.value_key() else {
            return;
        };
        let json = match self {
            ControlValue::Empty => return,
            ControlValue::Labels(labels) => serde_json::json!(labels),
            ControlValue::Choices(choices) => serde_json::json!(choices),
            ControlValue::Text(text) => serde_json::json!(text),
            ControlValue::Rating(rating) => serde_json::json!(rating),
            ControlValue::Number(number) => serde_json::json!(number),
            ControlValue::Taxonomy(paths) => serde_json::json!(paths),
            ControlValue::DateTime(datetime) => serde_json::json!(datetime),
        };
        value.insert(key.to_string(), json);
    }

    /// The label names, for label-carrying results.
    pub fn labels(&self) -> &[String] {
        match self {
            ControlValue::Labels(labels) => labels,
            _ => &[],
        }
    }

    /// Whether a value of this shape can be stored for `result_type`.
    pub fn fits(&self, result_type: ResultType) -> bool {
        match self {
            ControlValue::Empty => result_type.is_geometry_only(),
            ControlValue::Labels(_) => result_type.carries_labels(),
            ControlValue::Choices(_) => result_type == ResultType::Choices,
            ControlValue::Text(_) => result_type == ResultType::TextArea,
            ControlValue::Rating(_) => result_type == ResultType::Rating,
            ControlValue::Number(_) => result_type == ResultType::Number,
            ControlValue::Taxonomy(_) => result_type == ResultType::Taxonomy,
            ControlValue::DateTime(_) => result_type == ResultType::DateTime,
        }
    }
}

/// One result owned by a region.
#[derive(Clone, Debug, PartialEq)]
pub struct AreaResult {
    pub from_name: String,
    pub to_name: String,
    pub result_type: ResultType,
    pub value: ControlValue,
    /// Unknown fields found inside `value`, written back untouched.
    pub extra_value: Map<String, Value>,
    /// Unknown top-level fields of the result entry.
    pub extra: Map<String, Value>,
    pub score: Option<f64>,
}

impl AreaResult {
    pub fn new(
        from_name: impl Into<String>,
        to_name: impl Into<String>,
        result_type: ResultType,
        value: ControlValue,
    ) -> Self {
        Self {
            from_name: from_name.into(),
            to_name: to_name.into(),
            result_type,
            value,
            extra_value: Map::new(),
            extra: Map::new(),
            score: None,
        }
    }

    /// Shorthand for a label-carrying result.
    pub fn labels(
        from_name: impl Into<String>,
        to_name: impl Into<String>,
        result_type: ResultType,
        labels: &[&str],
    ) -> Self {
        Self::new(
            from_name,
            to_name,
            result_type,
            ControlValue::Labels(labels.iter().map(|l| l.to_string()).collect()),
        )
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}
