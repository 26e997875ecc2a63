//! Schema of one entry of the result array.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::Origin;
use crate::relations::RelationDirection;

/// `type` of relation entries.
pub const RELATION_TYPE: &str = "relation";

/// One element of the portable result array.
///
/// Region results carry `id`, `from_name`, `to_name` and `value`; relation
/// entries carry `from_id`, `to_id`, `direction` and `labels` instead.
/// Fields this crate does not know are kept in `extra` and written back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to_name: String,
    #[serde(rename = "type")]
    pub result_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub value: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, rename = "parentID", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_rotation: Option<f64>,

    // Relation entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<RelationDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultEntry {
    pub fn is_relation(&self) -> bool {
        self.result_type == RELATION_TYPE
    }

    /// Both image dimensions, when present.
    pub fn original_size(&self) -> Option<(u32, u32)> {
        Some((self.original_width?, self.original_height?))
    }
}

/// A result array as found in files: either bare or wrapped in an object
/// with a `result` key (the shape of an exported annotation).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ResultDocument {
    Bare(Vec<ResultEntry>),
    Wrapped { result: Vec<ResultEntry> },
}

impl ResultDocument {
    pub(crate) fn into_entries(self) -> Vec<ResultEntry> {
        match self {
            ResultDocument::Bare(entries) => entries,
            ResultDocument::Wrapped { result } => result,
        }
    }
}
