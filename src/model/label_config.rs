//! The label configuration as a lookup table of controls and objects.
//!
//! Building this table from the XML-like config language is somebody
//! else's job; here it is plain data, loaded from JSON or YAML.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::choices::ChoiceNode;
use super::result::ResultType;
use crate::config::load_structured;
use crate::error::LabelError;

/// Kind of media object a control annotates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectTag {
    Image,
    Text,
    HyperText,
    Audio,
    Video,
    TimeSeries,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub tag: ObjectTag,
}

/// One control tag: its type, target object and allowed values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub tag: ResultType,
    pub to_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoiceNode>,
    /// Flat choices only: allow more than one selected value.
    #[serde(default)]
    pub multiple: bool,
    /// The control contributes one result per region instead of one per
    /// annotation.
    #[serde(default, rename = "perRegion")]
    pub per_region: bool,
}

impl ControlSpec {
    pub fn new(name: impl Into<String>, tag: ResultType, to_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag,
            to_name: to_name.into(),
            labels: Vec::new(),
            choices: Vec::new(),
            multiple: false,
            per_region: false,
        }
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_choices(mut self, choices: Vec<ChoiceNode>) -> Self {
        self.choices = choices;
        self
    }

    pub fn per_region(mut self) -> Self {
        self.per_region = true;
        self
    }

    /// True for controls that draw regions rather than label existing ones.
    pub fn draws_regions(&self) -> bool {
        self.tag.shape_kind().is_some()
    }
}

/// What a `(from_name, to_name)` pair is allowed to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capability {
    /// `None` accepts any result type.
    pub control: Option<ResultType>,
    pub object: Option<ObjectTag>,
    pub per_region: bool,
}

impl Capability {
    pub fn accepts(&self, result_type: ResultType) -> bool {
        self.control.is_none_or(|control| control == result_type)
    }
}

/// Lookup from result names to control capabilities.
pub trait ControlResolver {
    fn resolve(&self, from_name: &str, to_name: &str) -> Option<Capability>;
}

/// Resolver that accepts every pair. Used when no label config is at hand.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl ControlResolver for AcceptAll {
    fn resolve(&self, _from_name: &str, _to_name: &str) -> Option<Capability> {
        Some(Capability {
            control: None,
            object: None,
            per_region: false,
        })
    }
}

/// Controls and objects of one project.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
    #[serde(default)]
    pub controls: Vec<ControlSpec>,
}

impl LabelConfig {
    /// Loads a config from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        load_structured(path)
    }

    pub fn with_object(mut self, name: impl Into<String>, tag: ObjectTag) -> Self {
        self.objects.push(ObjectSpec {
            name: name.into(),
            tag,
        });
        self
    }

    pub fn with_control(mut self, control: ControlSpec) -> Self {
        self.controls.push(control);
        self
    }

    pub fn control(&self, name: &str) -> Option<&ControlSpec> {
        self.controls.iter().find(|c| c.name == name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectSpec> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Controls that draw regions, in config order.
    pub fn drawing_controls(&self) -> impl Iterator<Item = &ControlSpec> {
        self.controls.iter().filter(|c| c.draws_regions())
    }

    /// Names that are declared more than once, with their counts.
    pub fn duplicate_names(&self) -> BTreeMap<&str, usize> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for name in self
            .controls
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.objects.iter().map(|o| o.name.as_str()))
        {
            *counts.entry(name).or_default() += 1;
        }
        counts.retain(|_, count| *count > 1);
        counts
    }
}

impl ControlResolver for LabelConfig {
    fn resolve(&self, from_name: &str, to_name: &str) -> Option<Capability> {
        let control = self.control(from_name)?;
        if control.to_name != to_name {
            return None;
        }
        let object = self.object(to_name)?;
        Some(Capability {
            control: Some(control.tag),
            object: Some(object.tag),
            per_region: control.per_region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LabelConfig {
        LabelConfig::default()
            .with_object("image", ObjectTag::Image)
            .with_control(
                ControlSpec::new("label", ResultType::RectangleLabels, "image")
                    .with_labels(&["Car", "Person"]),
            )
            .with_control(ControlSpec::new("note", ResultType::TextArea, "image").per_region())
    }

    #[test]
    fn test_resolve_known_pair() {
        let cap = config().resolve("label", "image").expect("resolves");
        assert_eq!(cap.control, Some(ResultType::RectangleLabels));
        assert_eq!(cap.object, Some(ObjectTag::Image));
        assert!(cap.accepts(ResultType::RectangleLabels));
        assert!(!cap.accepts(ResultType::Choices));
    }

    #[test]
    fn test_resolve_rejects_wrong_object() {
        assert!(config().resolve("label", "text").is_none());
        assert!(config().resolve("missing", "image").is_none());
    }

    #[test]
    fn test_accept_all() {
        let cap = AcceptAll.resolve("anything", "else").expect("always");
        assert!(cap.accepts(ResultType::Taxonomy));
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
objects:
  - name: text
    type: text
controls:
  - name: ner
    type: labels
    to_name: text
    labels: [PER, ORG]
  - name: comment
    type: textarea
    to_name: text
    perRegion: true
"#;
        let config: LabelConfig = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.controls.len(), 2);
        assert!(config.control("comment").expect("comment").per_region);
        assert_eq!(config.drawing_controls().count(), 0);
        assert!(config.duplicate_names().is_empty());
    }
}
