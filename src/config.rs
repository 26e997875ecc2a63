//! Engine options and structured config file loading.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LabelError;

/// Tunables of the annotation engine.
///
/// Distances and sizes are in percent of the canvas unless noted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Maximum retained history entries; the oldest are dropped first.
    pub history_limit: usize,
    /// Debounce delay of draft autosave.
    pub autosave_delay_ms: u64,
    /// Clicking this close to the first polygon vertex closes it.
    pub polygon_close_distance: f64,
    /// Drag gestures producing a smaller box are discarded.
    pub min_region_size: f64,
    /// Brush radius in image pixels.
    pub brush_radius_px: f64,
    pub keypoint_width: f64,
    /// Tolerance for geometry comparisons (values are exported with two
    /// decimals of precision in mind).
    pub round_trip_eps: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            history_limit: 100,
            autosave_delay_ms: 1000,
            polygon_close_distance: 1.0,
            min_region_size: 0.5,
            brush_radius_px: 8.0,
            keypoint_width: 1.0,
            round_trip_eps: 0.005,
        }
    }
}

impl EngineOptions {
    /// Loads options from a `.json`, `.yaml` or `.yml` file. Missing keys
    /// keep their defaults.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        load_structured(path)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

/// Reads a JSON or YAML file, picking the parser from the extension.
pub(crate) fn load_structured<T: DeserializeOwned>(path: &Path) -> Result<T, LabelError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let text = fs::read_to_string(path)?;
    let parse_err = |message: String| LabelError::ConfigParse {
        path: path.to_path_buf(),
        message,
    };

    match ext.as_str() {
        "json" => serde_json::from_str(&text).map_err(|e| parse_err(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(&text).map_err(|e| parse_err(e.to_string())),
        other => Err(LabelError::UnsupportedFormat(format!(
            "config extension '{}' (supported: json, yaml, yml)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let opts = EngineOptions::default();
        assert_eq!(opts.history_limit, 100);
        assert_eq!(opts.autosave_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("tempfile");
        writeln!(file, "history_limit: 5\nautosave_delay_ms: 250").expect("write");

        let opts = EngineOptions::load(file.path()).expect("load");
        assert_eq!(opts.history_limit, 5);
        assert_eq!(opts.autosave_delay_ms, 250);
        assert_eq!(opts.min_region_size, 0.5);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        let err = EngineOptions::load(file.path()).expect_err("toml");
        assert!(matches!(err, LabelError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("tempfile");
        write!(file, "{{\"history_limit\": \"lots\"}}").expect("write");
        let err = EngineOptions::load(file.path()).expect_err("bad type");
        assert!(matches!(err, LabelError::ConfigParse { .. }));
    }
}
