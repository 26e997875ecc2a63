#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{json, Value};

use labelstate::serialize::ResultEntry;

pub const LABELS: &[&str] = &["Car", "Bus", "Pedestrian", "Cyclist"];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

fn percent() -> impl Strategy<Value = f64> {
    (0u32..=9000).prop_map(|v| v as f64 / 100.0)
}

fn extent() -> impl Strategy<Value = f64> {
    (50u32..=1000).prop_map(|v| v as f64 / 100.0)
}

fn labels() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(LABELS.to_vec(), 1..=2)
}

/// The `type` tag and `value` object of one well-formed region result.
pub fn arb_region_value() -> BoxedStrategy<(&'static str, Value)> {
    let rect = (percent(), percent(), extent(), extent(), labels()).prop_map(|(x, y, w, h, l)| {
        (
            "rectanglelabels",
            json!({"x": x, "y": y, "width": w, "height": h, "rotation": 0.0, "rectanglelabels": l}),
        )
    });
    let polygon = (prop::collection::vec((percent(), percent()), 3..8), labels()).prop_map(
        |(points, l)| {
            let points: Vec<[f64; 2]> = points.into_iter().map(|(x, y)| [x, y]).collect();
            ("polygonlabels", json!({"points": points, "polygonlabels": l}))
        },
    );
    let keypoint = (percent(), percent(), labels()).prop_map(|(x, y, l)| {
        (
            "keypointlabels",
            json!({"x": x, "y": y, "width": 0.5, "keypointlabels": l}),
        )
    });
    prop_oneof![rect, polygon, keypoint].boxed()
}

/// A well-formed result array: unique region ids, one control per shape
/// kind, and relations between distinct regions.
pub fn arb_result_array() -> BoxedStrategy<Vec<ResultEntry>> {
    prop::collection::vec(arb_region_value(), 0..12)
        .prop_flat_map(|regions| {
            let n = regions.len();
            let pairs = if n < 2 {
                Just(Vec::new()).boxed()
            } else {
                prop::collection::vec((0..n, 0..n), 0..4).boxed()
            };
            (Just(regions), pairs)
        })
        .prop_map(|(regions, pairs)| {
            let mut entries: Vec<Value> = regions
                .into_iter()
                .enumerate()
                .map(|(i, (result_type, value))| {
                    json!({
                        "id": format!("region{:04}", i),
                        "from_name": result_type.trim_end_matches("labels"),
                        "to_name": "image",
                        "type": result_type,
                        "origin": "manual",
                        "original_width": 640,
                        "original_height": 480,
                        "value": value,
                    })
                })
                .collect();

            let mut seen = Vec::new();
            for (from, to) in pairs {
                if from == to || seen.contains(&(from, to)) {
                    continue;
                }
                seen.push((from, to));
                entries.push(json!({
                    "type": "relation",
                    "from_id": format!("region{:04}", from),
                    "to_id": format!("region{:04}", to),
                    "direction": "right",
                }));
            }

            serde_json::from_value(Value::Array(entries)).expect("generated entries")
        })
        .boxed()
}

/// Result entries with arbitrary tags and numbers, well-formed or not.
pub fn arb_messy_entry() -> BoxedStrategy<ResultEntry> {
    let result_type = prop::sample::select(vec![
        "rectanglelabels",
        "polygonlabels",
        "brushlabels",
        "choices",
        "textarea",
        "rating",
        "relation",
        "cuboidlabels",
    ]);
    let number = prop_oneof![
        (-1000i32..1000).prop_map(|v| json!(v as f64 / 10.0)),
        Just(Value::Null),
        Just(json!("12")),
    ];
    let id = prop::option::of(prop::sample::select(vec!["a", "b", "c", ""]));
    let name = prop::sample::select(vec!["label", "", "choice"]);

    (
        result_type,
        id.clone(),
        name,
        prop::collection::vec(number, 4),
        id,
    )
        .prop_map(|(result_type, id, name, numbers, to_id)| {
            let entry = json!({
                "id": id,
                "from_name": name,
                "to_name": "image",
                "type": result_type,
                "from_id": id,
                "to_id": to_id,
                "value": {
                    "x": numbers[0],
                    "y": numbers[1],
                    "width": numbers[2],
                    "height": numbers[3],
                    "points": [[numbers[0], numbers[1]]],
                    "choices": ["A"],
                    "text": "note",
                    "rating": numbers[2],
                },
            });
            serde_json::from_value(entry).expect("generated entry")
        })
        .boxed()
}
