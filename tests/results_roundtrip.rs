//! Integration tests for result array import/export, one per type tag.

use serde_json::{json, Value};

use labelstate::model::{
    AcceptAll, ChoiceSelection, ControlValue, ObjectTag, Origin, ResultType, Shape, ShapeKind,
};
use labelstate::serialize::{
    from_results, parse_result_document, regions_to_results, ResultEntry, RELATION_TYPE,
};

fn entries(json: Value) -> Vec<ResultEntry> {
    serde_json::from_value(json).expect("valid result array")
}

/// Imports and re-exports, asserting nothing was dropped.
fn roundtrip(input: &[ResultEntry]) -> Vec<ResultEntry> {
    let import = from_results(input, &AcceptAll);
    assert!(import.mismatches.is_empty(), "dropped: {:?}", import.mismatches);
    regions_to_results(&import.regions, &import.relations)
}

/// Every key of the input `value` comes back unchanged, and a second pass
/// produces the same array.
fn assert_roundtrip(input: Value) -> Vec<ResultEntry> {
    let input = entries(input);
    let output = roundtrip(&input);
    assert_eq!(output.len(), input.len());

    for (before, after) in input.iter().zip(&output) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.from_name, after.from_name);
        assert_eq!(before.to_name, after.to_name);
        assert_eq!(before.result_type, after.result_type);
        for (key, value) in &before.value {
            assert_eq!(
                after.value.get(key),
                Some(value),
                "{} lost '{}'",
                before.result_type,
                key
            );
        }
    }

    assert_eq!(roundtrip(&output), output, "export is not idempotent");
    output
}

fn single(result_type: &str, value: Value) -> Value {
    json!([{
        "id": "r1",
        "from_name": "ctrl",
        "to_name": "obj",
        "type": result_type,
        "origin": "manual",
        "value": value
    }])
}

#[test]
fn test_rectanglelabels_roundtrip() {
    assert_roundtrip(single(
        "rectanglelabels",
        json!({"x": 10.5, "y": 20.25, "width": 30.0, "height": 15.0, "rotation": 12.0, "rectanglelabels": ["Car"]}),
    ));
}

#[test]
fn test_geometry_only_rectangle_roundtrip() {
    let out = assert_roundtrip(single(
        "rectangle",
        json!({"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0}),
    ));
    assert!(!out[0].value.contains_key("rectanglelabels"));
}

#[test]
fn test_ellipselabels_roundtrip() {
    assert_roundtrip(single(
        "ellipselabels",
        json!({"x": 50.0, "y": 50.0, "radiusX": 10.0, "radiusY": 5.0, "ellipselabels": ["Eye"]}),
    ));
}

#[test]
fn test_polygonlabels_roundtrip() {
    assert_roundtrip(single(
        "polygonlabels",
        json!({"points": [[10.0, 10.0], [40.0, 10.0], [25.0, 30.0]], "closed": true, "polygonlabels": ["Roof"]}),
    ));
}

#[test]
fn test_brushlabels_roundtrip() {
    let out = assert_roundtrip(json!([{
        "id": "r1",
        "from_name": "ctrl",
        "to_name": "obj",
        "type": "brushlabels",
        "origin": "manual",
        "original_width": 4,
        "original_height": 2,
        "value": {"format": "rle", "rle": [3, 0, 5, 255], "brushlabels": ["Road"]}
    }]));
    assert_eq!(out[0].original_size(), Some((4, 2)));
}

#[test]
fn test_brush_without_image_size_is_dropped() {
    let input = entries(json!([{
        "id": "r1",
        "from_name": "ctrl",
        "to_name": "obj",
        "type": "brushlabels",
        "value": {"format": "rle", "rle": [8, 0], "brushlabels": ["Road"]}
    }]));
    let import = from_results(&input, &AcceptAll);
    assert!(import.regions.is_empty());
    assert_eq!(import.mismatches.len(), 1);
}

#[test]
fn test_brush_with_huge_image_size_is_dropped() {
    let input = entries(json!([
        {
            "id": "r1",
            "from_name": "ctrl",
            "to_name": "obj",
            "type": "brushlabels",
            "original_width": 4294967295u32,
            "original_height": 4294967295u32,
            "value": {"format": "rle", "rle": [1, 0], "brushlabels": ["Road"]}
        },
        {
            "id": "r2",
            "from_name": "ctrl",
            "to_name": "obj",
            "type": "brushlabels",
            "original_width": 60000,
            "original_height": 60000,
            "value": {"format": "rle", "rle": [4294967295u32, 0], "brushlabels": ["Road"]}
        },
        {
            "id": "r3",
            "from_name": "ctrl",
            "to_name": "obj",
            "type": "brushlabels",
            "original_width": 4,
            "original_height": 2,
            "value": {"format": "rle", "rle": [8, 255], "brushlabels": ["Road"]}
        }
    ]));
    let import = from_results(&input, &AcceptAll);
    assert_eq!(import.mismatches.len(), 2);
    assert_eq!(import.regions.len(), 1);
    assert_eq!(import.regions[0].id.as_str(), "r3");
}

#[test]
fn test_keypointlabels_roundtrip() {
    assert_roundtrip(single(
        "keypointlabels",
        json!({"x": 33.0, "y": 44.0, "width": 1.0, "keypointlabels": ["Nose"]}),
    ));
}

#[test]
fn test_text_labels_roundtrip() {
    let input = entries(single(
        "labels",
        json!({"start": 4, "end": 9, "text": "Paris", "labels": ["City"]}),
    ));
    let import = from_results(&input, &AcceptAll);
    assert_eq!(import.regions[0].kind(), ShapeKind::TextSpan);

    assert_roundtrip(single(
        "labels",
        json!({"start": 4, "end": 9, "text": "Paris", "labels": ["City"]}),
    ));
}

#[test]
fn test_text_span_without_text_keeps_its_kind() {
    let input = entries(single(
        "labels",
        json!({"start": 4, "end": 9, "labels": ["City"]}),
    ));
    let import = from_results(&input, &AcceptAll);
    assert_eq!(import.regions[0].kind(), ShapeKind::TextSpan);

    let out = assert_roundtrip(single(
        "labels",
        json!({"start": 4, "end": 9, "labels": ["City"]}),
    ));
    assert_eq!(out[0].value.get("start"), Some(&json!(4)));
    assert!(out[0].value["end"].is_u64());
    let again = from_results(&out, &AcceptAll);
    assert_eq!(again.regions[0].kind(), ShapeKind::TextSpan);
}

#[test]
fn test_audio_labels_roundtrip() {
    let input = entries(single(
        "labels",
        json!({"start": 1.5, "end": 3.25, "channel": 0, "labels": ["Speech"]}),
    ));
    let import = from_results(&input, &AcceptAll);
    assert_eq!(import.regions[0].kind(), ShapeKind::Audio);

    assert_roundtrip(single(
        "labels",
        json!({"start": 1.5, "end": 3.25, "channel": 0, "labels": ["Speech"]}),
    ));
}

#[test]
fn test_hypertextlabels_roundtrip() {
    assert_roundtrip(single(
        "hypertextlabels",
        json!({
            "start": "/div[1]/p[1]",
            "end": "/div[1]/p[2]",
            "startOffset": 3,
            "endOffset": 7,
            "text": "hello",
            "hypertextlabels": ["Greeting"]
        }),
    ));
}

#[test]
fn test_timeserieslabels_roundtrip() {
    assert_roundtrip(single(
        "timeserieslabels",
        json!({"start": 10.0, "end": 20.0, "instant": false, "timeserieslabels": ["Run"]}),
    ));
    assert_roundtrip(single(
        "timeserieslabels",
        json!({"start": "2024-01-01T00:00:00", "end": "2024-01-01T00:00:00", "instant": true, "timeserieslabels": ["Spike"]}),
    ));
}

#[test]
fn test_videorectangle_roundtrip() {
    assert_roundtrip(single(
        "videorectangle",
        json!({
            "sequence": [
                {"frame": 1, "enabled": true, "x": 10.0, "y": 10.0, "width": 20.0, "height": 20.0, "rotation": 0.0, "time": 0.04},
                {"frame": 12, "enabled": false, "x": 30.0, "y": 10.0, "width": 20.0, "height": 20.0, "rotation": 0.0, "time": 0.48}
            ],
            "framesCount": 100,
            "duration": 4.0,
            "labels": ["Car"]
        }),
    ));
}

#[test]
fn test_classification_values_roundtrip() {
    assert_roundtrip(single("choices", json!({"choices": ["Sunny", "Warm"]})));
    assert_roundtrip(single(
        "choices",
        json!({"choices": [["Header 1"], ["Header 1", "Option 1.1"]]}),
    ));
    assert_roundtrip(single("textarea", json!({"text": ["first line", "second line"]})));
    assert_roundtrip(single("rating", json!({"rating": 4})));
    assert_roundtrip(single("number", json!({"number": 2.5})));
    assert_roundtrip(single("taxonomy", json!({"taxonomy": [["Animal", "Cat"]]})));
    assert_roundtrip(single("datetime", json!({"datetime": "2024-05-01T10:00"})));
}

#[test]
fn test_nested_choices_import_as_paths() {
    let input = entries(single(
        "choices",
        json!({"choices": [["Header 1", "Option 1.1"]]}),
    ));
    let import = from_results(&input, &AcceptAll);
    let region = &import.regions[0];
    assert_eq!(region.shape, Shape::Classification);
    assert_eq!(
        region.results[0].value,
        ControlValue::Choices(ChoiceSelection::Nested(vec![vec![
            "Header 1".to_string(),
            "Option 1.1".to_string()
        ]]))
    );
}

#[test]
fn test_textarea_string_value_is_normalized() {
    let input = entries(single("textarea", json!({"text": "only line"})));
    let out = roundtrip(&input);
    assert_eq!(out[0].value["text"], json!(["only line"]));
}

#[test]
fn test_unknown_fields_are_preserved() {
    let out = assert_roundtrip(json!([{
        "id": "r1",
        "from_name": "ctrl",
        "to_name": "obj",
        "type": "rectanglelabels",
        "origin": "prediction",
        "score": 0.87,
        "meta": {"reviewed": true},
        "value": {"x": 1.0, "y": 1.0, "width": 5.0, "height": 5.0, "rectanglelabels": ["Car"], "color": "red"}
    }]));
    assert_eq!(out[0].extra.get("meta"), Some(&json!({"reviewed": true})));
    assert_eq!(out[0].origin, Some(Origin::Prediction));
    assert_eq!(out[0].score, Some(0.87));
}

#[test]
fn test_results_sharing_an_id_form_one_region_in_any_order() {
    let input = entries(json!([
        {"id": "a", "from_name": "label", "to_name": "image", "type": "rectanglelabels",
         "value": {"x": 1.0, "y": 1.0, "width": 5.0, "height": 5.0, "rectanglelabels": ["Car"]}},
        {"id": "b", "from_name": "label", "to_name": "image", "type": "rectanglelabels",
         "value": {"x": 50.0, "y": 50.0, "width": 5.0, "height": 5.0, "rectanglelabels": ["Bus"]}},
        {"id": "a", "from_name": "notes", "to_name": "image", "type": "textarea",
         "value": {"x": 1.0, "y": 1.0, "width": 5.0, "height": 5.0, "text": ["dented"]}}
    ]));
    let import = from_results(&input, &AcceptAll);
    assert!(import.mismatches.is_empty());
    assert_eq!(import.regions.len(), 2);
    assert_eq!(import.regions[0].id.as_str(), "a");
    assert_eq!(import.regions[0].results.len(), 2);
    assert_eq!(import.regions[1].id.as_str(), "b");

    let out = regions_to_results(&import.regions, &import.relations);
    let ids: Vec<_> = out.iter().map(|e| e.id.as_deref().unwrap_or("")).collect();
    assert_eq!(ids, vec!["a", "a", "b"]);
}

#[test]
fn test_conflicting_shape_is_dropped_alone() {
    let input = entries(json!([
        {"id": "a", "from_name": "label", "to_name": "image", "type": "rectanglelabels",
         "value": {"x": 1.0, "y": 1.0, "width": 5.0, "height": 5.0, "rectanglelabels": ["Car"]}},
        {"id": "a", "from_name": "poly", "to_name": "image", "type": "polygonlabels",
         "value": {"points": [[1.0, 1.0], [2.0, 2.0], [3.0, 1.0]], "polygonlabels": ["Car"]}}
    ]));
    let import = from_results(&input, &AcceptAll);
    assert_eq!(import.regions.len(), 1);
    assert_eq!(import.regions[0].kind(), ShapeKind::Rectangle);
    assert_eq!(import.mismatches.len(), 1);
}

#[test]
fn test_relations_follow_regions() {
    let input = entries(json!([
        {"type": "relation", "from_id": "a", "to_id": "b", "direction": "bi", "labels": ["near"]},
        {"id": "a", "from_name": "label", "to_name": "image", "type": "rectanglelabels",
         "value": {"x": 1.0, "y": 1.0, "width": 5.0, "height": 5.0, "rectanglelabels": ["Car"]}},
        {"id": "b", "from_name": "label", "to_name": "image", "type": "rectanglelabels",
         "value": {"x": 50.0, "y": 50.0, "width": 5.0, "height": 5.0, "rectanglelabels": ["Bus"]}},
        {"type": "relation", "from_id": "a", "to_id": "gone"}
    ]));
    let out = roundtrip(&input);
    assert_eq!(out.len(), 3);
    let relation = &out[2];
    assert_eq!(relation.result_type, RELATION_TYPE);
    assert_eq!(relation.labels, Some(vec!["near".to_string()]));
    assert_eq!(
        serde_json::to_value(relation.direction).expect("direction"),
        json!("bi")
    );
}

#[test]
fn test_relation_unknown_fields_are_preserved() {
    let input = entries(json!([
        {"id": "a", "from_name": "label", "to_name": "image", "type": "rectanglelabels",
         "value": {"x": 1.0, "y": 1.0, "width": 5.0, "height": 5.0, "rectanglelabels": ["Car"]}},
        {"id": "b", "from_name": "label", "to_name": "image", "type": "rectanglelabels",
         "value": {"x": 50.0, "y": 50.0, "width": 5.0, "height": 5.0, "rectanglelabels": ["Bus"]}},
        {"type": "relation", "from_id": "a", "to_id": "b", "direction": "right",
         "labels": ["near"], "meta": {"k": 1}}
    ]));
    let out = roundtrip(&input);
    let relation = out.last().expect("relation entry");
    assert!(relation.is_relation());
    assert_eq!(relation.extra.get("meta"), Some(&json!({"k": 1})));

    let text = serde_json::to_value(relation).expect("serialize relation");
    assert_eq!(text["meta"], json!({"k": 1}));
    assert_eq!(roundtrip(&out), out);
}

#[test]
fn test_wrapped_document_is_accepted() {
    let doc = r#"{"id": 7, "result": [
        {"id": "a", "from_name": "label", "to_name": "image", "type": "rectanglelabels",
         "value": {"x": 1, "y": 1, "width": 5, "height": 5, "rectanglelabels": ["Car"]}}
    ]}"#;
    let parsed = parse_result_document(doc).expect("parse wrapped");
    assert_eq!(parsed.len(), 1);
    assert!(parse_result_document("{\"result\": 3}").is_err());
}

#[test]
fn test_object_tag_disambiguates_spans() {
    use labelstate::model::{ControlSpec, LabelConfig};

    let config = LabelConfig::default()
        .with_object("series", ObjectTag::TimeSeries)
        .with_control(ControlSpec::new("marks", ResultType::Labels, "series"));
    let input = entries(json!([
        {"id": "a", "from_name": "marks", "to_name": "series", "type": "labels",
         "value": {"start": 1.0, "end": 2.0, "labels": ["Peak"]}}
    ]));
    let import = from_results(&input, &config);
    assert_eq!(import.regions[0].kind(), ShapeKind::TimeSeries);
}
