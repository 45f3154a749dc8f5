//! Browser tests for the JavaScript handle
#![cfg(target_arch = "wasm32")]

use mentiongraph::MentionGraphCortex;
use serde::Serialize;
use serde_json::json;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn js(value: serde_json::Value) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap()
}

#[wasm_bindgen_test]
fn test_version() {
    assert!(mentiongraph::version().starts_with("mentiongraph v"));
}

#[wasm_bindgen_test]
fn test_resolve_people_from_js() {
    let cortex = MentionGraphCortex::new();
    let articles = js(json!([
        { "article_id": "a1", "persons": ["Anna Hansen", "Anna"] },
        { "article_id": "a2", "persons": ["Anna Hansen", "Peter Jensen"] },
        { "nonsense": true }
    ]));

    let people: serde_json::Value =
        serde_wasm_bindgen::from_value(cortex.js_resolve_people(articles).unwrap()).unwrap();
    let rows = people.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["canonical_name"], "Anna Hansen");
}

#[wasm_bindgen_test]
fn test_configure_rejects_zero_runs() {
    let mut cortex = MentionGraphCortex::new();
    let result = cortex.js_configure(js(json!({ "community": { "runs": 0 } })));
    assert!(result.is_err());
    // Previous pipeline stays in place
    assert_eq!(cortex.pipeline().config().community.runs, 10);
}

#[wasm_bindgen_test]
fn test_run_returns_stats() {
    let cortex = MentionGraphCortex::new();
    let articles = js(json!([{ "article_id": 7, "persons": ["Bo Holm"] }]));

    let output: serde_json::Value =
        serde_wasm_bindgen::from_value(cortex.js_run(articles).unwrap()).unwrap();
    assert_eq!(output["stats"]["articles"], 1);
    assert_eq!(output["communities"].as_array().unwrap().len(), 0);
}

#[wasm_bindgen_test]
fn test_skipped_record_logs_to_console() {
    mentiongraph::console::init(log::LevelFilter::Info);
    // A second install is ignored
    mentiongraph::console::init(log::LevelFilter::Debug);
    assert_eq!(log::max_level(), log::LevelFilter::Info);

    let cortex = MentionGraphCortex::new();
    let articles = js(json!([{ "persons": ["Bo Holm"] }, { "article_id": "a1", "persons": ["Bo Holm"] }]));
    let people: serde_json::Value =
        serde_wasm_bindgen::from_value(cortex.js_resolve_people(articles).unwrap()).unwrap();
    assert_eq!(people.as_array().unwrap().len(), 1);
}

#[wasm_bindgen_test]
fn test_configure_rejects_negative_threshold() {
    let mut cortex = MentionGraphCortex::new();
    let err = cortex
        .js_configure(js(json!({ "resolution": { "similarity_threshold": -1 } })))
        .unwrap_err();
    assert!(err.as_string().unwrap().starts_with("Invalid configuration"));
}
