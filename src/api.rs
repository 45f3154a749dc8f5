//! MentionGraphCortex: JavaScript handle for the batch pipeline
//!
//! Articles cross the boundary as plain JS arrays of objects (same shape as
//! the JSON ingest format); results come back as plain objects.

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::config::PipelineConfig;
use crate::pipeline::Pipeline;
use crate::resolution::ingest::{records_from_values, ArticleRecord};

#[wasm_bindgen]
pub struct MentionGraphCortex {
    pipeline: Pipeline,
}

impl Default for MentionGraphCortex {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl MentionGraphCortex {
    /// Pipeline with the default (Danish) configuration
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            pipeline: Pipeline::default(),
        }
    }

    /// Replace the configuration; missing fields take their defaults
    #[wasm_bindgen(js_name = configure)]
    pub fn js_configure(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: Value = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?;
        let config = PipelineConfig::from_value(config).map_err(to_js)?;
        self.pipeline = Pipeline::new(config).map_err(to_js)?;
        Ok(())
    }

    /// Person table, sorted by canonical name
    #[wasm_bindgen(js_name = resolvePeople)]
    pub fn js_resolve_people(&self, articles: JsValue) -> Result<JsValue, JsValue> {
        let articles = articles_from_js(articles)?;
        let people = self.pipeline.resolve_people(&articles).map_err(to_js)?;
        Ok(to_js_value(&people))
    }

    /// Ranked communities for the given articles
    #[wasm_bindgen(js_name = detectCommunities)]
    pub fn js_detect_communities(&self, articles: JsValue) -> Result<JsValue, JsValue> {
        let articles = articles_from_js(articles)?;
        let people = self.pipeline.resolve_people(&articles).map_err(to_js)?;
        let graph = self.pipeline.build_graph(&people);
        Ok(to_js_value(&self.pipeline.detect_communities(&graph)))
    }

    /// People, communities, network summary and stats in one call
    #[wasm_bindgen(js_name = run)]
    pub fn js_run(&self, articles: JsValue) -> Result<JsValue, JsValue> {
        let articles = articles_from_js(articles)?;
        let output = self.pipeline.run(&articles).map_err(to_js)?;
        Ok(to_js_value(&output))
    }
}

impl MentionGraphCortex {
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

fn articles_from_js(articles: JsValue) -> Result<Vec<ArticleRecord>, JsValue> {
    let items: Vec<Value> = serde_wasm_bindgen::from_value(articles)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse articles: {}", e)))?;
    Ok(records_from_values(items))
}

fn to_js(err: crate::error::PipelineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js_value<T: Serialize>(value: &T) -> JsValue {
    // Maps become plain objects rather than JS `Map`s
    match value.serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
        Ok(v) => v,
        Err(e) => {
            web_sys::console::error_1(&format!("[MentionGraphCortex] Serialization failed: {:?}", e).into());
            JsValue::NULL
        }
    }
}
