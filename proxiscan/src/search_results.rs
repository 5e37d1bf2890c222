//! Parsed `_search` responses, the input of both report renderers.

use anyhow::{anyhow, Result};
use proxiscan_core::query::predicate::lookup_field;
use serde_json::Value;

/// Shown when a hit carries neither `filename` nor `file_path`.
pub const UNKNOWN_FILE: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: Option<f64>,
    pub file: String,
    /// The scanned text field, when the hit has one.
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub total: u64,
    pub hits: Vec<SearchHit>,
    pub raw: Value,
}

impl SearchResults {
    /// Reads hits out of a search response, taking the text from `source_field`.
    pub fn from_response(raw: Value, source_field: &str) -> Result<Self> {
        let hits_obj = raw
            .get("hits")
            .ok_or_else(|| anyhow!("search response has no 'hits' object"))?;
        let total = match &hits_obj["total"] {
            Value::Number(n) => n.as_u64().unwrap_or(0),
            other => other["value"].as_u64().unwrap_or(0),
        };
        let hits = hits_obj["hits"]
            .as_array()
            .map(|hits| hits.iter().map(|hit| parse_hit(hit, source_field)).collect())
            .unwrap_or_default();
        Ok(Self { total, hits, raw })
    }
}

fn parse_hit(hit: &Value, source_field: &str) -> SearchHit {
    let source = &hit["_source"];
    let file = source["filename"]
        .as_str()
        .or_else(|| source["file_path"].as_str())
        .unwrap_or(UNKNOWN_FILE)
        .to_string();
    SearchHit {
        id: hit["_id"].as_str().unwrap_or_default().to_string(),
        score: hit["_score"].as_f64(),
        file,
        text: lookup_field(source, source_field).and_then(Value::as_str).map(str::to_string),
    }
}
