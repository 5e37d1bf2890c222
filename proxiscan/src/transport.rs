//! Blocking Elasticsearch transport.
//!
//! Thin wrapper over `reqwest::blocking`: every call returns the decoded JSON
//! body, and any non-2xx response surfaces as [`TransportError::Status`] with the
//! response body attached.

use log::{debug, info};
use proxiscan_core::FieldTarget;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Used when neither `--es-url` nor `PROXISCAN_ES_URL` is given.
pub const DEFAULT_ES_URL: &str = "http://localhost:9200";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Elasticsearch returned {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response from {url}: {message}")]
    Response { url: String, message: String },
}

/// Progress counters of a running `update_by_query` task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskProgress {
    pub action: String,
    pub total: u64,
    pub updated: u64,
    pub batches: u64,
    pub version_conflicts: u64,
}

/// One poll of `GET _tasks/<id>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatus {
    pub completed: bool,
    pub progress: TaskProgress,
    /// Final response, present once completed.
    pub response: Option<Value>,
}

impl TaskStatus {
    pub fn from_json(value: &Value) -> Self {
        let task = &value["task"];
        let status = &task["status"];
        let counter = |key: &str| status[key].as_u64().unwrap_or(0);
        Self {
            completed: value["completed"].as_bool().unwrap_or(false),
            progress: TaskProgress {
                action: task["action"].as_str().unwrap_or("unknown").to_string(),
                total: counter("total"),
                updated: counter("updated"),
                batches: counter("batches"),
                version_conflicts: counter("version_conflicts"),
            },
            response: value.get("response").cloned(),
        }
    }
}

/// Result of [`EsClient::ensure_field_mapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingOutcome {
    AlreadyPresent,
    Created,
}

#[derive(Debug, Clone)]
pub struct EsClient {
    base_url: String,
    http: Client,
}

impl EsClient {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = Client::builder()
            .build()
            .map_err(|source| TransportError::Http { url: base_url.clone(), source })?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// URL a user can poll by hand for a background task.
    pub fn task_url(&self, task_id: &str) -> String {
        self.url(&format!("_tasks/{}", task_id))
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Value, TransportError> {
        let response = request
            .send()
            .map_err(|source| TransportError::Http { url: url.to_string(), source })?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|source| TransportError::Http { url: url.to_string(), source })?;
        debug!("{} -> {}", url, status);
        if !status.is_success() {
            return Err(TransportError::Status { status: status.as_u16(), url: url.to_string(), body });
        }
        serde_json::from_str(&body)
            .map_err(|e| TransportError::Response { url: url.to_string(), message: e.to_string() })
    }

    pub fn search(&self, index: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.url(&format!("{}/_search", index));
        self.send(self.http.post(&url).json(body), &url)
    }

    /// Submits an `update_by_query`. Version conflicts never abort the run.
    ///
    /// With `wait_for_completion` false the response carries a `task` id.
    pub fn update_by_query(
        &self,
        index: &str,
        body: &Value,
        wait_for_completion: bool,
    ) -> Result<Value, TransportError> {
        let mut url = self.url(&format!("{}/_update_by_query?conflicts=proceed", index));
        if !wait_for_completion {
            url.push_str("&wait_for_completion=false");
        }
        info!("Submitting update_by_query to {}", url);
        self.send(self.http.post(&url).json(body), &url)
    }

    pub fn task(&self, task_id: &str) -> Result<TaskStatus, TransportError> {
        let url = self.task_url(task_id);
        let value = self.send(self.http.get(&url), &url)?;
        Ok(TaskStatus::from_json(&value))
    }

    /// Polls a task until it reports `completed`, calling `on_progress` after
    /// every unfinished poll. Returns the final status.
    pub fn monitor_task<F>(
        &self,
        task_id: &str,
        poll_interval: Duration,
        mut on_progress: F,
    ) -> Result<TaskStatus, TransportError>
    where
        F: FnMut(&TaskProgress),
    {
        loop {
            let status = self.task(task_id)?;
            if status.completed {
                info!("Task {} completed.", task_id);
                return Ok(status);
            }
            on_progress(&status.progress);
            thread::sleep(poll_interval);
        }
    }

    pub fn mapping(&self, index: &str) -> Result<Value, TransportError> {
        let url = self.url(&format!("{}/_mapping", index));
        self.send(self.http.get(&url), &url)
    }

    /// Whether `field` is mapped with a `keyword` sub-field, which the
    /// selection regexp runs against.
    pub fn has_keyword_subfield(&self, index: &str, field: &str) -> Result<bool, TransportError> {
        let mapping = self.mapping(index)?;
        let Some(properties) = index_properties(&mapping) else {
            return Ok(false);
        };
        let found = field_mapping(properties, field)
            .and_then(|m| m["fields"]["keyword"]["type"].as_str())
            .map(|t| t == "keyword")
            .unwrap_or(false);
        debug!("Keyword sub-field for '{}' in '{}': {}", field, index, found);
        Ok(found)
    }

    /// Creates the result field mapping under its bucket unless it already
    /// exists with the expected type.
    pub fn ensure_field_mapping(&self, index: &str, target: &FieldTarget) -> Result<MappingOutcome, TransportError> {
        let expected = target.target.mapping_type();
        let mapping = self.mapping(index)?;
        let existing = index_properties(&mapping)
            .and_then(|p| p.get(target.bucket()))
            .and_then(|bucket| bucket["properties"].get(&target.field_name))
            .and_then(|m| m["type"].as_str());
        if existing == Some(expected) {
            info!("Field mapping for {} already exists as {}", target.path(), expected);
            return Ok(MappingOutcome::AlreadyPresent);
        }

        let url = self.url(&format!("{}/_mapping", index));
        let body = mapping_payload(target);
        self.send(self.http.put(&url).json(&body), &url)?;
        info!("Set {} mapping for {}", expected, target.path());
        Ok(MappingOutcome::Created)
    }
}

/// `PUT _mapping` body declaring the result field.
pub fn mapping_payload(target: &FieldTarget) -> Value {
    json!({
        "properties": {
            target.bucket(): {
                "properties": {
                    target.field_name.clone(): { "type": target.target.mapping_type() }
                }
            }
        }
    })
}

/// The `properties` of the first index in a `GET _mapping` response, in
/// typeless or legacy `_doc` form.
fn index_properties(mapping: &Value) -> Option<&serde_json::Map<String, Value>> {
    let mappings = &mapping.as_object()?.values().next()?["mappings"];
    mappings
        .get("properties")
        .or_else(|| mappings.get("_doc").and_then(|doc| doc.get("properties")))
        .and_then(Value::as_object)
}

/// Walks a dotted field path through nested `properties`.
fn field_mapping<'a>(properties: &'a serde_json::Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = properties.get(parts.next()?)?;
    for part in parts {
        current = current["properties"].get(part)?;
    }
    Some(current)
}
