//! Configuration management for `proxiscan-core`.
//!
//! This module defines the detector configuration consumed by both the query
//! compiler and the highlight replicator. It handles deserialization of YAML
//! detector files and validates them before anything is compiled.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::errors::ProxiscanError;

/// Maximum allowed length for a pattern string (or a single chunk).
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Default proximity window, in characters.
pub const DEFAULT_PROXIMITY: usize = 50;

/// Upper bound on the proximity window. Larger gaps blow up the compiled regex.
pub const MAX_PROXIMITY: usize = 10_000;

/// Default document field holding the free text to scan.
pub const DEFAULT_SOURCE_FIELD: &str = "document_text";

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static field name regex"));

static SOURCE_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("static source field regex")
});

/// The regex describing the value to detect.
///
/// A single fragment is used verbatim. A chunked pattern describes a value that
/// may appear contiguous or split by whitespace/dashes between chunks; chunk
/// order defines left-to-right grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Single(String),
    Chunked(Vec<String>),
}

impl PatternSpec {
    /// Returns the chunks that make up this pattern.
    pub fn chunks(&self) -> Vec<&str> {
        match self {
            PatternSpec::Single(p) => vec![p.as_str()],
            PatternSpec::Chunked(chunks) => chunks.iter().map(String::as_str).collect(),
        }
    }

    fn validate(&self) -> Result<(), ProxiscanError> {
        match self {
            PatternSpec::Single(p) => validate_fragment(p, "patternRegex"),
            PatternSpec::Chunked(chunks) => {
                if chunks.is_empty() {
                    return Err(ProxiscanError::config(
                        "patternRegex chunk list must contain at least one chunk",
                    ));
                }
                for (i, chunk) in chunks.iter().enumerate() {
                    validate_fragment(chunk, &format!("patternRegex[{}]", i))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for PatternSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSpec::Single(p) => write!(f, "{}", p),
            PatternSpec::Chunked(chunks) => write!(f, "[{}]", chunks.join(", ")),
        }
    }
}

fn validate_fragment(fragment: &str, label: &str) -> Result<(), ProxiscanError> {
    if fragment.trim().is_empty() {
        return Err(ProxiscanError::config(format!("{} must not be empty", label)));
    }
    if fragment.len() > MAX_PATTERN_LENGTH {
        return Err(ProxiscanError::config(format!(
            "{}: pattern length ({}) exceeds maximum allowed ({})",
            label,
            fragment.len(),
            MAX_PATTERN_LENGTH
        )));
    }
    Ok(())
}

fn default_proximity() -> usize {
    DEFAULT_PROXIMITY
}

fn default_source_field() -> String {
    DEFAULT_SOURCE_FIELD.to_string()
}

/// A single declarative detector, usually loaded from a YAML file.
///
/// ```yaml
/// fieldName: HasTFN
/// patternRegex: ["[0-9]{3}", "[0-9]{3}", "[0-9]{3}"]
/// contextWords: ["TFN", "tax file number"]
/// checksum: au_tfn
/// proximity: 50
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfig {
    /// Name of the result attribute written under the PII or named-entity bucket.
    pub field_name: String,
    pub pattern_regex: PatternSpec,
    /// Trigger words/phrases. Matching is case-insensitive.
    #[serde(default)]
    pub context_words: Vec<String>,
    /// Name of the checksum algorithm used to confirm candidate matches.
    #[serde(default)]
    pub checksum: Option<String>,
    /// Maximum character gap between a context word and the pattern.
    #[serde(default = "default_proximity")]
    pub proximity: usize,
    #[serde(default = "default_source_field")]
    pub source_field: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl DetectorConfig {
    /// Creates a config with defaults for every optional key.
    pub fn new(field_name: impl Into<String>, pattern_regex: PatternSpec) -> Self {
        Self {
            field_name: field_name.into(),
            pattern_regex,
            context_words: Vec::new(),
            checksum: None,
            proximity: DEFAULT_PROXIMITY,
            source_field: default_source_field(),
            description: None,
        }
    }

    /// Loads and validates a detector from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading detector configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded detector '{}' from {}.", config.field_name, path.display());
        Ok(config)
    }

    /// Parses and validates a detector from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ProxiscanError> {
        let mut config: DetectorConfig = serde_yml::from_str(text).map_err(|e| {
            ProxiscanError::config(format!(
                "{}. patternRegex must be a string or a list of strings, e.g. '[0-9]{{3}}[\\s\\-]?[0-9]{{3}}'",
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field and normalises the context word set.
    pub fn validate(&mut self) -> Result<(), ProxiscanError> {
        if !FIELD_NAME_RE.is_match(&self.field_name) {
            return Err(ProxiscanError::config(format!(
                "fieldName '{}' must be a non-empty identifier ([A-Za-z_][A-Za-z0-9_]*)",
                self.field_name
            )));
        }
        if !SOURCE_FIELD_RE.is_match(&self.source_field) {
            return Err(ProxiscanError::config(format!(
                "sourceField '{}' is not a valid field path",
                self.source_field
            )));
        }
        self.pattern_regex.validate()?;

        if self.proximity > MAX_PROXIMITY {
            return Err(ProxiscanError::config(format!(
                "proximity ({}) exceeds maximum allowed ({})",
                self.proximity, MAX_PROXIMITY
            )));
        }

        if let Some(name) = &self.checksum {
            if name.trim().is_empty() {
                return Err(ProxiscanError::config("checksum must name an algorithm"));
            }
        }

        let mut seen = HashSet::new();
        let mut words = Vec::with_capacity(self.context_words.len());
        for word in self.context_words.drain(..) {
            if word.trim().is_empty() {
                return Err(ProxiscanError::config("contextWords must not contain empty entries"));
            }
            if seen.insert(word.clone()) {
                words.push(word);
            } else {
                warn!("Dropping duplicate context word '{}'.", word);
            }
        }
        self.context_words = words;

        debug!(
            "Detector '{}' validated: {} context word(s), checksum {:?}, proximity {}",
            self.field_name,
            self.context_words.len(),
            self.checksum,
            self.proximity
        );
        Ok(())
    }
}
