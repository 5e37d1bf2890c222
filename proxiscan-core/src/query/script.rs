//! Mutation scripts: the Painless source written onto selected documents, and a
//! local interpreter of the same logic.
//!
//! The interpreter exists so the value a generated script would write can be
//! checked against the highlighter without an Elasticsearch node.

use serde_json::{json, Map, Value};

use crate::checksums::{clean_digits, ChecksumFragment};
use crate::errors::ProxiscanError;
use crate::match_log::log_candidate_debug;
use crate::mode::{FieldTarget, Target};
use crate::proximity::{ProximityRegex, PATTERN_GROUP};
use crate::query::predicate::lookup_field;

pub const SCRIPT_LANG: &str = "painless";

/// The value a script writes into its target field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Flag(bool),
    Extracted(String),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Flag(b) => Value::Bool(*b),
            FieldValue::Extracted(s) => Value::String(s.clone()),
        }
    }
}

/// What a generated script does per document.
#[derive(Debug, Clone)]
pub enum ScriptPlan {
    /// Reverse direction: write `false`, no regex involved.
    MarkNegative,
    /// Run the composite regex once.
    FirstMatch { regex: ProximityRegex },
    /// Walk every candidate, stop at the first one whose digits pass the checksum.
    ChecksumScan { regex: ProximityRegex, checksum: ChecksumFragment },
}

#[derive(Debug, Clone)]
pub struct MutationScript {
    plan: ScriptPlan,
    target: FieldTarget,
    source_field: String,
    source: String,
}

impl MutationScript {
    pub fn new(plan: ScriptPlan, target: FieldTarget, source_field: impl Into<String>) -> Self {
        let source_field = source_field.into();
        let source = render_painless(&plan, &target, &source_field);
        Self { plan, target, source_field, source }
    }

    pub fn plan(&self) -> &ScriptPlan {
        &self.plan
    }

    pub fn target(&self) -> &FieldTarget {
        &self.target
    }

    /// Generated Painless source, one line.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lang(&self) -> &'static str {
        SCRIPT_LANG
    }

    pub fn to_json(&self) -> Value {
        json!({ "source": self.source, "lang": SCRIPT_LANG })
    }

    /// The value the script would write for `text`. `None` means no write.
    pub fn evaluate(&self, text: &str) -> Result<Option<FieldValue>, ProxiscanError> {
        let field = &self.target.field_name;
        let ner = self.target.target == Target::Ner;
        match &self.plan {
            ScriptPlan::MarkNegative => Ok(Some(FieldValue::Flag(false))),
            ScriptPlan::FirstMatch { regex } => {
                let first = regex.first_candidate(text);
                if let Some(candidate) = &first {
                    log_candidate_debug(field, candidate.pattern.as_str(), None);
                }
                Ok(if ner {
                    first.map(|c| FieldValue::Extracted(c.pattern.as_str().to_string()))
                } else {
                    Some(FieldValue::Flag(first.is_some()))
                })
            }
            ScriptPlan::ChecksumScan { regex, checksum } => {
                let algorithm = checksum
                    .algorithm
                    .ok_or_else(|| ProxiscanError::AlgorithmNotFound { name: checksum.name.clone() })?;
                let mut passing = None;
                for candidate in regex.candidates(text) {
                    let raw = candidate.pattern.as_str();
                    let passed = algorithm.validate(&clean_digits(raw));
                    log_candidate_debug(field, raw, Some(passed));
                    if passed {
                        passing = Some(raw.to_string());
                        break;
                    }
                }
                Ok(if ner {
                    passing.map(FieldValue::Extracted)
                } else {
                    Some(FieldValue::Flag(passing.is_some()))
                })
            }
        }
    }

    /// Runs the script against a document `_source`, merging the result into
    /// its bucket. The bucket is created even when nothing is written.
    pub fn apply(&self, doc: &mut Value) -> Result<Option<FieldValue>, ProxiscanError> {
        let value = match self.plan {
            ScriptPlan::MarkNegative => Some(FieldValue::Flag(false)),
            _ => {
                let text = lookup_field(doc, &self.source_field).and_then(Value::as_str).ok_or_else(|| {
                    ProxiscanError::Document(format!("missing text field '{}'", self.source_field))
                })?;
                self.evaluate(text)?
            }
        };

        let source = doc
            .as_object_mut()
            .ok_or_else(|| ProxiscanError::Document("document source is not an object".to_string()))?;
        let bucket = source.entry(self.target.bucket()).or_insert(Value::Null);
        if bucket.is_null() {
            *bucket = Value::Object(Map::new());
        }
        let bucket = bucket.as_object_mut().ok_or_else(|| {
            ProxiscanError::Document(format!("'{}' is not an object", self.target.bucket()))
        })?;
        if let Some(value) = &value {
            bucket.insert(self.target.field_name.clone(), value.to_json());
        }
        Ok(value)
    }
}

/// Name of the Painless function wrapping a checksum fragment.
pub fn checksum_function_name(algorithm: &str) -> String {
    let sanitized: String =
        algorithm.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect();
    format!("checksum_{}", sanitized)
}

/// Wraps a fragment so its shared `passChecksum` flag stays local to one call.
pub fn checksum_function(fragment: &ChecksumFragment) -> String {
    format!(
        "boolean {}(String cleanMatch) {{ boolean passChecksum = false; {} return passChecksum; }}",
        checksum_function_name(&fragment.name),
        fragment.body
    )
}

/// A regex as a Painless `/.../` literal.
pub fn regex_literal(source: &str) -> String {
    format!("/{}/", source.replace('/', "\\/"))
}

fn render_painless(plan: &ScriptPlan, target: &FieldTarget, source_field: &str) -> String {
    let bucket = target.bucket();
    let guard =
        format!("if (ctx._source.{b} == null) {{ ctx._source.{b} = new HashMap(); }}", b = bucket);
    let put = |value: &str| format!("ctx._source.{}.put('{}', {});", bucket, target.field_name, value);
    let ner = target.target == Target::Ner;

    match plan {
        ScriptPlan::MarkNegative => format!("{} {}", guard, put("false")),
        ScriptPlan::FirstMatch { regex } => {
            let matcher = format!(
                "Pattern pattern = {}; Matcher matcher = pattern.matcher(ctx._source.{});",
                regex_literal(regex.as_str()),
                source_field
            );
            if ner {
                format!(
                    "String firstMatch = null; {} if (matcher.find()) {{ firstMatch = matcher.group({}); }} {} if (firstMatch != null) {{ {} }}",
                    matcher,
                    PATTERN_GROUP,
                    guard,
                    put("firstMatch")
                )
            } else {
                format!(
                    "boolean foundMatch = false; {} if (matcher.find()) {{ foundMatch = true; }} {} {}",
                    matcher,
                    guard,
                    put("foundMatch")
                )
            }
        }
        ScriptPlan::ChecksumScan { regex, checksum } => {
            let function = checksum_function(checksum);
            let call = checksum_function_name(&checksum.name);
            let (declare, on_pass, write) = if ner {
                (
                    "String firstMatch = null;",
                    "firstMatch = rawMatch; break;",
                    format!("if (firstMatch != null) {{ {} }}", put("firstMatch")),
                )
            } else {
                ("boolean passChecksum = false;", "passChecksum = true; break;", put("passChecksum"))
            };
            format!(
                "{} {} Pattern pattern = {}; Matcher matcher = pattern.matcher(ctx._source.{}); while (matcher.find()) {{ String rawMatch = matcher.group({}); String cleanMatch = /[^0-9]/.matcher(rawMatch).replaceAll(''); if ({}(cleanMatch)) {{ {} }} }} {} {}",
                function,
                declare,
                regex_literal(regex.as_str()),
                source_field,
                PATTERN_GROUP,
                call,
                on_pass,
                guard,
                write
            )
        }
    }
}
