//! Selection predicates: which documents a detection run looks at.
//!
//! A [`Predicate`] renders to an Elasticsearch `bool` query and can also be
//! evaluated against a JSON document locally, which is how the test suites
//! check idempotence without a cluster.

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::errors::ProxiscanError;
use crate::proximity;

/// Suffix of the keyword sub-field regex conditions run against.
pub const KEYWORD_SUFFIX: &str = ".keyword";

/// One leaf clause of a selection predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The field is present and not null.
    Exists { field: String },
    /// The whole field value matches `pattern` (Lucene `regexp` semantics).
    Regexp { field: String, pattern: String },
    /// Any of `words` occurs in `default_field`. Phrases are quoted when rendered.
    QueryString { words: Vec<String>, default_field: String },
}

impl Condition {
    pub fn exists(field: impl Into<String>) -> Self {
        Condition::Exists { field: field.into() }
    }

    /// `.*<body>.*` over the keyword sub-field of `source_field`.
    pub fn contains_pattern(source_field: &str, body: &str) -> Self {
        Condition::Regexp {
            field: format!("{}{}", source_field, KEYWORD_SUFFIX),
            pattern: format!(".*{}.*", body),
        }
    }

    pub fn any_word(words: &[String], default_field: impl Into<String>) -> Self {
        Condition::QueryString { words: words.to_vec(), default_field: default_field.into() }
    }

    /// Renders the `query_string` query text: words ORed, phrases quoted.
    pub fn query_text(words: &[String]) -> String {
        words
            .iter()
            .map(|w| if w.contains(' ') { format!("\"{}\"", w) } else { w.clone() })
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    pub fn to_json(&self) -> Value {
        match self {
            Condition::Exists { field } => json!({ "exists": { "field": field } }),
            Condition::Regexp { field, pattern } => {
                let mut inner = Map::new();
                inner.insert(field.clone(), Value::String(pattern.clone()));
                json!({ "regexp": inner })
            }
            Condition::QueryString { words, default_field } => json!({
                "query_string": {
                    "query": Self::query_text(words),
                    "default_field": default_field,
                }
            }),
        }
    }

    /// Local approximation of how the store evaluates this clause.
    pub fn matches(&self, doc: &Value) -> Result<bool, ProxiscanError> {
        match self {
            Condition::Exists { field } => Ok(match lookup_field(doc, field) {
                None | Some(Value::Null) => false,
                Some(Value::Array(items)) => !items.is_empty(),
                Some(_) => true,
            }),
            Condition::Regexp { field, pattern } => {
                let Some(text) = lookup_text(doc, strip_keyword(field)) else {
                    return Ok(false);
                };
                let regex = proximity::compile(&format!(r"(?s)\A(?:{})\z", pattern))?;
                Ok(regex.is_match(text))
            }
            Condition::QueryString { words, default_field } => {
                let Some(text) = lookup_text(doc, default_field) else {
                    return Ok(false);
                };
                if words.is_empty() {
                    return Ok(false);
                }
                Ok(word_regex(words)?.is_match(text))
            }
        }
    }
}

/// Conjunction of `must` clauses with none of the `must_not` clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    pub must: Vec<Condition>,
    pub must_not: Vec<Condition>,
}

impl Predicate {
    pub fn to_json(&self) -> Value {
        json!({
            "bool": {
                "must": self.must.iter().map(Condition::to_json).collect::<Vec<_>>(),
                "must_not": self.must_not.iter().map(Condition::to_json).collect::<Vec<_>>(),
            }
        })
    }

    pub fn matches(&self, doc: &Value) -> Result<bool, ProxiscanError> {
        for condition in &self.must {
            if !condition.matches(doc)? {
                return Ok(false);
            }
        }
        for condition in &self.must_not {
            if condition.matches(doc)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Case-insensitive, word-bounded alternation over context words.
///
/// The same group the composite regex uses, shared with the highlighter so all
/// three agree on what a context hit is.
pub(crate) fn word_regex(words: &[String]) -> Result<Regex, ProxiscanError> {
    proximity::compile(&format!("(?i){}", proximity::context_group(words)))
}

fn strip_keyword(field: &str) -> &str {
    field.strip_suffix(KEYWORD_SUFFIX).unwrap_or(field)
}

/// Resolves a dotted path inside a JSON document.
pub fn lookup_field<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, key| value.as_object()?.get(key))
}

fn lookup_text<'a>(doc: &'a Value, path: &str) -> Option<&'a str> {
    lookup_field(doc, path).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_text_quotes_phrases() {
        let words = vec!["TFN".to_string(), "tax file number".to_string()];
        assert_eq!(Condition::query_text(&words), "TFN OR \"tax file number\"");
    }

    #[test]
    fn regexp_renders_under_keyword_field() {
        let json = Condition::contains_pattern("document_text", "[0-9]{9}").to_json();
        assert_eq!(json, json!({ "regexp": { "document_text.keyword": ".*[0-9]{9}.*" } }));
    }

    #[test]
    fn exists_treats_null_as_absent() {
        let condition = Condition::exists("PII.HasTFN");
        assert!(!condition.matches(&json!({ "PII": { "HasTFN": null } })).unwrap());
        assert!(!condition.matches(&json!({ "PII": {} })).unwrap());
        assert!(condition.matches(&json!({ "PII": { "HasTFN": false } })).unwrap());
    }

    #[test]
    fn regexp_is_whole_value_and_case_sensitive() {
        let condition = Condition::contains_pattern("body", "abc");
        assert!(condition.matches(&json!({ "body": "xx\nabc\nyy" })).unwrap());
        assert!(!condition.matches(&json!({ "body": "ABC" })).unwrap());
        assert!(!condition.matches(&json!({ "other": "abc" })).unwrap());
    }

    #[test]
    fn query_string_is_word_bounded() {
        let condition = Condition::any_word(&["TFN".to_string(), "tax file".to_string()], "body");
        assert!(condition.matches(&json!({ "body": "my tfn is" })).unwrap());
        assert!(condition.matches(&json!({ "body": "the Tax File here" })).unwrap());
        assert!(!condition.matches(&json!({ "body": "TFNs" })).unwrap());
    }

    #[test]
    fn predicate_combines_clauses() {
        let predicate = Predicate {
            must: vec![Condition::exists("body")],
            must_not: vec![Condition::exists("PII.Flag")],
        };
        assert!(predicate.matches(&json!({ "body": "x" })).unwrap());
        assert!(!predicate.matches(&json!({ "body": "x", "PII": { "Flag": true } })).unwrap());
        assert!(!predicate.matches(&json!({})).unwrap());
    }
}
