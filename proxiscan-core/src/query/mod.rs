//! Compiles a detector configuration and a [`DetectionMode`] into the request
//! an Elasticsearch run needs: a selection predicate and, for mutating modes,
//! a mutation script.
//!
//! Compilation is all-or-nothing. The composite regex is compiled and the
//! checksum algorithm is resolved before anything is returned, so a bad
//! pattern or an unknown algorithm never reaches the network.

pub mod predicate;
pub mod script;

use log::{debug, info};
use serde_json::{json, Value};

use crate::checksums::ChecksumLoader;
use crate::config::DetectorConfig;
use crate::errors::ProxiscanError;
use crate::mode::{DetectionMode, Direction, FieldTarget};
use crate::proximity::{pattern_body, ProximityRegex};

pub use predicate::{Condition, Predicate};
pub use script::{FieldValue, MutationScript, ScriptPlan};

/// The output of [`QueryCompiler::compile`].
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub mode: DetectionMode,
    pub target: FieldTarget,
    pub predicate: Predicate,
    /// Present only for mutating modes.
    pub script: Option<MutationScript>,
    pub regex: ProximityRegex,
}

impl CompiledQuery {
    /// `_search` request body.
    pub fn search_body(&self) -> Value {
        json!({ "query": self.predicate.to_json() })
    }

    /// `_update_by_query` request body, for mutating modes.
    pub fn update_body(&self) -> Option<Value> {
        self.script.as_ref().map(|script| {
            json!({
                "script": script.to_json(),
                "query": self.predicate.to_json(),
            })
        })
    }

    /// The body this mode sends: update body when mutating, search body otherwise.
    pub fn request_body(&self) -> Value {
        self.update_body().unwrap_or_else(|| self.search_body())
    }

    /// Whether a document `_source` would be selected by this run.
    pub fn selects(&self, doc: &Value) -> Result<bool, ProxiscanError> {
        self.predicate.matches(doc)
    }
}

/// Turns detector configurations into compiled queries.
#[derive(Debug, Default)]
pub struct QueryCompiler {
    loader: ChecksumLoader,
}

impl QueryCompiler {
    pub fn new(loader: ChecksumLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &ChecksumLoader {
        &self.loader
    }

    pub fn compile(&self, config: &DetectorConfig, mode: DetectionMode) -> Result<CompiledQuery, ProxiscanError> {
        let mut config = config.clone();
        config.validate()?;

        let target = FieldTarget::new(mode.target(), config.field_name.clone());
        let regex = ProximityRegex::from_config(&config)?;
        let predicate = build_predicate(&config, mode, &target);

        let script = if mode.is_mutation() {
            let plan = match (mode.direction(), &config.checksum) {
                (Direction::Reverse, _) => ScriptPlan::MarkNegative,
                (Direction::Forward, Some(name)) => {
                    let checksum = self.loader.load(name)?;
                    ScriptPlan::ChecksumScan { regex: regex.clone(), checksum }
                }
                (Direction::Forward, None) => ScriptPlan::FirstMatch { regex: regex.clone() },
            };
            Some(MutationScript::new(plan, target.clone(), config.source_field.clone()))
        } else {
            None
        };

        info!("Compiled detector '{}' in {} mode.", config.field_name, mode);
        debug!("Selection predicate: {}", predicate.to_json());
        Ok(CompiledQuery { mode, target, predicate, script, regex })
    }
}

/// Builds the selection predicate for a mode.
pub fn build_predicate(config: &DetectorConfig, mode: DetectionMode, target: &FieldTarget) -> Predicate {
    let body = pattern_body(&config.pattern_regex);
    let pattern_clause = Condition::contains_pattern(&config.source_field, &body);

    let mut must = vec![Condition::exists(config.source_field.clone())];
    if !config.context_words.is_empty() {
        must.push(Condition::any_word(&config.context_words, config.source_field.clone()));
    }
    let mut must_not = Vec::new();
    if mode.is_mutation() {
        must_not.push(Condition::exists(target.path()));
    }
    match mode.direction() {
        Direction::Forward => must.push(pattern_clause),
        Direction::Reverse => must_not.push(pattern_clause),
    }
    Predicate { must, must_not }
}

/// Compiles with the embedded checksum library.
pub fn compile(config: &DetectorConfig, mode: DetectionMode) -> Result<CompiledQuery, ProxiscanError> {
    QueryCompiler::default().compile(config, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternSpec;
    use crate::mode::Target;

    fn ssn_config() -> DetectorConfig {
        let mut config = DetectorConfig::new("HasSSN", PatternSpec::Single(r"[0-9]{3}-[0-9]{2}-[0-9]{4}".into()));
        config.context_words = vec!["SSN".into()];
        config
    }

    #[test]
    fn search_modes_have_no_script() {
        let compiled = compile(&ssn_config(), DetectionMode::Preview(Target::Pii)).unwrap();
        assert!(compiled.script.is_none());
        assert!(compiled.update_body().is_none());
        assert_eq!(compiled.request_body(), compiled.search_body());
    }

    #[test]
    fn preview_drops_the_labelled_exclusion() {
        let compiled = compile(&ssn_config(), DetectionMode::Preview(Target::Pii)).unwrap();
        assert!(compiled.predicate.must_not.is_empty());
        let compiled = compile(&ssn_config(), DetectionMode::Detect(Target::Pii)).unwrap();
        assert_eq!(compiled.predicate.must_not, vec![Condition::exists("PII.HasSSN")]);
    }

    #[test]
    fn reverse_moves_the_pattern_to_must_not() {
        let compiled = compile(&ssn_config(), DetectionMode::DetectNegatives).unwrap();
        assert_eq!(compiled.predicate.must.len(), 2);
        assert_eq!(compiled.predicate.must_not.len(), 2);
        assert!(matches!(compiled.script.unwrap().plan(), ScriptPlan::MarkNegative));
    }

    #[test]
    fn reverse_mutate_ignores_the_checksum() {
        let mut config = ssn_config();
        config.checksum = Some("does_not_exist".into());
        assert!(compile(&config, DetectionMode::DetectNegatives).is_ok());
        let err = compile(&config, DetectionMode::Detect(Target::Pii)).unwrap_err();
        assert!(matches!(err, ProxiscanError::AlgorithmNotFound { ref name } if name == "does_not_exist"));
    }

    #[test]
    fn malformed_pattern_fails_in_every_mode() {
        let config = DetectorConfig::new("Bad", PatternSpec::Single("([0-9".into()));
        for mode in [DetectionMode::Preview(Target::Pii), DetectionMode::DetectNegatives] {
            assert!(matches!(compile(&config, mode), Err(ProxiscanError::PatternCompile { .. })));
        }
    }

    #[test]
    fn update_body_carries_script_and_query() {
        let compiled = compile(&ssn_config(), DetectionMode::Detect(Target::Ner)).unwrap();
        let body = compiled.update_body().unwrap();
        assert_eq!(body["script"]["lang"], "painless");
        assert!(body["script"]["source"].as_str().unwrap().contains("named_entities"));
        assert_eq!(body["query"], compiled.predicate.to_json());
    }
}
