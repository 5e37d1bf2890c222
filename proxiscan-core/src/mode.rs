//! Detection modes: which documents to select and what to write back.
//!
//! The three axes (direction, action, target) are folded into one closed enum
//! so invalid combinations cannot be constructed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ProxiscanError;

/// Bucket holding boolean PII flags.
pub const PII_BUCKET: &str = "PII";

/// Bucket holding extracted named-entity strings.
pub const NER_BUCKET: &str = "named_entities";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Select documents that match the detection regex.
    Forward,
    /// Select documents that do not match, to record explicit negatives.
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Preview matching documents without writing anything.
    Search,
    /// Write the detection result back onto each selected document.
    Mutate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Boolean flag under the `PII` bucket.
    Pii,
    /// Extracted match text under the `named_entities` bucket.
    Ner,
}

impl Target {
    pub fn bucket(&self) -> &'static str {
        match self {
            Target::Pii => PII_BUCKET,
            Target::Ner => NER_BUCKET,
        }
    }

    /// Elasticsearch mapping type of the result field.
    pub fn mapping_type(&self) -> &'static str {
        match self {
            Target::Pii => "boolean",
            Target::Ner => "text",
        }
    }
}

/// The result attribute a detector writes, namespaced under its bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldTarget {
    pub target: Target,
    pub field_name: String,
}

impl FieldTarget {
    pub fn new(target: Target, field_name: impl Into<String>) -> Self {
        Self { target, field_name: field_name.into() }
    }

    pub fn bucket(&self) -> &'static str {
        self.target.bucket()
    }

    /// Dotted document path, e.g. `PII.HasTFN`.
    pub fn path(&self) -> String {
        format!("{}.{}", self.bucket(), self.field_name)
    }
}

/// A valid combination of direction, action and target.
///
/// Reverse direction only ever records `false` flags, so it has no NER variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Forward search: inspect matching documents, labelled or not.
    Preview(Target),
    /// Reverse search: inspect non-matching documents.
    PreviewNegatives,
    /// Forward mutate: label matching, not-yet-labelled documents.
    Detect(Target),
    /// Reverse mutate: write `false` onto non-matching, not-yet-labelled documents.
    DetectNegatives,
}

impl DetectionMode {
    /// Validates a flag combination.
    pub fn new(direction: Direction, action: Action, target: Target) -> Result<Self, ProxiscanError> {
        match (direction, action, target) {
            (Direction::Reverse, _, Target::Ner) => Err(ProxiscanError::config(
                "reverse mode cannot be combined with named-entity extraction",
            )),
            (Direction::Forward, Action::Search, t) => Ok(DetectionMode::Preview(t)),
            (Direction::Forward, Action::Mutate, t) => Ok(DetectionMode::Detect(t)),
            (Direction::Reverse, Action::Search, Target::Pii) => Ok(DetectionMode::PreviewNegatives),
            (Direction::Reverse, Action::Mutate, Target::Pii) => Ok(DetectionMode::DetectNegatives),
        }
    }

    /// Convenience constructor from the classic CLI switches.
    pub fn from_flags(reverse: bool, search: bool, ner: bool) -> Result<Self, ProxiscanError> {
        let direction = if reverse { Direction::Reverse } else { Direction::Forward };
        let action = if search { Action::Search } else { Action::Mutate };
        let target = if ner { Target::Ner } else { Target::Pii };
        Self::new(direction, action, target)
    }

    pub fn direction(&self) -> Direction {
        match self {
            DetectionMode::Preview(_) | DetectionMode::Detect(_) => Direction::Forward,
            DetectionMode::PreviewNegatives | DetectionMode::DetectNegatives => Direction::Reverse,
        }
    }

    pub fn action(&self) -> Action {
        match self {
            DetectionMode::Preview(_) | DetectionMode::PreviewNegatives => Action::Search,
            DetectionMode::Detect(_) | DetectionMode::DetectNegatives => Action::Mutate,
        }
    }

    pub fn target(&self) -> Target {
        match self {
            DetectionMode::Preview(t) | DetectionMode::Detect(t) => *t,
            DetectionMode::PreviewNegatives | DetectionMode::DetectNegatives => Target::Pii,
        }
    }

    pub fn is_mutation(&self) -> bool {
        self.action() == Action::Mutate
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction() {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        };
        let action = match self.action() {
            Action::Search => "search",
            Action::Mutate => "mutate",
        };
        let target = match self.target() {
            Target::Pii => "pii",
            Target::Ner => "ner",
        };
        write!(f, "{}/{}/{}", direction, action, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_ner_is_rejected() {
        assert!(DetectionMode::from_flags(true, false, true).is_err());
        assert!(DetectionMode::from_flags(true, true, true).is_err());
    }

    #[test]
    fn accessors_reflect_construction() {
        for reverse in [false, true] {
            for search in [false, true] {
                for ner in [false, true] {
                    let Ok(mode) = DetectionMode::from_flags(reverse, search, ner) else { continue };
                    assert_eq!(mode.direction() == Direction::Reverse, reverse);
                    assert_eq!(mode.action() == Action::Search, search);
                    assert_eq!(mode.target() == Target::Ner, ner);
                }
            }
        }
    }

    #[test]
    fn field_target_path_is_namespaced() {
        assert_eq!(FieldTarget::new(Target::Pii, "HasTFN").path(), "PII.HasTFN");
        assert_eq!(FieldTarget::new(Target::Ner, "TFN").path(), "named_entities.TFN");
    }

    #[test]
    fn display_names_all_axes() {
        assert_eq!(DetectionMode::Detect(Target::Ner).to_string(), "forward/mutate/ner");
        assert_eq!(DetectionMode::PreviewNegatives.to_string(), "reverse/search/pii");
    }
}
