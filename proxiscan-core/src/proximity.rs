//! Builds the composite proximity regex shared by detection and visualisation.
//!
//! The composite form is
//!
//! ```text
//! (?i)(\b(?:<context-alternation>)\b)[\s\S]{0,<max_gap>}?(<pattern-body>)
//! ```
//!
//! Group 1 is always the context occurrence and group 2 always the pattern
//! occurrence. Context words only match on word boundaries, the same rule the
//! highlighter applies. The context must come first: the regex never looks backwards
//! from a pattern for a trailing context word.
//!
//! License: MIT OR Apache-2.0

use log::debug;
use regex::{Captures, Match, Regex, RegexBuilder};

use crate::config::{DetectorConfig, PatternSpec};
use crate::errors::ProxiscanError;

/// Optional separator allowed between consecutive chunks of a chunked pattern.
pub const CHUNK_SEPARATOR: &str = r"[\s\-]?";

/// Capture group holding the context occurrence.
pub const CONTEXT_GROUP: usize = 1;

/// Capture group holding the pattern occurrence.
pub const PATTERN_GROUP: usize = 2;

/// Size limit for compiled regexes (10 MB), large proximity windows grow quickly.
pub(crate) const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Renders the pattern body: single fragments verbatim, chunks joined by
/// [`CHUNK_SEPARATOR`]. Each chunk is wrapped in a plain group so an
/// alternation inside one chunk cannot swallow its neighbours.
///
/// The body is also sent as a Lucene `regexp`, which has no `(?:...)` syntax.
/// Plain groups are valid in both engines and open after the pattern group, so
/// [`PATTERN_GROUP`] is unaffected.
pub fn pattern_body(spec: &PatternSpec) -> String {
    match spec {
        PatternSpec::Single(pattern) => pattern.clone(),
        PatternSpec::Chunked(chunks) => chunks
            .iter()
            .map(|c| format!("({})", c))
            .collect::<Vec<_>>()
            .join(CHUNK_SEPARATOR),
    }
}

/// Joins the context words into a literal alternation.
///
/// An empty word list yields an empty alternation, which matches the empty
/// string everywhere and so gates nothing.
pub fn context_alternation(words: &[String]) -> String {
    words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|")
}

/// The body of group 1: the word-bounded alternation, or nothing at all when
/// no context words are configured.
pub fn context_group(words: &[String]) -> String {
    if words.is_empty() {
        String::new()
    } else {
        format!(r"\b(?:{})\b", context_alternation(words))
    }
}

/// Renders the composite regex source without compiling it.
pub fn composite_source(spec: &PatternSpec, words: &[String], max_gap: usize) -> String {
    format!(r"(?i)({})[\s\S]{{0,{}}}?({})", context_group(words), max_gap, pattern_body(spec))
}

pub(crate) fn compile(source: &str) -> Result<Regex, ProxiscanError> {
    RegexBuilder::new(source)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| ProxiscanError::PatternCompile { pattern: source.to_string(), source: e })
}

/// A context occurrence followed, within the window, by a pattern occurrence.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'t> {
    /// Empty (zero-width) when no context words are configured.
    pub context: Match<'t>,
    pub pattern: Match<'t>,
}

impl<'t> Candidate<'t> {
    fn from_captures(caps: &Captures<'t>) -> Option<Self> {
        Some(Self { context: caps.get(CONTEXT_GROUP)?, pattern: caps.get(PATTERN_GROUP)? })
    }
}

/// The compiled composite regex.
#[derive(Debug, Clone)]
pub struct ProximityRegex {
    source: String,
    regex: Regex,
    max_gap: usize,
}

impl ProximityRegex {
    /// Builds and compiles the composite regex.
    pub fn build(spec: &PatternSpec, words: &[String], max_gap: usize) -> Result<Self, ProxiscanError> {
        let source = composite_source(spec, words, max_gap);
        debug!("Compiling proximity regex: {}", source);
        let regex = compile(&source)?;
        Ok(Self { source, regex, max_gap })
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self, ProxiscanError> {
        Self::build(&config.pattern_regex, &config.context_words, config.proximity)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn max_gap(&self) -> usize {
        self.max_gap
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The first candidate in document order, if any.
    pub fn first_candidate<'t>(&self, text: &'t str) -> Option<Candidate<'t>> {
        self.regex.captures(text).as_ref().and_then(Candidate::from_captures)
    }

    /// All non-overlapping candidates in document order.
    pub fn candidates<'r, 't>(&'r self, text: &'t str) -> impl Iterator<Item = Candidate<'t>> + 'r
    where
        't: 'r,
    {
        self.regex.captures_iter(text).filter_map(|caps| Candidate::from_captures(&caps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tfn_chunks() -> PatternSpec {
        PatternSpec::Chunked(vec!["[0-9]{3}".into(), "[0-9]{3}".into(), "[0-9]{3}".into()])
    }

    #[test]
    fn composite_has_fixed_shape() {
        let source = composite_source(&PatternSpec::Single("[0-9]{9}".into()), &["TFN".into()], 50);
        assert_eq!(source, r"(?i)(\b(?:TFN)\b)[\s\S]{0,50}?([0-9]{9})");
    }

    #[test]
    fn chunks_use_plain_groups() {
        assert_eq!(pattern_body(&tfn_chunks()), r"([0-9]{3})[\s\-]?([0-9]{3})[\s\-]?([0-9]{3})");
        assert!(!pattern_body(&tfn_chunks()).contains("(?:"));
        let regex = ProximityRegex::build(&tfn_chunks(), &["TFN".into()], 50).unwrap();
        let candidate = regex.first_candidate("TFN: 288 946 270").unwrap();
        assert_eq!(candidate.pattern.as_str(), "288 946 270");
    }

    #[test]
    fn context_words_match_whole_words_only() {
        let regex = ProximityRegex::build(&PatternSpec::Single(r"\d{3}-\d{2}-\d{4}".into()), &["SSN".into()], 50)
            .unwrap();
        assert!(regex.is_match("ssn 123-45-6789"));
        assert!(!regex.is_match("SSNs: 123-45-6789"));
        assert!(!regex.is_match("XSSN 123-45-6789"));
    }

    #[test]
    fn empty_context_is_an_open_gate() {
        let source = composite_source(&PatternSpec::Single("x".into()), &[], 10);
        assert_eq!(source, r"(?i)()[\s\S]{0,10}?(x)");
        let regex = ProximityRegex::build(&PatternSpec::Single("[0-9]{4}".into()), &[], 10).unwrap();
        let candidate = regex.first_candidate("no context at all 1234").unwrap();
        assert_eq!(candidate.pattern.as_str(), "1234");
        assert!(candidate.context.as_str().is_empty());
    }

    #[test]
    fn context_words_are_escaped() {
        let alternation = context_alternation(&["a.b".into(), "tax file number".into()]);
        assert_eq!(alternation, r"a\.b|tax file number");
    }

    #[test]
    fn chunk_separators_match_identically() {
        let regex = ProximityRegex::build(&tfn_chunks(), &["TFN".into()], 50).unwrap();
        for text in ["TFN 288946270", "TFN 288 946 270", "TFN 288-946-270"] {
            let candidate = regex.first_candidate(text).expect(text);
            assert_eq!(candidate.context.as_str(), "TFN");
            assert_eq!(crate::checksums::clean_digits(candidate.pattern.as_str()), "288946270");
        }
        assert!(!regex.is_match("TFN 288__946_270"));
    }

    #[test]
    fn context_must_precede_pattern() {
        let regex = ProximityRegex::build(&PatternSpec::Single(r"\d{3}-\d{2}-\d{4}".into()), &["SSN".into()], 50)
            .unwrap();
        assert!(regex.is_match("SSN: 123-45-6789"));
        assert!(!regex.is_match("invoice 123-45-6789 foo SSN"));
    }

    #[test]
    fn gap_is_bounded_in_characters() {
        let regex = ProximityRegex::build(&PatternSpec::Single("[0-9]{4}".into()), &["pin".into()], 5).unwrap();
        assert!(regex.is_match("PIN: 1234"));
        assert!(regex.is_match("pin éééé1234"));
        assert!(!regex.is_match("pin ......... 1234"));
    }

    #[test]
    fn candidates_iterate_in_document_order() {
        let regex = ProximityRegex::build(&tfn_chunks(), &["TFN".into()], 50).unwrap();
        let text = "TFN 123 456 789, later TFN 288-946-270";
        let found: Vec<&str> = regex.candidates(text).map(|c| c.pattern.as_str()).collect();
        assert_eq!(found, vec!["123 456 789", "288-946-270"]);
    }

    #[test]
    fn malformed_pattern_is_a_compile_error() {
        let err = ProximityRegex::build(&PatternSpec::Single("([0-9".into()), &[], 50).unwrap_err();
        assert!(matches!(err, ProxiscanError::PatternCompile { .. }));
    }

    #[test]
    fn pattern_group_stays_second_with_user_groups() {
        let regex =
            ProximityRegex::build(&PatternSpec::Single("(ab)(c)".into()), &["key".into()], 5).unwrap();
        let candidate = regex.first_candidate("key: abc").unwrap();
        assert_eq!(candidate.pattern.as_str(), "abc");
    }
}
