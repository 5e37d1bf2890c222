// proxiscan-core/src/lib.rs
//! # Proxiscan Core Library
//!
//! `proxiscan-core` holds the matching semantics behind proxiscan: a declarative
//! detector (pattern, context words, optional checksum, proximity window) is
//! compiled into an Elasticsearch selection predicate plus a Painless mutation
//! script, and the very same detector drives a local highlighter that shows which
//! context words were near or far from a pattern occurrence.
//!
//! The two execution paths never talk to each other. They agree because both are
//! derived from one [`DetectorConfig`] through one [`ProximityRegex`] shape, and
//! because the generated script can be interpreted locally
//! ([`MutationScript::evaluate`]) for conformance testing.
//!
//! The library does no network I/O. Loading YAML configs and checksum directories
//! is the only filesystem access.
//!
//! ## Modules
//!
//! * `config`: [`DetectorConfig`] and [`PatternSpec`], YAML loading and validation.
//! * `checksums`: check-digit algorithms, native validators and the Painless fragment loader.
//! * `proximity`: builds the composite `(context)[gap](pattern)` regex.
//! * `mode`: [`DetectionMode`], the closed set of direction/action/target combinations.
//! * `query`: compiles a detector and a mode into a predicate and a mutation script.
//! * `highlight`: replicates matching over raw text and produces annotated spans.
//! * `match_log`: PII-safe debug logging of matched values.
//! * `errors`: the [`ProxiscanError`] type.
//!
//! ## Usage Example
//!
//! ```rust
//! use proxiscan_core::{compile, highlight, segments, DetectionMode, DetectorConfig, Target};
//!
//! let config = DetectorConfig::from_yaml_str(
//!     "fieldName: HasTFN\npatternRegex: ['[0-9]{3}', '[0-9]{3}', '[0-9]{3}']\ncontextWords: [TFN]\nchecksum: au_tfn\n",
//! )?;
//!
//! // Server side: the update_by_query body.
//! let compiled = compile(&config, DetectionMode::Detect(Target::Pii))?;
//! let body = compiled.update_body().expect("mutating modes carry a script");
//! assert_eq!(body["script"]["lang"], "painless");
//!
//! // Client side: the same detector, highlighted.
//! let text = "Client TFN: 288 946 270";
//! let spans = highlight(text, &config.pattern_regex, &config.context_words, config.proximity);
//! let rebuilt: String = segments(text, &spans).iter().map(|s| s.text()).collect();
//! assert_eq!(rebuilt, text);
//! # Ok::<(), proxiscan_core::ProxiscanError>(())
//! ```

pub mod checksums;
pub mod config;
pub mod errors;
pub mod highlight;
pub mod match_log;
pub mod mode;
pub mod proximity;
pub mod query;

pub use checksums::{clean_digits, ChecksumAlgorithm, ChecksumFragment, ChecksumLoader};
pub use config::{DetectorConfig, PatternSpec, DEFAULT_PROXIMITY, DEFAULT_SOURCE_FIELD};
pub use errors::ProxiscanError;
pub use highlight::{highlight, resolve_overlaps, segments, Highlighter, MatchSpan, Segment, SpanKind};
pub use mode::{Action, DetectionMode, Direction, FieldTarget, Target, NER_BUCKET, PII_BUCKET};
pub use proximity::{Candidate, ProximityRegex};
pub use query::{
    build_predicate, compile, CompiledQuery, Condition, FieldValue, MutationScript, Predicate, QueryCompiler,
    ScriptPlan,
};
