//! Highlight replication: re-runs pattern and context matching over raw text
//! and classifies every context occurrence as near or far.
//!
//! Classification mirrors the composite detection regex. A context occurrence
//! is near only when a pattern occurrence starts at or after its end within the
//! proximity window. A context word that trails a pattern is always far, since
//! detection never looks backwards.
//!
//! Rendering is best-effort: [`highlight`] never fails, a pattern that does not
//! compile simply yields no spans.

use log::warn;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::config::{DetectorConfig, PatternSpec};
use crate::errors::ProxiscanError;
use crate::match_log::log_span_debug;
use crate::proximity::{self, pattern_body};
use crate::query::predicate::word_regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    Pattern,
    ContextNear,
    ContextFar,
}

impl SpanKind {
    /// CSS class / short label used by renderers.
    pub fn label(&self) -> &'static str {
        match self {
            SpanKind::Pattern => "pattern",
            SpanKind::ContextNear => "near",
            SpanKind::ContextFar => "far",
        }
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A highlighted byte range `[start, end)` of the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
    pub text: String,
}

impl MatchSpan {
    fn new(text: &str, start: usize, end: usize, kind: SpanKind) -> Self {
        Self { start, end, kind, text: text[start..end].to_string() }
    }

    pub fn overlaps(&self, other: &MatchSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Pattern and context matchers compiled from one detector.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Regex,
    context: Option<Regex>,
    max_gap: usize,
}

impl Highlighter {
    pub fn new(spec: &PatternSpec, words: &[String], max_gap: usize) -> Result<Self, ProxiscanError> {
        let pattern = proximity::compile(&format!("(?i)(?:{})", pattern_body(spec)))?;
        let context = if words.is_empty() { None } else { Some(word_regex(words)?) };
        Ok(Self { pattern, context, max_gap })
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self, ProxiscanError> {
        Self::new(&config.pattern_regex, &config.context_words, config.proximity)
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Every pattern occurrence and classified context occurrence, overlap-free,
    /// ordered by position.
    pub fn spans(&self, text: &str) -> Vec<MatchSpan> {
        let patterns: Vec<MatchSpan> = self
            .pattern
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| MatchSpan::new(text, m.start(), m.end(), SpanKind::Pattern))
            .collect();

        let mut spans = Vec::with_capacity(patterns.len());
        if let Some(context) = &self.context {
            for m in context.find_iter(text).filter(|m| !m.is_empty()) {
                let near = patterns.iter().any(|p| {
                    p.start >= m.end() && text[m.end()..p.start].chars().count() <= self.max_gap
                });
                let kind = if near { SpanKind::ContextNear } else { SpanKind::ContextFar };
                spans.push(MatchSpan::new(text, m.start(), m.end(), kind));
            }
        }
        spans.extend(patterns);

        let kept = resolve_overlaps(spans);
        for span in &kept {
            log_span_debug(span.kind.label(), span.start, span.end, &span.text);
        }
        kept
    }

    /// Whether the spans predict a positive detection: a near context word, or
    /// any pattern occurrence when no context words gate the detector.
    pub fn predicts_detection(&self, spans: &[MatchSpan]) -> bool {
        let wanted = if self.has_context() { SpanKind::ContextNear } else { SpanKind::Pattern };
        spans.iter().any(|s| s.kind == wanted)
    }
}

/// Computes spans, falling back to none when the detector does not compile.
pub fn highlight(text: &str, spec: &PatternSpec, words: &[String], max_gap: usize) -> Vec<MatchSpan> {
    match Highlighter::new(spec, words, max_gap) {
        Ok(highlighter) => highlighter.spans(text),
        Err(e) => {
            warn!("Highlighting disabled, rendering text unmodified: {}", e);
            Vec::new()
        }
    }
}

/// Keeps the first-by-position span of every overlapping group.
///
/// Spans are ordered by start ascending and end descending, so the longest span
/// at a position is considered first; a span is kept only if it starts at or
/// after the end of the last kept one.
pub fn resolve_overlaps(mut spans: Vec<MatchSpan>) -> Vec<MatchSpan> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut kept: Vec<MatchSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match kept.last() {
            Some(last) if span.start < last.end => continue,
            _ => kept.push(span),
        }
    }
    kept
}

/// A piece of the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    Plain(&'t str),
    Highlight { kind: SpanKind, text: &'t str },
}

impl<'t> Segment<'t> {
    pub fn text(&self) -> &'t str {
        match self {
            Segment::Plain(text) | Segment::Highlight { text, .. } => text,
        }
    }
}

/// Interleaves plain and highlighted segments covering all of `text`.
///
/// `spans` must be overlap-free, as returned by [`resolve_overlaps`]. Spans that
/// do not fit the text are skipped.
pub fn segments<'t>(text: &'t str, spans: &[MatchSpan]) -> Vec<Segment<'t>> {
    let mut ordered: Vec<&MatchSpan> = spans.iter().collect();
    ordered.sort_by_key(|s| s.start);

    let mut out = Vec::with_capacity(ordered.len() * 2 + 1);
    let mut cursor = 0;
    for span in ordered {
        if span.start < cursor || span.end > text.len() || span.start >= span.end {
            continue;
        }
        let Some(highlighted) = text.get(span.start..span.end) else { continue };
        if span.start > cursor {
            out.push(Segment::Plain(&text[cursor..span.start]));
        }
        out.push(Segment::Highlight { kind: span.kind, text: highlighted });
        cursor = span.end;
    }
    if cursor < text.len() {
        out.push(Segment::Plain(&text[cursor..]));
    }
    out
}
