//! HTML search report, rendered with `tinytemplate`.
//!
//! Every value is HTML-escaped by the template's default formatter. The only
//! unescaped inserts are the stylesheet and the highlighted text, which is
//! escaped segment by segment here before it is wrapped in `<span>` tags.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use log::info;
use proxiscan_core::{segments, DetectorConfig, Highlighter, Segment, SpanKind};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tinytemplate::TinyTemplate;

use crate::search_results::SearchResults;

const REPORT_TEMPLATE: &str = include_str!("../../templates/report.html");
const REPORT_STYLESHEET: &str = include_str!("../../templates/report.css");

/// Default directory reports are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "search_results";

#[derive(Serialize)]
struct ReportContext {
    index: String,
    generated: String,
    stylesheet: &'static str,
    field_name: String,
    source_field: String,
    pattern: String,
    context_words: String,
    proximity: usize,
    total: u64,
    hits: Vec<HitContext>,
    raw_json: String,
}

#[derive(Serialize)]
struct HitContext {
    position: usize,
    id: String,
    file: String,
    score: Option<String>,
    has_text: bool,
    detected: bool,
    text_html: String,
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn css_class(kind: SpanKind) -> &'static str {
    match kind {
        SpanKind::Pattern => "pattern",
        SpanKind::ContextNear => "context-near",
        SpanKind::ContextFar => "context-far",
    }
}

/// Escaped HTML for a run of segments, highlights wrapped in classed spans.
pub fn segments_to_html(parts: &[Segment<'_>]) -> String {
    parts
        .iter()
        .map(|part| match part {
            Segment::Plain(text) => escape_html(text),
            Segment::Highlight { kind, text } => {
                format!("<span class=\"{}\">{}</span>", css_class(*kind), escape_html(text))
            }
        })
        .collect()
}

/// Renders the whole report. Hits are left unhighlighted when `highlighter` is `None`.
pub fn render_report(
    results: &SearchResults,
    config: &DetectorConfig,
    highlighter: Option<&Highlighter>,
    index: &str,
    generated: DateTime<Local>,
) -> Result<String> {
    let hits = results
        .hits
        .iter()
        .enumerate()
        .map(|(idx, hit)| {
            let (text_html, detected) = match (&hit.text, highlighter) {
                (Some(text), Some(h)) => {
                    let spans = h.spans(text);
                    (segments_to_html(&segments(text, &spans)), h.predicts_detection(&spans))
                }
                (Some(text), None) => (escape_html(text), false),
                (None, _) => (String::new(), false),
            };
            HitContext {
                position: idx + 1,
                id: hit.id.clone(),
                file: hit.file.clone(),
                score: hit.score.map(|s| s.to_string()),
                has_text: hit.text.is_some(),
                detected,
                text_html,
            }
        })
        .collect();

    let context_words =
        if config.context_words.is_empty() { "None".to_string() } else { config.context_words.join(", ") };
    let context = ReportContext {
        index: index.to_string(),
        generated: generated.format("%Y-%m-%d %H:%M:%S").to_string(),
        stylesheet: REPORT_STYLESHEET,
        field_name: config.field_name.clone(),
        source_field: config.source_field.clone(),
        pattern: config.pattern_regex.to_string(),
        context_words,
        proximity: config.proximity,
        total: results.total,
        hits,
        raw_json: serde_json::to_string_pretty(&results.raw)?,
    };

    let mut tt = TinyTemplate::new();
    tt.add_template("report", REPORT_TEMPLATE)
        .context("Failed to parse report template")?;
    tt.render("report", &context)
        .map_err(|e| anyhow!("Failed to render report template: {}", e))
}

/// `search_<index>_<YYYYmmdd_HHMMSS>.html`, with path-unsafe index characters replaced.
pub fn report_file_name(index: &str, generated: DateTime<Local>) -> String {
    let safe: String = index
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    format!("search_{}_{}.html", safe, generated.format("%Y%m%d_%H%M%S"))
}

/// Writes `html` into `output_dir`, creating the directory if needed.
pub fn write_report(output_dir: &Path, index: &str, generated: DateTime<Local>, html: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    let path = output_dir.join(report_file_name(index, generated));
    fs::write(&path, html).with_context(|| format!("Failed to write report {}", path.display()))?;
    info!("HTML report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proxiscan_core::PatternSpec;
    use serde_json::json;

    fn config() -> DetectorConfig {
        let mut config = DetectorConfig::new("HasSSN", PatternSpec::Single(r"\d{3}-\d{2}-\d{4}".into()));
        config.context_words = vec!["SSN".into()];
        config
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).single().unwrap()
    }

    #[test]
    fn file_name_has_index_and_timestamp() {
        assert_eq!(report_file_name("docs/2024", fixed_time()), "search_docs_2024_20260304_050607.html");
    }

    #[test]
    fn segments_are_escaped_and_classed() {
        let parts = [Segment::Plain("<b>"), Segment::Highlight { kind: SpanKind::ContextFar, text: "SSN" }];
        assert_eq!(segments_to_html(&parts), "&lt;b&gt;<span class=\"context-far\">SSN</span>");
    }

    #[test]
    fn report_contains_highlights_and_metadata() {
        let raw = json!({ "hits": { "total": { "value": 1 }, "hits": [
            { "_id": "doc-1", "_score": 2.0, "_source": { "filename": "a.txt", "document_text": "SSN: 123-45-6789 <x>" } }
        ] } });
        let results = SearchResults::from_response(raw, "document_text").unwrap();
        let config = config();
        let highlighter = Highlighter::from_config(&config).unwrap();
        let html = render_report(&results, &config, Some(&highlighter), "people", fixed_time()).unwrap();
        assert!(html.contains("<title>PII Search Results: people</title>"));
        assert!(html.contains("<span class=\"context-near\">SSN</span>"));
        assert!(html.contains("<span class=\"pattern\">123-45-6789</span>"));
        assert!(html.contains("&lt;x&gt;"));
        assert!(html.contains("Result 1/1"));
        assert!(html.contains("<span class=\"verdict-yes\">yes</span>"));
        assert!(html.contains(".context-far"));
    }

    #[test]
    fn write_report_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let path = write_report(&out, "idx", fixed_time(), "<html></html>").unwrap();
        assert!(path.ends_with("search_idx_20260304_050607.html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
