//! Coloured terminal rendering of highlighted search hits.

use anyhow::Result;
use proxiscan_core::{segments, DetectorConfig, Highlighter, Segment};
use std::io::Write;

use super::theme::{paint, ThemeEntry, ThemeMap};
use crate::search_results::{SearchHit, SearchResults};

/// Renders annotated segments; with colour off this is the original text.
pub fn render_segments(parts: &[Segment<'_>], theme: &ThemeMap, enable_colors: bool) -> String {
    parts
        .iter()
        .map(|part| match part {
            Segment::Plain(text) => (*text).to_string(),
            Segment::Highlight { kind, text } => paint(text, ThemeEntry::from(*kind), theme, enable_colors),
        })
        .collect()
}

/// Highlights `text`, or returns it unmodified when no highlighter is available.
pub fn render_text(text: &str, highlighter: Option<&Highlighter>, theme: &ThemeMap, enable_colors: bool) -> String {
    let spans = highlighter.map(|h| h.spans(text)).unwrap_or_default();
    render_segments(&segments(text, &spans), theme, enable_colors)
}

pub fn print_results<W: Write>(
    writer: &mut W,
    results: &SearchResults,
    config: &DetectorConfig,
    highlighter: Option<&Highlighter>,
    theme: &ThemeMap,
    enable_colors: bool,
) -> Result<()> {
    writeln!(
        writer,
        "{}",
        paint(
            &format!("{} result(s) for {} (showing {})", results.total, config.field_name, results.hits.len()),
            ThemeEntry::Header,
            theme,
            enable_colors
        )
    )?;
    writeln!(
        writer,
        "Legend: {}  {}  {}",
        paint("pattern", ThemeEntry::Pattern, theme, enable_colors),
        paint("near context", ThemeEntry::ContextNear, theme, enable_colors),
        paint("far context", ThemeEntry::ContextFar, theme, enable_colors),
    )?;
    for (idx, hit) in results.hits.iter().enumerate() {
        print_hit(writer, idx + 1, results.hits.len(), hit, config, highlighter, theme, enable_colors)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn print_hit<W: Write>(
    writer: &mut W,
    position: usize,
    shown: usize,
    hit: &SearchHit,
    config: &DetectorConfig,
    highlighter: Option<&Highlighter>,
    theme: &ThemeMap,
    enable_colors: bool,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        paint(&format!("Result {}/{}: {}", position, shown, hit.id), ThemeEntry::Header, theme, enable_colors)
    )?;
    writeln!(writer, "File: {}", hit.file)?;
    if let Some(score) = hit.score {
        writeln!(writer, "Score: {}", score)?;
    }
    match &hit.text {
        Some(text) => {
            if let Some(h) = highlighter {
                let detected = h.predicts_detection(&h.spans(text));
                writeln!(writer, "Predicted detection: {}", if detected { "yes" } else { "no" })?;
            }
            writeln!(writer, "{}:", config.source_field)?;
            writeln!(writer, "{}", render_text(text, highlighter, theme, enable_colors))?;
        }
        None => writeln!(writer, "(No {} found)", config.source_field)?,
    }
    Ok(())
}
