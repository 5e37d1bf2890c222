//! `highlight`: re-render a saved search response with detector highlights.

use anyhow::{Context, Result};
use chrono::Local;
use is_terminal::IsTerminal;
use log::warn;
use proxiscan_core::{DetectorConfig, Highlighter};
use std::io::{self, Write};
use std::path::PathBuf;

use super::{read_input, success_msg};
use crate::cli::{HighlightCommand, ReportFormat};
use crate::search_results::SearchResults;
use crate::ui::theme::ThemeMap;
use crate::ui::{html_report, terminal_view};

/// Index name used in reports when none was given.
pub const UNKNOWN_INDEX: &str = "unknown";

#[derive(Debug, Clone)]
pub struct HighlightOptions {
    pub config_path: PathBuf,
    pub input: Option<PathBuf>,
    pub index: String,
    pub format: ReportFormat,
    pub output_dir: PathBuf,
}

impl From<HighlightCommand> for HighlightOptions {
    fn from(cmd: HighlightCommand) -> Self {
        Self {
            config_path: cmd.config,
            input: cmd.input,
            index: cmd.index.unwrap_or_else(|| UNKNOWN_INDEX.to_string()),
            format: cmd.format,
            output_dir: cmd.output_dir,
        }
    }
}

pub fn run_highlight<W: Write>(opts: &HighlightOptions, out: &mut W, theme: &ThemeMap) -> Result<()> {
    let config = DetectorConfig::load_from_file(&opts.config_path)?;
    let raw = read_input(opts.input.as_deref())?;
    let response: serde_json::Value =
        serde_json::from_str(&raw).context("Input is not a JSON search response")?;
    let results = SearchResults::from_response(response, &config.source_field)?;

    let highlighter = match Highlighter::from_config(&config) {
        Ok(h) => Some(h),
        Err(e) => {
            warn!("Hits will be shown without highlights: {}", e);
            None
        }
    };

    match opts.format {
        ReportFormat::Terminal => {
            let enable_colors = io::stdout().is_terminal();
            terminal_view::print_results(out, &results, &config, highlighter.as_ref(), theme, enable_colors)
        }
        ReportFormat::Html => {
            let generated = Local::now();
            let html = html_report::render_report(&results, &config, highlighter.as_ref(), &opts.index, generated)?;
            let path = html_report::write_report(&opts.output_dir, &opts.index, generated, &html)?;
            success_msg(format!("HTML output written to: {}", path.display()), theme);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;
    use std::fs;

    const CONFIG: &str = "fieldName: HasSSN\npatternRegex: '\\d{3}-\\d{2}-\\d{4}'\ncontextWords: [SSN]\n";
    const RESPONSE: &str = r#"{"hits":{"total":{"value":1},"hits":[
        {"_id":"d1","_score":1.0,"_source":{"filename":"a.txt","document_text":"SSN: 123-45-6789"}}]}}"#;

    fn options(dir: &std::path::Path, format: ReportFormat) -> HighlightOptions {
        let config_path = dir.join("ssn.yml");
        let input = dir.join("response.json");
        fs::write(&config_path, CONFIG).unwrap();
        fs::write(&input, RESPONSE).unwrap();
        HighlightOptions {
            config_path,
            input: Some(input),
            index: "people".into(),
            format,
            output_dir: dir.join("reports"),
        }
    }

    #[test]
    fn terminal_output_lists_hits() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        run_highlight(&options(dir.path(), ReportFormat::Terminal), &mut out, &ThemeStyle::default_theme_map())
            .unwrap();
        let text = String::from_utf8(strip_ansi_escapes::strip(&out)).unwrap();
        assert!(text.contains("Result 1/1: d1"));
        assert!(text.contains("Predicted detection: yes"));
        assert!(text.contains("SSN: 123-45-6789"));
    }

    #[test]
    fn html_output_writes_one_report() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), ReportFormat::Html);
        run_highlight(&opts, &mut Vec::new(), &ThemeStyle::default_theme_map()).unwrap();
        let written: Vec<_> = fs::read_dir(&opts.output_dir).unwrap().collect();
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn rejects_non_json_input() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), ReportFormat::Terminal);
        fs::write(opts.input.as_ref().unwrap(), "not json").unwrap();
        assert!(run_highlight(&opts, &mut Vec::new(), &ThemeStyle::default_theme_map()).is_err());
    }
}
