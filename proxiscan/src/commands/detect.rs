//! `detect`: compile a detector and run it against an index.

use anyhow::{bail, Context, Result};
use chrono::Local;
use log::{debug, info, warn};
use proxiscan_core::{Action, DetectionMode, DetectorConfig, FieldTarget, Highlighter, QueryCompiler, Target};
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use super::{build_loader, info_msg, success_msg, warn_msg};
use crate::cli::{DetectCommand, LibraryArgs};
use crate::search_results::SearchResults;
use crate::transport::{EsClient, MappingOutcome, TaskProgress};
use crate::ui::html_report;
use crate::ui::theme::ThemeMap;

/// How a mutating run is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Block until the update finishes.
    Wait,
    /// Return as soon as the task is created.
    Background,
    /// Create a task and poll it until completion.
    Monitor,
}

#[derive(Debug, Clone)]
pub struct DetectOptions {
    pub index: String,
    pub config_path: PathBuf,
    pub mode: DetectionMode,
    pub dry_run: bool,
    pub execution: Execution,
    pub library: LibraryArgs,
    pub es_url: String,
    pub html: bool,
    pub output_dir: PathBuf,
    pub size: Option<usize>,
    pub poll_interval: Duration,
}

impl DetectOptions {
    /// Folds the raw switches into a validated mode.
    pub fn from_command(cmd: DetectCommand) -> Result<Self> {
        let mode = DetectionMode::from_flags(cmd.reverse, cmd.search, cmd.ner)
            .context("Invalid flag combination")?;
        let execution = match (cmd.async_mode, cmd.monitor) {
            (true, true) => bail!("--async and --monitor cannot be used together"),
            (true, false) => Execution::Background,
            (false, true) => Execution::Monitor,
            (false, false) => Execution::Wait,
        };
        if cmd.dry_run && execution != Execution::Wait {
            bail!("--dry-run cannot be combined with --async or --monitor");
        }
        if mode.action() == Action::Search && execution != Execution::Wait {
            bail!("--search cannot be combined with --async or --monitor");
        }
        Ok(Self {
            index: cmd.index,
            config_path: cmd.config,
            mode,
            dry_run: cmd.dry_run,
            execution,
            library: cmd.library,
            es_url: cmd.es_url,
            html: cmd.html,
            output_dir: cmd.output_dir,
            size: cmd.size,
            poll_interval: Duration::from_secs(cmd.poll_interval),
        })
    }
}

const KEYWORD_MAPPING_HELP: &str = r#"The text field must be mapped with a keyword sub-field, e.g.:
"document_text": {
  "type": "text",
  "fields": {
    "keyword": { "type": "keyword", "ignore_above": 32000 }
  }
}
Painless regexes must also be enabled (script.painless.regex.enabled=true)."#;

/// Runs `detect`. Request and response bodies go to `out`, status messages to stderr.
pub fn run_detect<W: Write>(opts: &DetectOptions, out: &mut W, theme: &ThemeMap) -> Result<()> {
    let config = DetectorConfig::load_from_file(&opts.config_path)?;
    let compiler = QueryCompiler::new(build_loader(&opts.library));
    let compiled = compiler.compile(&config, opts.mode)?;

    let what = match opts.mode.target() {
        Target::Pii => "PII detection",
        Target::Ner => "NER extraction",
    };
    info_msg(format!("Processing {} for index: {} ({})", what, opts.index, opts.mode), theme);
    info_msg(format!("Field: {}", compiled.target.path()), theme);
    info_msg(format!("Pattern regex: {}", config.pattern_regex), theme);
    info_msg(
        format!(
            "Context words: {}",
            if config.context_words.is_empty() { "None".to_string() } else { config.context_words.join(", ") }
        ),
        theme,
    );
    info_msg(format!("Checksum algorithm: {}", config.checksum.as_deref().unwrap_or("None")), theme);

    let mut body = compiled.request_body();
    if let (Some(size), Some(obj)) = (opts.size, body.as_object_mut()) {
        obj.insert("size".to_string(), Value::from(size));
    }

    if opts.dry_run {
        writeln!(out, "Generated Elasticsearch Query:")?;
        writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
        return Ok(());
    }

    let client = EsClient::new(&opts.es_url)?;
    match opts.mode.action() {
        Action::Search => run_search(opts, &client, &config, &body, out, theme),
        Action::Mutate => run_update(opts, &client, &config, &compiled.target, &body, out, theme),
    }
}

fn run_search<W: Write>(
    opts: &DetectOptions,
    client: &EsClient,
    config: &DetectorConfig,
    body: &Value,
    out: &mut W,
    theme: &ThemeMap,
) -> Result<()> {
    if opts.mode.target() == Target::Ner {
        let target = FieldTarget::new(Target::Ner, config.field_name.clone());
        if let Err(e) = client.ensure_field_mapping(&opts.index, &target) {
            warn_msg(format!("Could not set mapping for {}: {}", target.path(), e), theme);
        }
    }

    let response = client.search(&opts.index, body)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;

    if opts.html {
        let results = SearchResults::from_response(response, &config.source_field)?;
        let highlighter = match Highlighter::from_config(config) {
            Ok(h) => Some(h),
            Err(e) => {
                warn!("Report will not be highlighted: {}", e);
                None
            }
        };
        let generated = Local::now();
        let html = html_report::render_report(&results, config, highlighter.as_ref(), &opts.index, generated)?;
        let path = html_report::write_report(&opts.output_dir, &opts.index, generated, &html)?;
        success_msg(format!("HTML output written to: {}", path.display()), theme);
    }
    Ok(())
}

fn run_update<W: Write>(
    opts: &DetectOptions,
    client: &EsClient,
    config: &DetectorConfig,
    target: &FieldTarget,
    body: &Value,
    out: &mut W,
    theme: &ThemeMap,
) -> Result<()> {
    if !client.has_keyword_subfield(&opts.index, &config.source_field)? {
        bail!(
            "{}.keyword mapping is required but not found in index '{}'.\n{}",
            config.source_field,
            opts.index,
            KEYWORD_MAPPING_HELP
        );
    }
    match client.ensure_field_mapping(&opts.index, target)? {
        MappingOutcome::AlreadyPresent => debug!("Mapping for {} already present.", target.path()),
        MappingOutcome::Created => info_msg(
            format!("Set {} mapping for {}", target.target.mapping_type(), target.path()),
            theme,
        ),
    }

    let wait = opts.execution == Execution::Wait;
    let response = client.update_by_query(&opts.index, body, wait)?;
    if wait {
        writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
        return Ok(());
    }

    let Some(task_id) = response["task"].as_str() else {
        bail!("No task ID found in response: {}", response);
    };
    success_msg(format!("Task started with ID: {}", task_id), theme);
    writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;

    if opts.execution == Execution::Background {
        info_msg(format!("Task running in background. Monitor manually at: {}", client.task_url(task_id)), theme);
        return Ok(());
    }

    info!("Monitoring task {}", task_id);
    let status = client.monitor_task(task_id, opts.poll_interval, print_progress)?;
    eprintln!();
    success_msg("Task completed successfully!", theme);
    if let Some(final_response) = &status.response {
        writeln!(out, "{}", serde_json::to_string_pretty(final_response)?)?;
    }
    Ok(())
}

/// One-line progress display, redrawn in place on stderr.
pub fn format_progress(progress: &TaskProgress) -> String {
    format!(
        "Status: {} | Total: {} | Updated: {} | Batches: {} | Version Conflicts: {}",
        progress.action, progress.total, progress.updated, progress.batches, progress.version_conflicts
    )
}

fn print_progress(progress: &TaskProgress) {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "\r{}", format_progress(progress));
    let _ = stderr.flush();
}
