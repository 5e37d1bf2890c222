// proxiscan/src/cli.rs
//! Command-line interface definition for the proxiscan application.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::transport::DEFAULT_ES_URL;
use crate::ui::html_report::DEFAULT_OUTPUT_DIR;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "proxiscan",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Proximity-aware PII detection for Elasticsearch indices",
    long_about = "Proxiscan labels documents in an Elasticsearch index from a declarative detector: a pattern, optional context words that must precede it within a character window, and an optional checksum algorithm. The same detector drives a local highlighter so every label can be audited.",
    arg_required_else_help = true,
)]
pub struct Cli {
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    #[arg(long, short = 'd', global = true, conflicts_with = "quiet", help = "Enable debug logging.")]
    pub debug: bool,

    #[arg(long = "theme", value_name = "FILE", global = true, help = "Path to a custom YAML theme file.")]
    pub theme: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Labels (or previews) documents of an index that match a detector.
    #[command(about = "Label or preview documents of an index that match a detector.")]
    Detect(DetectCommand),

    /// Highlights a saved search response against a detector.
    #[command(about = "Highlight a saved search response against a detector.")]
    Highlight(HighlightCommand),

    /// Inspects the checksum algorithm library.
    #[command(subcommand, about = "Inspect the checksum algorithm library.")]
    Checksum(ChecksumCommand),
}

#[derive(Args, Debug, Clone)]
pub struct LibraryArgs {
    #[arg(
        long = "checksums-dir",
        value_name = "DIR",
        help = "Directory of <name>.painless algorithm definitions, searched before the built-in ones."
    )]
    pub checksums_dir: Option<PathBuf>,
}

/// Arguments for the `detect` command.
#[derive(Parser, Debug)]
pub struct DetectCommand {
    #[arg(value_name = "INDEX", help = "Elasticsearch index to scan.")]
    pub index: String,

    #[arg(value_name = "CONFIG", help = "Detector configuration file (YAML).")]
    pub config: PathBuf,

    #[arg(long = "dry-run", conflicts_with_all = ["async_mode", "monitor"], help = "Print the generated request instead of sending it.")]
    pub dry_run: bool,

    #[arg(long = "async", conflicts_with = "monitor", help = "Run the update in the background and print the task id.")]
    pub async_mode: bool,

    #[arg(long, help = "Run the update in the background and poll its progress until it completes.")]
    pub monitor: bool,

    #[arg(long, conflicts_with_all = ["async_mode", "monitor"], help = "Search instead of updating; already-labelled documents are included.")]
    pub search: bool,

    #[arg(long, help = "Select documents that do NOT match and label them false.")]
    pub reverse: bool,

    #[arg(long, help = "Record the matched text under named_entities instead of a boolean flag under PII.")]
    pub ner: bool,

    #[command(flatten)]
    pub library: LibraryArgs,

    #[arg(long = "es-url", value_name = "URL", env = "PROXISCAN_ES_URL", default_value = DEFAULT_ES_URL, help = "Elasticsearch base URL.")]
    pub es_url: String,

    #[arg(long, requires = "search", help = "Write an HTML highlight report of the search results.")]
    pub html: bool,

    #[arg(long = "output-dir", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR, help = "Directory HTML reports are written to.")]
    pub output_dir: PathBuf,

    #[arg(long, value_name = "N", requires = "search", help = "Maximum number of search hits to return.")]
    pub size: Option<usize>,

    #[arg(long = "poll-interval", value_name = "SECONDS", default_value_t = 2, help = "Seconds between task status polls in --monitor mode.")]
    pub poll_interval: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Html,
}

/// Arguments for the `highlight` command.
#[derive(Parser, Debug)]
pub struct HighlightCommand {
    #[arg(long, value_name = "FILE", help = "Detector configuration file (YAML).")]
    pub config: PathBuf,

    #[arg(long, short = 'i', value_name = "FILE", help = "Saved search response (JSON); reads stdin if not provided.")]
    pub input: Option<PathBuf>,

    #[arg(long, value_name = "NAME", help = "Index name shown in the report.")]
    pub index: Option<String>,

    #[arg(long, value_enum, default_value = "terminal", help = "Output format.")]
    pub format: ReportFormat,

    #[arg(long = "output-dir", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR, help = "Directory HTML reports are written to.")]
    pub output_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ChecksumCommand {
    /// Lists every known algorithm.
    List {
        #[command(flatten)]
        library: LibraryArgs,
    },
    /// Prints an algorithm's trimmed, single-line fragment.
    Show {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(long, help = "Print the untrimmed definition instead.")]
        raw: bool,

        #[command(flatten)]
        library: LibraryArgs,
    },
    /// Validates values locally with an algorithm's native implementation.
    Check {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "VALUE", required = true)]
        values: Vec<String>,

        #[command(flatten)]
        library: LibraryArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn detect_rejects_incompatible_flags() {
        for args in [
            vec!["proxiscan", "detect", "idx", "c.yml", "--dry-run", "--async"],
            vec!["proxiscan", "detect", "idx", "c.yml", "--dry-run", "--monitor"],
            vec!["proxiscan", "detect", "idx", "c.yml", "--search", "--monitor"],
            vec!["proxiscan", "detect", "idx", "c.yml", "--async", "--monitor"],
            vec!["proxiscan", "detect", "idx", "c.yml", "--html"],
        ] {
            assert!(Cli::try_parse_from(&args).is_err(), "{:?}", args);
        }
    }

    #[test]
    fn detect_parses_defaults() {
        let cli = Cli::try_parse_from(["proxiscan", "detect", "idx", "c.yml", "--search", "--html"]).unwrap();
        let Commands::Detect(cmd) = cli.command else { panic!("expected detect") };
        assert_eq!(cmd.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(cmd.poll_interval, 2);
        assert!(cmd.html && cmd.search);
    }
}
