// proxiscan/src/main.rs
//! Proxiscan entry point.

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use log::LevelFilter;
use std::io;
use std::process::ExitCode;

use proxiscan::cli::{Cli, Commands};
use proxiscan::commands::checksum::run_checksum;
use proxiscan::commands::detect::{run_detect, DetectOptions};
use proxiscan::commands::highlight::{run_highlight, HighlightOptions};
use proxiscan::logger;
use proxiscan::ui::output_format::print_error_message;
use proxiscan::ui::theme::{build_theme_map, ThemeStyle};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.quiet {
        Some(LevelFilter::Off)
    } else if cli.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    logger::init_logger(level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let stderr = io::stderr();
            let enable_colors = stderr.is_terminal();
            let _ = print_error_message(
                &mut stderr.lock(),
                &format!("{:#}", e),
                &ThemeStyle::default_theme_map(),
                enable_colors,
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let theme_map = build_theme_map(cli.theme.as_ref()).context("Theme error")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Detect(cmd) => {
            let opts = DetectOptions::from_command(cmd)?;
            run_detect(&opts, &mut out, &theme_map)
        }
        Commands::Highlight(cmd) => run_highlight(&HighlightOptions::from(cmd), &mut out, &theme_map),
        Commands::Checksum(cmd) => run_checksum(&cmd, &mut out),
    }
}
