//! Command implementations, one module per subcommand.

pub mod checksum;
pub mod detect;
pub mod highlight;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use proxiscan_core::ChecksumLoader;
use std::io::{self, Read};
use std::path::Path;

use crate::cli::LibraryArgs;
use crate::ui::output_format;
use crate::ui::theme::ThemeMap;

/// Helper for printing info messages to stderr. Silent under `--quiet`.
pub fn info_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    if log::max_level() == log::LevelFilter::Off {
        return;
    }
    let enable_colors = io::stderr().is_terminal();
    let _ = output_format::print_info_message(&mut io::stderr(), msg.as_ref(), theme, enable_colors);
}

/// Helper for printing success messages to stderr.
pub fn success_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let enable_colors = io::stderr().is_terminal();
    let _ = output_format::print_success_message(&mut io::stderr(), msg.as_ref(), theme, enable_colors);
}

/// Helper for printing warning messages to stderr.
pub fn warn_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let enable_colors = io::stderr().is_terminal();
    let _ = output_format::print_warn_message(&mut io::stderr(), msg.as_ref(), theme, enable_colors);
}

/// Builds the checksum loader: an optional directory in front of the built-ins.
pub fn build_loader(library: &LibraryArgs) -> ChecksumLoader {
    match &library.checksums_dir {
        Some(dir) => ChecksumLoader::embedded().with_directory(dir),
        None => ChecksumLoader::embedded(),
    }
}

/// Reads a file, or stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}
