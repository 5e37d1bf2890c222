//! `checksum`: list, show and locally check library algorithms.

use anyhow::{anyhow, Result};
use proxiscan_core::{clean_digits, ChecksumLoader};
use std::io::Write;

use super::build_loader;
use crate::cli::ChecksumCommand;

pub fn run_checksum<W: Write>(cmd: &ChecksumCommand, out: &mut W) -> Result<()> {
    match cmd {
        ChecksumCommand::List { library } => list(&build_loader(library), out),
        ChecksumCommand::Show { name, raw, library } => show(&build_loader(library), name, *raw, out),
        ChecksumCommand::Check { name, values, library } => check(&build_loader(library), name, values, out),
    }
}

/// One name per line; algorithms with a native validator are marked.
pub fn list<W: Write>(loader: &ChecksumLoader, out: &mut W) -> Result<()> {
    for name in loader.names()? {
        if loader.load(&name)?.algorithm.is_some() {
            writeln!(out, "{} (native)", name)?;
        } else {
            writeln!(out, "{}", name)?;
        }
    }
    Ok(())
}

pub fn show<W: Write>(loader: &ChecksumLoader, name: &str, raw: bool, out: &mut W) -> Result<()> {
    if raw {
        write!(out, "{}", loader.raw(name)?)?;
    } else {
        writeln!(out, "{}", loader.load(name)?.body)?;
    }
    Ok(())
}

/// Validates each value after stripping non-digits. Only algorithms with a
/// native validator can be checked locally.
pub fn check<W: Write>(loader: &ChecksumLoader, name: &str, values: &[String], out: &mut W) -> Result<()> {
    let fragment = loader.load(name)?;
    let algorithm = fragment
        .algorithm
        .ok_or_else(|| anyhow!("Checksum algorithm '{}' has no native validator; it can only run in Elasticsearch", name))?;
    for value in values {
        let verdict = if algorithm.validate(&clean_digits(value)) { "valid" } else { "invalid" };
        writeln!(out, "{}: {}", value, verdict)?;
    }
    Ok(())
}
