//! loader.rs - Loads checksum algorithm fragments from algorithm libraries.
//!
//! Algorithm definitions are authored as standalone, runnable Painless snippets.
//! Before one can be embedded into a generated script, its lab scaffolding is
//! trimmed away at the marker lines and the remainder collapsed onto one line.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::ChecksumAlgorithm;
use crate::errors::ProxiscanError;

/// Marker line: it and everything above it is lab scaffolding.
pub const FRAGMENT_START_MARKER: &str = "// Anything on this line or above will be removed";

/// Marker line: it and everything below it is lab scaffolding.
pub const FRAGMENT_END_MARKER: &str =
    "// Return statement goes here so you can validate if passChecksum is working in your lab";

/// File extension of algorithm definitions on disk.
pub const ALGORITHM_EXTENSION: &str = "painless";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static whitespace regex"));

static ALGORITHM_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static algorithm name regex"));

const EMBEDDED_ALGORITHMS: &[(&str, &str)] = &[
    ("luhn", include_str!("../../checksums/luhn.painless")),
    ("au_tfn", include_str!("../../checksums/au_tfn.painless")),
    ("au_abn", include_str!("../../checksums/au_abn.painless")),
    ("au_medicare", include_str!("../../checksums/au_medicare.painless")),
];

/// A source of raw algorithm definitions, looked up by name.
pub trait AlgorithmLibrary: Send + Sync {
    /// Returns the raw definition for `name`, or `None` if this library does not
    /// know the algorithm.
    fn raw_source(&self, name: &str) -> Result<Option<String>, ProxiscanError>;

    /// Lists the algorithm names this library can provide.
    fn names(&self) -> Result<Vec<String>, ProxiscanError>;

    /// A short label used in log messages.
    fn describe(&self) -> String;

    /// Whether definitions from this library are the ones the native
    /// [`ChecksumAlgorithm`] validators were written against.
    fn is_builtin(&self) -> bool {
        false
    }
}

/// The algorithm definitions compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedLibrary;

impl AlgorithmLibrary for EmbeddedLibrary {
    fn raw_source(&self, name: &str) -> Result<Option<String>, ProxiscanError> {
        Ok(EMBEDDED_ALGORITHMS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, src)| (*src).to_string()))
    }

    fn names(&self) -> Result<Vec<String>, ProxiscanError> {
        Ok(EMBEDDED_ALGORITHMS.iter().map(|(n, _)| (*n).to_string()).collect())
    }

    fn describe(&self) -> String {
        "embedded library".to_string()
    }

    fn is_builtin(&self) -> bool {
        true
    }
}

/// A directory of `<name>.painless` files.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, ALGORITHM_EXTENSION))
    }
}

impl AlgorithmLibrary for DirectoryLibrary {
    fn raw_source(&self, name: &str) -> Result<Option<String>, ProxiscanError> {
        if !ALGORITHM_NAME_RE.is_match(name) {
            warn!("Refusing to look up checksum algorithm with unsafe name '{}'.", name);
            return Ok(None);
        }
        let path = self.path_for(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn names(&self) -> Result<Vec<String>, ProxiscanError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ALGORITHM_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// A checksum algorithm ready to be embedded into a generated script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumFragment {
    pub name: String,
    /// Single-line Painless body. Reads `cleanMatch`, sets `passChecksum`.
    pub body: String,
    /// Native counterpart, when one exists.
    pub algorithm: Option<ChecksumAlgorithm>,
}

/// Resolves algorithm names against an ordered list of libraries.
///
/// The first library that knows a name wins, so a directory layered in front of
/// the embedded library can override a built-in definition.
pub struct ChecksumLoader {
    libraries: Vec<Box<dyn AlgorithmLibrary>>,
}

impl std::fmt::Debug for ChecksumLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.libraries.iter().map(|l| l.describe()).collect();
        f.debug_struct("ChecksumLoader").field("libraries", &names).finish()
    }
}

impl Default for ChecksumLoader {
    fn default() -> Self {
        Self::embedded()
    }
}

impl ChecksumLoader {
    /// A loader backed only by the embedded library.
    pub fn embedded() -> Self {
        Self { libraries: vec![Box::new(EmbeddedLibrary)] }
    }

    /// A loader with no libraries at all.
    pub fn empty() -> Self {
        Self { libraries: Vec::new() }
    }

    /// Puts `dir` in front of the libraries already configured.
    pub fn with_directory<P: AsRef<Path>>(self, dir: P) -> Self {
        self.with_library_first(Box::new(DirectoryLibrary::new(dir)))
    }

    pub fn with_library_first(mut self, library: Box<dyn AlgorithmLibrary>) -> Self {
        self.libraries.insert(0, library);
        self
    }

    fn resolve(&self, name: &str) -> Result<(String, &dyn AlgorithmLibrary), ProxiscanError> {
        for library in &self.libraries {
            if let Some(source) = library.raw_source(name)? {
                debug!("Checksum algorithm '{}' resolved from {}.", name, library.describe());
                return Ok((source, library.as_ref()));
            }
        }
        Err(ProxiscanError::AlgorithmNotFound { name: name.to_string() })
    }

    /// Loads the raw definition for `name` without trimming.
    pub fn raw(&self, name: &str) -> Result<String, ProxiscanError> {
        self.resolve(name).map(|(source, _)| source)
    }

    /// Loads `name` and turns it into an inlineable fragment.
    ///
    /// The native validator is attached only when the definition came from a
    /// built-in library; an override keeps its own semantics and so has none.
    pub fn load(&self, name: &str) -> Result<ChecksumFragment, ProxiscanError> {
        let (raw, library) = self.resolve(name)?;
        let body = collapse_whitespace(&strip_line_comments(&trim_scaffold(&raw)));
        let algorithm = if library.is_builtin() { ChecksumAlgorithm::from_name(name) } else { None };
        if algorithm.is_none() {
            debug!("Checksum algorithm '{}' has no native validator; local evaluation unavailable.", name);
        }
        Ok(ChecksumFragment { name: name.to_string(), body, algorithm })
    }

    /// Every name known to any library, deduplicated and sorted.
    pub fn names(&self) -> Result<Vec<String>, ProxiscanError> {
        let mut all = Vec::new();
        for library in &self.libraries {
            all.extend(library.names()?);
        }
        all.sort();
        all.dedup();
        Ok(all)
    }
}

/// Removes lab scaffolding around the algorithm body.
///
/// Everything up to and including the start marker line goes, as does the end
/// marker line and everything after it. With only one marker present, only that
/// side is trimmed; with neither, the content is returned unchanged.
pub fn trim_scaffold(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let start = lines.iter().position(|l| l.contains(FRAGMENT_START_MARKER)).map(|i| i + 1);
    let end = lines.iter().position(|l| l.contains(FRAGMENT_END_MARKER));

    let core = match (start, end) {
        (Some(s), Some(e)) if s <= e => &lines[s..e],
        (Some(_), Some(_)) => &lines[0..0],
        (Some(s), None) => &lines[s..],
        (None, Some(e)) => &lines[..e],
        (None, None) => &lines[..],
    };
    core.join("\n")
}

/// Drops `//` comments, which would otherwise run to the end of the one-line
/// script once whitespace is collapsed. `//` inside a string literal is kept.
pub fn strip_line_comments(text: &str) -> String {
    text.lines()
        .map(|line| {
            let mut quote: Option<char> = None;
            let mut escaped = false;
            let mut prev = '\0';
            for (idx, c) in line.char_indices() {
                match quote {
                    Some(q) => {
                        if escaped {
                            escaped = false;
                        } else if c == '\\' {
                            escaped = true;
                        } else if c == q {
                            quote = None;
                        }
                    }
                    None if c == '\'' || c == '"' => quote = Some(c),
                    None if c == '/' && prev == '/' => return &line[..idx - 1],
                    None => {}
                }
                prev = c;
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapses line breaks and runs of whitespace to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}
