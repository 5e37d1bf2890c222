//! Terminal theme: which colour and emphasis each kind of output gets.
//!
//! Themes are YAML maps from a [`ThemeEntry`] to a [`ThemeStyle`]. A custom theme
//! file only needs the entries it changes; everything else falls back to the
//! defaults.

use anyhow::{Context, Result};
use owo_colors::{AnsiColors, OwoColorize, Style};
use proxiscan_core::SpanKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub type ThemeMap = HashMap<ThemeEntry, ThemeStyle>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeEntry {
    Header,
    Success,
    Info,
    Warn,
    Error,
    /// A pattern occurrence.
    Pattern,
    /// A context word within the proximity window of a following pattern.
    ContextNear,
    /// A context word that supports no pattern.
    ContextFar,
}

impl ThemeEntry {
    pub const ALL: [ThemeEntry; 8] = [
        ThemeEntry::Header,
        ThemeEntry::Success,
        ThemeEntry::Info,
        ThemeEntry::Warn,
        ThemeEntry::Error,
        ThemeEntry::Pattern,
        ThemeEntry::ContextNear,
        ThemeEntry::ContextFar,
    ];
}

impl From<SpanKind> for ThemeEntry {
    fn from(kind: SpanKind) -> Self {
        match kind {
            SpanKind::Pattern => ThemeEntry::Pattern,
            SpanKind::ContextNear => ThemeEntry::ContextNear,
            SpanKind::ContextFar => ThemeEntry::ContextFar,
        }
    }
}

/// A named 16-colour ANSI colour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ThemeColor {
    Named(String),
}

#[derive(Debug, Clone)]
pub struct ParseThemeColorError;

impl fmt::Display for ParseThemeColorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invalid theme color; expected one of: black, red, green, yellow, blue, \
            magenta, cyan, white, or their bright variants (e.g. brightred)."
        )
    }
}

impl std::error::Error for ParseThemeColorError {}

const COLOR_NAMES: [(&str, AnsiColors); 16] = [
    ("black", AnsiColors::Black),
    ("red", AnsiColors::Red),
    ("green", AnsiColors::Green),
    ("yellow", AnsiColors::Yellow),
    ("blue", AnsiColors::Blue),
    ("magenta", AnsiColors::Magenta),
    ("cyan", AnsiColors::Cyan),
    ("white", AnsiColors::White),
    ("brightblack", AnsiColors::BrightBlack),
    ("brightred", AnsiColors::BrightRed),
    ("brightgreen", AnsiColors::BrightGreen),
    ("brightyellow", AnsiColors::BrightYellow),
    ("brightblue", AnsiColors::BrightBlue),
    ("brightmagenta", AnsiColors::BrightMagenta),
    ("brightcyan", AnsiColors::BrightCyan),
    ("brightwhite", AnsiColors::BrightWhite),
];

impl FromStr for ThemeColor {
    type Err = ParseThemeColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        if COLOR_NAMES.iter().any(|(name, _)| *name == lower) {
            Ok(ThemeColor::Named(lower))
        } else {
            Err(ParseThemeColorError)
        }
    }
}

impl ThemeColor {
    pub fn to_ansi_color(&self) -> AnsiColors {
        let ThemeColor::Named(name) = self;
        COLOR_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| *c)
            .unwrap_or(AnsiColors::White)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeStyle {
    pub fg: Option<ThemeColor>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub strikethrough: bool,
}

impl ThemeStyle {
    fn colored(name: &str) -> Self {
        Self { fg: Some(ThemeColor::Named(name.into())), bold: false, strikethrough: false }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    /// The `owo_colors` style for this entry.
    pub fn to_style(&self) -> Style {
        let mut style = Style::new();
        if let Some(fg) = &self.fg {
            style = style.color(fg.to_ansi_color());
        }
        if self.bold {
            style = style.bold();
        }
        if self.strikethrough {
            style = style.strikethrough();
        }
        style
    }

    /// Loads a theme file and fills missing entries from the defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ThemeMap> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read theme file {}", path.display()))?;
        let mut custom: ThemeMap = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse theme file {}", path.display()))?;
        for (entry, style) in Self::default_theme_map() {
            custom.entry(entry).or_insert(style);
        }
        Ok(custom)
    }

    pub fn default_theme_map() -> ThemeMap {
        let mut theme = HashMap::new();
        theme.insert(ThemeEntry::Header, ThemeStyle::colored("cyan").bold());
        theme.insert(ThemeEntry::Success, ThemeStyle::colored("green"));
        theme.insert(ThemeEntry::Info, ThemeStyle::colored("white"));
        theme.insert(ThemeEntry::Warn, ThemeStyle::colored("yellow"));
        theme.insert(ThemeEntry::Error, ThemeStyle::colored("red"));
        theme.insert(ThemeEntry::Pattern, ThemeStyle::colored("magenta").bold());
        theme.insert(ThemeEntry::ContextNear, ThemeStyle::colored("green").bold());
        theme.insert(ThemeEntry::ContextFar, ThemeStyle::colored("red").strikethrough());
        theme
    }
}

pub fn build_theme_map(theme_path: Option<&PathBuf>) -> Result<ThemeMap> {
    match theme_path {
        Some(path) => ThemeStyle::load_from_file(path),
        None => Ok(ThemeStyle::default_theme_map()),
    }
}

/// Renders `text` in the style of `entry`, or plain when colour is off.
pub fn paint(text: &str, entry: ThemeEntry, theme: &ThemeMap, enable_colors: bool) -> String {
    match theme.get(&entry) {
        Some(style) if enable_colors => text.style(style.to_style()).to_string(),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_named_colors() {
        assert!("red".parse::<ThemeColor>().is_ok());
        assert!("BrightGreen".parse::<ThemeColor>().is_ok());
        assert!("unknown".parse::<ThemeColor>().is_err());
    }

    #[test]
    fn default_theme_covers_every_entry() {
        let theme = ThemeStyle::default_theme_map();
        for entry in ThemeEntry::ALL {
            assert!(theme.contains_key(&entry), "{:?}", entry);
        }
        assert!(theme[&ThemeEntry::ContextFar].strikethrough);
    }

    #[test]
    fn custom_theme_is_merged_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pattern:\n  fg: yellow\n").unwrap();
        let theme = ThemeStyle::load_from_file(file.path()).unwrap();
        assert_eq!(theme[&ThemeEntry::Pattern].fg, Some(ThemeColor::Named("yellow".into())));
        assert!(!theme[&ThemeEntry::Pattern].bold);
        assert!(theme[&ThemeEntry::ContextNear].bold);
    }

    #[test]
    fn paint_without_colour_is_identity() {
        let theme = ThemeStyle::default_theme_map();
        assert_eq!(paint("SSN", ThemeEntry::ContextNear, &theme, false), "SSN");
        assert_ne!(paint("SSN", ThemeEntry::ContextNear, &theme, true), "SSN");
    }
}
