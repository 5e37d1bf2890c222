// proxiscan/src/logger.rs
//! Logger setup for the proxiscan binary.
//!
//! `RUST_LOG` is honoured when set; otherwise only warnings and errors are shown.
//! An explicit level (from `--quiet` or `--debug`) overrides both.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Initializes the global logger. Calling it twice is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None);
    let _ = builder.try_init();
}
