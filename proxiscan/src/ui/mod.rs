//! Output rendering: themed status messages, terminal highlight view and the
//! HTML search report.

pub mod html_report;
pub mod output_format;
pub mod terminal_view;
pub mod theme;
