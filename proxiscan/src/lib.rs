// proxiscan/src/lib.rs
//! # Proxiscan CLI
//!
//! Command-line front end for `proxiscan-core`: compiles detectors into
//! Elasticsearch requests, submits them, and renders highlighted reports of
//! search results.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod search_results;
pub mod transport;
pub mod ui;
