// proxiscan/tests/cli_integration_tests.rs
//! End-to-end tests of the `proxiscan` binary.
//!
//! Only code paths that need no Elasticsearch cluster run here: dry runs,
//! argument validation, the checksum library and offline highlighting.
//! Output is passed through `strip_ansi_escapes` before comparison.

mod common;

use anyhow::Result;
#[allow(unused_imports)]
use assert_cmd::prelude::*;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;

fn proxiscan() -> Command {
    let mut cmd = Command::cargo_bin("proxiscan").unwrap();
    cmd.env("RUST_LOG", "debug");
    cmd.env_remove("PROXISCAN_ES_URL");
    cmd
}

fn strip_ansi(bytes: &[u8]) -> String {
    String::from_utf8_lossy(&strip_ansi_escapes::strip(bytes)).to_string()
}

/// Parses the JSON that follows the dry-run banner.
fn dry_run_body(stdout: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stdout);
    let json = text
        .split_once("Generated Elasticsearch Query:")
        .map(|(_, rest)| rest)
        .expect("dry-run banner present");
    serde_json::from_str(json.trim()).expect("dry-run body is JSON")
}

#[test]
fn dry_run_prints_update_body() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = common::write_file(dir.path(), "tfn.yml", common::TFN_CONFIG);

    let output = proxiscan()
        .args(["detect", "docs"])
        .arg(&config)
        .arg("--dry-run")
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let body = dry_run_body(&output.stdout);
    assert_eq!(body["script"]["lang"], "painless");
    let source = body["script"]["source"].as_str().unwrap_or_default();
    assert!(source.contains("checksum_au_tfn"));
    assert!(source.contains("ctx._source.PII.put('TFN'"));
    assert_eq!(body["query"]["bool"]["must_not"][0]["exists"]["field"], "PII.TFN");
    Ok(())
}

#[test]
fn dry_run_search_has_no_script() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = common::write_file(dir.path(), "ssn.yml", common::SSN_CONFIG);

    let output = proxiscan()
        .args(["detect", "docs"])
        .arg(&config)
        .args(["--dry-run", "--search", "--size", "7"])
        .output()?;
    assert!(output.status.success());

    let body = dry_run_body(&output.stdout);
    assert!(body.get("script").is_none());
    assert_eq!(body["size"], 7);
    assert!(body["query"]["bool"]["must_not"].as_array().map_or(true, |a| a.is_empty()));
    Ok(())
}

#[test]
fn ner_reverse_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = common::write_file(dir.path(), "ssn.yml", common::SSN_CONFIG);

    proxiscan()
        .args(["detect", "docs"])
        .arg(&config)
        .args(["--dry-run", "--ner", "--reverse"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid flag combination"));
    Ok(())
}

#[test]
fn conflicting_execution_flags_fail_to_parse() {
    proxiscan()
        .args(["detect", "docs", "c.yml", "--async", "--monitor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn invalid_config_is_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = common::write_file(dir.path(), "bad.yml", "fieldName: HasX\npatternRegex: 42\n");

    proxiscan()
        .args(["detect", "docs"])
        .arg(&config)
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("patternRegex must be a string or a list of strings"));
    Ok(())
}

#[test]
fn checksum_list_show_and_check() {
    proxiscan()
        .args(["checksum", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("au_tfn (native)").and(predicate::str::contains("luhn (native)")));

    proxiscan()
        .args(["checksum", "show", "luhn"])
        .assert()
        .success()
        .stdout(predicate::str::contains("passChecksum").and(predicate::str::contains("String cleanMatch").not()));

    proxiscan()
        .args(["checksum", "show", "luhn", "--raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("return passChecksum;"));

    proxiscan()
        .args(["checksum", "check", "luhn", "4111 1111 1111 1111", "1234"])
        .assert()
        .success()
        .stdout("4111 1111 1111 1111: valid\n1234: invalid\n");

    proxiscan()
        .args(["checksum", "show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn checksum_directory_overrides_builtin() -> Result<()> {
    let dir = tempfile::tempdir()?;
    common::write_file(dir.path(), "luhn.painless", "passChecksum = cleanMatch.length() == 3;");

    proxiscan()
        .args(["checksum", "show", "luhn", "--checksums-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout("passChecksum = cleanMatch.length() == 3;\n");

    proxiscan()
        .args(["checksum", "check", "luhn", "4111 1111 1111 1111", "--checksums-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no native validator"));
    Ok(())
}

#[test]
fn highlight_terminal_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = common::write_file(dir.path(), "ssn.yml", common::SSN_CONFIG);
    let input = common::write_file(dir.path(), "response.json", common::SEARCH_RESPONSE);

    let output = proxiscan()
        .args(["--quiet", "highlight", "--config"])
        .arg(&config)
        .arg("--input")
        .arg(&input)
        .output()?;
    assert!(output.status.success());

    let stdout = strip_ansi(&output.stdout);
    assert!(stdout.contains("2 result(s) for HasSSN (showing 2)"));
    assert!(stdout.contains("Result 1/2: doc-1"));
    assert!(stdout.contains("File: /b.txt"));
    assert!(stdout.contains("Employee SSN: 123-45-6789"));
    assert_eq!(stdout.matches("Predicted detection: yes").count(), 1);
    assert_eq!(stdout.matches("Predicted detection: no").count(), 1);
    Ok(())
}

#[test]
fn highlight_reads_stdin_and_writes_html() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = common::write_file(dir.path(), "ssn.yml", common::SSN_CONFIG);
    let reports = dir.path().join("out");

    proxiscan()
        .args(["highlight", "--format", "html", "--index", "people", "--config"])
        .arg(&config)
        .arg("--output-dir")
        .arg(&reports)
        .write_stdin(common::SEARCH_RESPONSE)
        .assert()
        .success()
        .stderr(predicate::str::contains("HTML output written to:"));

    let written: Vec<_> = fs::read_dir(&reports)?.collect::<Result<_, _>>()?;
    assert_eq!(written.len(), 1);
    let name = written[0].file_name().to_string_lossy().to_string();
    assert!(name.starts_with("search_people_") && name.ends_with(".html"));
    let html = fs::read_to_string(written[0].path())?;
    assert!(html.contains("PII Search Results: people"));
    assert!(html.contains("<span class=\"context-near\">SSN</span>"));
    Ok(())
}
