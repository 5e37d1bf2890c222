// proxiscan/tests/common/mod.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

/// Sets up the logger once per test binary.
#[allow(dead_code)]
pub fn setup_logger() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .is_test(true)
            .try_init();
    });
}

#[allow(dead_code)]
pub const SSN_CONFIG: &str = r#"fieldName: HasSSN
patternRegex: '[0-9]{3}-[0-9]{2}-[0-9]{4}'
contextWords: [SSN]
proximity: 20
"#;

#[allow(dead_code)]
pub const TFN_CONFIG: &str = r#"fieldName: TFN
patternRegex: ["[0-9]{3}", "[0-9]{3}", "[0-9]{3}"]
contextWords: ["TFN", "tax file number"]
checksum: au_tfn
"#;

#[allow(dead_code)]
pub const SEARCH_RESPONSE: &str = r#"{
  "took": 3,
  "hits": {
    "total": { "value": 2, "relation": "eq" },
    "hits": [
      { "_id": "doc-1", "_score": 1.2, "_source": { "filename": "a.txt", "document_text": "Employee SSN: 123-45-6789" } },
      { "_id": "doc-2", "_score": 0.4, "_source": { "file_path": "/b.txt", "document_text": "123-45-6789 then SSN" } }
    ]
  }
}"#;

/// Writes `contents` to `dir/name` and returns the path.
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write test fixture");
    path
}
