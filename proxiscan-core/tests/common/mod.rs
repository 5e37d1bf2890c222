// proxiscan-core/tests/common/mod.rs
use proxiscan_core::config::{DetectorConfig, PatternSpec};
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
pub fn tfn_config() -> DetectorConfig {
    let mut config = DetectorConfig::new(
        "HasTFN",
        PatternSpec::Chunked(vec!["[0-9]{3}".into(), "[0-9]{3}".into(), "[0-9]{3}".into()]),
    );
    config.context_words = vec!["TFN".into(), "tax file number".into()];
    config.checksum = Some("au_tfn".into());
    config
}

#[allow(dead_code)]
pub fn ssn_config() -> DetectorConfig {
    let mut config = DetectorConfig::new("HasSSN", PatternSpec::Single("[0-9]{3}-[0-9]{2}-[0-9]{4}".into()));
    config.context_words = vec!["SSN".into()];
    config
}
