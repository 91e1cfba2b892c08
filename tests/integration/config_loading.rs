//! Layered configuration loading: defaults, files and environment overrides

use crate::integration::test_utils::with_config_env;
use provoke::config::{ConfigLoader, ProvokeConfig};
use provoke::generation::GenerationKind;
use provoke::settings::StylePreset;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_global(test_dir: &TempDir, contents: &str) -> PathBuf {
    let dir = test_dir.path().join("provoke");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn defaults_apply_without_any_source() {
    let test_dir = TempDir::new().unwrap();

    let config = with_config_env(&test_dir, &[], || ConfigLoader::load().unwrap());

    let defaults = ProvokeConfig::default();
    assert_eq!(config.orchestrator, defaults.orchestrator);
    assert_eq!(config.executor, defaults.executor);
    assert_eq!(config.backend, defaults.backend);
    assert_eq!(config.orchestrator.debounce_ms, 300);
    assert_eq!(config.settings.ai_timeout_seconds, 5.0);
}

#[test]
fn global_file_is_discovered_under_xdg_config_home() {
    let test_dir = TempDir::new().unwrap();
    let path = write_global(
        &test_dir,
        r#"
[orchestrator]
debounce_ms = 500
kind = "counterargument"

[settings]
style_preset = "contrarian"
ai_timeout_seconds = 9.5
"#,
    );

    let (config, discovered) = with_config_env(&test_dir, &[], || {
        (
            ConfigLoader::load().unwrap(),
            ConfigLoader::global_config_path(),
        )
    });

    assert_eq!(discovered, Some(path));
    assert_eq!(config.orchestrator.debounce_ms, 500);
    assert_eq!(config.orchestrator.kind, GenerationKind::Counterargument);
    assert_eq!(config.settings.style_preset, StylePreset::Contrarian);
    assert_eq!(config.settings.ai_timeout_seconds, 9.5);
    assert_eq!(config.executor.max_retries, 2);
}

#[test]
fn explicit_file_overrides_global_and_environment_overrides_both() {
    let test_dir = TempDir::new().unwrap();
    write_global(
        &test_dir,
        r#"
[backend]
model = "global-model"
endpoint = "http://global:11434"
"#,
    );
    let explicit = test_dir.path().join("explicit.toml");
    fs::write(
        &explicit,
        r#"
[backend]
model = "explicit-model"

[executor]
max_retries = 1
"#,
    )
    .unwrap();

    let config = with_config_env(
        &test_dir,
        &[
            ("PROVOKE__BACKEND__MODEL", "env-model"),
            ("PROVOKE__EXECUTOR__BACKOFF_MS", "40"),
        ],
        || ConfigLoader::load_with(Some(&explicit)).unwrap(),
    );

    assert_eq!(config.backend.model, "env-model");
    assert_eq!(config.backend.endpoint, "http://global:11434");
    assert_eq!(config.executor.max_retries, 1);
    assert_eq!(config.executor.backoff_ms, 40);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let test_dir = TempDir::new().unwrap();
    let missing = test_dir.path().join("nope.toml");

    let result = with_config_env(&test_dir, &[], || ConfigLoader::load_with(Some(&missing)));

    assert!(result.is_err());
}

#[test]
fn out_of_range_values_are_rejected() {
    let test_dir = TempDir::new().unwrap();

    let result = with_config_env(
        &test_dir,
        &[
            ("PROVOKE__EXECUTOR__MAX_RETRIES", "50"),
            ("PROVOKE__ORCHESTRATOR__DEBOUNCE_MS", "60000"),
        ],
        ConfigLoader::load,
    );

    let message = result.unwrap_err().to_string();
    assert!(message.contains("max_retries"), "{}", message);
    assert!(message.contains("debounce_ms"), "{}", message);
}

#[test]
fn single_file_loading_ignores_the_environment() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("only.toml");
    fs::write(&path, "[backend]\nmodel = \"file-model\"\n").unwrap();

    let config = with_config_env(
        &test_dir,
        &[("PROVOKE__BACKEND__MODEL", "env-model")],
        || ConfigLoader::load_from_file(&path).unwrap(),
    );

    assert_eq!(config.backend.model, "file-model");
}
