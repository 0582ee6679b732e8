//! Configuration loading from workspace files.

use strata::config::{StrataConfig, WORKSPACE_FILE};
use tempfile::TempDir;

#[test]
fn missing_workspace_file_falls_back_to_defaults() {
    let workspace = TempDir::new().unwrap();
    let config = StrataConfig::load_from(workspace.path()).unwrap();
    assert!(config.remote.endpoint.is_none());
    assert_eq!(config.upload.part_size, 5 * 1024 * 1024);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn workspace_file_sets_remote_and_logging() {
    let workspace = TempDir::new().unwrap();
    std::fs::write(
        workspace.path().join(WORKSPACE_FILE),
        r#"
[remote]
endpoint = "https://sync.example.test/api"
api_key = "secret"

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = StrataConfig::load_from(workspace.path()).unwrap();
    assert_eq!(
        config.remote.endpoint.as_deref(),
        Some("https://sync.example.test/api")
    );
    assert_eq!(config.remote.api_key.as_deref(), Some("secret"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn malformed_workspace_file_is_a_configuration_error() {
    let workspace = TempDir::new().unwrap();
    std::fs::write(workspace.path().join(WORKSPACE_FILE), "remote = not valid").unwrap();
    assert!(StrataConfig::load_from(workspace.path()).is_err());
}
