//! Settings file loading and protected-settings decryption.

use std::path::Path;

use omsagent_handler::application::ports::SettingsProvider;
use omsagent_handler::application::services::install::install;
use omsagent_handler::domain::{HandlerConfig, HandlerError};
use omsagent_handler::infra::settings::FileSettingsProvider;

use crate::helpers::{
    FakeFs, FakeRunner, RecordingSleeper, UBUNTU_1604, WORKSPACE_ID, WORKSPACE_KEY, exit, host,
};

const WAAGENT_LIB: &str = "/var/lib/waagent";
/// `"encrypted-blob"` in standard base64.
const ENCRYPTED: &str = "ZW5jcnlwdGVkLWJsb2I=";

fn write_settings(dir: &Path, handler_settings: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("0.settings");
    let file = serde_json::json!({ "runtimeSettings": [{ "handlerSettings": handler_settings }] });
    std::fs::write(&path, file.to_string()).expect("write settings");
    path
}

fn protected_settings() -> serde_json::Value {
    serde_json::json!({
        "publicSettings": { "workspaceId": WORKSPACE_ID, "stopOnMultipleConnections": true },
        "protectedSettings": ENCRYPTED,
        "protectedSettingsCertThumbprint": "ABC123",
    })
}

#[tokio::test]
async fn public_settings_only_needs_no_decryption() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(
        dir.path(),
        &serde_json::json!({ "publicSettings": { "workspaceId": WORKSPACE_ID } }),
    );
    let runner = FakeRunner::new();
    let provider = FileSettingsProvider::new(&runner, path, WAAGENT_LIB.into());

    let settings = provider.settings().await.expect("settings");

    let public = settings.public.expect("public");
    assert_eq!(public.workspace_id.as_deref(), Some(WORKSPACE_ID));
    assert!(!public.stop_on_multiple_connections());
    assert!(matches!(settings.protected, Ok(None)));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn protected_settings_are_decrypted_with_agent_certificate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(dir.path(), &protected_settings());
    let runner = FakeRunner::new()
        .on("which openssl", [exit(0, "/usr/bin/openssl")])
        .on(
            "openssl smime",
            [exit(0, &format!(r#"{{"workspaceKey": "{WORKSPACE_KEY}", "proxy": "http://p:3128"}}"#))],
        );
    let provider = FileSettingsProvider::new(&runner, path, WAAGENT_LIB.into());

    let settings = provider.settings().await.expect("settings");

    let protected = settings.protected.expect("decrypted").expect("protected");
    assert_eq!(protected.workspace_key.as_deref(), Some(WORKSPACE_KEY));
    assert_eq!(protected.proxy.as_deref(), Some("http://p:3128"));
    assert!(settings.public.expect("public").stop_on_multiple_connections());
    assert_eq!(
        runner.calls()[1],
        "openssl smime -inform DER -decrypt -recip /var/lib/waagent/ABC123.crt \
-inkey /var/lib/waagent/ABC123.prv"
    );
    assert_eq!(runner.stdin_inputs(), vec![b"encrypted-blob".to_vec()]);
}

#[tokio::test]
async fn settings_are_loaded_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(dir.path(), &protected_settings());
    let runner = FakeRunner::new()
        .on("which openssl", [exit(0, "/usr/bin/openssl")])
        .on("openssl smime", [exit(0, r#"{"workspaceKey": "a2V5"}"#)]);
    let provider = FileSettingsProvider::new(&runner, path, WAAGENT_LIB.into());

    provider.settings().await.expect("first");
    provider.settings().await.expect("second");

    assert_eq!(runner.count("openssl smime"), 1);
}

#[tokio::test]
async fn missing_openssl_is_kept_for_callers_that_need_protected_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(dir.path(), &protected_settings());
    let runner = FakeRunner::new().on("which openssl", [exit(1, "")]);
    let provider = FileSettingsProvider::new(&runner, path, WAAGENT_LIB.into());

    let settings = provider.settings().await.expect("settings");

    let public = settings.public.as_ref().expect("public");
    assert_eq!(public.workspace_id.as_deref(), Some(WORKSPACE_ID));
    let err = settings.require_protected().expect_err("no openssl");
    assert!(matches!(err, HandlerError::UnsupportedOpenSsl));
    assert_eq!(err.exit_code(), 60);
    assert_eq!(runner.count("openssl smime"), 0);
}

#[tokio::test]
async fn failed_decryption_is_kept_as_generic_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(dir.path(), &protected_settings());
    let runner = FakeRunner::new()
        .on("which openssl", [exit(0, "/usr/bin/openssl")])
        .on("openssl smime", [exit(4, "Error decrypting PKCS#7 structure")]);
    let provider = FileSettingsProvider::new(&runner, path, WAAGENT_LIB.into());

    let settings = provider.settings().await.expect("settings");

    assert!(settings.public.is_some());
    let err = settings.require_protected().expect_err("decrypt");
    assert!(matches!(err, HandlerError::ProtectedSettingsUnreadable(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("Failed decrypting protectedSettings"));
}

#[tokio::test]
async fn install_proceeds_when_protected_settings_cannot_be_decrypted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(
        dir.path(),
        &serde_json::json!({
            "publicSettings": { "workspaceId": WORKSPACE_ID },
            "protectedSettings": ENCRYPTED,
            "protectedSettingsCertThumbprint": "ABC123",
        }),
    );
    let config = HandlerConfig::default();
    let runner = FakeRunner::new()
        .on("which openssl", [exit(1, "")])
        .on("--upgrade", [exit(0, "Installed")]);
    let sleeper = RecordingSleeper::default();
    let fs = FakeFs::new().with_file(&config.paths.os_release, UBUNTU_1604);
    let provider = FileSettingsProvider::new(&runner, path, WAAGENT_LIB.into());

    let code = install(&host(&runner, &sleeper, &fs, &config), &provider)
        .await
        .expect("install");

    assert_eq!(code, 0);
    assert_eq!(runner.count("--upgrade"), 1);
}

#[tokio::test]
async fn string_stop_flag_keeps_public_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(
        dir.path(),
        &serde_json::json!({
            "publicSettings": { "workspaceId": WORKSPACE_ID, "stopOnMultipleConnections": "true" },
        }),
    );
    let runner = FakeRunner::new();
    let provider = FileSettingsProvider::new(&runner, path, WAAGENT_LIB.into());

    let settings = provider.settings().await.expect("settings");

    let public = settings.public.expect("public");
    assert_eq!(public.workspace_id.as_deref(), Some(WORKSPACE_ID));
    assert!(!public.stop_on_multiple_connections());
}

#[tokio::test]
async fn unreadable_settings_file_yields_empty_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runner = FakeRunner::new();
    let provider =
        FileSettingsProvider::new(&runner, dir.path().join("9.settings"), WAAGENT_LIB.into());

    let settings = provider.settings().await.expect("settings");

    assert!(settings.public.is_none());
    assert!(matches!(settings.protected, Ok(None)));
}
