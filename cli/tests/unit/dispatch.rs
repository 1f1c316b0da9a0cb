//! Operation dispatch: outcome → status report.

use omsagent_handler::commands::{execute, status_for};
use omsagent_handler::domain::{HandlerConfig, HandlerSettings, Operation, StatusState};

use crate::helpers::{
    FakeFs, FakeRunner, FakeSettings, RecordingSleeper, UBUNTU_1604, exit, host, valid_settings,
};

#[tokio::test]
async fn update_is_a_successful_no_op() {
    let config = HandlerConfig::default();
    let runner = FakeRunner::new();
    let sleeper = RecordingSleeper::default();
    let fs = FakeFs::new();

    let outcome = execute(
        &host(&runner, &sleeper, &fs, &config),
        &valid_settings(None),
        Operation::Update,
    )
    .await;
    let status = status_for(Operation::Update, &outcome);

    assert_eq!(status.exit_code, 0);
    assert_eq!(status.state, StatusState::Success);
    assert_eq!(status.message, "Update succeeded");
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn missing_workspace_id_reports_parameter_failure() {
    let config = HandlerConfig::default();
    let runner = FakeRunner::new();
    let sleeper = RecordingSleeper::default();
    let fs = FakeFs::new().with_file(&config.paths.os_release, UBUNTU_1604);
    let settings = FakeSettings(HandlerSettings {
        public: Some(Default::default()),
        protected: Ok(None),
    });

    let outcome = execute(&host(&runner, &sleeper, &fs, &config), &settings, Operation::Install).await;
    let status = status_for(Operation::Install, &outcome);

    assert_eq!(status.exit_code, 11);
    assert_eq!(
        status.message,
        "Install failed due to a missing parameter: Workspace ID must be provided"
    );
}

#[tokio::test]
async fn install_exit_one_carries_dependency_hint() {
    let config = HandlerConfig::default();
    let runner = FakeRunner::new().on("--upgrade", [exit(1, "missing dependency")]);
    let sleeper = RecordingSleeper::default();
    let fs = FakeFs::new().with_file(&config.paths.os_release, UBUNTU_1604);

    let outcome = execute(
        &host(&runner, &sleeper, &fs, &config),
        &valid_settings(None),
        Operation::Install,
    )
    .await;
    let status = status_for(Operation::Install, &outcome);

    assert_eq!(status.exit_code, 1);
    assert_eq!(status.state, StatusState::Failed);
    assert!(status.message.contains("Please check that dependencies are installed"));
}

#[tokio::test]
async fn disable_exit_code_is_reported_verbatim() {
    let config = HandlerConfig::default();
    let runner = FakeRunner::new().on("disable", [exit(4, "")]);
    let sleeper = RecordingSleeper::default();
    let fs = FakeFs::new().with_path(&config.paths.service_control);

    let outcome = execute(
        &host(&runner, &sleeper, &fs, &config),
        &valid_settings(None),
        Operation::Disable,
    )
    .await;
    let status = status_for(Operation::Disable, &outcome);

    assert_eq!(status.exit_code, 4);
    assert_eq!(status.message, "Disable failed with exit code 4");
}
