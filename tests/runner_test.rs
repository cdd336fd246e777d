use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use assessment_session::error::{AppError, ConfigError};
use assessment_session::infrastructure::{FileElapsedStore, TokioTickSource};
use assessment_session::models::{load_test_definition, AttemptId, TestDefinition};
use assessment_session::orchestrator::{
    SessionCommand, SessionController, SessionDeps, SessionHandle, SessionRunner, SessionStatus,
};
use assessment_session::services::{
    JsonFileSubmitter, RecordingCapture, Submission, SubmitReason,
};

async fn fixture() -> TestDefinition {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_test.toml");
    load_test_definition(&path).await.expect("加载测试试卷失败")
}

fn start(def: &TestDefinition, attempt: &str, dir: &Path) -> SessionHandle {
    try_start(def, attempt, dir).expect("会话启动失败")
}

fn try_start(
    def: &TestDefinition,
    attempt: &str,
    dir: &Path,
) -> assessment_session::error::AppResult<SessionHandle> {
    let (source, ticks) = TokioTickSource::new(Duration::from_secs(1));
    let controller = SessionController::new(
        AttemptId::new(attempt),
        def,
        45,
        SessionDeps {
            store: Arc::new(FileElapsedStore::new(dir.join("state"))),
            submitter: Box::new(JsonFileSubmitter::new(dir.join("submissions"))),
            capture: Box::new(RecordingCapture::new()),
            ticks: Arc::new(source),
        },
    );
    SessionRunner::start(controller, def.ordering().unwrap(), def.budget_minutes, ticks)
}

#[tokio::test(start_paused = true)]
async fn test_full_attempt_writes_submission_file() {
    let def = fixture().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let handle = start(&def, "runner-full", dir.path());

    for line in [
        "pick move",
        "next",
        "text Arc 可以跨线程共享",
        "next",
        "accept",
        "now",
        "stop",
        "next",
        "text 令牌桶",
        "next",
    ] {
        assert!(handle.send(line.parse().unwrap()));
    }

    let outcome = assert_ok!(handle.wait().await);
    assert_eq!(outcome.status, SessionStatus::Submitted);
    assert_eq!(outcome.submit_reason, Some(SubmitReason::Completed));
    assert_eq!(outcome.answered, 4);
    assert_eq!(outcome.total, 4);

    let written = std::fs::read_to_string(
        dir.path().join("submissions").join("runner-full.submission.json"),
    )
    .unwrap();
    let submission: Submission = serde_json::from_str(&written).unwrap();
    assert_eq!(submission.answers.len(), 4);
    assert_eq!(
        submission.answers.get("ownership").unwrap().selected_option.as_deref(),
        Some("move")
    );
}

#[tokio::test(start_paused = true)]
async fn test_closing_and_reopening_resumes_clock() {
    let def = fixture().await;
    let dir = tempfile::tempdir().expect("tempdir");

    let handle = start(&def, "runner-reload", dir.path());
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    let outcome = assert_ok!(handle.close().await);
    assert_eq!(outcome.status, SessionStatus::InProgress);
    assert_eq!(outcome.elapsed_seconds, 10);

    let reopened = start(&def, "runner-reload", dir.path());
    assert_eq!(reopened.latest().remaining_seconds, 110);

    // 提交文件只会在作答结束时写入
    assert!(!dir
        .path()
        .join("submissions")
        .join("runner-reload.submission.json")
        .exists());

    reopened.send(SessionCommand::Quit);
    let outcome = assert_ok!(reopened.wait().await);
    assert_eq!(outcome.status, SessionStatus::InProgress);
}

#[tokio::test(start_paused = true)]
async fn test_reopening_after_time_runs_out_keeps_first_submission() {
    let def = fixture().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let submission_path = dir
        .path()
        .join("submissions")
        .join("runner-expired.submission.json");

    let handle = start(&def, "runner-expired", dir.path());
    assert!(handle.send("pick copy".parse().unwrap()));
    let outcome = assert_ok!(handle.wait().await);
    assert_eq!(outcome.status, SessionStatus::Submitted);
    assert_eq!(outcome.submit_reason, Some(SubmitReason::TimeExpired));
    let first = std::fs::read_to_string(&submission_path).unwrap();

    match try_start(&def, "runner-expired", dir.path()) {
        Err(AppError::Config(ConfigError::AttemptClosed { .. })) => {}
        Err(other) => panic!("意外的错误: {other}"),
        Ok(_) => panic!("已提交的作答不应再次开始"),
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    let after = std::fs::read_to_string(&submission_path).unwrap();
    assert_eq!(first, after);
    let submission: Submission = serde_json::from_str(&after).unwrap();
    assert_eq!(
        submission.answers.get("ownership").unwrap().selected_option.as_deref(),
        Some("copy")
    );
}

#[tokio::test]
async fn test_missing_definition_is_reported() {
    assert_err!(load_test_definition(Path::new("tests/fixtures/missing.toml")).await);
}
