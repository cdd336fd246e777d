use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use assessment_session::config::Config;
use assessment_session::infrastructure::{FileElapsedStore, TokioTickSource};
use assessment_session::models::{load_test_definition, AttemptId};
use assessment_session::orchestrator::{
    CommandParseError, SessionCommand, SessionController, SessionDeps, SessionRunner,
    SessionSnapshot,
};
use assessment_session::services::{JsonFileSubmitter, LoggingCapture, SubmissionOutcome};
use assessment_session::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(&config);

    let definition = load_test_definition(Path::new(&config.test_definition_path)).await?;
    let ordering = definition.ordering()?;

    let (source, ticks) = TokioTickSource::new(config.tick_period());
    let controller = SessionController::new(
        AttemptId::new(config.attempt_id.as_str()),
        &definition,
        config.voice_prep_seconds,
        SessionDeps {
            store: Arc::new(FileElapsedStore::new(&config.state_dir)),
            submitter: Box::new(JsonFileSubmitter::new(&config.submission_dir)),
            capture: Box::new(LoggingCapture),
            ticks: Arc::new(source),
        },
    );

    let handle = SessionRunner::start(controller, ordering, definition.budget_minutes, ticks)?;
    let mut snapshots = handle.snapshots();
    let mut last_view = render(&handle.latest(), None);

    info!("⌨️ 输入命令: next / prev / goto <ID> / pick <选项> / text <内容> / consent / dismiss / accept / now / stop / quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("读取标准输入失败")? else {
                    break;
                };
                match line.parse::<SessionCommand>() {
                    Ok(SessionCommand::Quit) => {
                        handle.send(SessionCommand::Quit);
                        break;
                    }
                    Ok(command) => {
                        handle.send(command);
                    }
                    Err(CommandParseError::Empty) => {}
                    Err(e) => warn!("⚠️ {}", e),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                last_view = render(&snapshot, Some(&last_view));
                if snapshot.status.is_terminal() {
                    break;
                }
            }
        }
    }

    let outcome = handle.close().await?;
    logging::print_final_stats(
        &outcome.status.to_string(),
        outcome.answered,
        outcome.total,
        outcome.elapsed_seconds,
    );
    if outcome.submission == Some(SubmissionOutcome::MayNotHaveSaved) {
        warn!("⚠️ 你的结果可能没有保存");
    }

    Ok(())
}

/// 只在题目或语音状态变化时输出完整信息，倒计时走 debug
fn render(snapshot: &SessionSnapshot, last: Option<&String>) -> String {
    let question = snapshot
        .question
        .as_ref()
        .map(|q| format!("{} [{}] {}", q.id, q.modality, q.title))
        .unwrap_or_default();
    let voice = snapshot.voice_state.map(|s| s.name()).unwrap_or("-");
    let view = format!("{} | {} | 语音: {}", snapshot.status, question, voice);

    if last != Some(&view) {
        let position = snapshot
            .position
            .map(|p| p.to_string())
            .unwrap_or_default();
        info!(
            "📄 {} {} | 剩余 {} | 已作答 {}",
            position, view, snapshot.remaining_display, snapshot.answered
        );
        if let Some(question) = &snapshot.question {
            if let Some(options) = &question.options {
                info!("   选项: {}", options.join(" / "));
            }
        }
    } else {
        debug!("⏱️ 剩余 {}", snapshot.remaining_display);
    }
    view
}
