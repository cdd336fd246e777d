//! 会话运行器 - 编排层
//!
//! 把同步的 `SessionController` 放进一个 tokio 任务里驱动：
//!
//! - 命令从 `mpsc` 通道进入
//! - 节拍从 `TokioTickSource` 的接收端进入
//! - 每次状态变化通过 `watch` 通道发布最新快照
//!
//! 命令通道关闭等同于表现层被销毁：会话挂起、租约全部释放，
//! 作答保持可恢复状态。

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::infrastructure::Tick;
use crate::models::SectionOrdering;
use crate::services::{SubmissionOutcome, SubmitReason};

use super::command::SessionCommand;
use super::session_controller::{SessionController, SessionSnapshot, SessionStatus};

/// 会话结束时的汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    pub submit_reason: Option<SubmitReason>,
    pub submission: Option<SubmissionOutcome>,
    pub answered: usize,
    pub total: usize,
    pub elapsed_seconds: u64,
}

impl SessionOutcome {
    fn from_controller(controller: &SessionController) -> Self {
        Self {
            status: controller.status(),
            submit_reason: controller.submit_reason(),
            submission: controller.submission_outcome(),
            answered: controller.answers_snapshot().len(),
            total: controller.question_count(),
            elapsed_seconds: controller.elapsed_seconds(),
        }
    }
}

/// 运行中会话的句柄
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    /// 发送命令；会话已结束时返回 `false`
    pub fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// 订阅快照
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// 最新快照
    pub fn latest(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// 等待会话自行结束（提交或退出），期间保持命令通道打开
    pub async fn wait(self) -> AppResult<SessionOutcome> {
        let SessionHandle { commands, task, .. } = self;
        let outcome = task.await?;
        drop(commands);
        Ok(outcome)
    }

    /// 关闭命令通道（表现层销毁）并等待会话挂起
    pub async fn close(self) -> AppResult<SessionOutcome> {
        let SessionHandle { commands, task, .. } = self;
        drop(commands);
        Ok(task.await?)
    }
}

/// 会话运行器
pub struct SessionRunner;

impl SessionRunner {
    /// 开始作答并在后台驱动会话
    ///
    /// `begin` 在调用方所在的任务里同步执行，配置错误直接返回
    pub fn start(
        mut controller: SessionController,
        ordering: SectionOrdering,
        total_budget_minutes: u32,
        ticks: mpsc::UnboundedReceiver<Tick>,
    ) -> AppResult<SessionHandle> {
        controller.begin(ordering, total_budget_minutes)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let task = tokio::spawn(run_loop(controller, command_rx, ticks, snapshot_tx));

        Ok(SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        })
    }
}

async fn run_loop(
    mut controller: SessionController,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    mut ticks: mpsc::UnboundedReceiver<Tick>,
    snapshots: watch::Sender<SessionSnapshot>,
) -> SessionOutcome {
    while !controller.status().is_terminal() {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SessionCommand::Quit) | None => {
                    controller.suspend();
                    break;
                }
                Some(command) => {
                    if let Err(e) = command.apply(&mut controller) {
                        if e.is_usage() {
                            warn!("⚠️ [作答 {}] 忽略命令 {:?}: {}", controller.attempt_id(), command, e);
                        } else {
                            error!("❌ [作答 {}] 命令 {:?} 执行失败: {}", controller.attempt_id(), command, e);
                        }
                    }
                }
            },
            Some(tick) = ticks.recv() => {
                if !controller.on_tick(tick) {
                    continue;
                }
            }
        }

        // 没有订阅者时发送失败，不影响会话
        let _ = snapshots.send(controller.snapshot());
    }

    let _ = snapshots.send(controller.snapshot());
    info!(
        "🏁 [作答 {}] 会话结束，状态 {}",
        controller.attempt_id(),
        controller.status()
    );
    SessionOutcome::from_controller(&controller)
}
