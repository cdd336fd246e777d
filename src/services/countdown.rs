//! 倒计时服务 - 业务能力层
//!
//! 从初始预算开始单调递减，每个节拍把新值交还给持有者，
//! 并（可选）把已用秒数写入持久化存储。归零时自行停止，
//! 且只发出一次 `Expired`。是否自动提交由会话决定。

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::infrastructure::{ElapsedStore, LeaseId, TickLease, TickSource, TimerId};
use crate::models::AttemptId;

/// 计时状态，满足 `0 <= remaining_seconds <= total_seconds`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerState {
    pub total_seconds: u64,
    pub remaining_seconds: u64,
}

impl TimerState {
    pub fn elapsed_seconds(&self) -> u64 {
        self.total_seconds - self.remaining_seconds
    }
}

/// 节拍产生的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// 剩余秒数更新
    Tick { remaining_seconds: u64 },
    /// 归零，每次启动只出现一次
    Expired,
}

struct Persistence {
    attempt_id: AttemptId,
    store: Arc<dyn ElapsedStore>,
}

/// 倒计时器
///
/// 运行中持有一个节拍租约；`stop` 或丢弃计时器时租约被释放
pub struct CountdownTimer {
    timer: TimerId,
    state: Option<TimerState>,
    lease: Option<TickLease>,
    expired: bool,
    persistence: Option<Persistence>,
}

impl CountdownTimer {
    pub fn new(timer: TimerId) -> Self {
        Self {
            timer,
            state: None,
            lease: None,
            expired: false,
            persistence: None,
        }
    }

    /// 每个节拍把已用秒数写入 `store`
    pub fn with_persistence(mut self, attempt_id: AttemptId, store: Arc<dyn ElapsedStore>) -> Self {
        self.persistence = Some(Persistence { attempt_id, store });
        self
    }

    /// 启动计时
    ///
    /// `resume_from_seconds` 落在 `[0, total_seconds]` 内时从该值开始，否则从
    /// `total_seconds` 开始。起点为 0 时不租用节拍，直接返回 `Expired`。
    pub fn start(
        &mut self,
        total_seconds: u64,
        resume_from_seconds: Option<u64>,
        ticks: &dyn TickSource,
    ) -> Result<Option<TimerEvent>, ConfigError> {
        if total_seconds == 0 {
            return Err(ConfigError::InvalidBudget { total_seconds });
        }

        // 重新启动前先释放旧租约
        self.stop();

        let remaining_seconds = match resume_from_seconds {
            Some(resume) if resume <= total_seconds => resume,
            Some(resume) => {
                warn!(
                    "⚠️ 计时器 {} 的恢复值 {} 超出预算 {}，从头开始",
                    self.timer, resume, total_seconds
                );
                total_seconds
            }
            None => total_seconds,
        };

        self.state = Some(TimerState {
            total_seconds,
            remaining_seconds,
        });
        self.expired = false;

        if remaining_seconds == 0 {
            self.expired = true;
            info!("⏰ 计时器 {} 启动时已无剩余时间", self.timer);
            return Ok(Some(TimerEvent::Expired));
        }

        self.lease = Some(ticks.acquire(self.timer.clone()));
        debug!(
            "⏱️ 计时器 {} 启动: {}/{} 秒",
            self.timer, remaining_seconds, total_seconds
        );
        Ok(None)
    }

    /// 处理一个节拍
    ///
    /// 不属于当前租约的节拍（已停止、或来自旧租约）被忽略
    pub fn tick(&mut self, lease: LeaseId) -> Option<TimerEvent> {
        if self.lease.as_ref().map(TickLease::id) != Some(lease) {
            return None;
        }
        let state = self.state.as_mut()?;

        state.remaining_seconds = state.remaining_seconds.saturating_sub(1);
        let remaining_seconds = state.remaining_seconds;
        let elapsed_seconds = state.elapsed_seconds();

        self.persist(elapsed_seconds);

        if remaining_seconds == 0 {
            self.stop();
            self.expired = true;
            info!("⏰ 计时器 {} 已归零", self.timer);
            Some(TimerEvent::Expired)
        } else {
            Some(TimerEvent::Tick { remaining_seconds })
        }
    }

    /// 停止计时并释放租约；重复调用无副作用
    pub fn stop(&mut self) {
        if let Some(mut lease) = self.lease.take() {
            lease.release();
            debug!("⏹️ 计时器 {} 已停止", self.timer);
        }
    }

    pub fn timer(&self) -> &TimerId {
        &self.timer
    }

    pub fn state(&self) -> Option<TimerState> {
        self.state
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.map_or(0, |s| s.remaining_seconds)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.state.map_or(0, |s| s.elapsed_seconds())
    }

    pub fn is_running(&self) -> bool {
        self.lease.is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    fn persist(&self, elapsed_seconds: u64) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        // 持久化失败只影响刷新后的恢复，不阻塞作答
        if let Err(e) = persistence
            .store
            .set(&persistence.attempt_id, elapsed_seconds)
        {
            warn!(
                "⚠️ [作答 {}] 已用时间写入失败，继续使用内存计时: {}",
                persistence.attempt_id, e
            );
        }
    }
}
