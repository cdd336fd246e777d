//! 语音作答流程 - 流程层
//!
//! 定义一道语音题的完整流程：
//! 1. 进入题目 → 弹出录音授权（AwaitingConsent）
//! 2. 同意 → 准备倒计时（Preparing，默认 45 秒）
//! 3. 倒计时归零或考生点击"现在开始" → 录音（Recording）
//! 4. 考生点击停止 → 结束（Stopped，终态）
//!
//! 录音阶段没有超时。作答期间只有考生能停止录音；离开题目或会话结束时，
//! 录音中的状态被收尾为 Stopped，让采集设备结束录制。

use tracing::{debug, info};

use crate::error::{AppError, UsageError};
use crate::infrastructure::{LeaseId, TickSource, TimerId};
use crate::models::VoiceState;
use crate::services::{CountdownTimer, TimerEvent};

/// 默认准备时间（秒）
pub const DEFAULT_PREP_SECONDS: u64 = 45;

/// 语音作答状态机
///
/// - 每道语音题一个实例，作答期间复用
/// - 准备倒计时是独立的计时器，和总计时互不共享状态
/// - 授权弹窗只在 `on_enter` 时自动弹出，关闭后本次访问内不会再自动弹出
pub struct VoiceResponse {
    question_id: String,
    state: VoiceState,
    prep: CountdownTimer,
    prep_budget_seconds: u64,
}

impl VoiceResponse {
    pub fn new(question_id: impl Into<String>, prep_budget_seconds: u64) -> Self {
        let question_id = question_id.into();
        Self {
            prep: CountdownTimer::new(TimerId::VoicePrep(question_id.clone())),
            question_id,
            state: VoiceState::NotStarted,
            prep_budget_seconds: prep_budget_seconds.max(1),
        }
    }

    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn prep_running(&self) -> bool {
        self.prep.is_running()
    }

    /// 题目成为当前题（新的一次访问）
    pub fn on_enter(&mut self) {
        if self.state == VoiceState::NotStarted {
            self.state = VoiceState::AwaitingConsent;
            debug!("[题目 {}] 自动弹出录音授权", self.question_id);
        }
    }

    /// 关闭授权弹窗，不开始录音
    pub fn dismiss(&mut self) -> Result<(), UsageError> {
        match self.state {
            VoiceState::AwaitingConsent => {
                self.state = VoiceState::NotStarted;
                Ok(())
            }
            other => Err(UsageError::illegal_voice(other.to_string(), "dismiss")),
        }
    }

    /// 本次访问内重新打开授权弹窗
    pub fn request_consent(&mut self) -> Result<(), UsageError> {
        match self.state {
            VoiceState::NotStarted => {
                self.state = VoiceState::AwaitingConsent;
                Ok(())
            }
            other => Err(UsageError::illegal_voice(other.to_string(), "request_consent")),
        }
    }

    /// 同意授权，开始准备倒计时
    pub fn accept(&mut self, ticks: &dyn TickSource) -> Result<(), AppError> {
        if self.state != VoiceState::AwaitingConsent {
            return Err(UsageError::illegal_voice(self.state.to_string(), "accept").into());
        }

        // 预算至少 1 秒且不从中途恢复，启动时不会立即归零
        self.prep.start(self.prep_budget_seconds, None, ticks)?;
        self.state = VoiceState::Preparing {
            remaining_seconds: self.prep_budget_seconds,
        };
        info!(
            "🎙️ [题目 {}] 开始 {} 秒准备",
            self.question_id, self.prep_budget_seconds
        );
        Ok(())
    }

    /// 准备倒计时的节拍；返回状态是否变化
    pub fn on_prep_tick(&mut self, lease: LeaseId) -> bool {
        if !matches!(self.state, VoiceState::Preparing { .. }) {
            return false;
        }

        match self.prep.tick(lease) {
            Some(TimerEvent::Tick { remaining_seconds }) => {
                self.state = VoiceState::Preparing { remaining_seconds };
                true
            }
            Some(TimerEvent::Expired) => {
                self.state = VoiceState::Recording;
                info!("🔴 [题目 {}] 准备时间结束，自动开始录音", self.question_id);
                true
            }
            None => false,
        }
    }

    /// 提前开始录音
    pub fn begin_now(&mut self) -> Result<(), UsageError> {
        match self.state {
            VoiceState::Preparing { remaining_seconds } => {
                self.prep.stop();
                self.state = VoiceState::Recording;
                info!(
                    "🔴 [题目 {}] 考生提前开始录音 (剩余 {} 秒准备)",
                    self.question_id, remaining_seconds
                );
                Ok(())
            }
            other => Err(UsageError::illegal_voice(other.to_string(), "begin_now")),
        }
    }

    /// 考生停止录音
    pub fn stop(&mut self) -> Result<(), UsageError> {
        match self.state {
            VoiceState::Recording => {
                self.state = VoiceState::Stopped;
                Ok(())
            }
            other => Err(UsageError::illegal_voice(other.to_string(), "stop")),
        }
    }

    /// 离开题目或会话结束
    ///
    /// 授权中/准备中回到 NotStarted；录音中视为停止；Stopped 保持不变
    pub fn on_leave(&mut self) {
        self.prep.stop();
        self.state = match self.state {
            VoiceState::AwaitingConsent | VoiceState::Preparing { .. } => VoiceState::NotStarted,
            VoiceState::Recording => {
                info!("⏹️ [题目 {}] 离开题目，录音结束", self.question_id);
                VoiceState::Stopped
            }
            other => other,
        };
    }
}
