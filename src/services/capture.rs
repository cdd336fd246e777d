//! 采集设备 - 业务能力层
//!
//! 语音状态机只表达"意图"，真正的录音由采集设备根据状态变化完成

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::models::VoiceState;

/// 采集设备，观察每一次语音状态变化
pub trait CaptureDevice: Send {
    fn observe(&mut self, question_id: &str, state: &VoiceState);
}

/// 只记录日志的采集设备
#[derive(Debug, Default)]
pub struct LoggingCapture;

impl CaptureDevice for LoggingCapture {
    fn observe(&mut self, question_id: &str, state: &VoiceState) {
        match state {
            VoiceState::Preparing { remaining_seconds } => {
                info!("🎙️ [题目 {}] 准备录音，剩余 {} 秒", question_id, remaining_seconds)
            }
            VoiceState::Recording => info!("🔴 [题目 {}] 开始录音", question_id),
            VoiceState::Stopped => info!("⏹️ [题目 {}] 停止录音", question_id),
            VoiceState::AwaitingConsent => info!("🔔 [题目 {}] 等待录音授权", question_id),
            VoiceState::NotStarted => info!("↩️ [题目 {}] 录音未开始", question_id),
        }
    }
}

/// 记录状态序列的采集设备，克隆之间共享记录
#[derive(Debug, Clone, Default)]
pub struct RecordingCapture {
    seen: Arc<Mutex<Vec<(String, VoiceState)>>>,
}

impl RecordingCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<(String, VoiceState)> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 某道题依次经历的状态名（倒计时数值不计）
    pub fn states_for(&self, question_id: &str) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for (id, state) in self.seen() {
            if id == question_id && names.last() != Some(&state.name()) {
                names.push(state.name());
            }
        }
        names
    }
}

impl CaptureDevice for RecordingCapture {
    fn observe(&mut self, question_id: &str, state: &VoiceState) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((question_id.to_string(), *state));
    }
}
