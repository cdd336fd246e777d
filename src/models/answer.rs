use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 语音题状态
///
/// 每个状态都是闭合的变体，`Recording` 不可能同时带着倒计时
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VoiceState {
    #[default]
    NotStarted,
    /// 授权弹窗已打开，尚未关闭
    AwaitingConsent,
    /// 准备阶段，剩余秒数
    Preparing { remaining_seconds: u64 },
    Recording,
    Stopped,
}

impl VoiceState {
    pub fn name(&self) -> &'static str {
        match self {
            VoiceState::NotStarted => "NotStarted",
            VoiceState::AwaitingConsent => "AwaitingConsent",
            VoiceState::Preparing { .. } => "Preparing",
            VoiceState::Recording => "Recording",
            VoiceState::Stopped => "Stopped",
        }
    }

    /// 是否已经产生了录音
    pub fn has_recording(&self) -> bool {
        matches!(self, VoiceState::Recording | VoiceState::Stopped)
    }
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Preparing { remaining_seconds } => {
                write!(f, "Preparing({})", remaining_seconds)
            }
            other => f.write_str(other.name()),
        }
    }
}

/// 单道题的作答内容
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_state: Option<VoiceState>,
}

impl Answer {
    /// 考生是否对本题有过输入
    pub fn has_input(&self) -> bool {
        self.selected_option.is_some()
            || self.free_text.is_some()
            || self.voice_state.is_some_and(|v| v.has_recording())
    }
}

/// 作答快照，交给提交方的只读副本
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSnapshot {
    answers: BTreeMap<String, Answer>,
}

impl AnswerSnapshot {
    pub fn new(answers: BTreeMap<String, Answer>) -> Self {
        Self { answers }
    }

    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Answer)> {
        self.answers.iter()
    }
}
