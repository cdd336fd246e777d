//! 作答存储 - 业务能力层
//!
//! 按题目 ID 保存考生当前的作答内容，只检查"有没有"，不检查题型形状

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::UsageError;
use crate::models::{Answer, AnswerSnapshot, Question, VoiceState};

/// 作答存储
///
/// 职责：
/// - 每道题一份作答，写入即覆盖（不保留历史）
/// - 作答期间不删除任何条目
/// - 结束时生成快照交给提交方
#[derive(Debug, Default)]
pub struct AnswerStore {
    answers: HashMap<String, Answer>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取作答，不存在时返回空作答（不会失败）
    pub fn get(&self, question_id: &str) -> Answer {
        self.answers.get(question_id).cloned().unwrap_or_default()
    }

    /// 题目第一次成为当前题时创建空作答
    pub fn ensure(&mut self, question_id: &str) -> &Answer {
        self.answers.entry(question_id.to_string()).or_default()
    }

    /// 单选：覆盖之前的选项
    pub fn set_selected_option(
        &mut self,
        question: &Question,
        option: &str,
    ) -> Result<(), UsageError> {
        if !question.has_option(option) {
            return Err(UsageError::InvalidOption {
                question_id: question.id.clone(),
                option: option.to_string(),
            });
        }

        self.entry(&question.id).selected_option = Some(option.to_string());
        debug!("题目 {} 选择了 '{}'", question.id, option);
        Ok(())
    }

    /// 自由文本：最后一次写入为准
    pub fn set_free_text(&mut self, question_id: &str, text: impl Into<String>) {
        self.entry(question_id).free_text = Some(text.into());
    }

    pub fn set_voice_state(&mut self, question_id: &str, state: VoiceState) {
        self.entry(question_id).voice_state = Some(state);
    }

    /// 有输入的题目数量
    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|a| a.has_input()).count()
    }

    /// 只读快照，只包含有输入的题目
    pub fn snapshot(&self) -> AnswerSnapshot {
        let answers: BTreeMap<String, Answer> = self
            .answers
            .iter()
            .filter(|(_, answer)| answer.has_input())
            .map(|(id, answer)| (id.clone(), answer.clone()))
            .collect();
        AnswerSnapshot::new(answers)
    }

    /// 丢弃上一次作答遗留的内容
    pub fn clear(&mut self) {
        self.answers.clear();
    }

    fn entry(&mut self, question_id: &str) -> &mut Answer {
        self.answers.entry(question_id.to_string()).or_default()
    }
}
