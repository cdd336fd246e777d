//! 作答上下文
//!
//! 封装"哪一次作答的第几题"这一信息，用于日志前缀

use std::fmt::Display;

use crate::models::AttemptId;

/// 作答上下文
#[derive(Debug, Clone)]
pub struct AttemptCtx {
    /// 作答 ID
    pub attempt_id: AttemptId,

    /// 题目在顺序中的位置（从1开始）
    pub question_index: usize,

    /// 题目 ID
    pub question_id: String,
}

impl AttemptCtx {
    /// 创建新的作答上下文
    pub fn new(attempt_id: AttemptId, question_index: usize, question_id: impl Into<String>) -> Self {
        Self {
            attempt_id,
            question_index,
            question_id: question_id.into(),
        }
    }
}

impl Display for AttemptCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[作答 #{} 题目#{} ({})]",
            self.attempt_id, self.question_index, self.question_id
        )
    }
}
