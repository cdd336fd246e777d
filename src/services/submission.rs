//! 提交服务 - 业务能力层
//!
//! 只负责"把一次作答交出去"，会话保证每次作答只调用一次，
//! 失败后的重试由提交方自己负责

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SubmissionError;
use crate::infrastructure::is_storable_attempt_id;
use crate::models::{AnswerSnapshot, AttemptId};

/// 提交原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    /// 考生在最后一题点击下一题
    Completed,
    /// 总时长耗尽，自动提交
    TimeExpired,
}

/// 提交内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub attempt_id: AttemptId,
    pub test_id: String,
    pub answers: AnswerSnapshot,
    pub elapsed_seconds: u64,
    pub reason: SubmitReason,
    pub submitted_at: DateTime<Local>,
}

/// 提交结果（考生可见的提示）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Saved,
    /// "你的结果可能没有保存"
    MayNotHaveSaved,
}

/// 提交方
pub trait Submitter: Send {
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmissionError>;
}

/// 写 JSON 文件的提交方：每个作答一个文件
pub struct JsonFileSubmitter {
    dir: PathBuf,
}

impl JsonFileSubmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, attempt_id: &AttemptId) -> PathBuf {
        self.dir.join(format!("{}.submission.json", attempt_id))
    }
}

impl Submitter for JsonFileSubmitter {
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmissionError> {
        if !is_storable_attempt_id(&submission.attempt_id) {
            return Err(SubmissionError::InvalidAttemptId {
                attempt_id: submission.attempt_id.to_string(),
            });
        }

        let path = self.path_for(&submission.attempt_id);
        debug!(
            "写入提交: 作答 {} | 题目 {} | 已用 {} 秒",
            submission.attempt_id,
            submission.answers.len(),
            submission.elapsed_seconds
        );

        let write_failed = |source: std::io::Error| SubmissionError::WriteFailed {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_failed)?;
        let content = serde_json::to_string_pretty(submission)?;
        std::fs::write(&path, content).map_err(write_failed)?;

        info!("📤 提交已写入: {}", path.display());
        Ok(())
    }
}

/// 内存提交方，可克隆，克隆之间共享同一份记录
#[derive(Debug, Clone, Default)]
pub struct MemorySubmitter {
    submissions: Arc<Mutex<Vec<Submission>>>,
    reject_with: Option<String>,
}

impl MemorySubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次提交都被拒绝（记录仍会保留，便于检查调用次数）
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            reject_with: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Submitter for MemorySubmitter {
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmissionError> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(submission.clone());

        match &self.reject_with {
            Some(reason) => Err(SubmissionError::Rejected {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::models::Answer;

    fn submission(attempt: &str) -> Submission {
        let mut answers = BTreeMap::new();
        answers.insert(
            "q1".to_string(),
            Answer {
                free_text: Some("Arc<Mutex<T>>".to_string()),
                ..Answer::default()
            },
        );
        Submission {
            attempt_id: AttemptId::new(attempt),
            test_id: "backend-screen".to_string(),
            answers: AnswerSnapshot::new(answers),
            elapsed_seconds: 321,
            reason: SubmitReason::Completed,
            submitted_at: Local::now(),
        }
    }

    #[test]
    fn test_json_file_submitter_writes_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut submitter = JsonFileSubmitter::new(dir.path().join("out"));
        let sub = submission("cand-1");

        submitter.submit(&sub).unwrap();

        let written = std::fs::read_to_string(submitter.path_for(&sub.attempt_id)).unwrap();
        let parsed: Submission = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.elapsed_seconds, 321);
        assert_eq!(parsed.reason, SubmitReason::Completed);
        assert_eq!(
            parsed.answers.get("q1").unwrap().free_text.as_deref(),
            Some("Arc<Mutex<T>>")
        );
    }

    #[test]
    fn test_json_file_submitter_rejects_unsafe_attempt_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut submitter = JsonFileSubmitter::new(dir.path());
        let err = submitter.submit(&submission("a/b")).unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidAttemptId { .. }));
    }

    #[test]
    fn test_memory_submitter_shares_records_between_clones() {
        let recorder = MemorySubmitter::new();
        let mut handle = recorder.clone();
        handle.submit(&submission("x")).unwrap();
        assert_eq!(recorder.count(), 1);

        let mut rejecting = MemorySubmitter::rejecting("downstream offline");
        assert!(rejecting.submit(&submission("y")).is_err());
        assert_eq!(rejecting.count(), 1);
    }
}
