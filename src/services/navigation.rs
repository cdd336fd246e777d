//! 题目导航 - 业务能力层
//!
//! 只回答"上一题 / 下一题是谁"，不持有游标，也不关心能否回看

use std::fmt;

use serde::Serialize;

use crate::error::UsageError;
use crate::models::SectionOrdering;

/// 当前位置（`index` 从 0 开始，显示时 +1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub index: usize,
    pub total: usize,
}

impl Position {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index + 1, self.total)
    }
}

/// 题目导航器
///
/// 给定题目顺序和索引，计算合法的前后题目。纯函数，无副作用。
#[derive(Debug, Clone)]
pub struct QuestionNavigator {
    ordering: SectionOrdering,
}

impl QuestionNavigator {
    pub fn new(ordering: SectionOrdering) -> Self {
        Self { ordering }
    }

    pub fn ordering(&self) -> &SectionOrdering {
        &self.ordering
    }

    pub fn total(&self) -> usize {
        self.ordering.len()
    }

    /// 索引处的题目 ID
    pub fn current_question_id(&self, index: usize) -> Result<&str, UsageError> {
        self.ordering
            .ids()
            .get(index)
            .map(String::as_str)
            .ok_or(UsageError::OutOfRange {
                index,
                total: self.total(),
            })
    }

    /// 上一题；`None` 表示应退出到概览页
    pub fn previous_id(&self, index: usize) -> Option<&str> {
        if index >= self.total() {
            return None;
        }
        index
            .checked_sub(1)
            .and_then(|i| self.ordering.ids().get(i))
            .map(String::as_str)
    }

    /// 下一题；`None` 表示应提交并结束作答
    pub fn next_id(&self, index: usize) -> Option<&str> {
        index
            .checked_add(1)
            .and_then(|i| self.ordering.ids().get(i))
            .map(String::as_str)
    }

    pub fn position(&self, index: usize) -> Result<Position, UsageError> {
        self.current_question_id(index)?;
        Ok(Position {
            index,
            total: self.total(),
        })
    }

    pub fn index_of(&self, question_id: &str) -> Option<usize> {
        self.ordering.ids().iter().position(|id| id == question_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator(ids: &[&str]) -> QuestionNavigator {
        QuestionNavigator::new(
            SectionOrdering::new(ids.iter().map(|s| s.to_string()).collect()).unwrap(),
        )
    }

    #[test]
    fn test_current_question_id_is_stable_in_range() {
        let nav = navigator(&["q1", "q2", "q3"]);
        for index in 0..nav.total() {
            let first = nav.current_question_id(index).unwrap().to_string();
            assert_eq!(nav.current_question_id(index).unwrap(), first);
        }
        assert_eq!(
            nav.current_question_id(3),
            Err(UsageError::OutOfRange { index: 3, total: 3 })
        );
    }

    #[test]
    fn test_bounds_return_none() {
        for ids in [&["only"][..], &["a", "b"][..], &["a", "b", "c", "d"][..]] {
            let nav = navigator(ids);
            assert_eq!(nav.previous_id(0), None);
            assert_eq!(nav.next_id(nav.total() - 1), None);
        }
    }

    #[test]
    fn test_previous_and_next_in_middle() {
        let nav = navigator(&["q1", "q2", "q3"]);
        assert_eq!(nav.previous_id(1), Some("q1"));
        assert_eq!(nav.next_id(1), Some("q3"));
        assert_eq!(nav.previous_id(7), None);
        assert_eq!(nav.next_id(7), None);
    }

    #[test]
    fn test_position_display() {
        let nav = navigator(&["q1", "q2", "q3"]);
        let pos = nav.position(1).unwrap();
        assert_eq!(pos.to_string(), "2/3");
        assert!(!pos.is_first());
        assert!(nav.position(2).unwrap().is_last());
        assert_eq!(nav.index_of("q3"), Some(2));
        assert_eq!(nav.index_of("missing"), None);
    }
}
