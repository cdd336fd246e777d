use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 作答方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modality {
    /// 单选题
    MultipleChoice,
    /// 长文本题
    LongAnswer,
    /// 短文本题
    ShortAnswer,
    /// 语音题
    Voice,
    /// 模拟操作题
    Simulation,
}

impl Modality {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Modality::MultipleChoice => "multiple-choice",
            Modality::LongAnswer => "long-answer",
            Modality::ShortAnswer => "short-answer",
            Modality::Voice => "voice",
            Modality::Simulation => "simulation",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 题目（作答期间不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub skill: String,
    pub modality: Modality,
    pub time_budget_minutes: u32,
    #[serde(default)]
    pub description: String,
    /// 仅单选题有选项
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Question {
    /// 选项是否属于本题
    pub fn has_option(&self, option: &str) -> bool {
        self.options
            .as_deref()
            .is_some_and(|options| options.iter().any(|o| o == option))
    }

    pub fn is_voice(&self) -> bool {
        self.modality == Modality::Voice
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::malformed(&self.title, "题目 ID 为空"));
        }

        match (self.modality, self.options.as_deref()) {
            (Modality::MultipleChoice, None) | (Modality::MultipleChoice, Some([])) => Err(
                ConfigError::malformed(&self.id, "单选题必须至少包含一个选项"),
            ),
            (Modality::MultipleChoice, Some(options)) => {
                let mut seen = HashSet::new();
                match options.iter().find(|o| !seen.insert(o.as_str())) {
                    Some(dup) => Err(ConfigError::malformed(
                        &self.id,
                        format!("选项 '{}' 重复", dup),
                    )),
                    None => Ok(()),
                }
            }
            (modality, Some(_)) => Err(ConfigError::malformed(
                &self.id,
                format!("{} 题不应包含选项", modality),
            )),
            (_, None) => Ok(()),
        }
    }
}

/// 试卷分区
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// 试卷定义（由试卷提供方给出）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: String,
    pub title: String,
    /// 整场作答的总时长（分钟）
    pub budget_minutes: u32,
    /// 是否允许回看已经离开的题目
    #[serde(default = "default_allow_revisit")]
    pub allow_revisit: bool,
    #[serde(default)]
    pub sections: Vec<Section>,
}

fn default_allow_revisit() -> bool {
    true
}

impl TestDefinition {
    /// 按"分区 → 题目"顺序遍历所有题目
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    pub fn question_count(&self) -> usize {
        self.questions().count()
    }

    /// 校验试卷结构
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget_minutes == 0 {
            return Err(ConfigError::InvalidBudget { total_seconds: 0 });
        }
        for question in self.questions() {
            question.validate()?;
        }
        // 顺序本身也会检查空和重复
        self.ordering().map(|_| ())
    }

    /// 展开为本次作答的题目顺序
    pub fn ordering(&self) -> Result<SectionOrdering, ConfigError> {
        SectionOrdering::new(self.questions().map(|q| q.id.clone()).collect())
    }

    /// 以题目 ID 为键的题目表
    pub fn catalog(&self) -> HashMap<String, Question> {
        self.questions()
            .map(|q| (q.id.clone(), q.clone()))
            .collect()
    }
}

/// 题目顺序：作答期间稳定，且不包含重复 ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOrdering {
    ids: Vec<String>,
}

impl SectionOrdering {
    pub fn new(ids: Vec<String>) -> Result<Self, ConfigError> {
        if ids.is_empty() {
            return Err(ConfigError::EmptyOrdering);
        }

        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(ConfigError::DuplicateQuestion { id: dup.clone() });
        }

        Ok(Self { ids })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 构造时已保证非空，这里只为满足 clippy
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// 作答 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(String);

impl AttemptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttemptId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
