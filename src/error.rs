use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（试卷定义、时间预算），在 begin() 时致命
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 使用错误（表现层传入了非法参数），只记录日志，不展示给考生
    #[error("使用错误: {0}")]
    Usage(#[from] UsageError),
    /// 计时持久化错误，可恢复
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 提交协作方错误
    #[error("提交错误: {0}")]
    Submission(#[from] SubmissionError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 会话任务异常退出
    #[error("会话任务异常退出: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl AppError {
    /// 是否属于表现层的编程错误
    pub fn is_usage(&self) -> bool {
        matches!(self, AppError::Usage(_))
    }
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 时间预算必须大于 0
    #[error("无效的时间预算: {total_seconds} 秒")]
    InvalidBudget { total_seconds: u64 },
    /// 题目顺序为空
    #[error("题目顺序为空")]
    EmptyOrdering,
    /// 题目在顺序中重复出现
    #[error("题目 {id} 在顺序中重复出现")]
    DuplicateQuestion { id: String },
    /// 顺序中引用了试卷中不存在的题目
    #[error("题目 {id} 不存在于试卷定义中")]
    UnknownQuestion { id: String },
    /// 试卷定义结构不合法
    #[error("试卷定义不合法 ({id}): {reason}")]
    MalformedDefinition { id: String, reason: String },
    /// 作答已经提交或放弃，不能再次开始
    #[error("作答 {attempt_id} 已结束 ({ending})，不能重新开始")]
    AttemptClosed { attempt_id: String, ending: String },
}

/// 使用错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// 索引超出范围
    #[error("索引 {index} 超出范围 [0, {total})")]
    OutOfRange { index: usize, total: usize },
    /// 选项不在题目的选项列表中
    #[error("选项 '{option}' 不属于题目 {question_id}")]
    InvalidOption { question_id: String, option: String },
    /// 题目不在本次作答的顺序中
    #[error("题目 {id} 不在本次作答中")]
    UnknownQuestion { id: String },
    /// 会话不处于作答中
    #[error("会话状态为 {status}，无法执行该操作")]
    SessionNotActive { status: String },
    /// 当前题目不是语音题
    #[error("题目 {id} 不是语音题")]
    NotVoiceQuestion { id: String },
    /// 语音状态机不允许该转换
    #[error("语音状态 {from} 不允许操作 {action}")]
    IllegalVoiceTransition { from: String, action: String },
    /// 单向作答模式下禁止回看
    #[error("单向作答模式下不能从第 {from} 题回到第 {to} 题")]
    RevisitForbidden { from: usize, to: usize },
}

/// 计时持久化错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 作答 ID 不能用作存储键
    #[error("非法的作答 ID: {attempt_id}")]
    InvalidAttemptId { attempt_id: String },
    /// 存储不可用
    #[error("存储不可用 ({path}): {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 存储内容损坏
    #[error("存储内容无法解析 ({path}): {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 提交错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 非法的作答 ID
    #[error("非法的作答 ID: {attempt_id}")]
    InvalidAttemptId { attempt_id: String },
    /// 写入失败
    #[error("提交写入失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("提交序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 协作方拒绝
    #[error("提交被拒绝: {reason}")]
    Rejected { reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl UsageError {
    /// 创建非法语音转换错误
    pub fn illegal_voice(from: impl Into<String>, action: impl Into<String>) -> Self {
        UsageError::IllegalVoiceTransition {
            from: from.into(),
            action: action.into(),
        }
    }
}

impl ConfigError {
    /// 创建试卷定义不合法错误
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::MalformedDefinition {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
