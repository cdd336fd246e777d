use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 试卷定义 TOML 文件路径
    pub test_definition_path: String,
    /// 本次作答 ID
    pub attempt_id: String,
    /// 已用时间持久化目录
    pub state_dir: String,
    /// 提交结果输出目录
    pub submission_dir: String,
    /// 语音题准备倒计时（秒）
    pub voice_prep_seconds: u64,
    /// 计时器节拍间隔（毫秒）
    pub tick_period_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 日志过滤规则
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            test_definition_path: "assessment.toml".to_string(),
            attempt_id: "local-attempt".to_string(),
            state_dir: "session_state".to_string(),
            submission_dir: "submissions".to_string(),
            voice_prep_seconds: 45,
            tick_period_ms: 1000,
            verbose_logging: false,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            test_definition_path: std::env::var("TEST_DEFINITION_PATH").unwrap_or(default.test_definition_path),
            attempt_id: std::env::var("ATTEMPT_ID").unwrap_or(default.attempt_id),
            state_dir: std::env::var("STATE_DIR").unwrap_or(default.state_dir),
            submission_dir: std::env::var("SUBMISSION_DIR").unwrap_or(default.submission_dir),
            voice_prep_seconds: std::env::var("VOICE_PREP_SECONDS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.voice_prep_seconds),
            tick_period_ms: std::env::var("TICK_PERIOD_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.tick_period_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            rust_log: std::env::var("RUST_LOG").unwrap_or(default.rust_log),
        }
    }

    /// 计时器节拍间隔
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }
}
