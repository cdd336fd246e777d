//! # Assessment Session
//!
//! 一个限时在线测评的作答会话引擎
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（节拍租约、持久化），只暴露能力
//! - `TickSource` - 周期节拍的租用与释放（`TokioTickSource` / `VirtualClock`）
//! - `ElapsedStore` - 已用时间的直写缓存
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuestionNavigator` - 顺序导航
//! - `AnswerStore` - 作答存储
//! - `CountdownTimer` - 倒计时
//! - `Submitter` / `CaptureDevice` - 外部协作方
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道语音题"的完整流程
//! - `AttemptCtx` - 上下文封装（attempt_id + question_index）
//! - `VoiceResponse` - 授权 → 准备 → 录音 → 停止
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session_controller` - 一次作答的状态和操作
//! - `orchestrator/session_runner` - 命令与节拍的事件循环
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{load_test_definition, AttemptId, Question, TestDefinition, VoiceState};
pub use orchestrator::{
    SessionCommand, SessionController, SessionDeps, SessionHandle, SessionOutcome, SessionRunner,
    SessionSnapshot, SessionStatus,
};
pub use workflow::{AttemptCtx, VoiceResponse};
