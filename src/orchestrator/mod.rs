//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层持有一次作答的全部状态，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `session_controller` - 会话控制器
//! - 开始作答、恢复计时
//! - 导航、作答写入、语音题操作
//! - 时间到自动提交，最后一题完成提交
//! - 输出会话快照
//!
//! ### `session_runner` - 会话运行器
//! - 在 tokio 任务里驱动控制器
//! - 汇合命令和节拍两个事件来源
//! - 通过 watch 通道发布快照
//!
//! ### `command` - 会话命令
//! - 表现层操作的枚举及文本解析
//!
//! ## 层次关系
//!
//! ```text
//! session_runner (事件循环)
//!     ↓
//! session_controller (一次作答)
//!     ↓
//! workflow::VoiceResponse (一道语音题)
//!     ↓
//! services (能力层：navigation / answer_store / countdown / submission / capture)
//!     ↓
//! infrastructure (基础设施：TickSource / ElapsedStore)
//! ```
//!
//! ## 设计原则
//!
//! 1. **唯一写入方**：表现层只发命令、读快照
//! 2. **租约随会话结束释放**：提交、退出、挂起都会停止所有计时
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod command;
pub mod session_controller;
pub mod session_runner;

// 重新导出主要类型
pub use command::{CommandParseError, SessionCommand};
pub use session_controller::{
    DraftBuffer, NavOutcome, SessionController, SessionDeps, SessionSnapshot, SessionStatus,
};
pub use session_runner::{SessionHandle, SessionOutcome, SessionRunner};
