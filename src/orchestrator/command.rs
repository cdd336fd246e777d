//! 会话命令
//!
//! 表现层发给会话的操作，支持从一行文本解析：
//!
//! | 文本 | 操作 |
//! |------|------|
//! | `next` / `prev` | 下一题 / 上一题 |
//! | `goto <题目ID>` | 跳转 |
//! | `pick <选项>` | 选择选项 |
//! | `text <内容>` | 写入文本 |
//! | `consent` / `dismiss` / `accept` | 授权弹窗 |
//! | `now` / `stop` | 开始 / 停止录音 |
//! | `quit` | 关闭页面（会话挂起） |

use std::str::FromStr;

use thiserror::Error;

use crate::error::AppResult;

use super::session_controller::SessionController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Next,
    Prev,
    GoTo(String),
    Pick(String),
    Text(String),
    RequestConsent,
    Dismiss,
    Accept,
    BeginNow,
    Stop,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("空命令")]
    Empty,

    #[error("未知命令: {0}")]
    Unknown(String),

    #[error("命令 {command} 缺少参数")]
    MissingArgument { command: String },
}

impl FromStr for SessionCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let argument = |command: &str| {
            if rest.is_empty() {
                Err(CommandParseError::MissingArgument {
                    command: command.to_string(),
                })
            } else {
                Ok(rest.to_string())
            }
        };

        match head.to_ascii_lowercase().as_str() {
            "" => Err(CommandParseError::Empty),
            "next" | "n" => Ok(SessionCommand::Next),
            "prev" | "p" => Ok(SessionCommand::Prev),
            "goto" | "g" => argument("goto").map(SessionCommand::GoTo),
            "pick" => argument("pick").map(SessionCommand::Pick),
            // 允许写入空文本以清空作答
            "text" => Ok(SessionCommand::Text(rest.to_string())),
            "consent" => Ok(SessionCommand::RequestConsent),
            "dismiss" => Ok(SessionCommand::Dismiss),
            "accept" => Ok(SessionCommand::Accept),
            "now" => Ok(SessionCommand::BeginNow),
            "stop" => Ok(SessionCommand::Stop),
            "quit" | "q" => Ok(SessionCommand::Quit),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

impl SessionCommand {
    /// 在会话上执行命令；`Quit` 由运行器处理，这里只挂起会话
    pub fn apply(&self, controller: &mut SessionController) -> AppResult<()> {
        match self {
            SessionCommand::Next => controller.advance().map(|_| ()),
            SessionCommand::Prev => controller.retreat().map(|_| ()),
            SessionCommand::GoTo(id) => controller.go_to(id).map(|_| ()),
            SessionCommand::Pick(option) => controller.select_option(option),
            SessionCommand::Text(text) => controller.write_text(text),
            SessionCommand::RequestConsent => controller.request_consent(),
            SessionCommand::Dismiss => controller.dismiss_consent(),
            SessionCommand::Accept => controller.accept_consent(),
            SessionCommand::BeginNow => controller.begin_recording(),
            SessionCommand::Stop => controller.stop_recording(),
            SessionCommand::Quit => {
                controller.suspend();
                Ok(())
            }
        }
    }
}
