/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志
///
/// 过滤规则取自 `Config::rust_log`；开启 `verbose_logging` 时本 crate 输出 debug 级别
pub fn init(config: &Config) {
    let mut filter = EnvFilter::new(&config.rust_log);
    if config.verbose_logging {
        if let Ok(directive) = "assessment_session=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `title`: 试卷标题
/// - `attempt_id`: 作答 ID
/// - `question_count`: 题目总数
/// - `budget_minutes`: 总时长（分钟）
pub fn log_startup(title: &str, attempt_id: &str, question_count: usize, budget_minutes: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 作答开始 - {}", title);
    info!("🆔 作答 ID: {}", attempt_id);
    info!("📋 题目总数: {} | ⏱️ 总时长: {} 分钟", question_count, budget_minutes);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `status`: 会话最终状态
/// - `answered`: 已作答题目数
/// - `total`: 题目总数
/// - `elapsed_seconds`: 已用时间
pub fn print_final_stats(status: &str, answered: usize, total: usize, elapsed_seconds: u64) {
    info!("\n{}", "=".repeat(60));
    info!("📊 作答结束统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📌 最终状态: {}", status);
    info!("✅ 已作答: {}/{}", answered, total);
    info!("⏱️ 已用时间: {}", format_clock(elapsed_seconds));
    info!("{}", "=".repeat(60));
}

/// 将秒数格式化为 `mm:ss`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
