/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::{info, warn};

use crate::config::Config;
use crate::models::PublishPayload;
use crate::workflow::RunOutcome;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动发布助手");
    info!("🌐 发布页: {}", config.upload_url);
    info!("⏱️ 轮询间隔: {}ms", config.poll_interval_ms);
    info!("{}", "=".repeat(60));
}

/// 记录待发布内容
pub fn log_payload(payload: &PublishPayload) {
    info!("📝 标题: {}", truncate_text(&payload.title, 40));
    info!("📄 正文: {}", truncate_text(&payload.description, 80));
    info!("🖼️ 文件: {} 个", payload.files.len());
    for file in &payload.files {
        info!("   - {} ({}, {} 字节)", file.name, file.mime_type, file.len());
    }
}

/// 打印运行结果
pub fn print_run_summary(outcome: &RunOutcome) {
    info!("\n{}", "=".repeat(60));
    info!("📊 发布流程结束");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    if outcome.is_success() {
        info!("✅ 结果: {}", outcome.phase);
    } else {
        warn!("❌ 结果: {}", outcome.phase);
    }
    info!(
        "🔁 轮询 {} 次, 耗时 {:.1}s",
        outcome.ticks,
        outcome.elapsed.as_secs_f64()
    );
    for followup in &outcome.manual_followups {
        warn!("👉 需要人工处理: {}", followup);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
