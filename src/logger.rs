//! 日志初始化

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化全局日志
///
/// 优先读取 `RUST_LOG`，否则默认 info 级别；`verbose` 为 true 时默认 debug。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("auto_publisher={},warn", default_level)));

    // 测试中可能被重复调用，忽略重复初始化的错误
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
