//! 日志初始化
//!
//! 整个栈内部使用 `tracing` 打点；依赖里偶有用 `log` 宏的 crate，
//! 通过 tracing-log 桥接统一收口。过滤级别从 `RUST_LOG` 读取，
//! 缺省 `info`。

use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器（幂等）
///
/// 重复调用是安全的：已经装过订阅器时静默返回。
pub fn init_logging() {
    init_logging_with("info");
}

/// 以给定的缺省过滤表达式初始化日志（`RUST_LOG` 优先）
pub fn init_logging_with(default_filter: &str) {
    // log → tracing 桥；重复安装返回 Err，忽略即可
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
