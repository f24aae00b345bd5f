/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::capture::CaptureSummary;

/// 初始化日志
///
/// `RUST_LOG` 优先；未设置时默认 `info`，详细模式下为 `debug`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `url`: 目标页面
/// - `output`: 输出文件路径
/// - `max_slides`: 最大抓取数量
pub fn log_startup(url: &str, output: &Path, max_slides: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 轮播图片导出");
    info!("🌐 目标页面: {}", url);
    info!("📄 输出文件: {}", output.display());
    info!("📊 最大幻灯片数: {}", max_slides);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 抓取统计
/// - `output`: 生成的文档（未生成时为 None）
pub fn print_final_stats(summary: &CaptureSummary, output: Option<&Path>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🖼️ 幻灯片: {}", summary.slides);
    info!("🔁 重复图片: {}", summary.duplicates);
    if summary.reached_ceiling {
        warn!("⚠️ 已达到最大幻灯片数，轮播可能未结束");
    }
    match output {
        Some(path) => info!("✅ 文档已保存至: {}", path.display()),
        None => warn!("❌ 未生成文档"),
    }
    info!("{}", "=".repeat(60));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("data:image/png;base64,AAAA", 10), "data:image...");
        assert_eq!(truncate_text("幻灯片图片", 3), "幻灯片...");
    }
}
