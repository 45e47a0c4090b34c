/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 订阅器
///
/// 默认级别为 info，`verbose` 时为 debug；设置了 `RUST_LOG` 时以它为准。
/// 重复调用不会报错
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n测试编写日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量测试编写模式");
    info!("🌐 远端: {}", if config.dry_run { "内存（演练）" } else { config.api_base_url.as_str() });
    info!("💾 草稿目录: {}", config.draft_dir);
    info!("📊 最大并发社区数: {}", config.max_concurrent_communities);
    info!("{}", "=".repeat(60));
}

/// 记录测试定义加载信息
///
/// # 参数
/// - `total`: 测试总数
/// - `groups`: 社区分组数
/// - `max_concurrent`: 最大并发数
pub fn log_tests_loaded(total: usize, groups: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 份待处理的测试，分属 {} 个社区", total, groups);
    info!("📋 最多同时处理 {} 个社区", max_concurrent);
    info!("💡 同一社区内的测试依次处理\n");
}

/// 记录社区分组开始信息
pub fn log_group_start(group_num: usize, total_groups: usize, community_id: &str, tests: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 个社区: {}", group_num, total_groups, community_id);
    info!("📄 本社区测试数: {}", tests);
    info!("{}", "=".repeat(60));
}

/// 记录社区分组完成信息
pub fn log_group_complete(community_id: &str, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 社区 {} 完成: 成功 {}/{}", community_id, success, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
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
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("两数相加", 2), "两数...");
        assert_eq!(truncate_text("add", 10), "add");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
