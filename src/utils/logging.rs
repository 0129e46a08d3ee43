use anyhow::Result;
/// 日志工具模块
///
/// 提供订阅器初始化、运行日志文件和格式化输出的辅助函数
use std::fs;
use tracing::info;

use crate::error::AppError;
use crate::models::run::RunSummary;

/// 初始化日志订阅器
///
/// 默认 info 级别，可通过 RUST_LOG 覆盖
pub fn init() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// 初始化运行日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n自动投递运行日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .map_err(|e| AppError::write_failed(log_file_path, e))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(keywords: &str, location: &str, mode: &str, submission_cap: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 职位自动投递");
    info!("🔍 关键词: {} | 地点: {}", keywords, location);
    info!("🎛️ 运行模式: {} | 投递上限: {}", mode, submission_cap);
    info!("{}", "=".repeat(60));
}

/// 记录发现阶段完成信息
pub fn log_jobs_found(total: usize, cap: usize) {
    info!("✓ 发现 {} 个职位 (上限 {})", total, cap);
    info!("💡 逐个处理，单页面串行\n");
}

/// 记录单个职位处理开始
pub fn log_job_start(index: usize, total: usize, title: &str, company: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📋 职位 {}/{}: {} @ {}", index, total, truncate_text(title, 40), truncate_text(company, 24));
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// 不论运行如何结束都要输出，中途打断也报告部分进度
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行汇总");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🔍 发现: {}", summary.jobs_found);
    info!("✅ 已提交: {}", summary.submitted);
    info!("⏭️ 已跳过: {}", summary.skipped);
    info!("❌ 失败: {}", summary.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
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
        assert_eq!(truncate_text("a very long job title", 6), "a very...");
    }
}
