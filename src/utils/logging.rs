/// 日志工具模块
///
/// 初始化 tracing（控制台 + 每次运行的日志文件），并提供各阶段的日志输出函数
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::services::RunSummary;

/// 初始化日志
///
/// # 参数
/// - `log_file_path`: 日志文件路径（追加写入）
/// - `verbose`: 是否输出 debug 级别
///
/// `RUST_LOG` 环境变量优先于 `verbose`。
pub fn init(log_file_path: &Path, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法创建日志文件: {}", log_file_path.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_thread_names(true),
        )
        .try_init()
        .context("日志系统已经初始化")?;

    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 DOI 校验启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "📊 并发数: {} | 保存 JSON: {} | 保存 XML: {} | 解析检查: {}",
        config.workers(),
        config.save_json,
        config.save_xml,
        config.check_resolution
    );
    info!(
        "🚦 限流: DataCite {}次/{}s, Crossref {}次/{}s",
        config.datacite_rate_limit.calls,
        config.datacite_rate_limit.period_seconds,
        config.crossref_rate_limit.calls,
        config.crossref_rate_limit.period_seconds
    );
    if let Some(provider) = config.provider {
        info!("🏷️ 默认提供方: {}", provider);
    }
    info!("{}", "=".repeat(60));
}

/// 记录输入加载信息
pub fn log_input_loaded(total: usize, workers: usize, batch_size: usize) {
    info!("✓ 找到 {} 个待校验的 DOI", total);
    if workers > 1 {
        info!("📋 将以每批 {} 个、{} 个并发的方式处理", batch_size, workers);
    } else {
        info!("📋 将按顺序逐个处理");
    }
}

/// 记录批次开始信息
pub fn log_batch_start(batch_num: usize, total_batches: usize, start: usize, end: usize, total: usize) {
    info!("{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批 DOI: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, success: usize, total: usize) {
    info!("{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 存在 {}/{}", batch_num, success, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, config: &Config) {
    info!("{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 总数: {}", summary.total);
    info!("✅ 存在: {}", summary.successful);
    info!("❌ 失败: {}", summary.failed);
    if let (Some(ok), Some(failed)) = (summary.resolution_successful, summary.resolution_failed) {
        info!("🔗 解析成功: {}", ok);
        info!("⛓️ 解析失败: {}", failed);
    }
    info!("{}", "=".repeat(60));
    info!("报告已保存至: {}", config.report_path().display());
    info!("日志已保存至: {}", config.log_path().display());
}
