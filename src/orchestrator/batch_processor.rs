//! 批量 DOI 处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量 DOI 的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建输出目录、加载并校验输入、创建报告和会话池
//! 2. **并发控制**：会话池大小即并发数，取出会话就是拿到许可
//! 3. **分批处理**：每批提交 `batch_size` 个任务，按完成顺序写入报告
//! 4. **顺序模式**：只有 1 个 worker 时逐个处理，两次请求之间固定间隔
//! 5. **全局统计**：汇总所有 DOI 的处理结果
//!
//! 单个 DOI 的任何失败（包括 panic）都会变成报告中的一行，不会中断整个运行。

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{RateLimiters, SessionPool, SessionSettings};
use crate::models::{load_input_file, InputRow, VerificationResult};
use crate::orchestrator::progress::Progress;
use crate::services::{ArtifactStore, ReportWriter, RunCounters, RunSummary};
use crate::utils::logging;
use crate::workflow::{DoiCtx, VerifyFlow};

const PROGRESS_LOG_EVERY: usize = 100;

/// 应用主结构
pub struct App {
    config: Config,
    rows: Vec<InputRow>,
    flow: Arc<VerifyFlow>,
    pool: Arc<SessionPool>,
    report: Arc<ReportWriter>,
    counters: Arc<RunCounters>,
}

impl App {
    /// 初始化应用
    ///
    /// 这里的任何错误都发生在第一个网络请求之前，直接终止运行。
    pub fn initialize(config: Config, input_file: &Path) -> AppResult<Self> {
        config.validate()?;
        logging::log_startup(&config);

        std::fs::create_dir_all(&config.output_dir)
            .map_err(|e| AppError::io(config.output_dir.display().to_string(), e))?;

        let input = load_input_file(input_file, config.provider, config.auto_detect_provider)?;
        let artifacts = ArtifactStore::prepare(&config)?;
        let report = Arc::new(ReportWriter::create(
            &config.report_path(),
            config.check_resolution,
        )?);
        let pool = SessionPool::new(config.workers(), &SessionSettings::from_config(&config))?;

        let limiters = Arc::new(RateLimiters::from_config(&config));
        let counters = Arc::new(RunCounters::new());
        let flow = Arc::new(VerifyFlow::new(&config, limiters, artifacts));

        Ok(Self {
            config,
            rows: input.rows,
            flow,
            pool,
            report,
            counters,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunSummary> {
        let total = self.rows.len();
        if total == 0 {
            warn!("⚠️ 输入文件中没有待校验的 DOI，程序结束");
        } else {
            logging::log_input_loaded(total, self.pool.size(), self.config.batch_size);

            let progress = Progress::new(total, PROGRESS_LOG_EVERY);
            if self.config.workers() > 1 {
                self.process_concurrent(&progress).await?;
            } else {
                self.process_sequential(&progress).await?;
            }
        }

        let summary = self.counters.summary(total, self.config.check_resolution);
        logging::print_final_stats(&summary, &self.config);
        Ok(summary)
    }

    /// 顺序模式：一次一个，两次之间固定间隔
    async fn process_sequential(&self, progress: &Progress) -> AppResult<()> {
        let delay = Duration::from_millis(self.config.sequential_delay_ms);

        for (idx, row) in self.rows.iter().enumerate() {
            let ctx = DoiCtx::from(row);
            let result = verify_one(self.flow.clone(), self.pool.clone(), ctx).await;
            self.finish_row(&result)?;
            progress.advance();

            if idx + 1 < self.rows.len() && !delay.is_zero() {
                sleep(delay).await;
            }
        }
        Ok(())
    }

    /// 并发模式：分批提交，按完成顺序写入报告
    async fn process_concurrent(&self, progress: &Progress) -> AppResult<()> {
        let batch_size = self.config.batch_size;
        let total = self.rows.len();
        let total_batches = total.div_ceil(batch_size);

        for (batch_idx, batch) in self.rows.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            logging::log_batch_start(
                batch_idx + 1,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total,
            );

            let batch_result = self.process_batch(batch, progress).await?;
            logging::log_batch_complete(batch_idx + 1, batch_result.success, batch_result.total());
        }
        Ok(())
    }

    /// 处理单个批次
    async fn process_batch(&self, batch: &[InputRow], progress: &Progress) -> AppResult<BatchResult> {
        let mut in_flight = FuturesUnordered::new();

        // 为本批创建并发任务；会话池限制同时在途的数量
        for row in batch {
            let ctx = DoiCtx::from(row);
            let handle = tokio::spawn(verify_one(self.flow.clone(), self.pool.clone(), ctx.clone()));
            in_flight.push(async move { (ctx, handle.await) });
        }

        // 按完成顺序收集结果
        let mut result = BatchResult::default();
        while let Some((ctx, joined)) = in_flight.next().await {
            let verification = match joined {
                Ok(verification) => verification,
                Err(e) => {
                    error!("{} 任务执行失败: {}", ctx, e);
                    VerificationResult::failed(
                        ctx.raw.trim(),
                        ctx.provider,
                        format!("Verification error: task failed: {}", e),
                    )
                }
            };

            result.record(&verification);
            self.finish_row(&verification)?;
            progress.advance();
        }

        Ok(result)
    }

    /// 每行只在这里计数并写入报告
    fn finish_row(&self, result: &VerificationResult) -> AppResult<()> {
        self.counters.record(result);
        self.report.write(result)?;
        Ok(())
    }
}

/// 取出会话并执行单个 DOI 的流程；panic 也转换为失败结果
async fn verify_one(flow: Arc<VerifyFlow>, pool: Arc<SessionPool>, ctx: DoiCtx) -> VerificationResult {
    let session = match pool.acquire().await {
        Ok(session) => session,
        Err(e) => {
            error!("{} ❌ 无法获取 HTTP 会话: {}", ctx, e);
            return VerificationResult::failed(
                ctx.raw.trim(),
                ctx.provider,
                format!("Verification error: {}", e),
            );
        }
    };

    catch_panic(&ctx, flow.run(&session, &ctx)).await
}

/// panic 转换为失败结果，不计数
async fn catch_panic<F>(ctx: &DoiCtx, verification: F) -> VerificationResult
where
    F: Future<Output = VerificationResult>,
{
    match AssertUnwindSafe(verification).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("{} ❌ 处理过程中发生异常: {}", ctx, reason);
            VerificationResult::failed(
                ctx.raw.trim(),
                ctx.provider,
                format!("Verification error: {}", reason),
            )
        }
    }
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}

impl BatchResult {
    fn record(&mut self, result: &VerificationResult) {
        if result.exists() {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }

    fn total(&self) -> usize {
        self.success + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    #[tokio::test]
    async fn panic_becomes_a_single_failed_row() {
        let counters = RunCounters::new();
        let ctx = DoiCtx::new(3, " 10.1234/boom ", Some(Provider::Crossref));

        let result = catch_panic(&ctx, async {
            // 流程中途 panic
            if ctx.row == 3 {
                panic!("boom");
            }
            VerificationResult::checked("10.1234/boom", Provider::Crossref, 200)
        })
        .await;
        counters.record(&result);

        assert_eq!(result.identifier(), "10.1234/boom");
        assert_eq!(result.http_status(), -1);
        assert_eq!(result.error_message(), "Verification error: boom");

        let summary = counters.summary(1, false);
        assert_eq!(summary.successful, 0);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn completed_row_passes_through() {
        let ctx = DoiCtx::new(1, "10.1234/ok", Some(Provider::Datacite));
        let result = catch_panic(&ctx, async {
            VerificationResult::checked("10.1234/ok", Provider::Datacite, 200)
        })
        .await;
        assert!(result.exists());
    }
}
