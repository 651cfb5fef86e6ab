//! 运行计数器
//!
//! 整个运行只有一个实例，所有计数在同一把锁内修改，worker 全部结束后再读取。

use std::sync::{Mutex, PoisonError};

use crate::models::VerificationResult;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    successful: usize,
    failed: usize,
    resolution_successful: usize,
    resolution_failed: usize,
}

#[derive(Debug, Default)]
pub struct RunCounters {
    counts: Mutex<Counts>,
}

/// 运行结束后的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// 未启用解析检查时为 `None`
    pub resolution_successful: Option<usize>,
    pub resolution_failed: Option<usize>,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按报告中的一行计数：存在性一次，有解析结果时再计解析
    pub fn record(&self, result: &VerificationResult) {
        self.record_existence(result.exists());
        if let Some(resolution) = result.resolution() {
            self.record_resolution(resolution.resolves);
        }
    }

    pub fn record_existence(&self, exists: bool) {
        let mut counts = self.lock();
        if exists {
            counts.successful += 1;
        } else {
            counts.failed += 1;
        }
    }

    pub fn record_resolution(&self, resolves: bool) {
        let mut counts = self.lock();
        if resolves {
            counts.resolution_successful += 1;
        } else {
            counts.resolution_failed += 1;
        }
    }

    pub fn summary(&self, total: usize, include_resolution: bool) -> RunSummary {
        let counts = *self.lock();
        RunSummary {
            total,
            successful: counts.successful,
            failed: counts.failed,
            resolution_successful: include_resolution.then_some(counts.resolution_successful),
            resolution_failed: include_resolution.then_some(counts.resolution_failed),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counts> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counts_from_many_threads() {
        let counters = Arc::new(RunCounters::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let counters = counters.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        counters.record_existence((i + t) % 2 == 0);
                        counters.record_resolution(true);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let summary = counters.summary(400, true);
        assert_eq!(summary.successful + summary.failed, 400);
        assert_eq!(summary.successful, 200);
        assert_eq!(summary.resolution_successful, Some(400));
    }

    #[test]
    fn resolution_counts_hidden_when_disabled() {
        let counters = RunCounters::new();
        counters.record_existence(true);
        let summary = counters.summary(1, false);
        assert_eq!(summary.resolution_successful, None);
        assert_eq!(summary.resolution_failed, None);
    }

    #[test]
    fn records_one_row_once() {
        use crate::models::{Provider, ResolutionInfo};

        let counters = RunCounters::new();
        counters.record(&VerificationResult::checked("10.1234/a", Provider::Datacite, 200));
        counters.record(
            &VerificationResult::checked("10.1234/b", Provider::Datacite, 404).with_resolution(
                ResolutionInfo {
                    resolves: false,
                    ..Default::default()
                },
            ),
        );
        counters.record(&VerificationResult::failed("bad", None, "Verification error: x"));

        let summary = counters.summary(3, true);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.resolution_successful, Some(0));
        assert_eq!(summary.resolution_failed, Some(1));
    }
}
