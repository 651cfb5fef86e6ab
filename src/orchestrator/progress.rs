use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

/// 单调递增的进度计数
#[derive(Debug)]
pub struct Progress {
    done: AtomicUsize,
    total: usize,
    log_every: usize,
}

impl Progress {
    pub fn new(total: usize, log_every: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            log_every: log_every.max(1),
        }
    }

    /// 完成一个，返回已完成数量
    pub fn advance(&self) -> usize {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.log_every == 0 || done == self.total {
            info!(
                "📈 进度: {}/{} ({:.1}%)",
                done,
                self.total,
                done as f64 * 100.0 / self.total.max(1) as f64
            );
        }
        done
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}
