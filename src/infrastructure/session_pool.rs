//! 会话池 - 基础设施层
//!
//! 池中会话数量等于 worker 数量，同一时刻一个会话只属于一个 worker。
//! 取出会话同时就是拿到并发许可，因此池本身也限制了在途请求数。

use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::HttpError;
use crate::infrastructure::http_client::{ResilientClient, SessionSettings};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("session pool is closed")]
    Closed,
    #[error("session pool has no idle session")]
    Empty,
}

/// 固定大小的会话池
#[derive(Debug)]
pub struct SessionPool {
    permits: Arc<Semaphore>,
    sessions: Mutex<Vec<ResilientClient>>,
    size: usize,
}

impl SessionPool {
    /// 创建 `size` 个独立会话
    pub fn new(size: usize, settings: &SessionSettings) -> Result<Arc<Self>, HttpError> {
        let size = size.max(1);
        let sessions = (0..size)
            .map(|_| ResilientClient::new(settings))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Arc::new(Self {
            permits: Arc::new(Semaphore::new(size)),
            sessions: Mutex::new(sessions),
            size,
        }))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 等待并取出一个空闲会话，guard 释放时自动归还
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledSession, PoolError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        let session = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .ok_or(PoolError::Empty)?;

        Ok(PooledSession {
            session: Some(session),
            pool: Arc::clone(self),
            _permit: permit,
        })
    }

    fn release(&self, session: ResilientClient) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session);
    }
}

/// 借出的会话
pub struct PooledSession {
    session: Option<ResilientClient>,
    pool: Arc<SessionPool>,
    // Drop 中先归还会话，字段析构时才释放许可
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledSession {
    type Target = ResilientClient;

    fn deref(&self) -> &Self::Target {
        self.session
            .as_ref()
            .expect("session is only taken in Drop")
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::time::Duration;

    fn pool(size: usize) -> Arc<SessionPool> {
        SessionPool::new(size, &SessionSettings::from_config(&Config::default())).unwrap()
    }

    #[test]
    fn size_is_at_least_one() {
        assert_eq!(pool(0).size(), 1);
        assert_eq!(pool(4).size(), 4);
    }

    #[tokio::test]
    async fn sessions_are_returned_on_drop() {
        let pool = pool(2);
        {
            let _a = pool.acquire().await.unwrap();
            let _b = pool.acquire().await.unwrap();
            assert_eq!(pool.sessions.lock().unwrap().len(), 0);
        }
        assert_eq!(pool.sessions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn acquire_waits_when_all_sessions_are_busy() {
        let pool = pool(1);
        let held = pool.acquire().await.unwrap();

        let waiting = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(waiting.is_err(), "second acquire should block while the only session is held");

        drop(held);
        assert!(pool.acquire().await.is_ok());
    }
}
