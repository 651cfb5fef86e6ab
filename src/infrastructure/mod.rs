//! 基础设施层：持有稀缺的共享资源（限流窗口、HTTP 会话），只暴露能力

pub mod http_client;
pub mod rate_limiter;
pub mod session_pool;

pub use http_client::{ResilientClient, RetryPolicy, SessionSettings};
pub use rate_limiter::{RateLimiter, RateLimiters};
pub use session_pool::{PoolError, PooledSession, SessionPool};
