//! # DOI Verify
//!
//! 批量校验 DOI 是否在 DataCite / Crossref 注册，并可选地检查 doi.org 跳转
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（限流窗口、HTTP 会话），只暴露能力
//! - `RateLimiters` - 每个提供方一个滑动窗口限流器，所有 worker 共享
//! - `SessionPool` - 每个 worker 一个带重试的 HTTP 会话
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个 DOI
//! - `RegistryService` - DataCite / Crossref 存在性查询与附件获取
//! - `ResolutionChecker` - doi.org 跳转检查
//! - `ArtifactStore` / `ReportWriter` - 写附件、写报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个 DOI"的完整处理流程
//! - `DoiCtx` - 上下文封装（行号 + 原始输入）
//! - `VerifyFlow` - 流程编排（归一化 → 查询 → 附件 → 解析 → 计数）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理资源和并发
//!
//! ## 模块结构

pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use cli::Cli;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{normalize, Doi, Provider, VerificationResult};
pub use orchestrator::App;
pub use services::RunSummary;
pub use workflow::{DoiCtx, VerifyFlow};
