//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<InputRow>)
//!     ↓
//! workflow::VerifyFlow (处理单个 DOI)
//!     ↓
//! services (能力层：registry / resolution / artifacts / report)
//!     ↓
//! infrastructure (基础设施：RateLimiter / SessionPool)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有会话池和报告写入器
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;
pub mod progress;

pub use batch_processor::App;
pub use progress::Progress;
