pub mod doi_ctx;
pub mod verify_flow;

pub use doi_ctx::DoiCtx;
pub use verify_flow::VerifyFlow;
