//! 业务能力层：每个服务只处理单个 DOI 的一项能力，不关心流程顺序

pub mod artifact_store;
pub mod counters;
pub mod provider_detector;
pub mod registry;
pub mod report_writer;
pub mod resolution;

pub use artifact_store::ArtifactStore;
pub use counters::{RunCounters, RunSummary};
pub use provider_detector::ProviderDetector;
pub use registry::{ArtifactRequest, RegistryLookup, RegistryService};
pub use report_writer::ReportWriter;
pub use resolution::ResolutionChecker;
