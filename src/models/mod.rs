pub mod doi;
pub mod loaders;
pub mod provider;
pub mod result;

pub use doi::{normalize, Doi};
pub use loaders::{load_input_file, InputRow, InputSet};
pub use provider::Provider;
pub use result::{ArtifactPaths, ResolutionInfo, VerificationResult};
