//! service-core: configuration, errors, observability and retry helpers
//! shared by the account tooling binaries.
pub mod config;
pub mod error;
pub mod observability;
pub mod retry;

pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
