pub mod config;
pub mod error;
pub mod orchestrator;
pub mod storage;
pub mod util;

pub use config::{ListerConfig, ProviderKind};
pub use error::StorageError;
pub use orchestrator::{BackendReport, Orchestrator};
pub use storage::{FileContent, ObjectPage, RetrievalOptions, StorageProvider};
