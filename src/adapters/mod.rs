// Adapters layer: concrete implementations for external systems (explorer, model service, storage, cache).

pub mod cache;
pub mod credentials;
pub mod explorer;
pub mod model;
pub mod storage;

pub use cache::{FileVerdictCache, MemoryVerdictCache};
pub use credentials::{FileCredentials, MemoryCredentials};
pub use explorer::ExplorerClient;
pub use model::ContractAnalyzer;
pub use storage::LocalStorage;
