pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{
    ContractAnalyzer, ExplorerClient, FileCredentials, FileVerdictCache, LocalStorage,
    MemoryCredentials, MemoryVerdictCache,
};
pub use config::ScannerConfig;
pub use core::{evaluator::evaluate, scanner::Scanner};
pub use domain::model::{Credentials, Pair, ScanResult, Verdict};
pub use utils::error::{Result, ScanError};
