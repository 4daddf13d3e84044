use crate::domain::model::{Credentials, Verdict};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 以合約地址為 key 的判定快取；過期的項目必須回傳 `None`
#[async_trait]
pub trait VerdictCache: Send + Sync {
    async fn get(&self, contract_address: &str) -> Result<Option<Verdict>>;
    async fn set(&self, contract_address: &str, verdict: &Verdict, ttl: chrono::Duration)
        -> Result<()>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_credentials(&self) -> Result<Credentials>;
    async fn set_credentials(&self, credentials: &Credentials) -> Result<()>;
}
