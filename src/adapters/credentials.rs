use crate::adapters::storage::read_if_exists;
use crate::domain::model::Credentials;
use crate::domain::ports::{CredentialStore, Storage};
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use std::sync::RwLock;

pub const CREDENTIALS_FILE: &str = "credentials.toml";

#[derive(Debug, Default)]
pub struct MemoryCredentials {
    inner: RwLock<Credentials>,
}

impl MemoryCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn get_credentials(&self) -> Result<Credentials> {
        self.inner
            .read()
            .map(|creds| creds.clone())
            .map_err(|_| ScanError::ConfigError {
                message: "credential store lock poisoned".to_string(),
            })
    }

    async fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| ScanError::ConfigError {
            message: "credential store lock poisoned".to_string(),
        })?;
        *guard = credentials.clone();
        Ok(())
    }
}

/// 將金鑰存成 TOML 檔，取代原本的設定頁面
pub struct FileCredentials<S: Storage> {
    storage: S,
}

impl<S: Storage> FileCredentials<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: Storage> CredentialStore for FileCredentials<S> {
    async fn get_credentials(&self) -> Result<Credentials> {
        let Some(bytes) = read_if_exists(&self.storage, CREDENTIALS_FILE).await? else {
            return Ok(Credentials::default());
        };

        let content = String::from_utf8_lossy(&bytes);
        toml::from_str(&content).map_err(|e| ScanError::TomlError {
            message: format!("{}: {}", CREDENTIALS_FILE, e),
        })
    }

    async fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        let content = toml::to_string(credentials).map_err(|e| ScanError::TomlError {
            message: e.to_string(),
        })?;
        self.storage
            .write_file(CREDENTIALS_FILE, content.as_bytes())
            .await?;
        tracing::info!("🔑 Credentials saved to {}", CREDENTIALS_FILE);
        Ok(())
    }
}
