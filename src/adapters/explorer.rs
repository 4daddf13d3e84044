use crate::config::ExplorerConfig;
use crate::domain::model::{Credentials, Pair};
use crate::utils::error::{Result, ScanError};
use crate::utils::retry::{with_retry, RetryPolicy};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// 區塊鏈瀏覽器 API 客戶端（代幣列表 + 合約原始碼）
pub struct ExplorerClient {
    client: Client,
    base_url: String,
    max_pairs: usize,
    retry: RetryPolicy,
}

impl ExplorerClient {
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("contract-scanner/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            max_pairs: config.max_pairs,
            retry: RetryPolicy::new(config.retry_attempts, config.retry_delay_ms),
        })
    }

    /// 取得最新交易對；任何失敗都回傳空列表
    pub async fn fetch_new_pairs(&self, credentials: &Credentials) -> Vec<Pair> {
        match self.try_fetch_new_pairs(credentials).await {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::warn!("⚠️ Token list unavailable: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn try_fetch_new_pairs(&self, credentials: &Credentials) -> Result<Vec<Pair>> {
        let api_key = credentials
            .explorer_key()
            .ok_or_else(|| ScanError::missing("explorer_api_key"))?;

        tracing::debug!("Fetching token list from: {}", self.base_url);
        let query = [
            ("module", "token"),
            ("action", "tokenlist"),
            ("apikey", api_key),
        ];
        let body = with_retry(self.retry, "explorer tokenlist", || self.get(&query)).await?;

        let items = body.into_success_list()?;
        let total = items.len();

        let pairs: Vec<Pair> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<TokenRecord>(item) {
                Ok(record) => record.into_pair(),
                Err(e) => {
                    tracing::debug!("Skipping malformed token record: {}", e);
                    None
                }
            })
            .take(self.max_pairs)
            .collect();

        tracing::info!("🌐 Explorer returned {} tokens, keeping {}", total, pairs.len());
        Ok(pairs)
    }

    /// 取得合約原始碼；任何失敗都回傳空字串
    pub async fn fetch_source(&self, credentials: &Credentials, contract_address: &str) -> String {
        match self.try_fetch_source(credentials, contract_address).await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("⚠️ Source for {} unavailable: {}", contract_address, e);
                String::new()
            }
        }
    }

    pub async fn try_fetch_source(
        &self,
        credentials: &Credentials,
        contract_address: &str,
    ) -> Result<String> {
        let api_key = credentials
            .explorer_key()
            .ok_or_else(|| ScanError::missing("explorer_api_key"))?;

        let query = [
            ("module", "contract"),
            ("action", "getsourcecode"),
            ("address", contract_address),
            ("apikey", api_key),
        ];
        let body = with_retry(self.retry, "explorer getsourcecode", || self.get(&query)).await?;

        let first = body.into_success_list()?.into_iter().next();
        let source = first
            .and_then(|item| serde_json::from_value::<SourceRecord>(item).ok())
            .and_then(|record| record.source_code)
            .filter(|code| !code.is_empty());

        match source {
            Some(code) => {
                tracing::debug!("📄 Fetched {} bytes of source for {}", code.len(), contract_address);
                Ok(code)
            }
            None => Err(ScanError::DataUnavailable {
                message: format!("no verified source code for {}", contract_address),
            }),
        }
    }

    async fn get(&self, query: &[(&str, &str)]) -> Result<ExplorerResponse> {
        let response = self.client.get(&self.base_url).query(query).send().await?;
        tracing::debug!("Explorer response status: {}", response.status());

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ScanError::upstream(format!("unreadable explorer response: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    #[serde(default)]
    status: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: serde_json::Value,
}

impl ExplorerResponse {
    /// 瀏覽器以 status = "1" 表示成功
    fn is_success(&self) -> bool {
        match &self.status {
            Some(serde_json::Value::String(s)) => s == "1",
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(1),
            _ => false,
        }
    }

    fn into_success_list(self) -> Result<Vec<serde_json::Value>> {
        if !self.is_success() {
            let detail = match &self.result {
                serde_json::Value::String(s) => s.clone(),
                _ => String::new(),
            };
            return Err(ScanError::upstream(format!(
                "explorer status {:?}: {} {}",
                self.status,
                self.message.unwrap_or_default(),
                detail
            )));
        }

        match self.result {
            serde_json::Value::Array(items) => Ok(items),
            other => Err(ScanError::upstream(format!(
                "expected a result list, got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenRecord {
    #[serde(rename = "tokenName", default)]
    token_name: Option<String>,
    #[serde(rename = "contractAddress", default)]
    contract_address: Option<String>,
}

impl TokenRecord {
    fn into_pair(self) -> Option<Pair> {
        let name = self.token_name.filter(|n| !n.trim().is_empty())?;
        let contract_address = self.contract_address.filter(|a| !a.trim().is_empty())?;
        Some(Pair {
            name,
            contract_address,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SourceRecord {
    #[serde(rename = "SourceCode", default)]
    source_code: Option<String>,
}
