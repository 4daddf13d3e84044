use crate::adapters::model::sentinel_for;
use crate::adapters::{ContractAnalyzer, ExplorerClient};
use crate::config::ScannerConfig;
use crate::core::evaluator::evaluate;
use crate::domain::model::{Credentials, ScanResult, Verdict};
use crate::domain::ports::{CredentialStore, VerdictCache};
use crate::utils::error::Result;
use std::sync::Arc;

pub const SOURCE_UNAVAILABLE: &str = "Unable to fetch contract code.";

/// 掃描流程：代幣列表 → 快取 → 原始碼 → 模型分析 → 判定 → 寫回快取
pub struct Scanner {
    explorer: ExplorerClient,
    analyzer: ContractAnalyzer,
    cache: Arc<dyn VerdictCache>,
    credentials: Arc<dyn CredentialStore>,
    cache_ttl: chrono::Duration,
}

impl Scanner {
    pub fn new(
        explorer: ExplorerClient,
        analyzer: ContractAnalyzer,
        cache: Arc<dyn VerdictCache>,
        credentials: Arc<dyn CredentialStore>,
        cache_ttl: chrono::Duration,
    ) -> Self {
        Self {
            explorer,
            analyzer,
            cache,
            credentials,
            cache_ttl,
        }
    }

    pub fn from_config(
        config: &ScannerConfig,
        cache: Arc<dyn VerdictCache>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        Ok(Self::new(
            ExplorerClient::new(&config.explorer)?,
            ContractAnalyzer::new(&config.model)?,
            cache,
            credentials,
            config.cache.ttl(),
        ))
    }

    pub async fn get_credentials(&self) -> Result<Credentials> {
        self.credentials.get_credentials().await
    }

    pub async fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        self.credentials.set_credentials(credentials).await
    }

    /// 讀不到金鑰時視為未設定，後續步驟會回傳空結果
    async fn current_credentials(&self) -> Credentials {
        match self.credentials.get_credentials().await {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!("⚠️ Could not read credentials: {}", e);
                Credentials::default()
            }
        }
    }

    /// 每個交易對一列結果，順序與瀏覽器回傳的順序相同
    pub async fn get_results(&self) -> Vec<ScanResult> {
        let credentials = self.current_credentials().await;
        let pairs = self.explorer.fetch_new_pairs(&credentials).await;

        if pairs.is_empty() {
            tracing::info!("📭 No new pairs to analyze");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let verdict = self
                .analyze_contract_with(&credentials, &pair.contract_address)
                .await;
            tracing::info!("📊 {} ({}): {}", pair.name, pair.contract_address, verdict);

            results.push(ScanResult {
                name: pair.name,
                contract_address: pair.contract_address,
                verdict,
            });
        }

        results
    }

    pub async fn analyze_contract(&self, contract_address: &str) -> Verdict {
        let credentials = self.current_credentials().await;
        self.analyze_contract_with(&credentials, contract_address)
            .await
    }

    async fn analyze_contract_with(
        &self,
        credentials: &Credentials,
        contract_address: &str,
    ) -> Verdict {
        match self.cache.get(contract_address).await {
            Ok(Some(verdict)) => {
                tracing::debug!("💾 Cache hit for {}", contract_address);
                return verdict;
            }
            Ok(None) => tracing::debug!("Cache miss for {}", contract_address),
            Err(e) => tracing::warn!("⚠️ Cache read failed for {}: {}", contract_address, e),
        }

        // 取不到原始碼不寫入快取，之後瀏覽器索引完成還能重試
        let source = match self
            .explorer
            .try_fetch_source(credentials, contract_address)
            .await
        {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("⚠️ Source for {} unavailable: {}", contract_address, e);
                return Verdict::Unavailable(SOURCE_UNAVAILABLE.to_string());
            }
        };

        let analysis = match self.analyzer.try_analyze(credentials, &source).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("⚠️ Analysis for {} failed: {}", contract_address, e);
                return Verdict::Unavailable(sentinel_for(&e).to_string());
            }
        };

        let verdict = evaluate(&analysis);

        if let Err(e) = self
            .cache
            .set(contract_address, &verdict, self.cache_ttl)
            .await
        {
            tracing::warn!("⚠️ Cache write failed for {}: {}", contract_address, e);
        }

        verdict
    }
}
