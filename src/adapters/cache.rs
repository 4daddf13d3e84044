use crate::adapters::storage::read_if_exists;
use crate::domain::model::{CacheEntry, Verdict};
use crate::domain::ports::{Storage, VerdictCache};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CACHE_FILE: &str = "verdicts.json";

#[derive(Debug, Clone, Default)]
pub struct MemoryVerdictCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl MemoryVerdictCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn contains(&self, contract_address: &str) -> bool {
        self.entries.lock().await.contains_key(contract_address)
    }

    /// 直接放入一筆項目（測試或預熱用）
    pub async fn insert_entry(&self, entry: CacheEntry) {
        self.entries
            .lock()
            .await
            .insert(entry.contract_address.clone(), entry);
    }
}

#[async_trait]
impl VerdictCache for MemoryVerdictCache {
    async fn get(&self, contract_address: &str) -> Result<Option<Verdict>> {
        let mut entries = self.entries.lock().await;

        match entries.get(contract_address) {
            Some(entry) if entry.is_expired() => {
                tracing::debug!("⌛ Cache entry for {} expired", contract_address);
                entries.remove(contract_address);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.verdict.clone())),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        contract_address: &str,
        verdict: &Verdict,
        ttl: chrono::Duration,
    ) -> Result<()> {
        let entry = CacheEntry::new(contract_address, verdict.clone(), ttl);
        let mut entries = self.entries.lock().await;

        entries.retain(|_, existing| !existing.is_expired());
        entries.insert(contract_address.to_string(), entry);
        Ok(())
    }
}

/// 以 JSON 檔保存的快取，跨程序執行仍有效
pub struct FileVerdictCache<S: Storage> {
    storage: S,
    lock: Mutex<()>,
}

impl<S: Storage> FileVerdictCache<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    /// 檔案損毀時當作空快取，下一次寫入會整個覆蓋
    async fn load(&self) -> Result<HashMap<String, CacheEntry>> {
        match read_if_exists(&self.storage, CACHE_FILE).await? {
            Some(bytes) if !bytes.is_empty() => match serde_json::from_slice(&bytes) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    tracing::warn!("⚠️ Discarding unreadable {}: {}", CACHE_FILE, e);
                    Ok(HashMap::new())
                }
            },
            _ => Ok(HashMap::new()),
        }
    }

    async fn save(&self, entries: &HashMap<String, CacheEntry>) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries)?;
        self.storage.write_file(CACHE_FILE, &json).await
    }
}

#[async_trait]
impl<S: Storage> VerdictCache for FileVerdictCache<S> {
    async fn get(&self, contract_address: &str) -> Result<Option<Verdict>> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;

        Ok(entries
            .get(contract_address)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.verdict.clone()))
    }

    async fn set(
        &self,
        contract_address: &str,
        verdict: &Verdict,
        ttl: chrono::Duration,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        if entries.len() < before {
            tracing::debug!("🧹 Pruned {} expired cache entries", before - entries.len());
        }

        entries.insert(
            contract_address.to_string(),
            CacheEntry::new(contract_address, verdict.clone(), ttl),
        );
        self.save(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = MemoryVerdictCache::new();

        assert_eq!(cache.get("0xabc").await.unwrap(), None);

        cache
            .set("0xabc", &Verdict::PossibleScam, chrono::Duration::hours(12))
            .await
            .unwrap();

        assert_eq!(
            cache.get("0xabc").await.unwrap(),
            Some(Verdict::PossibleScam)
        );
        assert_eq!(cache.get("0xdef").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_expired_entry_is_absent() {
        let cache = MemoryVerdictCache::new();
        cache
            .set("0xabc", &Verdict::Safe, chrono::Duration::zero())
            .await
            .unwrap();

        assert_eq!(cache.get("0xabc").await.unwrap(), None);
        assert!(!cache.contains("0xabc").await);
    }

    #[tokio::test]
    async fn test_memory_cache_overwrite_after_expiry() {
        let cache = MemoryVerdictCache::new();
        cache
            .set("0xabc", &Verdict::Safe, chrono::Duration::zero())
            .await
            .unwrap();
        cache
            .set("0xabc", &Verdict::PossibleScam, chrono::Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(
            cache.get("0xabc").await.unwrap(),
            Some(Verdict::PossibleScam)
        );
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_cache_prunes_expired_on_write() {
        let cache = MemoryVerdictCache::new();
        cache
            .set("0xold", &Verdict::Safe, chrono::Duration::zero())
            .await
            .unwrap();
        cache
            .set("0xnew", &Verdict::PossibleScam, chrono::Duration::hours(1))
            .await
            .unwrap();

        assert!(!cache.contains("0xold").await);
        assert!(cache.contains("0xnew").await);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_file_cache_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        let cache = FileVerdictCache::new(LocalStorage::new(temp_dir.path()));
        cache
            .set("0xabc", &Verdict::Safe, chrono::Duration::hours(12))
            .await
            .unwrap();

        let reopened = FileVerdictCache::new(LocalStorage::new(temp_dir.path()));
        assert_eq!(reopened.get("0xabc").await.unwrap(), Some(Verdict::Safe));
        assert!(temp_dir.path().join(CACHE_FILE).exists());
    }

    #[tokio::test]
    async fn test_file_cache_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileVerdictCache::new(LocalStorage::new(temp_dir.path()));

        assert_eq!(cache.get("0xabc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_cache_prunes_expired_on_write() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileVerdictCache::new(LocalStorage::new(temp_dir.path()));

        cache
            .set("0xold", &Verdict::Safe, chrono::Duration::zero())
            .await
            .unwrap();
        cache
            .set("0xnew", &Verdict::PossibleScam, chrono::Duration::hours(1))
            .await
            .unwrap();

        let raw = std::fs::read(temp_dir.path().join(CACHE_FILE)).unwrap();
        let stored: HashMap<String, CacheEntry> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored.contains_key("0xnew"));
    }

    #[tokio::test]
    async fn test_file_cache_recovers_from_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CACHE_FILE), br#"{"0xabc": {trunc"#).unwrap();
        let cache = FileVerdictCache::new(LocalStorage::new(temp_dir.path()));

        assert_eq!(cache.get("0xabc").await.unwrap(), None);

        cache
            .set("0xabc", &Verdict::PossibleScam, chrono::Duration::hours(12))
            .await
            .unwrap();

        assert_eq!(
            cache.get("0xabc").await.unwrap(),
            Some(Verdict::PossibleScam)
        );
        let raw = std::fs::read(temp_dir.path().join(CACHE_FILE)).unwrap();
        let stored: HashMap<String, CacheEntry> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(stored.len(), 1);
    }
}
