use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 瀏覽器代幣列表中的一筆新交易對
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub name: String,
    pub contract_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Safe,
    PossibleScam,
    Unavailable(String),
}

impl Verdict {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Verdict::Unavailable(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Verdict::Safe => "Safe",
            Verdict::PossibleScam => "Possible Scam",
            Verdict::Unavailable(reason) => reason,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Safe => write!(f, "✅ Safe"),
            Verdict::PossibleScam => write!(f, "⚠️ Possible Scam"),
            Verdict::Unavailable(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub contract_address: String,
    pub verdict: Verdict,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(contract_address: &str, verdict: Verdict, ttl: chrono::Duration) -> Self {
        Self {
            contract_address: contract_address.to_string(),
            verdict,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// 兩把 API 金鑰；空字串視為未設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub explorer_api_key: String,
    #[serde(default)]
    pub llm_api_key: String,
}

impl Credentials {
    pub fn new(explorer_api_key: impl Into<String>, llm_api_key: impl Into<String>) -> Self {
        Self {
            explorer_api_key: explorer_api_key.into(),
            llm_api_key: llm_api_key.into(),
        }
    }

    pub fn explorer_key(&self) -> Option<&str> {
        non_blank(&self.explorer_api_key)
    }

    pub fn llm_key(&self) -> Option<&str> {
        non_blank(&self.llm_api_key)
    }

    /// Keys missing here are taken from `fallback`.
    pub fn merged_with(&self, fallback: &Credentials) -> Credentials {
        Credentials {
            explorer_api_key: self
                .explorer_key()
                .or(fallback.explorer_key())
                .unwrap_or_default()
                .to_string(),
            llm_api_key: self
                .llm_key()
                .or(fallback.llm_key())
                .unwrap_or_default()
                .to_string(),
        }
    }

    pub fn masked(&self) -> (String, String) {
        (mask(self.explorer_key()), mask(self.llm_key()))
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn mask(key: Option<&str>) -> String {
    match key {
        None => "(not set)".to_string(),
        Some(k) if k.chars().count() <= 8 => "****".to_string(),
        Some(k) => {
            let skip = k.chars().count() - 4;
            format!("****{}", k.chars().skip(skip).collect::<String>())
        }
    }
}

/// 顯示用的一列結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub name: String,
    pub contract_address: String,
    pub verdict: Verdict,
}
