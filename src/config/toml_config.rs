use crate::domain::model::Credentials;
use crate::utils::error::{Result, ScanError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "contract-scanner.toml";
pub const EXPLORER_KEY_ENV: &str = "SCANNER_EXPLORER_API_KEY";
pub const MODEL_KEY_ENV: &str = "SCANNER_MODEL_API_KEY";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a smart contract security auditor. Analyze the following smart contract code for known exploits and high-risk issues.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub explorer: ExplorerConfig,
    pub model: ModelConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub scan: ScanConfig,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub max_pairs: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bscscan.com/api".to_string(),
            timeout_seconds: 30,
            retry_attempts: 0,
            retry_delay_ms: 500,
            max_pairs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub max_source_chars: usize,
    pub system_prompt: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4".to_string(),
            max_tokens: 500,
            temperature: 0.2,
            timeout_seconds: 60,
            retry_attempts: 0,
            retry_delay_ms: 500,
            max_source_chars: 48_000,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// "memory" 或 "file"
    pub backend: String,
    pub ttl_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            ttl_hours: 12,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: ".contract-scanner".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub interval_seconds: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
        }
    }
}

impl ScannerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScanError::TomlError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 指定路徑優先；否則嘗試預設檔名，不存在就用預設值
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// 替換環境變數 (例如 ${API_KEY})；未定義的變數換成空字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScanError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        });

        Ok(result.to_string())
    }

    fn apply_env_overrides(&mut self) {
        let from_env = Credentials::new(
            std::env::var(EXPLORER_KEY_ENV).unwrap_or_default(),
            std::env::var(MODEL_KEY_ENV).unwrap_or_default(),
        );
        self.credentials = self.credentials.merged_with(&from_env);
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("explorer.base_url", &self.explorer.base_url)?;
        validation::validate_positive_number("explorer.max_pairs", self.explorer.max_pairs, 1)?;

        validation::validate_url("model.endpoint", &self.model.endpoint)?;
        validation::validate_positive_number("model.max_tokens", self.model.max_tokens as usize, 1)?;
        validation::validate_range("model.temperature", self.model.temperature, 0.0, 2.0)?;
        validation::validate_positive_number(
            "model.max_source_chars",
            self.model.max_source_chars,
            1,
        )?;

        validation::validate_one_of("cache.backend", &self.cache.backend, &["memory", "file"])?;
        validation::validate_range("cache.ttl_hours", self.cache.ttl_hours, 1, 24 * 30)?;

        Ok(())
    }
}

impl Validate for ScannerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
