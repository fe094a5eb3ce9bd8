//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值。
//! 优先级从低到高：默认值、配置文件、`.env` 与环境变量、命令行参数。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub source_lang: String,
    pub target_lang: String,
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    // 批次配置
    pub batch_size: usize,
    pub batch_delay_secs: u64,

    // 重试配置
    pub max_retry_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,

    // 网络配置
    pub request_timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,

            batch_size: constants::DEFAULT_BATCH_SIZE,
            batch_delay_secs: constants::DEFAULT_BATCH_DELAY.as_secs(),

            max_retry_attempts: constants::DEFAULT_MAX_RETRY_ATTEMPTS,
            retry_base_delay_ms: constants::DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: constants::DEFAULT_RETRY_MAX_DELAY_MS,

            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl TranslationConfig {
    /// 创建带指定语言的默认配置
    pub fn default_with_lang(target_lang: &str, api_url: Option<&str>) -> Self {
        let mut config = Self::default();
        config.target_lang = target_lang.to_string();
        if let Some(url) = api_url {
            config.api_url = url.to_string();
        }
        config
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.batch_size == 0 {
            return Err(TranslationError::ConfigError("批次大小不能为0".to_string()));
        }

        if self.max_retry_attempts == 0 {
            return Err(TranslationError::ConfigError("最大尝试次数不能为0".to_string()));
        }

        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(TranslationError::ConfigError(
                "重试基础延迟不能大于最大延迟".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时不能为0".to_string()));
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(TranslationError::ConfigError(format!(
                "API URL 必须以 http:// 或 https:// 开头: {}",
                self.api_url
            )));
        }

        if self.target_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("目标语言不能为空".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖（使用类型安全环境变量系统）
    ///
    /// 只有显式设置的变量才会覆盖；格式错误的变量记录警告后忽略。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{translation, EnvVar};

        macro_rules! apply {
            ($var:ty, $apply:expr) => {
                match <$var>::get_set() {
                    Some(Ok(value)) => $apply(value),
                    Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
                    None => {}
                }
            };
        }

        apply!(translation::SourceLang, |v| self.source_lang = v);
        apply!(translation::TargetLang, |v| self.target_lang = v);
        apply!(translation::ApiUrl, |v: String| {
            tracing::info!("环境变量覆盖 API URL: {}", v);
            self.api_url = v;
        });
        apply!(translation::ApiKey, |v| self.api_key = Some(v));
        apply!(translation::BatchSize, |v| self.batch_size = v);
        apply!(translation::BatchDelay, |v: Duration| {
            self.batch_delay_secs = v.as_secs()
        });
        apply!(translation::MaxRetryAttempts, |v| self.max_retry_attempts = v);
        apply!(translation::RequestTimeout, |v: Duration| {
            self.request_timeout_secs = v.as_secs()
        });
    }

    /// 转换为Duration类型
    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs(self.batch_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器（自动搜索配置文件）
    pub fn new() -> TranslationResult<Self> {
        Self::build(Self::load_config()?)
    }

    /// 从指定配置文件创建配置管理器
    pub fn from_file<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
        Self::build(Self::load_from_file(&expanded)?)
    }

    fn build(mut config: TranslationConfig) -> TranslationResult<Self> {
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 取出配置
    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 创建简单配置
    pub fn create_simple_config(&self, target_lang: &str, api_url: Option<&str>) -> TranslationConfig {
        let mut config = self.config.clone();
        config.target_lang = target_lang.to_string();
        if let Some(url) = api_url {
            config.api_url = url.to_string();
        }
        config
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<TranslationConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        // 查找配置文件
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
