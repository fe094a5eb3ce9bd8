//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次处理相关
    pub const DEFAULT_BATCH_SIZE: usize = 20;
    pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(10);

    // 重试相关
    pub const DEFAULT_MAX_RETRY_ATTEMPTS: usize = 5;
    pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 2000;
    pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 60_000;

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "http://localhost:1188/v2/translate";
    pub const DEFAULT_SOURCE_LANG: &str = "ja";
    pub const DEFAULT_TARGET_LANG: &str = "en";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    // 文档包读取限制
    pub const MAX_PART_BYTES: u64 = 256 * 1024 * 1024; // 256MiB
    pub const MAX_PACKAGE_BYTES: u64 = 512 * 1024 * 1024; // 512MiB

    // 工作表名称限制
    pub const MAX_SHEET_NAME_CHARS: usize = 31;
    pub const SHEET_NAME_FORBIDDEN: &[char] = &['\\', '/', '?', '*', '[', ']', ':'];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "xlsx-translator.toml",
        ".xlsx-translator.toml",
        "xlsx-translator.json",
        "~/.config/xlsx-translator/config.toml",
        "/etc/xlsx-translator/config.toml",
    ];
}

/// 加载配置，失败时回退到默认配置
pub fn load_translation_config(target_lang: &str, api_url: Option<&str>) -> TranslationConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.create_simple_config(target_lang, api_url),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            TranslationConfig::default_with_lang(target_lang, api_url)
        }
    }
}
