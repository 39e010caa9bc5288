//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 调度相关
    pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(50);
    pub const DEFAULT_MAX_FLUSH_WAIT: Duration = Duration::from_millis(500);
    pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(50);
    pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 3;

    // 重试与超时
    pub const DEFAULT_MAX_RETRIES: usize = 2;
    pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

    // HTML片段处理
    pub const DEFAULT_SHORT_CONTENT_THRESHOLD: usize = 100;

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "http://localhost:1188/translate";
    pub const DEFAULT_TARGET_LANG: &str = "vi";

    // 不收集文本的元素
    pub const SKIP_ELEMENTS: &[&str] = &["script", "style"];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "translation-manager.toml",
        ".translation-manager.toml",
        "translation-manager.json",
        "~/.config/translation-manager/config.toml",
        "/etc/translation-manager/config.toml",
    ];
}

/// 加载翻译配置，失败时回退到默认配置
pub fn load_translation_config(target_lang: &str, api_url: Option<&str>) -> TranslationConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.create_simple_config(target_lang, api_url),
        Err(e) => {
            tracing::warn!("创建配置管理器失败，使用默认配置: {}", e);
            TranslationConfig::default_with_lang(target_lang, api_url)
        }
    }
}
