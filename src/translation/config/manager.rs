//! 配置管理器
//!
//! 配置按以下顺序叠加：内置默认值 → 配置文件 → `.env` 文件 → 环境变量

use std::path::Path;
use std::time::Duration;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译管理器配置
///
/// 所有调度、重试和HTML处理参数都可调，时间类字段以毫秒存储，
/// 通过同名的 `Duration` 访问器读取。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub api_url: String,
    pub target_lang: String,

    // 调度配置
    pub debounce_delay_ms: u64,
    /// 0 表示不限制（每个新请求都会重新计时）
    pub max_flush_wait_ms: u64,
    pub max_concurrent_requests: usize,
    pub chunk_delay_ms: u64,

    // 重试配置
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    pub request_timeout_ms: u64,

    // HTML片段配置
    pub short_content_threshold: usize,
    pub skip_elements: Vec<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),

            debounce_delay_ms: constants::DEFAULT_DEBOUNCE_DELAY.as_millis() as u64,
            max_flush_wait_ms: constants::DEFAULT_MAX_FLUSH_WAIT.as_millis() as u64,
            max_concurrent_requests: constants::DEFAULT_MAX_CONCURRENT_REQUESTS,
            chunk_delay_ms: constants::DEFAULT_CHUNK_DELAY.as_millis() as u64,

            max_retries: constants::DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: constants::DEFAULT_RETRY_BASE_DELAY.as_millis() as u64,
            request_timeout_ms: constants::DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,

            short_content_threshold: constants::DEFAULT_SHORT_CONTENT_THRESHOLD,
            skip_elements: constants::SKIP_ELEMENTS
                .iter()
                .map(|name| name.to_string())
                .collect(),
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
        if self.max_concurrent_requests == 0 {
            return Err(TranslationError::ConfigError("最大并发数不能为0".to_string()));
        }

        if self.request_timeout_ms == 0 {
            return Err(TranslationError::ConfigError("请求超时不能为0".to_string()));
        }

        if self.target_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("目标语言不能为空".to_string()));
        }

        let url = url::Url::parse(&self.api_url).map_err(|e| {
            TranslationError::ConfigError(format!("API URL无效 '{}': {}", self.api_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TranslationError::ConfigError(format!(
                "API URL必须使用http或https: {}",
                self.api_url
            )));
        }

        Ok(())
    }

    /// 应用环境变量覆盖（使用类型安全环境变量系统）
    ///
    /// 只有显式设置的变量才会覆盖，格式错误的值会被记录并忽略。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{translation, EnvVar};

        fn apply<T>(name: &str, value: Option<Result<T, crate::env::EnvError>>, slot: &mut T) {
            match value {
                Some(Ok(value)) => *slot = value,
                Some(Err(e)) => tracing::warn!("忽略无效的环境变量 {}: {}", name, e),
                None => {}
            }
        }

        apply(
            translation::ApiUrl::NAME,
            translation::ApiUrl::get_if_set(),
            &mut self.api_url,
        );
        apply(
            translation::TargetLang::NAME,
            translation::TargetLang::get_if_set(),
            &mut self.target_lang,
        );
        apply(
            translation::MaxConcurrentRequests::NAME,
            translation::MaxConcurrentRequests::get_if_set(),
            &mut self.max_concurrent_requests,
        );
        apply(
            translation::MaxRetries::NAME,
            translation::MaxRetries::get_if_set(),
            &mut self.max_retries,
        );
        apply(
            translation::ShortContentThreshold::NAME,
            translation::ShortContentThreshold::get_if_set(),
            &mut self.short_content_threshold,
        );

        let millis_overrides = [
            (
                translation::DebounceDelay::NAME,
                translation::DebounceDelay::get_if_set(),
                &mut self.debounce_delay_ms,
            ),
            (
                translation::MaxFlushWait::NAME,
                translation::MaxFlushWait::get_if_set(),
                &mut self.max_flush_wait_ms,
            ),
            (
                translation::ChunkDelay::NAME,
                translation::ChunkDelay::get_if_set(),
                &mut self.chunk_delay_ms,
            ),
            (
                translation::RetryBaseDelay::NAME,
                translation::RetryBaseDelay::get_if_set(),
                &mut self.retry_base_delay_ms,
            ),
            (
                translation::RequestTimeout::NAME,
                translation::RequestTimeout::get_if_set(),
                &mut self.request_timeout_ms,
            ),
        ];
        for (name, value, slot) in millis_overrides {
            let mut millis = Duration::from_millis(*slot);
            apply(name, value, &mut millis);
            *slot = millis.as_millis() as u64;
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// `None` 表示不限制刷新等待时间
    pub fn max_flush_wait(&self) -> Option<Duration> {
        (self.max_flush_wait_ms > 0).then(|| Duration::from_millis(self.max_flush_wait_ms))
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
    config_path: Option<String>,
}

impl ConfigManager {
    /// 从默认搜索路径、`.env` 和环境变量创建配置管理器
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();

        let config_path = Self::find_config_file();
        let mut config = Self::load_config(config_path.as_deref())?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// 从指定文件创建配置管理器（环境变量仍然生效）
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();

        let expanded = shellexpand::tilde(path).to_string();
        if !Path::new(&expanded).exists() {
            return Err(TranslationError::ConfigError(format!(
                "配置文件不存在: {}",
                expanded
            )));
        }

        let mut config = Self::load_config(Some(&expanded))?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self {
            config,
            config_path: Some(expanded),
        })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 实际加载的配置文件路径
    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    /// 以当前配置为基础，覆盖目标语言和API地址
    pub fn create_simple_config(&self, target_lang: &str, api_url: Option<&str>) -> TranslationConfig {
        let mut config = self.config.clone();
        config.target_lang = target_lang.to_string();
        if let Some(url) = api_url {
            config.api_url = url.to_string();
        }
        config
    }

    fn find_config_file() -> Option<String> {
        constants::CONFIG_PATHS.iter().find_map(|path| {
            let expanded = shellexpand::tilde(path);
            Path::new(expanded.as_ref())
                .exists()
                .then(|| expanded.to_string())
        })
    }

    /// 默认值与配置文件合并
    fn load_config(path: Option<&str>) -> TranslationResult<TranslationConfig> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&TranslationConfig::default())
                .map_err(|e| TranslationError::ConfigError(format!("默认配置错误: {}", e)))?,
        );

        match path {
            Some(path) => {
                tracing::info!("加载配置文件: {}", path);
                builder = builder.add_source(File::with_name(path));
            }
            None => tracing::info!("未找到配置文件，使用默认配置"),
        }

        let config = builder
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("构建配置失败: {}", e)))?;

        config
            .try_deserialize()
            .map_err(|e| TranslationError::ConfigError(format!("反序列化配置失败: {}", e)))
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() {
                match dotenv::from_filename(env_file) {
                    Ok(_) => {
                        tracing::info!("已加载环境变量文件: {}", env_file);
                        break;
                    }
                    Err(e) => tracing::warn!("无法加载环境变量文件 {}: {}", env_file, e),
                }
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
