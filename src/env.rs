//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量管理，所有变量以 `TRANSLATION_MANAGER_` 为前缀

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量被显式设置时返回值，未设置时返回 `None`
    fn get_if_set() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "TRANSLATION_MANAGER_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "TRANSLATION_MANAGER_TARGET_LANG";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("vi".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Default target language (e.g. vi, en, zh, pt-br)";

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim().to_lowercase();
            let valid = !lang.is_empty()
                && lang.len() <= 8
                && lang.chars().all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_');
            if !valid {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Language code must be 1-8 ASCII letters, '-' or '_'".to_string(),
                });
            }
            Ok(lang)
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "TRANSLATION_MANAGER_API_URL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("http://localhost:1188/translate".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Translation API endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 防抖延迟
    pub struct DebounceDelay;
    impl EnvVar<Duration> for DebounceDelay {
        const NAME: &'static str = "TRANSLATION_MANAGER_DEBOUNCE_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(50));
        const DESCRIPTION: &'static str = "Debounce delay before a queued batch is flushed (ms)";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 10_000)
        }
    }

    /// 最长刷新等待
    pub struct MaxFlushWait;
    impl EnvVar<Duration> for MaxFlushWait {
        const NAME: &'static str = "TRANSLATION_MANAGER_MAX_FLUSH_WAIT_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(500));
        const DESCRIPTION: &'static str =
            "Upper bound on how long the oldest queued request waits for a flush (ms, 0 = unbounded)";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 60_000)
        }
    }

    /// 最大并发请求数
    pub struct MaxConcurrentRequests;
    impl EnvVar<usize> for MaxConcurrentRequests {
        const NAME: &'static str = "TRANSLATION_MANAGER_MAX_CONCURRENT_REQUESTS";
        const DEFAULT: Option<usize> = Some(3);
        const DESCRIPTION: &'static str = "Requests dispatched concurrently per chunk";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100)
        }
    }

    /// 批次间隔
    pub struct ChunkDelay;
    impl EnvVar<Duration> for ChunkDelay {
        const NAME: &'static str = "TRANSLATION_MANAGER_CHUNK_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(50));
        const DESCRIPTION: &'static str = "Pause between consecutive chunks of one flush (ms)";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 10_000)
        }
    }

    /// 最大重试次数
    pub struct MaxRetries;
    impl EnvVar<usize> for MaxRetries {
        const NAME: &'static str = "TRANSLATION_MANAGER_MAX_RETRIES";
        const DEFAULT: Option<usize> = Some(2);
        const DESCRIPTION: &'static str = "Retries after the first failed attempt";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 0, 10)
        }
    }

    /// 重试基础延迟
    pub struct RetryBaseDelay;
    impl EnvVar<Duration> for RetryBaseDelay {
        const NAME: &'static str = "TRANSLATION_MANAGER_RETRY_BASE_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(500));
        const DESCRIPTION: &'static str = "Backoff unit; attempt n waits base * (n + 1) (ms)";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 60_000)
        }
    }

    /// 单次请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "TRANSLATION_MANAGER_TIMEOUT_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(10_000));
        const DESCRIPTION: &'static str = "Hard timeout for a single backend call (ms)";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 1, 300_000)
        }
    }

    /// 短内容阈值
    pub struct ShortContentThreshold;
    impl EnvVar<usize> for ShortContentThreshold {
        const NAME: &'static str = "TRANSLATION_MANAGER_SHORT_CONTENT_THRESHOLD";
        const DEFAULT: Option<usize> = Some(100);
        const DESCRIPTION: &'static str =
            "HTML shorter than this many characters is translated as one whole string";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 0, 1_000_000)
        }
    }
}

/// 辅助函数
fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_millis(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<Duration> {
    let millis: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of milliseconds".to_string(),
    })?;

    if millis < min || millis > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {}ms is outside {}..={}ms", millis, min, max),
        });
    }

    Ok(Duration::from_millis(millis))
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"info\")\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));

    docs.push_str("\n## Translation Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"vi\")\n",
        translation::TargetLang::NAME,
        translation::TargetLang::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: \"http://localhost:1188/translate\")\n",
        translation::ApiUrl::NAME,
        translation::ApiUrl::DESCRIPTION
    ));

    let durations = [
        (
            translation::DebounceDelay::NAME,
            translation::DebounceDelay::DESCRIPTION,
            translation::DebounceDelay::DEFAULT,
        ),
        (
            translation::MaxFlushWait::NAME,
            translation::MaxFlushWait::DESCRIPTION,
            translation::MaxFlushWait::DEFAULT,
        ),
        (
            translation::ChunkDelay::NAME,
            translation::ChunkDelay::DESCRIPTION,
            translation::ChunkDelay::DEFAULT,
        ),
        (
            translation::RetryBaseDelay::NAME,
            translation::RetryBaseDelay::DESCRIPTION,
            translation::RetryBaseDelay::DEFAULT,
        ),
        (
            translation::RequestTimeout::NAME,
            translation::RequestTimeout::DESCRIPTION,
            translation::RequestTimeout::DEFAULT,
        ),
    ];
    for (name, description, default) in durations {
        docs.push_str(&format!(
            "- `{}`: {} (default: {})\n",
            name,
            description,
            default.map_or_else(|| "none".to_string(), |d| d.as_millis().to_string())
        ));
    }

    let counts = [
        (
            translation::MaxConcurrentRequests::NAME,
            translation::MaxConcurrentRequests::DESCRIPTION,
            translation::MaxConcurrentRequests::DEFAULT,
        ),
        (
            translation::MaxRetries::NAME,
            translation::MaxRetries::DESCRIPTION,
            translation::MaxRetries::DEFAULT,
        ),
        (
            translation::ShortContentThreshold::NAME,
            translation::ShortContentThreshold::DESCRIPTION,
            translation::ShortContentThreshold::DEFAULT,
        ),
    ];
    for (name, description, default) in counts {
        docs.push_str(&format!(
            "- `{}`: {} (default: {})\n",
            name,
            description,
            default.map_or_else(|| "none".to_string(), |d| d.to_string())
        ));
    }

    docs
}
