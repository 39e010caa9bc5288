//! 翻译引擎：重试与超时控制
//!
//! 每一次后端调用都被包在硬超时里；任何失败（网络错误、超时、响应格式不符）
//! 都按线性退避重试，第 n 次重试前等待 `base_delay * (n + 1)`。

use std::sync::Arc;
use std::time::Duration;

use super::backend::TranslationBackend;
use super::service::ServiceStats;
use crate::translation::config::TranslationConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
            timeout: config.request_timeout(),
        }
    }

    /// 第 `attempt` 次失败后的等待时间（从0开始计数）
    pub fn backoff(&self, attempt: usize) -> Duration {
        self.base_delay.saturating_mul(attempt as u32 + 1)
    }
}

/// 翻译引擎
pub struct TranslationEngine {
    backend: Arc<dyn TranslationBackend>,
    policy: RetryPolicy,
    stats: Arc<ServiceStats>,
}

impl TranslationEngine {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        policy: RetryPolicy,
        stats: Arc<ServiceStats>,
    ) -> Self {
        Self {
            backend,
            policy,
            stats,
        }
    }

    /// 带重试的翻译
    ///
    /// 最多尝试 `max_retries + 1` 次，全部失败时返回最后一次的错误。
    pub async fn translate_with_retry(&self, content: &str, lang: &str) -> TranslationResult<String> {
        let mut attempt = 0;

        loop {
            match self.translate_with_timeout(content, lang).await {
                Ok(translated) => return Ok(translated),
                Err(e) if attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        "翻译失败，{}ms 后进行第 {} 次重试: {}",
                        delay.as_millis(),
                        attempt + 1,
                        e
                    );
                    self.stats.inc_retries();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.with_context(format!("共尝试 {} 次", attempt + 1)));
                }
            }
        }
    }

    /// 带超时的单次后端调用
    ///
    /// 超时后后端 future 会被丢弃，底层 HTTP 请求随之中止。
    pub async fn translate_with_timeout(&self, content: &str, lang: &str) -> TranslationResult<String> {
        self.stats.inc_backend_calls();
        tracing::debug!(
            "调用翻译后端 {}: {} 个字符 -> {}",
            self.backend.name(),
            content.chars().count(),
            lang
        );

        match tokio::time::timeout(self.policy.timeout, self.backend.translate(content, lang)).await {
            Ok(result) => result,
            Err(_) => {
                self.stats.inc_timeouts();
                Err(TranslationError::TimeoutError(format!(
                    "后端调用超过 {}ms",
                    self.policy.timeout.as_millis()
                )))
            }
        }
    }
}
