//! 翻译后端
//!
//! 后端是一个黑盒的网络服务：输入一段文本和目标语言，返回一段译文。
//! [`TranslationBackend`] 是调度层唯一依赖的接口，[`HttpBackend`] 是基于
//! reqwest 的默认实现。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译后端接口
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// 翻译单段文本
    async fn translate(&self, text: &str, target_lang: &str) -> TranslationResult<String>;

    /// 后端名称，用于日志
    fn name(&self) -> &'static str;
}

/// 请求体
#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    pub text: &'a str,
    pub target_lang: &'a str,
}

/// 响应体
#[derive(Debug, Deserialize)]
pub struct TranslateResponse {
    pub translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
pub struct TranslatedText {
    pub text: String,
}

impl TranslateResponse {
    /// 取第一条译文，数组为空视为格式错误
    pub fn into_first(self) -> TranslationResult<String> {
        self.translations
            .into_iter()
            .next()
            .map(|item| item.text)
            .ok_or_else(|| TranslationError::ParseError("响应中translations数组为空".to_string()))
    }
}

/// HTTP翻译后端
///
/// `POST {api_url}`，JSON 请求体 `{"text", "target_lang"}`，
/// 期望响应 `{"translations": [{"text"}]}`。
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
}

impl HttpBackend {
    pub fn new(api_url: impl Into<String>) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("translation-manager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self::with_client(client, api_url))
    }

    /// 使用已有的 reqwest 客户端
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl TranslationBackend for HttpBackend {
    async fn translate(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&TranslateRequest { text, target_lang })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::NetworkError(format!(
                "翻译API返回状态码 {}",
                status
            )));
        }

        let body = response.text().await?;
        let parsed: TranslateResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::ParseError(format!("响应格式不符: {}", e)))?;

        parsed.into_first()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
