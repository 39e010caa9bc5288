//! HTML 翻译处理器
//!
//! 短于阈值的内容被当作纯文本整体翻译。其余内容解析为片段树，
//! 逐个文本节点翻译后再序列化。片段只经过分词，源码中的每一个标签都原样输出，
//! 只有文本内容会改变。

use std::collections::{HashMap, HashSet};

use futures::future::join_all;

use crate::parsers::html::{collect_texts, html_to_fragment, rewrite_texts, serialize_fragment};
use crate::translation::config::TranslationConfig;
use crate::translation::core::TranslationService;
use crate::translation::error::helpers::log_error;

/// HTML 翻译处理器
#[derive(Debug, Clone)]
pub struct HtmlProcessor {
    short_content_threshold: usize,
    skip_elements: Vec<String>,
}

impl HtmlProcessor {
    pub fn new(short_content_threshold: usize, skip_elements: Vec<String>) -> Self {
        Self {
            short_content_threshold,
            skip_elements,
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(config.short_content_threshold, config.skip_elements.clone())
    }

    /// 是否走整体翻译路径（按字符数计算）
    pub fn is_short(&self, content: &str) -> bool {
        content.chars().count() < self.short_content_threshold
    }

    /// 翻译 HTML 内容，失败的部分保留原文
    pub async fn process(&self, service: &TranslationService, content: &str, lang: &str) -> String {
        if self.is_short(content) {
            return service.translate(content, lang).await;
        }

        let mut fragment = html_to_fragment(content);

        let texts = collect_texts(&fragment, &self.skip_elements);
        if texts.is_empty() {
            return content.to_string();
        }

        // 同一片段内相同的文本只请求一次
        let mut seen = HashSet::new();
        let unique: Vec<&str> = texts
            .iter()
            .map(String::as_str)
            .filter(|text| seen.insert(*text))
            .collect();

        tracing::debug!(
            "HTML片段: {} 个文本节点, {} 个不同文本",
            texts.len(),
            unique.len()
        );

        let translated = join_all(unique.iter().map(|text| service.translate(text, lang))).await;
        let translations: HashMap<&str, String> = unique.into_iter().zip(translated).collect();

        rewrite_texts(&mut fragment, &self.skip_elements, &mut |text| {
            translations.get(text).cloned()
        });

        match serialize_fragment(&fragment) {
            Ok(html) => html,
            Err(e) => {
                log_error(&e);
                content.to_string()
            }
        }
    }
}
