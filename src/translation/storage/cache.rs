//! 翻译缓存模块
//!
//! 进程内的译文缓存，键为 `目标语言:原文`。条目没有过期和驱逐，
//! 只能通过 [`TranslationCache::clear`] 整体清空。

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

// ============================================================================
// 核心类型
// ============================================================================

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
}

/// 翻译缓存
#[derive(Default)]
pub struct TranslationCache {
    /// 缓存键 -> 译文
    entries: RwLock<HashMap<String, String>>,
    stats: RwLock<CacheStats>,
}

/// 生成缓存键
pub fn cache_key(content: &str, target_lang: &str) -> String {
    format!("{}:{}", target_lang, content)
}

// ============================================================================
// 实现
// ============================================================================

impl TranslationCache {
    /// 创建新的翻译缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取缓存条目，同时记录命中统计
    pub fn get(&self, key: &str) -> Option<String> {
        let value = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();

        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        stats.total_requests += 1;
        if value.is_some() {
            stats.cache_hits += 1;
        } else {
            stats.cache_misses += 1;
        }

        value
    }

    /// 不计入统计的查询
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// 插入缓存条目（已存在时替换）
    pub fn set(&self, key: String, translated: String) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, translated);
    }

    /// 按 (原文, 语言, 译文) 批量写入
    pub fn preload<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = (String, String, String)>,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut loaded = 0;

        for (content, lang, translated) in items {
            entries.insert(cache_key(&content, &lang), translated);
            loaded += 1;
        }

        loaded
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// 获取缓存大小
    pub fn size(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 检查是否包含指定键
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> CacheStats {
        let mut result = self
            .stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        result.total_entries = self.size();
        result
    }

    /// 重置统计信息
    pub fn reset_stats(&self) {
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
    }
}

impl CacheStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }

    /// 计算缓存未命中率
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }

    /// 重置统计信息
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
