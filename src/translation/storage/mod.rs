//! 存储模块
//!
//! 提供进程内的翻译结果缓存。

pub mod cache;

pub use cache::{cache_key, CacheStats, TranslationCache};
