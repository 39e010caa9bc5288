//! # Translation Manager
//!
//! 面向外部文本翻译后端的请求管理层：合并相同请求、缓存结果、
//! 防抖批量分发、重试与超时控制，以及不破坏标记的 HTML 片段翻译。
//!
//! ## 模块组织
//!
//! - `translation` - 翻译服务、调度管道、缓存、配置和错误类型
//! - `parsers` - HTML 片段解析、遍历和序列化
//! - `env` - 类型安全的环境变量

pub mod env;
pub mod parsers;
pub mod translation;

// Re-export commonly used items for convenience
pub use translation::{
    PreloadEntry, TranslationBackend, TranslationConfig, TranslationError, TranslationResult,
    TranslationService,
};
