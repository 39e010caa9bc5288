//! 翻译模块
//!
//! 翻译请求管理器，采用清晰的模块化架构：
//! - **core**: 翻译服务、重试超时引擎和后端接口
//! - **pipeline**: 请求合并队列、防抖调度和批次分发
//! - **storage**: 进程内译文缓存
//! - **processor**: HTML 感知的片段翻译
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use translation_manager::translation::TranslationService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TranslationService::create_default("vi", None)?;
//!
//! service.request_translation("Hello", "vi", |translated| {
//!     println!("{}", translated);
//! });
//!
//! let html = service.translate_html("<p>Hello <b>World</b></p>", "vi").await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块 - 默认值、配置文件和环境变量
pub mod config;

/// 核心模块 - 翻译服务、引擎和后端
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 翻译管道模块 - 合并、调度和分发
pub mod pipeline;

/// HTML 片段翻译
pub mod processor;

/// 存储管理模块 - 译文缓存
pub mod storage;

// ============================================================================
// 公共API导出
// ============================================================================

pub use config::{ConfigManager, TranslationConfig};
pub use core::{
    HttpBackend, PreloadEntry, RetryPolicy, ServiceStats, ServiceStatsSnapshot,
    TranslationBackend, TranslationService,
};
pub use error::{ErrorSeverity, TranslationError, TranslationResult};
pub use pipeline::FlushReport;
pub use processor::HtmlProcessor;
pub use storage::{cache_key, CacheStats, TranslationCache};
