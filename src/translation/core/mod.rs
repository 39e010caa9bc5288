//! 翻译系统核心模块
//!
//! - **服务层** (`service.rs`): 对外的统一入口，协调缓存、队列、调度和分发
//! - **引擎层** (`engine.rs`): 单次后端调用的超时控制和重试退避
//! - **后端** (`backend.rs`): 翻译后端接口及其 HTTP 实现
//!
//! ## 模块依赖关系
//!
//! ```text
//! TranslationService (service.rs)
//!     ├── TranslationCache (storage/cache.rs)
//!     ├── PendingQueue (pipeline/queue.rs)
//!     ├── DebounceScheduler (pipeline/scheduler.rs)
//!     ├── BatchDispatcher (pipeline/batch.rs)
//!     │       └── TranslationEngine (engine.rs)
//!     │               └── dyn TranslationBackend (backend.rs)
//!     └── HtmlProcessor (processor.rs)
//! ```

pub mod backend;
pub mod engine;
pub mod service;

/// 翻译后端接口与 HTTP 实现
pub use backend::{HttpBackend, TranslationBackend};

/// 重试与超时控制
pub use engine::{RetryPolicy, TranslationEngine};

/// 统一翻译服务 - 主要的对外接口
pub use service::{PreloadEntry, TranslationService};

/// 服务运行统计信息
pub use service::{ServiceStats, ServiceStatsSnapshot};
