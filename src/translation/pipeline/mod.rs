//! 翻译管道模块
//!
//! 请求从入队到落定的完整路径：合并队列、防抖调度和批次分发

pub mod batch;
pub mod queue;
pub mod scheduler;

// 重新导出主要类型
pub use batch::{BatchDispatcher, DispatchOptions, FlushReport};
pub use queue::{Callback, PendingItem, PendingQueue, PushOutcome};
pub use scheduler::DebounceScheduler;
