//! 批次分发
//!
//! 一次刷新会取出队列中的全部条目，按并发上限切分成若干块：
//! 块与块之间严格串行并间隔 `chunk_delay`，块内条目并发执行，
//! 等全部落定后才进入下一块。任何条目的失败都不会影响同块的其他条目。

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Mutex as AsyncMutex;

use super::queue::{PendingItem, PendingQueue};
use crate::translation::core::engine::TranslationEngine;
use crate::translation::core::service::ServiceStats;
use crate::translation::error::helpers::log_error;
use crate::translation::storage::TranslationCache;

/// 分发参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub concurrency_limit: usize,
    pub chunk_delay: Duration,
}

/// 单次刷新的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub items: usize,
    pub chunks: usize,
    pub translated: usize,
    pub fallbacks: usize,
}

enum ItemOutcome {
    Translated,
    Cached,
    Fallback,
}

/// 批次分发器
pub struct BatchDispatcher {
    queue: Arc<PendingQueue>,
    cache: Arc<TranslationCache>,
    engine: TranslationEngine,
    options: DispatchOptions,
    stats: Arc<ServiceStats>,
    flush_lock: AsyncMutex<()>,
}

impl BatchDispatcher {
    pub fn new(
        queue: Arc<PendingQueue>,
        cache: Arc<TranslationCache>,
        engine: TranslationEngine,
        options: DispatchOptions,
        stats: Arc<ServiceStats>,
    ) -> Self {
        Self {
            queue,
            cache,
            engine,
            options: DispatchOptions {
                concurrency_limit: options.concurrency_limit.max(1),
                ..options
            },
            stats,
            flush_lock: AsyncMutex::new(()),
        }
    }

    /// 刷新队列
    ///
    /// 刷新周期互不重叠：正在进行的刷新结束前，新的刷新会先等待，再取快照。
    pub async fn flush(&self) -> FlushReport {
        let _guard = self.flush_lock.lock().await;

        let items = self.queue.drain();
        if items.is_empty() {
            return FlushReport::default();
        }

        let total = items.len();
        let chunk_count = total.div_ceil(self.options.concurrency_limit);
        self.stats.inc_flushes();
        tracing::info!("开始刷新翻译队列: {} 个条目, {} 个批次", total, chunk_count);

        let mut report = FlushReport {
            items: total,
            chunks: chunk_count,
            ..FlushReport::default()
        };

        let mut remaining = items.into_iter().peekable();
        let mut chunk_index = 0;
        while remaining.peek().is_some() {
            let chunk: Vec<PendingItem> = remaining
                .by_ref()
                .take(self.options.concurrency_limit)
                .collect();
            chunk_index += 1;
            self.stats.inc_chunks();
            tracing::debug!("处理批次 {}/{}: {} 个条目", chunk_index, chunk_count, chunk.len());

            let outcomes = join_all(chunk.into_iter().map(|item| self.process_item(item))).await;
            for outcome in outcomes {
                match outcome {
                    ItemOutcome::Translated | ItemOutcome::Cached => report.translated += 1,
                    ItemOutcome::Fallback => report.fallbacks += 1,
                }
            }

            if remaining.peek().is_some() && !self.options.chunk_delay.is_zero() {
                tokio::time::sleep(self.options.chunk_delay).await;
            }
        }

        tracing::info!(
            "翻译队列刷新完成: 成功 {}, 回退原文 {}",
            report.translated,
            report.fallbacks
        );
        report
    }

    async fn process_item(&self, item: PendingItem) -> ItemOutcome {
        self.stats.inc_items_processed();

        if let Some(cached) = self.cache.peek(&item.key) {
            tracing::debug!("条目已在缓存中: {}", item.key);
            item.resolve(&cached);
            return ItemOutcome::Cached;
        }

        match self
            .engine
            .translate_with_retry(&item.content, &item.lang)
            .await
        {
            Ok(translated) => {
                self.cache.set(item.key.clone(), translated.clone());
                item.resolve(&translated);
                ItemOutcome::Translated
            }
            Err(e) => {
                log_error(&e.with_context(format!("键 {}，返回原文", item.key)));
                self.stats.inc_fallbacks();
                self.cache.set(item.key.clone(), item.content.clone());
                let original = item.content.clone();
                item.resolve(&original);
                ItemOutcome::Fallback
            }
        }
    }
}
