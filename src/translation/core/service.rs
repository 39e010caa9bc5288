//! 翻译服务核心实现
//!
//! 本模块提供了统一的翻译服务接口，整合了请求合并、防抖调度、批次分发、
//! 重试超时和缓存管理。这是翻译系统的主要入口点。
//!
//! ## 请求路径
//!
//! ```text
//! request_translation
//!     ├── 空内容 / 缓存命中 → 同步回调
//!     └── 未命中 → PendingQueue（相同键合并）
//!             └── DebounceScheduler 到期
//!                     └── BatchDispatcher（分块、块内并发）
//!                             └── TranslationEngine（超时 + 重试）
//!                                     └── TranslationBackend
//! ```
//!
//! 结果沿原路返回：先写入缓存，再分发给该键上挂着的所有回调。
//! 失败的条目以原文作为结果写入缓存并回调，调用方永远拿到一个字符串。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use translation_manager::translation::core::TranslationService;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TranslationService::create_default("vi", Some("http://localhost:1188/translate"))?;
//!
//! let text = service.translate("Hello", "vi").await;
//! let html = service.translate_html("<p>Hello <b>World</b></p>", "vi").await;
//!
//! let stats = service.get_stats();
//! println!("后端调用 {} 次", stats.backend_calls);
//! # Ok(())
//! # }
//! ```

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::oneshot;

use super::backend::{HttpBackend, TranslationBackend};
use super::engine::{RetryPolicy, TranslationEngine};
use crate::translation::{
    config::{load_translation_config, TranslationConfig},
    error::{TranslationError, TranslationResult},
    pipeline::{
        BatchDispatcher, DebounceScheduler, DispatchOptions, FlushReport, PendingQueue,
        PushOutcome,
    },
    processor::HtmlProcessor,
    storage::{cache_key, CacheStats, TranslationCache},
};

/// 预加载条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadEntry {
    pub content: String,
    pub lang: String,
    pub translated_content: String,
}

impl PreloadEntry {
    pub fn new(
        content: impl Into<String>,
        lang: impl Into<String>,
        translated_content: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            lang: lang.into(),
            translated_content: translated_content.into(),
        }
    }
}

/// 统一的翻译服务
///
/// 服务本身只是一个 `Arc` 句柄，克隆代价很低，所有克隆共享同一份缓存、
/// 队列和定时器。服务必须在 tokio 运行时内创建：防抖定时器和分发任务都会
/// 被派生到创建时所在的运行时上。
///
/// ## 线程安全
///
/// 内部状态由 `std::sync` 锁保护，任何锁都不会跨越 `.await` 持有，
/// 也不会在执行回调时持有。回调可能在运行时的工作线程上被调用。
#[derive(Clone)]
pub struct TranslationService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: TranslationConfig,
    cache: Arc<TranslationCache>,
    queue: Arc<PendingQueue>,
    scheduler: Arc<DebounceScheduler>,
    dispatcher: Arc<BatchDispatcher>,
    processor: HtmlProcessor,
    stats: Arc<ServiceStats>,
}

impl TranslationService {
    /// 使用指定后端创建翻译服务
    ///
    /// # 错误
    ///
    /// - `ConfigError`: 配置校验失败
    /// - `InternalError`: 当前线程不在 tokio 运行时内
    pub fn new(
        config: TranslationConfig,
        backend: Arc<dyn TranslationBackend>,
    ) -> TranslationResult<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            TranslationError::InternalError(format!("翻译服务必须在tokio运行时中创建: {}", e))
        })?;

        let stats = Arc::new(ServiceStats::default());
        let cache = Arc::new(TranslationCache::new());
        let queue = Arc::new(PendingQueue::new());

        let engine = TranslationEngine::new(
            backend,
            RetryPolicy::from_config(&config),
            Arc::clone(&stats),
        );
        let dispatcher = Arc::new(BatchDispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&cache),
            engine,
            DispatchOptions {
                concurrency_limit: config.max_concurrent_requests,
                chunk_delay: config.chunk_delay(),
            },
            Arc::clone(&stats),
        ));
        let scheduler = Arc::new(DebounceScheduler::new(
            runtime,
            Arc::clone(&dispatcher),
            config.debounce_delay(),
            config.max_flush_wait(),
        ));
        let processor = HtmlProcessor::from_config(&config);

        tracing::info!(
            "翻译服务已创建: API={}, 目标语言={}, 并发={}, 防抖={}ms",
            config.api_url,
            config.target_lang,
            config.max_concurrent_requests,
            config.debounce_delay_ms
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                cache,
                queue,
                scheduler,
                dispatcher,
                processor,
                stats,
            }),
        })
    }

    /// 使用配置中的 API 地址创建 HTTP 后端的翻译服务
    pub fn from_config(config: TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;
        let backend = HttpBackend::new(config.api_url.clone())?;
        Self::new(config, Arc::new(backend))
    }

    /// 从配置文件和环境变量加载配置，并覆盖目标语言与 API 地址
    pub fn create_default(target_lang: &str, api_url: Option<&str>) -> TranslationResult<Self> {
        let config = load_translation_config(target_lang, api_url);
        Self::from_config(config)
    }

    /// 请求翻译
    ///
    /// 回调恰好被调用一次：
    ///
    /// - 内容为空时立即以原内容回调
    /// - 缓存命中时立即以缓存值回调
    /// - 否则进入待处理队列（相同的键会合并），在刷新后以译文或原文回调
    pub fn request_translation<F>(&self, content: &str, lang: &str, callback: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        let inner = &self.inner;
        inner.stats.inc_requests();

        if content.is_empty() {
            callback(String::new());
            return;
        }

        let key = cache_key(content, lang);
        if let Some(cached) = inner.cache.get(&key) {
            inner.stats.inc_cache_hits();
            callback(cached);
            return;
        }

        let (outcome, oldest) = inner.queue.push(key, content, lang, Box::new(callback));
        match outcome {
            PushOutcome::Created => inner.stats.inc_enqueued(),
            PushOutcome::Coalesced => inner.stats.inc_coalesced(),
        }

        inner.scheduler.arm(oldest);
    }

    /// 异步翻译，永远返回一个字符串（失败时为原文）
    pub async fn translate(&self, content: &str, lang: &str) -> String {
        let (tx, rx) = oneshot::channel();
        self.request_translation(content, lang, move |value| {
            let _ = tx.send(value);
        });

        match rx.await {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("翻译回调通道已关闭，返回原文");
                content.to_string()
            }
        }
    }

    /// 使用配置中的默认目标语言翻译
    pub async fn translate_default(&self, content: &str) -> String {
        self.translate(content, &self.inner.config.target_lang).await
    }

    /// HTML 感知的翻译
    ///
    /// 短内容整体翻译；长内容逐个文本节点翻译，标签、属性和嵌套保持不变。
    pub async fn translate_html(&self, content: &str, lang: &str) -> String {
        self.inner.processor.process(self, content, lang).await
    }

    /// 立即刷新队列，不等待防抖定时器
    pub async fn flush_now(&self) -> FlushReport {
        self.inner.scheduler.cancel();
        self.inner.dispatcher.flush().await
    }

    /// 清空缓存
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        tracing::info!("翻译缓存已清空");
    }

    /// 查询缓存中的译文（不计入命中统计）
    pub fn cached_translation(&self, content: &str, lang: &str) -> Option<String> {
        self.inner.cache.peek(&cache_key(content, lang))
    }

    /// 缓存条目数
    pub fn cache_size(&self) -> usize {
        self.inner.cache.size()
    }

    /// 缓存统计
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.get_stats()
    }

    /// 预加载译文，已有的同键条目会被覆盖
    pub fn preload_translations<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = PreloadEntry>,
    {
        let loaded = self.inner.cache.preload(
            entries
                .into_iter()
                .map(|entry| (entry.content, entry.lang, entry.translated_content)),
        );
        tracing::info!("预加载 {} 条翻译", loaded);
        loaded
    }

    /// 等待刷新的条目数
    pub fn pending_count(&self) -> usize {
        self.inner.queue.len()
    }

    /// 防抖定时器是否在计时
    pub fn is_flush_scheduled(&self) -> bool {
        self.inner.scheduler.is_armed()
    }

    /// 获取统计信息快照
    pub fn get_stats(&self) -> ServiceStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// 获取配置
    pub fn config(&self) -> &TranslationConfig {
        &self.inner.config
    }
}

/// 服务运行统计
///
/// 所有计数器都是原子变量，可以在任意线程上无锁更新。
/// 读取时请使用 [`ServiceStats::snapshot`] 取得普通数值的副本。
#[derive(Debug, Default)]
pub struct ServiceStats {
    /// 调用 `request_translation` 的次数
    requests: AtomicUsize,
    /// 同步命中缓存的请求数
    cache_hits: AtomicUsize,
    /// 新建待处理条目的请求数
    enqueued: AtomicUsize,
    /// 合并到已有条目的请求数
    coalesced: AtomicUsize,
    /// 非空刷新的次数
    flushes: AtomicUsize,
    /// 处理过的分块数
    chunks: AtomicUsize,
    /// 分发器处理过的条目数
    items_processed: AtomicUsize,
    /// 实际发起的后端调用数（含重试）
    backend_calls: AtomicUsize,
    retries: AtomicUsize,
    timeouts: AtomicUsize,
    /// 以原文作为结果的条目数
    fallbacks: AtomicUsize,
}

impl ServiceStats {
    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_flushes(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_chunks(&self) {
        self.chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_items_processed(&self) {
        self.items_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_backend_calls(&self) {
        self.backend_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallbacks(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取统计数据快照
    ///
    /// 各字段分别读取，高并发时彼此之间不保证严格一致。
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            chunks: self.chunks.load(Ordering::Relaxed),
            items_processed: self.items_processed.load(Ordering::Relaxed),
            backend_calls: self.backend_calls.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        for counter in [
            &self.requests,
            &self.cache_hits,
            &self.enqueued,
            &self.coalesced,
            &self.flushes,
            &self.chunks,
            &self.items_processed,
            &self.backend_calls,
            &self.retries,
            &self.timeouts,
            &self.fallbacks,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// 服务统计数据的不可变快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStatsSnapshot {
    pub requests: usize,
    pub cache_hits: usize,
    pub enqueued: usize,
    pub coalesced: usize,
    pub flushes: usize,
    pub chunks: usize,
    pub items_processed: usize,
    pub backend_calls: usize,
    pub retries: usize,
    pub timeouts: usize,
    pub fallbacks: usize,
}
