//! 待处理队列（请求合并）
//!
//! 同一个缓存键在任意时刻最多只有一个 [`PendingItem`]；后到的相同请求只会在
//! 已有条目上追加回调。刷新时整个队列被一次性取出并清空。

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use tokio::time::Instant;

/// 一次性回调，收到最终字符串（译文、缓存值或原文）
pub type Callback = Box<dyn FnOnce(String) + Send + 'static>;

/// 待翻译条目
pub struct PendingItem {
    pub key: String,
    pub content: String,
    pub lang: String,
    pub callbacks: Vec<Callback>,
}

impl PendingItem {
    /// 把结果分发给所有回调
    ///
    /// 单个回调 panic 会被捕获并记录，其余回调照常执行。
    pub fn resolve(self, value: &str) -> usize {
        let mut delivered = 0;

        for callback in self.callbacks {
            let value = value.to_string();
            match catch_unwind(AssertUnwindSafe(move || callback(value))) {
                Ok(()) => delivered += 1,
                Err(_) => tracing::error!("翻译回调发生panic，键: {}", self.key),
            }
        }

        delivered
    }
}

impl std::fmt::Debug for PendingItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingItem")
            .field("key", &self.key)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// 入队结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// 新建了条目
    Created,
    /// 合并到已有条目
    Coalesced,
}

#[derive(Default)]
struct QueueState {
    items: Vec<PendingItem>,
    index: HashMap<String, usize>,
    oldest: Option<Instant>,
}

/// 待处理队列
#[derive(Default)]
pub struct PendingQueue {
    state: Mutex<QueueState>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查找或创建条目并追加回调
    ///
    /// 返回入队结果和队列中最早条目的入队时间。
    pub fn push(&self, key: String, content: &str, lang: &str, callback: Callback) -> (PushOutcome, Instant) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let outcome = match state.index.get(&key).copied() {
            Some(position) => {
                state.items[position].callbacks.push(callback);
                PushOutcome::Coalesced
            }
            None => {
                let position = state.items.len();
                state.index.insert(key.clone(), position);
                state.items.push(PendingItem {
                    key,
                    content: content.to_string(),
                    lang: lang.to_string(),
                    callbacks: vec![callback],
                });
                PushOutcome::Created
            }
        };

        let oldest = *state.oldest.get_or_insert_with(Instant::now);
        (outcome, oldest)
    }

    /// 取出全部条目（按入队顺序）并清空队列
    pub fn drain(&self) -> Vec<PendingItem> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.index.clear();
        state.oldest = None;
        std::mem::take(&mut state.items)
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 最早条目的入队时间
    pub fn oldest(&self) -> Option<Instant> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .oldest
    }
}
