//! 防抖调度
//!
//! 每个服务实例只有一个共享定时器。每次入队都会取消旧定时器并以防抖延迟重新计时，
//! 到期后触发一次刷新。设置了 `max_wait` 时，重新计时的延迟不会让最早入队的
//! 条目等待超过该上限。

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::batch::BatchDispatcher;

#[derive(Default)]
struct TimerState {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

/// 防抖调度器
pub struct DebounceScheduler {
    runtime: Handle,
    dispatcher: Arc<BatchDispatcher>,
    delay: Duration,
    max_wait: Option<Duration>,
    timer: Mutex<TimerState>,
}

impl DebounceScheduler {
    pub fn new(
        runtime: Handle,
        dispatcher: Arc<BatchDispatcher>,
        delay: Duration,
        max_wait: Option<Duration>,
    ) -> Self {
        Self {
            runtime,
            dispatcher,
            delay,
            max_wait,
            timer: Mutex::new(TimerState::default()),
        }
    }

    /// 计算下一次定时的延迟
    pub fn next_delay(&self, oldest: Instant) -> Duration {
        match self.max_wait {
            Some(max_wait) => self
                .delay
                .min(max_wait.saturating_sub(oldest.elapsed())),
            None => self.delay,
        }
    }

    /// 取消现有定时器并重新计时
    pub fn arm(self: &Arc<Self>, oldest: Instant) {
        let delay = self.next_delay(oldest);
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = timer.handle.take() {
            previous.abort();
        }
        timer.generation = timer.generation.wrapping_add(1);
        let generation = timer.generation;

        let scheduler = Arc::clone(self);
        timer.handle = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if scheduler.expire(generation) {
                scheduler.dispatcher.flush().await;
            }
        }));

        tracing::trace!("防抖定时器已重置: {}ms", delay.as_millis());
    }

    /// 定时器到期：只有最新一代定时器才会清除句柄并触发刷新
    fn expire(&self, generation: u64) -> bool {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.generation != generation {
            return false;
        }
        // 句柄指向的就是当前任务，丢弃句柄不会中止它
        timer.handle = None;
        true
    }

    /// 取消定时器（不刷新）
    pub fn cancel(&self) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
        timer.generation = timer.generation.wrapping_add(1);
    }

    /// 是否有待触发的定时器
    pub fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handle
            .is_some()
    }
}
