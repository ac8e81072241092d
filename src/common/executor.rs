/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::trace;

use crate::common::BoxedTask;

/// Handle to a timer armed through an [`Executor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// The narrow contract a supervisor needs from the event loop driving it.
///
/// Supervisors never touch the underlying runtime directly: the pump task is
/// posted here, request timers are armed and cancelled here, and system
/// teardown drains here. Every callable posted by one supervisor runs
/// concurrently with other supervisors but the supervisor's own pump remains a
/// single serial task.
#[async_trait]
pub trait Executor: fmt::Debug + Send + Sync + 'static {
    /// Schedules a task on this executor.
    fn post(&self, task: BoxedTask);

    /// Arms a one-shot timer that runs `task` after `after` elapses.
    fn schedule_timer(&self, after: Duration, task: BoxedTask) -> TimerHandle;

    /// Cancels a previously armed timer.
    ///
    /// Returns `true` when the timer was still pending, `false` when it had
    /// already fired (or was cancelled before).
    fn cancel_timer(&self, timer: &TimerHandle) -> bool;

    /// Token cancelled when the executor is being torn down; pumps watch a
    /// child of this token for forced cancellation.
    fn shutdown_token(&self) -> CancellationToken;

    /// Cancels all pending timers, signals teardown, and waits until every
    /// posted task has finished.
    async fn drain(&self);
}

/// The provided [`Executor`] implementation over the ambient Tokio runtime.
///
/// Tasks are tracked with a [`TaskTracker`] so [`drain`](Executor::drain) can
/// wait for the pumps to wind down; timers are plain sleeping tasks recorded in
/// a live-timer table so they can be aborted on cancellation.
#[derive(Debug)]
pub struct TokioExecutor {
    tracker: TaskTracker,
    cancellation: CancellationToken,
    timers: Arc<DashMap<u64, JoinHandle<()>>>,
    next_timer: AtomicU64,
}

impl TokioExecutor {
    /// Creates a new executor bound to the current Tokio runtime.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tracker: TaskTracker::new(),
            cancellation: CancellationToken::new(),
            timers: Arc::new(DashMap::new()),
            next_timer: AtomicU64::new(1),
        })
    }

    /// Number of timers currently armed; useful for asserting that shutdown
    /// left nothing ticking.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

#[async_trait]
impl Executor for TokioExecutor {
    fn post(&self, task: BoxedTask) {
        self.tracker.spawn(task);
    }

    fn schedule_timer(&self, after: Duration, task: BoxedTask) -> TimerHandle {
        let id = self.next_timer.fetch_add(1, Ordering::Relaxed);
        let timers = self.timers.clone();
        let handle = self.tracker.spawn(async move {
            tokio::time::sleep(after).await;
            task.await;
            timers.remove(&id);
        });
        self.timers.insert(id, handle);
        trace!(timer = id, ?after, "Timer armed");
        TimerHandle(id)
    }

    fn cancel_timer(&self, timer: &TimerHandle) -> bool {
        if let Some((_, handle)) = self.timers.remove(&timer.0) {
            handle.abort();
            trace!(timer = timer.0, "Timer cancelled");
            true
        } else {
            false
        }
    }

    fn shutdown_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    async fn drain(&self) {
        trace!("Draining executor");
        for entry in self.timers.iter() {
            entry.value().abort();
        }
        self.timers.clear();
        self.cancellation.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        trace!("Executor drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn cancelled_timer_does_not_fire() {
        let executor = TokioExecutor::new();
        let fired = Arc::new(AtomicBool::new(false));
        let observed = fired.clone();
        let timer = executor.schedule_timer(
            Duration::from_secs(30),
            Box::pin(async move {
                observed.store(true, Ordering::SeqCst);
            }),
        );
        assert!(executor.cancel_timer(&timer));
        assert!(!executor.cancel_timer(&timer));
        executor.drain().await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn elapsed_timer_fires_once() {
        let executor = TokioExecutor::new();
        let fired = Arc::new(AtomicU64::new(0));
        let observed = fired.clone();
        executor.schedule_timer(
            Duration::from_millis(5),
            Box::pin(async move {
                observed.fetch_add(1, Ordering::SeqCst);
            }),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        executor.drain().await;
    }
}
