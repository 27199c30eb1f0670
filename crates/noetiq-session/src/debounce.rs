//! Single-slot trailing-edge debouncer.
//!
//! Holds at most one pending item and one timer. Scheduling replaces the
//! item and restarts the timer. When the timer expires without a newer
//! schedule, the item is handed to a [`Commit`] implementation.
//!
//! Cancelling stops the *timer* only. Once an item has been taken for commit
//! its request runs to completion, so a dispatched save is never torn down
//! halfway.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

/// Sink for items whose quiescence window elapsed (or that were flushed).
#[async_trait]
pub trait Commit: Send + Sync + 'static {
    type Item: Send + 'static;

    /// Persist one item. Failures are the implementation's to report.
    async fn commit(&self, item: Self::Item);
}

struct Slot<T> {
    pending: Option<T>,
    timer: Option<JoinHandle<()>>,
    /// Bumped by every schedule, flush and cancel; a timer only fires for
    /// the generation it was started under.
    generation: u64,
}

impl<T> Slot<T> {
    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Shared<C: Commit> {
    committer: C,
    window: Duration,
    slot: Mutex<Slot<C::Item>>,
}

impl<C: Commit> Shared<C> {
    async fn fire(&self, generation: u64) {
        let item = {
            let mut slot = self.slot.lock().await;
            if slot.generation != generation {
                return;
            }
            slot.timer = None;
            slot.pending.take()
        };
        if let Some(item) = item {
            trace!(window_ms = self.window.as_millis() as u64, "Debounce window elapsed");
            self.committer.commit(item).await;
        }
    }
}

impl<C: Commit> Drop for Shared<C> {
    fn drop(&mut self) {
        self.slot.get_mut().stop_timer();
    }
}

/// Cloneable handle; clones share the same slot.
pub struct Debouncer<C: Commit> {
    shared: Arc<Shared<C>>,
}

impl<C: Commit> Clone for Debouncer<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Commit> Debouncer<C> {
    pub fn new(committer: C, window: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                committer,
                window,
                slot: Mutex::new(Slot {
                    pending: None,
                    timer: None,
                    generation: 0,
                }),
            }),
        }
    }

    pub fn window(&self) -> Duration {
        self.shared.window
    }

    pub fn committer(&self) -> &C {
        &self.shared.committer
    }

    /// Replace the pending item and restart the window. Returns the item
    /// that was displaced without being committed, if any.
    pub async fn schedule(&self, item: C::Item) -> Option<C::Item> {
        let mut slot = self.shared.slot.lock().await;
        slot.stop_timer();
        slot.generation += 1;
        let displaced = slot.pending.replace(item);

        let generation = slot.generation;
        let window = self.shared.window;
        let weak: Weak<Shared<C>> = Arc::downgrade(&self.shared);
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(shared) = weak.upgrade() {
                shared.fire(generation).await;
            }
        }));
        displaced
    }

    /// Commit `item` right away, bypassing the slot.
    pub async fn commit_now(&self, item: C::Item) {
        self.shared.committer.commit(item).await;
    }

    /// Stop the timer and commit the pending item now, waiting for the
    /// commit to finish. Returns whether anything was pending.
    pub async fn flush(&self) -> bool {
        let item = {
            let mut slot = self.shared.slot.lock().await;
            slot.stop_timer();
            slot.generation += 1;
            slot.pending.take()
        };
        match item {
            Some(item) => {
                self.shared.committer.commit(item).await;
                true
            }
            None => false,
        }
    }

    /// Stop the timer and drop the pending item without committing it.
    pub async fn cancel(&self) -> Option<C::Item> {
        let mut slot = self.shared.slot.lock().await;
        slot.stop_timer();
        slot.generation += 1;
        slot.pending.take()
    }

    /// [`Debouncer::cancel`], but only when the pending item satisfies `pred`.
    pub async fn cancel_if<F>(&self, pred: F) -> Option<C::Item>
    where
        F: FnOnce(&C::Item) -> bool,
    {
        let mut slot = self.shared.slot.lock().await;
        if !slot.pending.as_ref().is_some_and(pred) {
            return None;
        }
        slot.stop_timer();
        slot.generation += 1;
        slot.pending.take()
    }

    pub async fn has_pending(&self) -> bool {
        self.shared.slot.lock().await.pending.is_some()
    }

    /// Run `f` against the pending item while holding the slot.
    pub async fn inspect<R, F>(&self, f: F) -> R
    where
        F: FnOnce(Option<&C::Item>) -> R,
    {
        let slot = self.shared.slot.lock().await;
        f(slot.pending.as_ref())
    }
}
