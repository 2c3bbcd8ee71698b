//! Mock presentation host for testing.
//!
//! Records every mutation and can hold completions open so tests can observe
//! the engine while a batch is in flight.

use super::PresentationHost;
use arrayview_core::Mutation;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, Semaphore};

/// Mock host for testing.
///
/// Starts attached, completing every mutation immediately. Clones share
/// state.
#[derive(Debug)]
pub struct MockHost {
    inner: Arc<MockHostInner>,
}

#[derive(Debug)]
struct MockHostInner {
    attached: AtomicBool,
    holding: AtomicBool,
    mutations: Mutex<Vec<Mutation>>,
    started: watch::Sender<usize>,
    completed: watch::Sender<usize>,
    gate: Semaphore,
}

impl MockHost {
    /// Create an attached host.
    pub fn new() -> Self {
        let (started, _) = watch::channel(0);
        let (completed, _) = watch::channel(0);
        Self {
            inner: Arc::new(MockHostInner {
                attached: AtomicBool::new(true),
                holding: AtomicBool::new(false),
                mutations: Mutex::new(Vec::new()),
                started,
                completed,
                gate: Semaphore::new(0),
            }),
        }
    }

    /// Create a detached host.
    pub fn detached() -> Self {
        let host = Self::new();
        host.set_attached(false);
        host
    }

    /// Attach or detach the host.
    pub fn set_attached(&self, attached: bool) {
        self.inner.attached.store(attached, Ordering::SeqCst);
    }

    /// Every mutation received so far, in order.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.inner
            .mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of mutations that have completed.
    pub fn completed(&self) -> usize {
        *self.inner.completed.borrow()
    }

    /// Hold subsequent mutations open until released.
    pub fn hold_completions(&self) {
        self.inner.holding.store(true, Ordering::SeqCst);
    }

    /// Let `count` held mutations complete.
    pub fn release(&self, count: usize) {
        self.inner.gate.add_permits(count);
    }

    /// Wait until at least `count` mutations have been received.
    pub async fn wait_for_mutations(&self, count: usize) {
        let mut started = self.inner.started.subscribe();
        let _ = started.wait_for(|received| *received >= count).await;
    }

    /// Wait until at least `count` mutations have completed.
    pub async fn wait_for_completed(&self, count: usize) {
        let mut completed = self.inner.completed.subscribe();
        let _ = completed.wait_for(|done| *done >= count).await;
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockHost {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PresentationHost for MockHost {
    fn is_attached(&self) -> bool {
        self.inner.attached.load(Ordering::SeqCst)
    }

    async fn perform_batched_mutation(&self, mutation: Mutation) {
        self.inner
            .mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mutation);
        self.inner.started.send_modify(|received| *received += 1);

        if self.inner.holding.load(Ordering::SeqCst) {
            if let Ok(permit) = self.inner.gate.acquire().await {
                permit.forget();
            }
        }

        self.inner.completed.send_modify(|done| *done += 1);
    }
}
