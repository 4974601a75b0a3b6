//! Internal disposal bag for managing cleanup hooks.

use crate::traits::BoxFutureUnit;

/// A single pending cleanup action.
pub(crate) enum Disposer {
    Sync(Box<dyn FnOnce() + Send>),
    Async(Box<dyn FnOnce() -> BoxFutureUnit + Send>),
}

/// Container for disposal hooks with LIFO execution order.
///
/// Async hooks are executed first (in reverse order), followed by sync hooks.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<Box<dyn FnOnce() + Send>>,
    asyncs: Vec<Box<dyn FnOnce() -> BoxFutureUnit + Send>>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, disposer: Disposer) {
        match disposer {
            Disposer::Sync(f) => self.sync.push(f),
            Disposer::Async(f) => self.asyncs.push(f),
        }
    }

    /// Execute all sync hooks in reverse order (LIFO).
    pub(crate) fn run_all_sync_reverse(&mut self) {
        while let Some(f) = self.sync.pop() {
            (f)();
        }
    }

    /// Execute all async hooks in reverse order (LIFO).
    pub(crate) async fn run_all_async_reverse(&mut self) {
        while let Some(f) = self.asyncs.pop() {
            (f)().await;
        }
    }

    /// Moves the sync hooks out, leaving async hooks queued.
    pub(crate) fn take_sync(&mut self) -> DisposeBag {
        DisposeBag {
            sync: std::mem::take(&mut self.sync),
            asyncs: Vec::new(),
        }
    }

    pub(crate) fn pending_async(&self) -> usize {
        self.asyncs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asyncs.is_empty()
    }
}
