//! Lifetime scope for view-owned async work
//!
//! Every fetch a view starts runs inside its scope. Closing the scope
//! aborts whatever is still in flight and makes any result that races the
//! close come back as `Cancelled`, so a torn-down view never commits.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{AbortHandle, Abortable};
use tracing::debug;

use crate::error::{PollsError, Result};

#[derive(Debug, Default)]
struct ScopeInner {
    closed: AtomicBool,
    next_id: AtomicU64,
    handles: Mutex<HashMap<u64, AbortHandle>>,
}

#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    inner: Arc<ScopeInner>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Aborts all in-flight work. Idempotent.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let handles = match self.inner.handles.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        debug!(in_flight = handles.len(), "closing view scope");
        for handle in handles.into_values() {
            handle.abort();
        }
    }

    /// Runs `fut` tied to this scope.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output> {
        if self.is_closed() {
            return Err(PollsError::Cancelled);
        }

        let (handle, registration) = AbortHandle::new_pair();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handles) = self.inner.handles.lock() {
            handles.insert(id, handle);
        }

        let output = Abortable::new(fut, registration).await;

        if let Ok(mut handles) = self.inner.handles.lock() {
            handles.remove(&id);
        }

        // The scope may have closed between completion and this poll.
        match output {
            Ok(output) if !self.is_closed() => Ok(output),
            _ => Err(PollsError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_scope_passes_results_through() {
        let scope = ViewScope::new();
        assert_eq!(scope.run(async { 42 }).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn closed_scope_refuses_new_work() {
        let scope = ViewScope::new();
        scope.close();
        scope.close();
        assert!(matches!(
            scope.run(async { 1 }).await,
            Err(PollsError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn close_aborts_in_flight_work() {
        let scope = ViewScope::new();
        let gate = tokio::sync::Notify::new();

        let (result, ()) = futures::join!(
            scope.run(async {
                gate.notified().await;
                "late"
            }),
            async {
                scope.close();
                gate.notify_one();
            }
        );

        assert!(matches!(result, Err(PollsError::Cancelled)));
    }
}
