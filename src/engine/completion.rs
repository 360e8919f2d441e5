//! Completion signal - awaitable "render complete" per update cycle.
//!
//! One [`RenderComplete`] handle exists per scheduled cycle. Every clone of
//! it resolves together when the cycle settles. A cycle scheduled after the
//! previous one settled gets a fresh handle, so callers re-read
//! `render_complete()` for each cycle they want to observe.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};

// =============================================================================
// RenderComplete
// =============================================================================

/// Future resolving once an update cycle has settled.
///
/// Cloning is cheap; all clones resolve at the same time. If the owning
/// element is dropped mid-cycle the future resolves as well.
#[derive(Clone)]
pub struct RenderComplete {
    inner: Shared<oneshot::Receiver<()>>,
}

impl RenderComplete {
    fn pending() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { inner: rx.shared() })
    }

    fn resolved() -> Self {
        let (tx, handle) = Self::pending();
        let _ = tx.send(());
        handle
    }

    /// Whether the cycle behind this handle has settled.
    pub fn is_settled(&self) -> bool {
        self.inner.clone().now_or_never().is_some()
    }

    /// Whether two handles observe the same cycle.
    pub fn same_cycle(&self, other: &RenderComplete) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl Future for RenderComplete {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // Cancellation (sender dropped) also counts as settled.
        self.get_mut().inner.poll_unpin(cx).map(|_| ())
    }
}

impl std::fmt::Debug for RenderComplete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderComplete")
            .field("settled", &self.is_settled())
            .finish()
    }
}

// =============================================================================
// CompletionSignal
// =============================================================================

/// Owner side of the per-cycle completion handle.
#[derive(Debug)]
pub struct CompletionSignal {
    current: RenderComplete,
    sender: Option<oneshot::Sender<()>>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSignal {
    /// Start with an already-resolved handle (nothing ever scheduled).
    pub fn new() -> Self {
        Self {
            current: RenderComplete::resolved(),
            sender: None,
        }
    }

    /// Begin a new cycle. Reuses the outstanding handle if one is unresolved.
    pub fn begin(&mut self) {
        if self.sender.is_some() {
            return;
        }
        let (tx, handle) = RenderComplete::pending();
        self.current = handle;
        self.sender = Some(tx);
    }

    /// Resolve the outstanding handle, waking every awaiter.
    pub fn resolve(&mut self) {
        if let Some(tx) = self.sender.take() {
            let _ = tx.send(());
        }
    }

    /// Handle for the pending cycle, or the most recent one.
    pub fn current(&self) -> RenderComplete {
        self.current.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.sender.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
