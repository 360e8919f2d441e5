//! Cooperative scheduler - microtasks and the unhandled-error channel.
//!
//! All element work runs on one thread. Invalidations enqueue a microtask on
//! a thread-local [`LocalPool`]; the queue drains after the current
//! synchronous code returns control to the pool, either through
//! [`run_microtasks`] or while [`block_on`] drives a future.
//!
//! # Pattern
//!
//! ```ignore
//! el.set("count", 1);
//! el.set("count", 2);          // coalesced into the same cycle
//! block_on(el.render_complete()); // drains the flush, then resolves
//! ```

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use crate::error::HookError;

// =============================================================================
// Microtask Queue
// =============================================================================

/// Pool and spawner are created together so spawning never needs to borrow
/// the pool (it is mutably borrowed while draining).
struct Scheduler {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl Scheduler {
    fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: RefCell::new(pool),
            spawner,
        }
    }
}

thread_local! {
    static SCHEDULER: Scheduler = Scheduler::new();
    static QUEUED: Cell<usize> = const { Cell::new(0) };
}

/// Run `task` after the current synchronous work, before the next input.
pub fn queue_microtask(task: impl FnOnce() + 'static) {
    QUEUED.with(|q| q.set(q.get() + 1));
    let spawned = SCHEDULER.with(|scheduler| {
        scheduler.spawner.spawn_local(async move {
            QUEUED.with(|q| q.set(q.get().saturating_sub(1)));
            task();
        })
    });
    if let Err(err) = spawned {
        QUEUED.with(|q| q.set(q.get().saturating_sub(1)));
        tracing::error!(%err, "microtask dropped: scheduler is shut down");
    }
}

/// Number of microtasks waiting to run.
pub fn queued_microtasks() -> usize {
    QUEUED.with(|q| q.get())
}

/// Drain the microtask queue, including tasks queued while draining.
///
/// Calling this from inside a microtask is a no-op: the outer drain picks up
/// anything queued in the meantime.
pub fn run_microtasks() {
    SCHEDULER.with(|scheduler| match scheduler.pool.try_borrow_mut() {
        Ok(mut pool) => pool.run_until_stalled(),
        Err(_) => tracing::trace!("run_microtasks called while draining; deferred to outer drain"),
    });
}

/// Drive `future` to completion, running microtasks as it waits.
///
/// # Panics
///
/// Panics when called from inside a microtask or another `block_on`.
pub fn block_on<F: Future>(future: F) -> F::Output {
    SCHEDULER.with(|scheduler| scheduler.pool.borrow_mut().run_until(future))
}

// =============================================================================
// Unhandled Error Channel
// =============================================================================

/// Receiver of errors nobody else handled (failed lifecycle hooks).
pub type ErrorHandler = Rc<dyn Fn(&HookError)>;

thread_local! {
    static ERROR_HANDLERS: RefCell<Vec<(usize, ErrorHandler)>> = RefCell::new(Vec::new());
    static NEXT_HANDLER_ID: Cell<usize> = const { Cell::new(0) };
}

/// Subscribe to unhandled errors.
///
/// Returns an unsubscribe function. While no handler is registered, errors
/// are logged with `tracing::error!`.
pub fn on_unhandled_error(handler: impl Fn(&HookError) + 'static) -> Box<dyn FnOnce()> {
    let id = NEXT_HANDLER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    ERROR_HANDLERS.with(|handlers| {
        handlers.borrow_mut().push((id, Rc::new(handler)));
    });

    Box::new(move || {
        ERROR_HANDLERS.with(|handlers| {
            handlers.borrow_mut().retain(|(handler_id, _)| *handler_id != id);
        });
    })
}

/// Deliver an error on the unhandled-error channel.
pub fn report_unhandled(error: HookError) {
    // Clone out so handlers may unsubscribe while being called.
    let handlers: Vec<ErrorHandler> = ERROR_HANDLERS.with(|handlers| {
        handlers.borrow().iter().map(|(_, h)| h.clone()).collect()
    });

    if handlers.is_empty() {
        tracing::error!(hook = error.hook, message = %error.message, "unhandled hook error");
        return;
    }
    for handler in handlers {
        handler(&error);
    }
}

/// Remove all error handlers (for testing).
pub fn reset_error_handlers() {
    ERROR_HANDLERS.with(|handlers| handlers.borrow_mut().clear());
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microtask_runs_after_sync_code() {
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        queue_microtask(move || l.borrow_mut().push("task"));
        log.borrow_mut().push("sync");
        assert_eq!(queued_microtasks(), 1);

        run_microtasks();
        assert_eq!(*log.borrow(), vec!["sync", "task"]);
        assert_eq!(queued_microtasks(), 0);
    }

    #[test]
    fn test_nested_microtasks_drain() {
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        queue_microtask(move || {
            c.set(c.get() + 1);
            let c2 = c.clone();
            queue_microtask(move || c2.set(c2.get() + 1));
            // Re-entrant drain is deferred, not a panic.
            run_microtasks();
        });

        run_microtasks();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_block_on_drains_queue() {
        let flag = Rc::new(Cell::new(false));
        let (tx, rx) = futures::channel::oneshot::channel::<u32>();

        let f = flag.clone();
        queue_microtask(move || {
            f.set(true);
            let _ = tx.send(7);
        });

        let value = block_on(rx).unwrap();
        assert_eq!(value, 7);
        assert!(flag.get());
    }

    #[test]
    fn test_error_handlers() {
        reset_error_handlers();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let unsubscribe = on_unhandled_error(move |err| s.borrow_mut().push(err.message.clone()));

        report_unhandled(HookError::new("render", "first"));
        unsubscribe();
        report_unhandled(HookError::new("render", "second"));

        assert_eq!(*seen.borrow(), vec!["first".to_string()]);
    }
}
