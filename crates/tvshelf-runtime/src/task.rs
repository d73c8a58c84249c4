//! Cancellable task slots.
//!
//! A [`TaskSlot`] holds at most one live task. Spawning into an occupied
//! slot aborts the previous task, whether it is still waiting on a timer or
//! already awaiting I/O. Every spawn hands the task a [`Ticket`]; once a
//! newer task has been spawned (or the slot cancelled) the old ticket stops
//! being current and the task must not publish anything.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::{AbortHandle, JoinHandle};

use crate::observable::Observable;

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: Arc<AtomicU64>,
    id: u64,
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.id
    }
}

#[derive(Debug)]
pub struct TaskSlot {
    name: &'static str,
    generation: Arc<AtomicU64>,
    current: Mutex<Option<AbortHandle>>,
}

impl TaskSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            generation: Arc::new(AtomicU64::new(0)),
            current: Mutex::new(None),
        }
    }

    /// Abort whatever occupies the slot and spawn `make(ticket)` in its place.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(&self, make: F) -> JoinHandle<()>
    where
        F: FnOnce(Ticket) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = current.take() {
            if !previous.is_finished() {
                tracing::debug!(slot = self.name, "superseding running task");
            }
            previous.abort();
        }

        let ticket = Ticket {
            generation: Arc::clone(&self.generation),
            id,
        };
        let handle = tokio::spawn(make(ticket));
        *current = Some(handle.abort_handle());
        handle
    }

    /// Run `publish` only while `ticket` is current.
    ///
    /// The slot lock is held throughout, so a concurrent `spawn` or `cancel`
    /// cannot supersede the ticket between the check and the write.
    pub fn publish(&self, ticket: &Ticket, publish: impl FnOnce()) -> bool {
        let _current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if ticket.is_current() {
            publish();
            true
        } else {
            false
        }
    }

    /// Abort the task in the slot, if any. Returns whether a task was still running.
    pub fn cancel(&self) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        match current.take() {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.abort();
                if running {
                    tracing::debug!(slot = self.name, "cancelled running task");
                }
                running
            }
            None => false,
        }
    }
}

/// Raises a loading flag and lowers it again when dropped.
///
/// Dropping happens on success, on error and when the owning task is
/// aborted. The flag is only lowered while the ticket is current, so a
/// superseded task cannot clear the flag its replacement has raised.
pub struct LoadingGuard<'a> {
    slot: &'a TaskSlot,
    flag: &'a Observable<bool>,
    ticket: Ticket,
}

impl<'a> LoadingGuard<'a> {
    pub fn raise(slot: &'a TaskSlot, flag: &'a Observable<bool>, ticket: &Ticket) -> Self {
        slot.publish(ticket, || flag.set(true));
        Self {
            slot,
            flag,
            ticket: ticket.clone(),
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.slot.publish(&self.ticket, || self.flag.set(false));
    }
}
