//! Bounded MPMC mailbox used by the inter-core bus (spec §4.4, §6).
//!
//! Unlike a GVThread-style channel that parks a waiting caller, nothing on
//! the routing core's fast path ever blocks (spec §5, "Suspension points:
//! none on the fast path"): the master's dispatch to slaves is
//! fire-and-forget, and a slave drains its mailbox as part of its own
//! per-tick bus-servicing step. A lock-free ring buffer is therefore a
//! better fit than a yield-based channel; this wraps `crossbeam_queue::ArrayQueue`.

use crossbeam_queue::ArrayQueue;
use std::sync::Arc;

/// Error returned by [`Mailbox::try_send`] when the ring is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxFull;

/// A single recipient's bounded inbox.
pub struct Mailbox<T> {
    queue: ArrayQueue<T>,
}

impl<T> Mailbox<T> {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            queue: ArrayQueue::new(capacity),
        })
    }

    /// Non-blocking send; never suspends the caller (spec §5).
    pub fn try_send(&self, value: T) -> Result<(), MailboxFull> {
        self.queue.push(value).map_err(|_| MailboxFull)
    }

    /// Non-blocking receive, used when a worker services its mailbox.
    pub fn try_recv(&self) -> Option<T> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
