//! Control-plane-to-worker fan-out (spec §4.4).
//!
//! One lcore is the master; every admin mutation is applied to the
//! master's table first and then broadcast, fire-and-forget, to every
//! slave's mailbox over the bounded [`route6_core::channel::Mailbox`]
//! bus. The master never waits for a slave's ack (spec §4.4, step 5).

use route6_core::config::Opcode;
use route6_core::rt6_warn;
use route6_core::{channel::Mailbox, RouteConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One replicated admin mutation, tagged with a master-scoped sequence
/// number used only for diagnostic logging (spec §4.4, "Message identity").
#[derive(Debug, Clone, Copy)]
pub struct BusMessage {
    pub seq: u64,
    pub cfg: RouteConfig,
}

/// Fans admin mutations out from the master to every slave's mailbox.
pub struct Replicator {
    master_lcore: u32,
    mailboxes: Vec<Arc<Mailbox<BusMessage>>>,
    next_seq: AtomicU64,
}

impl Replicator {
    /// `master_lcore` is the id of the single serializer (spec §4.4).
    pub fn new(num_lcores: usize, master_lcore: u32, mailbox_capacity: usize) -> Self {
        let mailboxes = (0..num_lcores).map(|_| Mailbox::new(mailbox_capacity)).collect();
        Replicator {
            master_lcore,
            mailboxes,
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn master_lcore(&self) -> u32 {
        self.master_lcore
    }

    pub fn is_master(&self, lcore_id: u32) -> bool {
        lcore_id == self.master_lcore
    }

    /// This lcore's inbox, drained by its own cooperative loop.
    pub fn mailbox(&self, lcore_id: u32) -> &Arc<Mailbox<BusMessage>> {
        &self.mailboxes[lcore_id as usize]
    }

    /// Broadcast `cfg` to every lcore except the master (spec §4.4, steps
    /// 4-5). Only `ADD`/`DEL` are ever broadcast; `GET`/`FLUSH` never
    /// reach this point because the admin surface rejects them earlier.
    /// Asynchronous and best-effort: a full mailbox is logged and
    /// skipped, never retried, and never propagated back to the caller.
    pub fn broadcast(&self, cfg: RouteConfig) -> u64 {
        debug_assert!(matches!(cfg.ops, Opcode::Add | Opcode::Del));
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let msg = BusMessage { seq, cfg };
        for (lcore_id, mailbox) in self.mailboxes.iter().enumerate() {
            if lcore_id as u32 == self.master_lcore {
                continue;
            }
            if mailbox.try_send(msg).is_err() {
                rt6_warn!("bus message seq={} dropped: lcore{} mailbox full", seq, lcore_id);
            }
        }
        seq
    }

    /// SLAAC sync path (spec §4.4): a non-master lcore that discovers an
    /// auto-configured route sends it to the master instead of applying
    /// it locally, keeping the master the single serializer.
    pub fn send_to_master(&self, cfg: RouteConfig) -> Result<(), route6_core::channel::MailboxFull> {
        let msg = BusMessage { seq: 0, cfg };
        self.mailbox(self.master_lcore).try_send(msg)
    }
}
