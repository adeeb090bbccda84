//! Route entries (spec §3, §4.1): immutable-once-published descriptors
//! with a manually managed, atomic refcount.
//!
//! Entries are allocated and freed explicitly rather than through `Arc`,
//! because the table's own reference and a packet handler's transient
//! reference are dropped through two different paths with different
//! consequences: a transient [`EntryRef::release`] frees immediately once
//! the count hits zero, while the table's own [`EntryRef::table_delete`]
//! may instead have to park the entry in the dustbin (spec §4.3) because a
//! transient reference is still outstanding. `Arc::drop` cannot express
//! that branch, so the refcount and the free are done by hand, the same
//! way the source's `rte_atomic32_t refcnt` + `rte_free` pair does.

use crate::config::RouteConfig;
use crate::device::DeviceRef;
use crate::prefix::Ipv6Prefix;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU32, Ordering};
use std::net::Ipv6Addr;

/// Fields are frozen at publication time (spec §3, invariant 2): nothing
/// here is mutated afterwards except `refcount`.
pub struct RouteEntry {
    pub dst: Ipv6Prefix,
    pub src: Ipv6Prefix,
    pub prefsrc: Ipv6Prefix,
    pub gateway: Ipv6Addr,
    pub device: Option<DeviceRef>,
    pub mtu: u32,
    pub flags: u32,
    /// Insertion order, used by both engines to break ties between
    /// equal-length prefixes: "earliest wins" (spec §4.2, §9).
    pub order: u64,
    refcount: AtomicU32,
}

impl RouteEntry {
    #[inline]
    pub fn is_direct(&self) -> bool {
        self.gateway == Ipv6Addr::UNSPECIFIED
    }
}

/// A handle to a heap-allocated [`RouteEntry`]. `Copy` because holding one
/// does not by itself imply ownership — callers must track whether their
/// copy is the table's, a transient lookup reference, or a dustbin entry,
/// the same distinction the source draws with a bare `struct route6 *`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryRef(NonNull<RouteEntry>);

// Safety: a `RouteEntry`'s fields are immutable post-publication (only
// `refcount` is mutated, and only through atomic ops), so sharing a
// pointer to one across threads is sound.
unsafe impl Send for EntryRef {}
unsafe impl Sync for EntryRef {}

/// What happened when the table logically deleted an entry.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No transient reference was outstanding; the entry was freed.
    FreedImmediately,
    /// A transient reference is outstanding; the caller must push this
    /// entry onto the worker's dustbin.
    Dustbin,
}

impl EntryRef {
    /// Allocate and publish a new entry with refcount 1 (the table's own
    /// reference). `dst` is taken canonical from `cfg` (the replicator is
    /// responsible for having canonicalized it already).
    pub fn publish(cfg: &RouteConfig, device: Option<DeviceRef>, order: u64) -> Self {
        let boxed = Box::new(RouteEntry {
            dst: cfg.dst,
            src: cfg.src,
            prefsrc: cfg.prefsrc,
            gateway: cfg.gateway,
            device,
            mtu: cfg.mtu,
            flags: cfg.flags,
            order,
            refcount: AtomicU32::new(1),
        });
        EntryRef(NonNull::from(Box::leak(boxed)))
    }

    #[inline]
    pub fn get(&self) -> &RouteEntry {
        // Safety: the pointer is valid until the last reference releases
        // it (see `release`/`table_delete`), and fields are read-only.
        unsafe { self.0.as_ref() }
    }

    #[inline]
    pub fn refcount(&self) -> u32 {
        self.get().refcount.load(Ordering::Acquire)
    }

    /// Acquire a transient reference: increments the refcount and returns
    /// the same handle (spec §4.1, `acquire`). Precondition: the caller
    /// already holds a reference (the table's, or one handed out by a
    /// lookup).
    pub fn acquire(&self) -> Self {
        self.get().refcount.fetch_add(1, Ordering::AcqRel);
        *self
    }

    /// Release a transient reference (spec §4.1, `release`). If this was
    /// the last reference, frees the entry immediately.
    pub fn release(self) {
        if self.get().refcount.fetch_sub(1, Ordering::AcqRel) == 1 {
            // Safety: refcount just hit zero under us; no other handle
            // can exist (every handle pairs with exactly one increment).
            unsafe {
                drop(Box::from_raw(self.0.as_ptr()));
            }
        }
    }

    /// Logically delete this entry from the owning table (spec §4.1,
    /// `free`). Does **not** decrement the refcount: the table's own unit
    /// of refcount is what is being disposed of here, either by freeing
    /// the entry outright (no one else holds a reference) or by handing
    /// that unit to the dustbin until outstanding transient references
    /// drain (spec §3, invariant 3).
    pub fn table_delete(self) -> DeleteOutcome {
        if self.refcount() > 1 {
            DeleteOutcome::Dustbin
        } else {
            unsafe {
                drop(Box::from_raw(self.0.as_ptr()));
            }
            DeleteOutcome::FreedImmediately
        }
    }

    /// Pointer identity, used by the dustbin to compare/remove entries
    /// without re-deriving a `RouteEntry`.
    #[inline]
    pub fn addr(&self) -> usize {
        self.0.as_ptr() as usize
    }

    /// Free an entry parked in the dustbin. Callers (the dustbin alone)
    /// must have already confirmed `refcount() <= 1`: that remaining unit
    /// is the one the table handed over in [`Self::table_delete`], not an
    /// active borrower, so reclaiming it here is sound.
    pub fn dustbin_reclaim(self) {
        debug_assert!(self.refcount() <= 1, "dustbin reclaimed an entry still borrowed");
        unsafe {
            drop(Box::from_raw(self.0.as_ptr()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Opcode;
    use std::net::Ipv6Addr;

    fn cfg() -> RouteConfig {
        RouteConfig {
            ops: Opcode::Add,
            dst: Ipv6Prefix::new("2001:db8::".parse().unwrap(), 32).unwrap(),
            src: Ipv6Prefix::default_route(),
            prefsrc: Ipv6Prefix::default_route(),
            gateway: Ipv6Addr::UNSPECIFIED,
            ifname: crate::device::IfName::new("eth0").unwrap(),
            mtu: 0,
            flags: 0,
        }
    }

    #[test]
    fn fresh_entry_has_refcount_one() {
        let e = EntryRef::publish(&cfg(), None, 0);
        assert_eq!(e.refcount(), 1);
        e.table_delete();
    }

    #[test]
    fn acquire_then_release_returns_to_baseline() {
        let e = EntryRef::publish(&cfg(), None, 0);
        let borrowed = e.acquire();
        assert_eq!(e.refcount(), 2);
        borrowed.release();
        assert_eq!(e.refcount(), 1);
        e.table_delete();
    }

    #[test]
    fn table_delete_frees_immediately_with_no_borrowers() {
        let e = EntryRef::publish(&cfg(), None, 0);
        assert_eq!(e.table_delete(), DeleteOutcome::FreedImmediately);
    }

    #[test]
    fn table_delete_defers_while_borrowed() {
        let e = EntryRef::publish(&cfg(), None, 0);
        let borrowed = e.acquire();
        assert_eq!(e.table_delete(), DeleteOutcome::Dustbin);
        // The table's unit now lives in the dustbin; the transient
        // reference is still valid until released.
        assert_eq!(borrowed.refcount(), 2);
        borrowed.release();
        // Refcount is 1: only the dustbin's inherited unit remains.
        assert_eq!(e.refcount(), 1);
        e.dustbin_reclaim();
    }
}
