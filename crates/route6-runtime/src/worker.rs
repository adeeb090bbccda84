//! Per-lcore table ownership (spec §5, "Ownership of tables").
//!
//! Adapted from the teacher's `WorkerStates` contiguous, cache-line-aligned
//! array: instead of one fixed-size POD struct per worker, each slot here
//! holds an optional boxed [`LookupEngine`] trait object behind an
//! `UnsafeCell`. No lock guards it, because the invariant that makes the
//! fast path lock-free is narrower than mutual exclusion: a slot is never
//! touched by any thread other than the worker that owns it. Every
//! accessor that can violate that invariant is `unsafe` and documents the
//! obligation on the caller.

use route6_core::constants::MAX_LCORES;
use route6_core::EntryRef;
use route6_engine::LookupEngine;
use std::cell::UnsafeCell;

#[repr(align(64))]
struct LcoreSlot {
    table: UnsafeCell<Option<Box<dyn LookupEngine>>>,
}

impl Default for LcoreSlot {
    fn default() -> Self {
        LcoreSlot { table: UnsafeCell::new(None) }
    }
}

/// Contiguous array of per-lcore tables, one slot per possible lcore id
/// up to [`MAX_LCORES`] (spec §4.5, `num_workers`).
pub struct LcoreTables {
    slots: Box<[LcoreSlot]>,
}

// Safety: slots are only ever dereferenced through `setup`/`teardown`
// (called once, before/after the owning worker's loop runs) or through
// `with`/`with_mut` (documented as the owning worker's responsibility).
unsafe impl Sync for LcoreTables {}

impl LcoreTables {
    pub fn new(num_lcores: usize) -> Self {
        assert!(num_lcores > 0 && num_lcores <= MAX_LCORES, "num_lcores out of range");
        let slots = (0..num_lcores).map(|_| LcoreSlot::default()).collect::<Vec<_>>();
        LcoreTables { slots: slots.into_boxed_slice() }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Install a freshly constructed engine for `lcore_id` (spec §4.2,
    /// `setup`). Idempotent per worker: calling this again simply replaces
    /// the slot.
    pub fn setup(&self, lcore_id: u32, mut engine: Box<dyn LookupEngine>) {
        engine.setup(lcore_id);
        // Safety: called by the owner before any concurrent `with`/`with_mut`
        // on this slot begins.
        unsafe {
            *self.slots[lcore_id as usize].table.get() = Some(engine);
        }
    }

    /// Tear down `lcore_id`'s table, returning every entry it held so the
    /// caller can route each through the dustbin (spec §4.2, `destroy`).
    pub fn teardown(&self, lcore_id: u32) -> Vec<EntryRef> {
        // Safety: called by the owner once it has stopped servicing
        // `lcore_id`'s mailbox and packet path.
        unsafe {
            let slot = &mut *self.slots[lcore_id as usize].table.get();
            match slot.as_mut() {
                Some(engine) => {
                    let drained = engine.destroy(lcore_id);
                    *slot = None;
                    drained
                }
                None => Vec::new(),
            }
        }
    }

    /// Read-only access to `lcore_id`'s table.
    ///
    /// # Safety
    /// The caller must be the thread that owns `lcore_id`, or must
    /// otherwise guarantee no concurrent `with_mut` on the same slot
    /// (spec §5: "No worker reads or mutates another worker's table").
    pub unsafe fn with<R>(&self, lcore_id: u32, f: impl FnOnce(&dyn LookupEngine) -> R) -> R {
        let slot = &*self.slots[lcore_id as usize].table.get();
        let engine = slot.as_ref().expect("lcore table not set up");
        f(engine.as_ref())
    }

    /// Mutable access to `lcore_id`'s table.
    ///
    /// # Safety
    /// Same obligation as [`Self::with`].
    pub unsafe fn with_mut<R>(&self, lcore_id: u32, f: impl FnOnce(&mut dyn LookupEngine) -> R) -> R {
        let slot = &mut *self.slots[lcore_id as usize].table.get();
        let engine = slot.as_mut().expect("lcore table not set up");
        f(engine.as_mut())
    }
}

thread_local! {
    static CURRENT_LCORE_ID: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
}

/// Bind the calling thread to `lcore_id` for the remainder of its life.
/// Also threads through to [`route6_core::log`] so log lines carry the
/// same `[lcore<id>]` tag (mirrors `set_current_worker_id` in the
/// teacher's worker module).
pub fn bind_current_lcore(lcore_id: u32) {
    CURRENT_LCORE_ID.with(|c| c.set(Some(lcore_id)));
    route6_core::log::set_lcore_id(lcore_id);
}

pub fn current_lcore_id() -> Option<u32> {
    CURRENT_LCORE_ID.with(|c| c.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use route6_core::config::Opcode;
    use route6_core::{DeviceRef, IfName, Ipv6Prefix, RouteConfig};
    use route6_engine::EngineKind;
    use std::net::Ipv6Addr;

    fn cfg() -> RouteConfig {
        RouteConfig {
            ops: Opcode::Add,
            dst: Ipv6Prefix::new("2001:db8::".parse().unwrap(), 32).unwrap(),
            src: Ipv6Prefix::default_route(),
            prefsrc: Ipv6Prefix::default_route(),
            gateway: Ipv6Addr::UNSPECIFIED,
            ifname: IfName::new("eth0").unwrap(),
            mtu: 0,
            flags: 0,
        }
    }

    #[test]
    fn setup_then_add_then_teardown_drains_entries() {
        let tables = LcoreTables::new(4);
        tables.setup(0, route6_engine::new_engine(EngineKind::Hlist));
        let device = Some(DeviceRef { index: 1, name: IfName::new("eth0").unwrap() });
        unsafe {
            tables.with_mut(0, |e| e.add(&cfg(), device)).unwrap();
        }
        let drained = tables.teardown(0);
        assert_eq!(drained.len(), 1);
        for e in drained {
            e.table_delete();
        }
    }

    #[test]
    fn current_lcore_id_roundtrips() {
        assert_eq!(current_lcore_id(), None);
        bind_current_lcore(2);
        assert_eq!(current_lcore_id(), Some(2));
    }
}
