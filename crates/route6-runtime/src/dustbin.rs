//! Per-worker deferred reclamation (spec §4.3).
//!
//! The teacher's timer subsystem runs a dedicated OS thread that polls a
//! shared backend and wakes a ready queue. The dustbin doesn't need that:
//! its reclamation tick only ever touches the single worker's own list
//! (spec §5, "The dustbin timer ... is purely local"), so it is serviced
//! in-line from the worker's cooperative loop rather than from a second
//! thread, the same way `rte_timer_manage()` is called from inside a
//! DPDK lcore's own poll loop rather than from a separate timer thread.

use route6_core::constants::{RECYCLE_TIME_DEFAULT_SECS, RECYCLE_TIME_MAX_SECS, RECYCLE_TIME_MIN_SECS};
use route6_core::EntryRef;
use route6_core::{rt6_debug, rt6_warn};
use std::time::{Duration, Instant};

/// Clamp a requested recycle interval into `[1, 36000]` seconds, warning
/// and falling back to the default when out of range (spec §4.5).
pub fn clamp_recycle_time(requested: Duration) -> Duration {
    let secs = requested.as_secs();
    if secs < RECYCLE_TIME_MIN_SECS as u64 || secs > RECYCLE_TIME_MAX_SECS as u64 {
        rt6_warn!(
            "recycle_time {}s out of range [{}, {}], falling back to {}s",
            secs, RECYCLE_TIME_MIN_SECS, RECYCLE_TIME_MAX_SECS, RECYCLE_TIME_DEFAULT_SECS
        );
        Duration::from_secs(RECYCLE_TIME_DEFAULT_SECS as u64)
    } else {
        requested
    }
}

/// A worker's unordered list of entries queued by `free` (spec §3, "per-worker
/// unordered list"), plus the periodic-tick bookkeeping.
pub struct Dustbin {
    pending: Vec<EntryRef>,
    recycle_time: Duration,
    last_tick: Instant,
}

impl Dustbin {
    pub fn new(recycle_time: Duration) -> Self {
        Dustbin {
            pending: Vec::new(),
            recycle_time: clamp_recycle_time(recycle_time),
            last_tick: Instant::now(),
        }
    }

    pub fn recycle_time(&self) -> Duration {
        self.recycle_time
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queue an entry whose table reference has been handed to the
    /// dustbin (spec §4.1, `free`'s `Dustbin` outcome).
    pub fn push(&mut self, entry: EntryRef) {
        self.pending.push(entry);
    }

    /// Run a recycle pass if `recycle_time` has elapsed since the last
    /// one; returns the number of entries freed. Called from the worker's
    /// own loop, not a separate thread.
    pub fn maybe_tick(&mut self, now: Instant) -> usize {
        if now.duration_since(self.last_tick) < self.recycle_time {
            return 0;
        }
        self.last_tick = now;
        self.tick()
    }

    /// Unconditionally run one recycle pass (spec §4.3, steps 1-3): walk
    /// the list once, free every entry whose refcount has dropped to one
    /// (only the dustbin holds it), and leave the rest for a later tick.
    pub fn tick(&mut self) -> usize {
        let mut reclaimed = 0usize;
        self.pending.retain(|entry| {
            if entry.refcount() <= 1 {
                entry.dustbin_reclaim();
                reclaimed += 1;
                false
            } else {
                true
            }
        });
        if reclaimed > 0 {
            rt6_debug!("dustbin reclaimed {} entries, {} still pending", reclaimed, self.pending.len());
        }
        reclaimed
    }
}

/// One [`Dustbin`] per possible lcore, same ownership discipline as
/// [`crate::worker::LcoreTables`]: no lock, because only the owning
/// lcore's thread ever touches its own slot.
pub struct DustbinSlots {
    slots: Box<[std::cell::UnsafeCell<Dustbin>]>,
}

// Safety: see `LcoreTables` — a slot is only accessed through `with_mut`,
// which documents the same caller obligation.
unsafe impl Sync for DustbinSlots {}

impl DustbinSlots {
    pub fn new(num_lcores: usize, recycle_time: Duration) -> Self {
        let slots = (0..num_lcores)
            .map(|_| std::cell::UnsafeCell::new(Dustbin::new(recycle_time)))
            .collect::<Vec<_>>();
        DustbinSlots { slots: slots.into_boxed_slice() }
    }

    /// # Safety
    /// The caller must be the thread that owns `lcore_id` (spec §5).
    pub unsafe fn with_mut<R>(&self, lcore_id: u32, f: impl FnOnce(&mut Dustbin) -> R) -> R {
        f(&mut *self.slots[lcore_id as usize].get())
    }
}
