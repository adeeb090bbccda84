//! Runtime configuration (spec §4.5), following the shape of the
//! teacher's `SchedulerConfig`: a `Default` + builder struct validated by
//! `.validate()`, with warn-and-fallback behavior for out-of-range knobs
//! instead of hard failure.

use route6_core::constants::{MAX_LCORES, RECYCLE_TIME_DEFAULT_SECS, RECYCLE_TIME_MAX_SECS, RECYCLE_TIME_MIN_SECS};
use route6_core::rt6_warn;
use route6_engine::EngineKind;
use std::time::Duration;

/// Runtime-wide configuration: engine variant, dustbin recycle interval,
/// and worker count (spec §4.5).
#[derive(Debug, Clone)]
pub struct Route6Config {
    pub method: EngineKind,
    pub recycle_time: Duration,
    pub num_workers: usize,
    pub mailbox_capacity: usize,
}

impl Default for Route6Config {
    fn default() -> Self {
        Route6Config {
            method: EngineKind::Hlist,
            recycle_time: Duration::from_secs(RECYCLE_TIME_DEFAULT_SECS as u64),
            num_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4).min(MAX_LCORES),
            mailbox_capacity: 256,
        }
    }
}

impl Route6Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the engine variant. Any parse failure upstream (e.g. an
    /// unrecognised `method` keyword) should fall back to the default
    /// before reaching here; see [`parse_method`].
    pub fn method(mut self, method: EngineKind) -> Self {
        self.method = method;
        self
    }

    /// Set the dustbin recycle interval; out-of-range values warn and
    /// fall back to the default (spec §4.5).
    pub fn recycle_time(mut self, d: Duration) -> Self {
        self.recycle_time = crate::dustbin::clamp_recycle_time(d);
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n.clamp(1, MAX_LCORES);
        self
    }

    pub fn mailbox_capacity(mut self, n: usize) -> Self {
        self.mailbox_capacity = n.max(1);
        self
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_workers == 0 {
            return Err("num_workers must be at least 1");
        }
        if self.num_workers > MAX_LCORES {
            return Err("num_workers exceeds MAX_LCORES");
        }
        let secs = self.recycle_time.as_secs();
        if secs < RECYCLE_TIME_MIN_SECS as u64 || secs > RECYCLE_TIME_MAX_SECS as u64 {
            return Err("recycle_time out of [1, 36000] seconds");
        }
        Ok(())
    }
}

/// Parse the `method` configuration keyword (spec §4.5: `method ∈
/// {"lpm","hlist"}`, default `hlist`). Any other value is warned and
/// replaced with the default rather than rejected.
pub fn parse_method(raw: &str) -> EngineKind {
    match EngineKind::from_str(raw) {
        Some(kind) => kind,
        None => {
            rt6_warn!("unknown method '{}', falling back to hlist", raw);
            EngineKind::Hlist
        }
    }
}
