//! Memory and topology constants for the routing core.

/// Maximum number of lcores (worker execution contexts) supported.
///
/// Mirrors the teacher runtime's `MAX_WORKERS` bound: a fixed ceiling lets
/// per-lcore state live in a single contiguous, cache-line-aligned array
/// instead of a heap-allocated, resizable collection.
pub const MAX_LCORES: usize = 64;

/// Default dustbin recycle interval, in seconds.
pub const RECYCLE_TIME_DEFAULT_SECS: u32 = 10;

/// Minimum accepted `recycle_time`, in seconds.
pub const RECYCLE_TIME_MIN_SECS: u32 = 1;

/// Maximum accepted `recycle_time`, in seconds.
pub const RECYCLE_TIME_MAX_SECS: u32 = 36_000;

/// Bound on the stored interface name, matching `IFNAMSIZ`-style limits.
pub const IFNAME_SIZE: usize = 16;

/// Cache line size used for alignment of per-lcore state.
pub const CACHE_LINE_SIZE: usize = 64;

/// Sentinel lcore id meaning "not running on a worker".
pub const LCORE_NONE: u32 = u32::MAX;
