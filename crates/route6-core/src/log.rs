//! Kernel-style, zero-dependency logging for the routing core.
//!
//! Every message is tagged with the current lcore id, mirroring the
//! source's `RTE_LOG(level, RT6, "[%d] ...", rte_lcore_id(), ...)` calls.
//! Level is controlled by `ROUTE6_LOG_LEVEL` (`off|error|warn|info|debug|trace`).

use crate::env::env_get_str;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    let level = LogLevel::from_str(&env_get_str("ROUTE6_LOG_LEVEL", "info"));
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

#[inline]
fn level_enabled(level: LogLevel) -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    (level as u8) <= LOG_LEVEL.load(Ordering::Relaxed)
}

thread_local! {
    static LCORE_ID: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
}

/// Set the current thread's lcore id (called once by the worker loop).
pub fn set_lcore_id(id: u32) {
    LCORE_ID.with(|c| c.set(Some(id)));
}

pub fn current_lcore_id() -> Option<u32> {
    LCORE_ID.with(|c| c.get())
}

fn context_tag() -> String {
    match current_lcore_id() {
        Some(id) => format!("[lcore{}]", id),
        None => "[lcore--]".to_string(),
    }
}

#[doc(hidden)]
pub fn _log_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    eprintln!("{} {} {}", level.prefix(), context_tag(), args);
}

#[macro_export]
macro_rules! rt6_error {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Error, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! rt6_warn {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! rt6_info {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! rt6_debug {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Debug, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! rt6_trace {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Trace, format_args!($($arg)*))
    };
}
