//! # route6-engine
//!
//! The two interchangeable lookup-engine implementations (spec §4.2): a
//! trie-based longest-prefix-match table (`Lpm`) and a hash-table-backed
//! linear-scan table (`Hlist`), both behind the shared [`LookupEngine`]
//! trait so `route6-runtime` can select one at startup without caring
//! which it got.

pub mod common;
pub mod hlist;
pub mod lpm;

pub use common::{DumpFilter, EngineFactory, EngineKind, LookupEngine, RouteDumpEntry};
pub use hlist::{Hlist, HlistFactory};
pub use lpm::{Lpm, LpmFactory};

/// The built-in engine factories, mirroring the source's default
/// `g_rt6_list` registrations.
pub fn default_factories() -> Vec<Box<dyn EngineFactory>> {
    vec![Box::new(LpmFactory), Box::new(HlistFactory)]
}

/// Construct a fresh, empty engine of the requested kind.
pub fn new_engine(kind: EngineKind) -> Box<dyn LookupEngine> {
    match kind {
        EngineKind::Lpm => Box::new(Lpm::new()),
        EngineKind::Hlist => Box::new(Hlist::new()),
    }
}
