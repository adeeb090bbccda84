//! # route6-runtime
//!
//! Everything that turns the stateless [`route6_engine`] tables into a
//! running multi-core routing core: per-lcore table ownership
//! ([`worker::LcoreTables`]), deferred reclamation ([`dustbin::Dustbin`]),
//! the master-first replication bus ([`replicator::Replicator`]), and the
//! admin/config surface that ties them together ([`admin`], [`config`]).

pub mod admin;
pub mod config;
pub mod dustbin;
pub mod replicator;
pub mod worker;

pub use config::Route6Config;
pub use dustbin::{Dustbin, DustbinSlots};
pub use replicator::{BusMessage, Replicator};
pub use worker::LcoreTables;
