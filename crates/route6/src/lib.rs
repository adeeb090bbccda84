//! # route6
//!
//! Top-level facade over the per-lcore IPv6 routing core: re-exports the
//! public API of `route6-core`, `route6-engine` and `route6-runtime`, and
//! owns the [`Router`] handle that ties per-lcore tables, dustbins and
//! the replicator together.
//!
//! Thread affinity is the caller's responsibility, exactly as it is for
//! the lower-level `unsafe fn with`/`with_mut` accessors this wraps:
//! [`Router::input`], [`Router::output`] and [`Router::tick`] for a given
//! `lcore_id` must only ever be called from the single thread pinned to
//! that lcore (spec §5, "No worker reads or mutates another worker's
//! table"); [`Router::admin_add`]/[`admin_del`](Router::admin_del)/[`admin_show`](Router::admin_show)
//! must only be called from the master lcore's thread.

pub use route6_core::config::{self as route_config, Opcode};
pub use route6_core::log;
pub use route6_core::{
    rt6_debug, rt6_error, rt6_info, rt6_trace, rt6_warn, DeviceRef, EntryRef, Flow6, IfName,
    InterfaceRegistry, Ipv6Prefix, RouteConfig, RouteError, RouteResult,
};
pub use route6_engine::{DumpFilter, EngineKind, LookupEngine, RouteDumpEntry};
pub use route6_runtime::{BusMessage, Dustbin, DustbinSlots, LcoreTables, Replicator, Route6Config};

use std::sync::Arc;
use std::time::Instant;

/// Runtime handle for the routing core: owns every lcore's table and
/// dustbin, plus the replicator bus, and dispatches admin mutations
/// through the master-first protocol (spec §4.4).
pub struct Router {
    tables: LcoreTables,
    dustbins: DustbinSlots,
    replicator: Replicator,
    registry: Arc<dyn InterfaceRegistry>,
    master_lcore: u32,
}

impl Router {
    /// Lcore 0 is always the master (mirrors `rte_get_master_lcore()`
    /// returning the first lcore in the default EAL configuration).
    pub const MASTER_LCORE: u32 = 0;

    /// Build a router and initialize every lcore's table
    /// (spec §4.2, `setup`; supplemented "lcore enumeration at init").
    pub fn new(config: Route6Config, registry: Arc<dyn InterfaceRegistry>) -> Self {
        config.validate().expect("invalid route6 configuration");
        let tables = LcoreTables::new(config.num_workers);
        for lcore in 0..config.num_workers as u32 {
            tables.setup(lcore, route6_engine::new_engine(config.method));
        }
        let dustbins = DustbinSlots::new(config.num_workers, config.recycle_time);
        let replicator = Replicator::new(config.num_workers, Self::MASTER_LCORE, config.mailbox_capacity);
        Router {
            tables,
            dustbins,
            replicator,
            registry,
            master_lcore: Self::MASTER_LCORE,
        }
    }

    pub fn num_lcores(&self) -> usize {
        self.tables.len()
    }

    /// Tear down every lcore, handing every outstanding entry through
    /// that lcore's own dustbin rather than freeing it outright (spec
    /// §4.2, `destroy`; supplemented "lcore enumeration at init").
    pub fn teardown_all(&self) {
        for lcore in 0..self.num_lcores() as u32 {
            let drained = self.tables.teardown(lcore);
            for entry in drained {
                if entry.table_delete() == route6_core::DeleteOutcome::Dustbin {
                    unsafe { self.dustbins.with_mut(lcore, |bin| bin.push(entry)) };
                }
            }
        }
    }

    /// Packet-received lookup on `lcore_id`'s table (spec §4.2, `input`).
    ///
    /// # Safety obligation
    /// Must be called only from the thread pinned to `lcore_id`.
    pub fn input(&self, lcore_id: u32, flow: &Flow6) -> RouteResult<EntryRef> {
        unsafe { self.tables.with(lcore_id, |engine| engine.input(flow)) }
    }

    /// Packet-about-to-transmit lookup on `lcore_id`'s table (spec §4.2,
    /// `output`). Same safety obligation as [`Self::input`].
    pub fn output(&self, lcore_id: u32, flow: &Flow6) -> RouteResult<EntryRef> {
        unsafe { self.tables.with(lcore_id, |engine| engine.output(flow)) }
    }

    /// Service `lcore_id`'s bus mailbox and dustbin once; called from
    /// that lcore's own cooperative loop (spec §5).
    pub fn tick(&self, lcore_id: u32, now: Instant) {
        unsafe {
            self.dustbins.with_mut(lcore_id, |bin| {
                route6_runtime::admin::service_bus(&self.tables, lcore_id, bin, self.registry.as_ref(), &self.replicator);
                bin.maybe_tick(now);
            });
        }
    }

    /// Admin `ADD`/`DEL` request, run through the master-first protocol
    /// (spec §4.4). Must be called from the master lcore's thread.
    pub fn admin_apply(&self, req: RouteConfig) -> RouteResult<u64> {
        unsafe {
            self.dustbins.with_mut(self.master_lcore, |bin| {
                route6_runtime::admin::admin_apply(&self.tables, &self.replicator, self.registry.as_ref(), bin, req)
            })
        }
    }

    /// `ROUTE6_SHOW` for `lcore_id`'s table (spec §4.2, `dump`).
    pub fn admin_show(&self, lcore_id: u32, filter: Option<&DumpFilter>) -> Vec<RouteDumpEntry> {
        route6_runtime::admin::admin_show(&self.tables, lcore_id, filter)
    }

    /// SLAAC sync path: a non-master lcore forwards an auto-discovered
    /// route to the master instead of applying it locally (spec §4.4).
    pub fn slaac_sync(&self, cfg: RouteConfig) -> Result<(), route6_core::channel::MailboxFull> {
        self.replicator.send_to_master(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    struct FakeRegistry;
    impl InterfaceRegistry for FakeRegistry {
        fn interface_by_name(&self, name: &IfName) -> Option<DeviceRef> {
            Some(DeviceRef { index: 1, name: *name })
        }
    }

    fn req(ops: Opcode, addr: &str, plen: u8) -> RouteConfig {
        RouteConfig {
            ops,
            dst: Ipv6Prefix::new(addr.parse().unwrap(), plen).unwrap(),
            src: Ipv6Prefix::default_route(),
            prefsrc: Ipv6Prefix::default_route(),
            gateway: Ipv6Addr::UNSPECIFIED,
            ifname: IfName::new("eth0").unwrap(),
            mtu: 0,
            flags: route_config::flags::USER_CONFIGURED,
        }
    }

    #[test]
    fn end_to_end_add_then_lookup_on_a_slave() {
        let router = Router::new(Route6Config::new().num_workers(3), Arc::new(FakeRegistry));
        router.admin_apply(req(Opcode::Add, "2001:db8::", 32)).unwrap();
        router.tick(1, Instant::now());

        let hit = router.output(1, &Flow6::new("2001:db8::1".parse().unwrap())).unwrap();
        assert_eq!(hit.get().dst.plen(), 32);
        hit.release();
    }

    #[test]
    fn teardown_all_does_not_leak_and_drains_every_lcore() {
        let router = Router::new(Route6Config::new().num_workers(2), Arc::new(FakeRegistry));
        router.admin_apply(req(Opcode::Add, "2001:db8::", 32)).unwrap();
        router.tick(1, Instant::now());
        router.teardown_all();
        for lcore in 0..2u32 {
            assert_eq!(router.admin_show(lcore, None).len(), 0);
        }
    }

    #[test]
    fn del_without_outstanding_borrow_frees_immediately() {
        let router = Router::new(Route6Config::new().num_workers(2), Arc::new(FakeRegistry));
        router.admin_apply(req(Opcode::Add, "2001:db8::", 32)).unwrap();
        router.admin_apply(req(Opcode::Del, "2001:db8::", 32)).unwrap();
        assert_eq!(router.admin_show(Router::MASTER_LCORE, None).len(), 0);
    }
}
