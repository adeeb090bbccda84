//! Admin/config surface (spec §4.4, §4.5): validates and applies
//! add/del/show requests, running the master-first replication protocol
//! for mutations.

use crate::dustbin::Dustbin;
use crate::replicator::{BusMessage, Replicator};
use crate::worker::LcoreTables;
use route6_core::config::{self, Opcode};
use route6_core::{rt6_error, rt6_info, rt6_warn};
use route6_core::{DeleteOutcome, DeviceRef, InterfaceRegistry, RouteConfig, RouteError, RouteResult};
use route6_engine::{DumpFilter, RouteDumpEntry};

fn resolve_device(registry: &dyn InterfaceRegistry, req: &RouteConfig) -> Option<DeviceRef> {
    registry.interface_by_name(&req.ifname)
}

/// Run the master-first admin protocol for `ADD`/`DEL` (spec §4.4,
/// steps 1-5). `GET`/`FLUSH` are reserved and always rejected (spec
/// §4.4, "Operation set").
///
/// On success, returns the sequence number the mutation was broadcast
/// under. A failed local apply is never broadcast (step 3).
pub fn admin_apply(
    tables: &LcoreTables,
    replicator: &Replicator,
    registry: &dyn InterfaceRegistry,
    master_dustbin: &mut Dustbin,
    req: RouteConfig,
) -> RouteResult<u64> {
    let master_lcore = replicator.master_lcore();
    let device = resolve_device(registry, &req);
    config::validate(&req, device.is_some())?;
    let cfg = req.canonicalized();

    match cfg.ops {
        Opcode::Add => {
            let result = unsafe { tables.with_mut(master_lcore, |engine| engine.add(&cfg, device)) };
            if let Err(err) = result {
                rt6_error!("master failed to add route {}: {}", cfg.dst, err);
                return Err(err);
            }
        }
        Opcode::Del => {
            let removed = unsafe { tables.with_mut(master_lcore, |engine| engine.del(&cfg)) };
            match removed {
                Ok(entry) => {
                    if entry.table_delete() == DeleteOutcome::Dustbin {
                        master_dustbin.push(entry);
                    }
                }
                Err(err) => {
                    rt6_error!("master failed to del route {}: {}", cfg.dst, err);
                    return Err(err);
                }
            }
        }
        Opcode::Get | Opcode::Flush => return Err(RouteError::NotSupported),
    }

    let seq = replicator.broadcast(cfg);
    rt6_info!("admin {:?} {} broadcast as seq={}", cfg.ops, cfg.dst, seq);
    Ok(seq)
}

/// Apply one message drained from a slave's mailbox (spec §4.4, step 5:
/// "A slave that fails to apply the mutation logs the failure but does
/// not abort or roll back the master").
pub fn apply_replicated(
    tables: &LcoreTables,
    lcore_id: u32,
    dustbin: &mut Dustbin,
    registry: &dyn InterfaceRegistry,
    msg: BusMessage,
) {
    let device = resolve_device(registry, &msg.cfg);
    match msg.cfg.ops {
        Opcode::Add => {
            if let Err(err) = unsafe { tables.with_mut(lcore_id, |engine| engine.add(&msg.cfg, device)) } {
                rt6_warn!("lcore{} failed to apply seq={} add {}: {}", lcore_id, msg.seq, msg.cfg.dst, err);
            }
        }
        Opcode::Del => match unsafe { tables.with_mut(lcore_id, |engine| engine.del(&msg.cfg)) } {
            Ok(entry) => {
                if entry.table_delete() == DeleteOutcome::Dustbin {
                    dustbin.push(entry);
                }
            }
            Err(err) => {
                rt6_warn!("lcore{} failed to apply seq={} del {}: {}", lcore_id, msg.seq, msg.cfg.dst, err);
            }
        },
        Opcode::Get | Opcode::Flush => {
            rt6_warn!("lcore{} received unsupported opcode {:?} in seq={}", lcore_id, msg.cfg.ops, msg.seq);
        }
    }
}

/// Drain every pending bus message for `lcore_id` and apply it in
/// arrival order (spec §5, "admin mutations are processed in
/// message-arrival order from the bus"). Called once per iteration of
/// the worker's own cooperative loop.
pub fn service_bus(
    tables: &LcoreTables,
    lcore_id: u32,
    dustbin: &mut Dustbin,
    registry: &dyn InterfaceRegistry,
    replicator: &Replicator,
) -> usize {
    let mut applied = 0;
    while let Some(msg) = replicator.mailbox(lcore_id).try_recv() {
        apply_replicated(tables, lcore_id, dustbin, registry, msg);
        applied += 1;
    }
    applied
}

/// `ROUTE6_SHOW`: dump one lcore's table (spec §4.2, `dump`).
pub fn admin_show(tables: &LcoreTables, lcore_id: u32, filter: Option<&DumpFilter>) -> Vec<RouteDumpEntry> {
    unsafe { tables.with(lcore_id, |engine| engine.dump(filter)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use route6_core::device::IfName;
    use route6_core::prefix::Ipv6Prefix;
    use route6_engine::EngineKind;
    use std::net::Ipv6Addr;

    struct FakeRegistry;
    impl InterfaceRegistry for FakeRegistry {
        fn interface_by_name(&self, name: &IfName) -> Option<DeviceRef> {
            if name.as_str() == "eth0" {
                Some(DeviceRef { index: 1, name: *name })
            } else {
                None
            }
        }
    }

    fn req(ops: Opcode, addr: &str, plen: u8, ifname: &str) -> RouteConfig {
        RouteConfig {
            ops,
            dst: Ipv6Prefix::new(addr.parse().unwrap(), plen).unwrap(),
            src: Ipv6Prefix::default_route(),
            prefsrc: Ipv6Prefix::default_route(),
            gateway: Ipv6Addr::UNSPECIFIED,
            ifname: IfName::new(ifname).unwrap(),
            mtu: 0,
            flags: config::flags::USER_CONFIGURED,
        }
    }

    fn setup(num_lcores: usize) -> (LcoreTables, Replicator, Dustbin) {
        let tables = LcoreTables::new(num_lcores);
        for lcore in 0..num_lcores as u32 {
            tables.setup(lcore, route6_engine::new_engine(EngineKind::Hlist));
        }
        (tables, Replicator::new(num_lcores, 0, 16), Dustbin::new(std::time::Duration::from_secs(10)))
    }

    #[test]
    fn admin_add_propagates_to_slaves() {
        let (tables, repl, mut bin) = setup(3);
        let registry = FakeRegistry;
        admin_apply(&tables, &repl, &registry, &mut bin, req(Opcode::Add, "2001:db8::", 32, "eth0")).unwrap();

        let msg = repl.mailbox(1).try_recv().expect("slave should have received broadcast");
        apply_replicated(&tables, 1, &mut bin, &registry, msg);

        let dump = admin_show(&tables, 1, None);
        assert_eq!(dump.len(), 1);
    }

    #[test]
    fn service_bus_drains_every_pending_message_in_order() {
        let (tables, repl, mut bin) = setup(2);
        let registry = FakeRegistry;
        admin_apply(&tables, &repl, &registry, &mut bin, req(Opcode::Add, "2001:db8::", 32, "eth0")).unwrap();
        admin_apply(&tables, &repl, &registry, &mut bin, req(Opcode::Add, "2001:db9::", 32, "eth0")).unwrap();

        let applied = service_bus(&tables, 1, &mut bin, &registry, &repl);
        assert_eq!(applied, 2);
        assert_eq!(admin_show(&tables, 1, None).len(), 2);
        assert!(repl.mailbox(1).is_empty());
    }

    #[test]
    fn admin_add_rejects_unknown_interface_without_touching_table() {
        let (tables, repl, mut bin) = setup(2);
        let registry = FakeRegistry;
        let err = admin_apply(&tables, &repl, &registry, &mut bin, req(Opcode::Add, "2001:db8::", 32, "ethX")).unwrap_err();
        assert!(matches!(err, RouteError::Invalid(_)));
        assert!(admin_show(&tables, 0, None).is_empty());
    }

    #[test]
    fn failed_master_apply_is_never_broadcast() {
        let (tables, repl, mut bin) = setup(2);
        let registry = FakeRegistry;
        admin_apply(&tables, &repl, &registry, &mut bin, req(Opcode::Add, "2001:db8::", 32, "eth0")).unwrap();
        // Second identical add fails with Exists and must not reach the bus.
        let before = repl.mailbox(1).len();
        assert!(admin_apply(&tables, &repl, &registry, &mut bin, req(Opcode::Add, "2001:db8::", 32, "eth0")).is_err());
        assert_eq!(repl.mailbox(1).len(), before);
    }

    #[test]
    fn get_and_flush_are_rejected() {
        let (tables, repl, mut bin) = setup(2);
        let registry = FakeRegistry;
        assert_eq!(
            admin_apply(&tables, &repl, &registry, &mut bin, req(Opcode::Get, "2001:db8::", 32, "eth0")),
            Err(RouteError::NotSupported)
        );
        assert_eq!(
            admin_apply(&tables, &repl, &registry, &mut bin, req(Opcode::Flush, "2001:db8::", 32, "eth0")),
            Err(RouteError::NotSupported)
        );
    }
}
