//! Hash-table engine: buckets keyed by the exact canonical destination
//! prefix, scanned by descending prefix length (spec §4.2, "HLIST
//! variant"). Correctness matches the LPM engine; throughput is lower on
//! large tables because a miss at length *n* costs a hash lookup rather
//! than a single pointer hop.

use crate::common::{dump_candidates, identity_matches, select_input, select_output, DumpFilter, EngineFactory, EngineKind, LookupEngine, RouteDumpEntry};
use route6_core::{DeviceRef, EntryRef, Flow6, IfName, Ipv6Prefix, RouteConfig, RouteError, RouteResult};
use std::collections::HashMap;
use std::net::Ipv6Addr;

/// Hash-list table, owned exclusively by one worker.
#[derive(Default)]
pub struct Hlist {
    buckets: HashMap<Ipv6Prefix, Vec<EntryRef>>,
    next_order: u64,
    lcore_id: u32,
}

impl Hlist {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_key(addr: &Ipv6Addr, plen: u8) -> Ipv6Prefix {
        Ipv6Prefix::new_unchecked(*addr, plen).canonicalize()
    }
}

impl LookupEngine for Hlist {
    fn kind(&self) -> EngineKind {
        EngineKind::Hlist
    }

    fn setup(&mut self, lcore_id: u32) {
        self.lcore_id = lcore_id;
    }

    fn destroy(&mut self, _lcore_id: u32) -> Vec<EntryRef> {
        self.buckets.drain().flat_map(|(_, v)| v).collect()
    }

    fn input(&self, flow: &Flow6) -> RouteResult<EntryRef> {
        for plen in (0..=128u8).rev() {
            let key = Self::bucket_key(&flow.dst, plen);
            if let Some(bucket) = self.buckets.get(&key) {
                if let Some(hit) = select_input(bucket, flow.device) {
                    return Ok(hit.acquire());
                }
            }
        }
        Err(RouteError::NoRoute)
    }

    fn output(&self, flow: &Flow6) -> RouteResult<EntryRef> {
        for plen in (0..=128u8).rev() {
            let key = Self::bucket_key(&flow.dst, plen);
            if let Some(bucket) = self.buckets.get(&key) {
                if let Some(hit) = select_output(bucket) {
                    return Ok(hit.acquire());
                }
            }
        }
        Err(RouteError::NoRoute)
    }

    fn get(&self, identity: (Ipv6Prefix, IfName, Ipv6Addr)) -> Option<EntryRef> {
        let (dst, ifname, gateway) = identity;
        self.buckets
            .get(&dst)?
            .iter()
            .find(|e| identity_matches(e.get(), dst, ifname, gateway))
            .copied()
    }

    fn add(&mut self, cfg: &RouteConfig, device: Option<DeviceRef>) -> RouteResult<()> {
        let identity = cfg.identity();
        if self.get(identity).is_some() {
            return Err(RouteError::Exists);
        }
        let order = self.next_order;
        self.buckets
            .entry(identity.0)
            .or_default()
            .push(EntryRef::publish(&cfg.canonicalized(), device, order));
        self.next_order += 1;
        Ok(())
    }

    fn del(&mut self, cfg: &RouteConfig) -> RouteResult<EntryRef> {
        let (dst, ifname, gateway) = cfg.identity();
        let bucket = self.buckets.get_mut(&dst).ok_or(RouteError::NotExist)?;
        let pos = bucket
            .iter()
            .position(|e| identity_matches(e.get(), dst, ifname, gateway))
            .ok_or(RouteError::NotExist)?;
        let removed = bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&dst);
        }
        Ok(removed)
    }

    fn dump(&self, filter: Option<&DumpFilter>) -> Vec<RouteDumpEntry> {
        let all: Vec<EntryRef> = self.buckets.values().flatten().copied().collect();
        dump_candidates(&all, filter)
    }
}

pub struct HlistFactory;

impl EngineFactory for HlistFactory {
    fn kind(&self) -> EngineKind {
        EngineKind::Hlist
    }

    fn create(&self) -> Box<dyn LookupEngine> {
        Box::new(Hlist::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use route6_core::config::Opcode;

    fn mk_cfg(addr: &str, plen: u8, gateway: &str, ifname: &str) -> RouteConfig {
        RouteConfig {
            ops: Opcode::Add,
            dst: Ipv6Prefix::new(addr.parse().unwrap(), plen).unwrap(),
            src: Ipv6Prefix::default_route(),
            prefsrc: Ipv6Prefix::default_route(),
            gateway: gateway.parse().unwrap(),
            ifname: IfName::new(ifname).unwrap(),
            mtu: 0,
            flags: 0,
        }
    }

    fn dev(index: u32, name: &str) -> DeviceRef {
        DeviceRef { index, name: IfName::new(name).unwrap() }
    }

    #[test]
    fn add_then_get_round_trips() {
        let mut h = Hlist::new();
        let cfg = mk_cfg("2001:db8::", 32, "::", "eth0");
        h.add(&cfg, Some(dev(1, "eth0"))).unwrap();
        assert!(h.get(cfg.identity()).is_some());
    }

    #[test]
    fn add_duplicate_identity_fails_with_exists() {
        let mut h = Hlist::new();
        let cfg = mk_cfg("2001:db8::", 32, "::", "eth0");
        h.add(&cfg, Some(dev(1, "eth0"))).unwrap();
        assert_eq!(h.add(&cfg, Some(dev(1, "eth0"))), Err(RouteError::Exists));
    }

    #[test]
    fn del_removes_empty_bucket() {
        let mut h = Hlist::new();
        let cfg = mk_cfg("2001:db8::", 32, "::", "eth0");
        h.add(&cfg, Some(dev(1, "eth0"))).unwrap();
        let removed = h.del(&cfg).unwrap();
        assert_eq!(removed.table_delete(), route6_core::DeleteOutcome::FreedImmediately);
        assert!(h.buckets.is_empty());
    }

    #[test]
    fn longest_prefix_wins_even_though_storage_is_a_hash_table() {
        let mut h = Hlist::new();
        h.add(&mk_cfg("2001:db8::", 32, "::", "eth0"), Some(dev(1, "eth0"))).unwrap();
        h.add(&mk_cfg("2001:db8:1::", 48, "::", "eth1"), Some(dev(2, "eth1"))).unwrap();

        let hit = h.output(&Flow6::new("2001:db8:1::1".parse().unwrap())).unwrap();
        assert_eq!(hit.get().dst.plen(), 48);
        hit.release();
    }

    #[test]
    fn no_match_returns_no_route() {
        let h = Hlist::new();
        assert_eq!(
            h.output(&Flow6::new("2001:db8::1".parse().unwrap())),
            Err(RouteError::NoRoute)
        );
    }

    #[test]
    fn input_requires_device_match_when_set() {
        let mut h = Hlist::new();
        h.add(&mk_cfg("2001:db8::", 32, "::", "eth0"), Some(dev(1, "eth0"))).unwrap();
        let wrong = Flow6::new("2001:db8::1".parse().unwrap()).with_device(dev(9, "eth9"));
        assert_eq!(h.input(&wrong), Err(RouteError::NoRoute));
    }

    #[test]
    fn destroy_hands_back_every_entry() {
        let mut h = Hlist::new();
        h.add(&mk_cfg("2001:db8::", 32, "::", "eth0"), Some(dev(1, "eth0"))).unwrap();
        h.add(&mk_cfg("2001:db9::", 32, "::", "eth0"), Some(dev(1, "eth0"))).unwrap();
        let drained = h.destroy(0);
        assert_eq!(drained.len(), 2);
        for e in drained {
            e.table_delete();
        }
    }
}
