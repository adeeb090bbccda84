//! Longest-prefix-match engine: a binary trie over the 128 address bits
//! (spec §4.2, "LPM variant").

use crate::common::{dump_candidates, identity_matches, select_input, select_output, DumpFilter, EngineFactory, EngineKind, LookupEngine, RouteDumpEntry};
use route6_core::{DeviceRef, EntryRef, Flow6, IfName, InvalidReason, Ipv6Prefix, RouteConfig, RouteError, RouteResult};
use std::net::Ipv6Addr;

#[derive(Default)]
struct TrieNode {
    entries: Vec<EntryRef>,
    children: [Option<Box<TrieNode>>; 2],
}

impl TrieNode {
    fn collect_into(&self, out: &mut Vec<EntryRef>) {
        out.extend_from_slice(&self.entries);
        for child in self.children.iter().flatten() {
            child.collect_into(out);
        }
    }
}

fn bit_at(addr: &Ipv6Addr, i: u32) -> usize {
    ((u128::from(*addr) >> (127 - i)) & 1) as usize
}

/// Longest-prefix-match table, owned exclusively by one worker.
pub struct Lpm {
    root: TrieNode,
    next_order: u64,
    lcore_id: u32,
}

impl Default for Lpm {
    fn default() -> Self {
        Lpm {
            root: TrieNode::default(),
            next_order: 0,
            lcore_id: 0,
        }
    }
}

impl Lpm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes from root to the deepest reachable prefix of `addr`, in
    /// descending-specificity order (most specific first) so callers can
    /// try the longest candidate first.
    fn path_from_longest<'a>(&'a self, addr: &Ipv6Addr) -> Vec<&'a TrieNode> {
        let mut path = vec![&self.root];
        let mut node = &self.root;
        for i in 0..128u32 {
            match &node.children[bit_at(addr, i)] {
                Some(child) => {
                    node = child;
                    path.push(node);
                }
                None => break,
            }
        }
        path.reverse();
        path
    }

    fn node_at_mut(&mut self, dst: &Ipv6Prefix, create: bool) -> Option<&mut TrieNode> {
        let mut node = &mut self.root;
        for i in 0..dst.plen() as u32 {
            let bit = bit_at(&dst.addr(), i);
            if node.children[bit].is_none() {
                if !create {
                    return None;
                }
                node.children[bit] = Some(Box::new(TrieNode::default()));
            }
            node = node.children[bit].as_mut().unwrap();
        }
        Some(node)
    }
}

impl LookupEngine for Lpm {
    fn kind(&self) -> EngineKind {
        EngineKind::Lpm
    }

    fn setup(&mut self, lcore_id: u32) {
        self.lcore_id = lcore_id;
    }

    fn destroy(&mut self, _lcore_id: u32) -> Vec<EntryRef> {
        let mut out = Vec::new();
        self.root.collect_into(&mut out);
        self.root = TrieNode::default();
        out
    }

    fn input(&self, flow: &Flow6) -> RouteResult<EntryRef> {
        for node in self.path_from_longest(&flow.dst) {
            if let Some(hit) = select_input(&node.entries, flow.device) {
                return Ok(hit.acquire());
            }
        }
        Err(RouteError::NoRoute)
    }

    fn output(&self, flow: &Flow6) -> RouteResult<EntryRef> {
        for node in self.path_from_longest(&flow.dst) {
            if let Some(hit) = select_output(&node.entries) {
                return Ok(hit.acquire());
            }
        }
        Err(RouteError::NoRoute)
    }

    fn get(&self, identity: (Ipv6Prefix, IfName, Ipv6Addr)) -> Option<EntryRef> {
        let (dst, ifname, gateway) = identity;
        let mut node = &self.root;
        for i in 0..dst.plen() as u32 {
            node = node.children[bit_at(&dst.addr(), i)].as_deref()?;
        }
        node.entries
            .iter()
            .find(|e| identity_matches(e.get(), dst, ifname, gateway))
            .copied()
    }

    fn add(&mut self, cfg: &RouteConfig, device: Option<DeviceRef>) -> RouteResult<()> {
        let identity = cfg.identity();
        if self.get(identity).is_some() {
            return Err(RouteError::Exists);
        }
        let dst = identity.0;
        let order = self.next_order;
        let node = self
            .node_at_mut(&dst, true)
            .ok_or(RouteError::Invalid(InvalidReason::BadPrefixLength))?;
        node.entries.push(EntryRef::publish(&cfg.canonicalized(), device, order));
        self.next_order += 1;
        Ok(())
    }

    fn del(&mut self, cfg: &RouteConfig) -> RouteResult<EntryRef> {
        let (dst, ifname, gateway) = cfg.identity();
        let node = self.node_at_mut(&dst, false).ok_or(RouteError::NotExist)?;
        let pos = node
            .entries
            .iter()
            .position(|e| identity_matches(e.get(), dst, ifname, gateway))
            .ok_or(RouteError::NotExist)?;
        Ok(node.entries.remove(pos))
    }

    fn dump(&self, filter: Option<&DumpFilter>) -> Vec<RouteDumpEntry> {
        let mut all = Vec::new();
        self.root.collect_into(&mut all);
        dump_candidates(&all, filter)
    }
}

pub struct LpmFactory;

impl EngineFactory for LpmFactory {
    fn kind(&self) -> EngineKind {
        EngineKind::Lpm
    }

    fn create(&self) -> Box<dyn LookupEngine> {
        Box::new(Lpm::new())
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
        let mut lpm = Lpm::new();
        let cfg = mk_cfg("2001:db8::", 32, "::", "eth0");
        lpm.add(&cfg, Some(dev(1, "eth0"))).unwrap();
        assert!(lpm.get(cfg.identity()).is_some());
    }

    #[test]
    fn add_duplicate_identity_fails_with_exists() {
        let mut lpm = Lpm::new();
        let cfg = mk_cfg("2001:db8::", 32, "::", "eth0");
        lpm.add(&cfg, Some(dev(1, "eth0"))).unwrap();
        assert_eq!(lpm.add(&cfg, Some(dev(1, "eth0"))), Err(RouteError::Exists));
    }

    #[test]
    fn del_missing_fails_with_not_exist() {
        let mut lpm = Lpm::new();
        let cfg = mk_cfg("2001:db8::", 32, "::", "eth0");
        assert_eq!(lpm.del(&cfg), Err(RouteError::NotExist));
    }

    #[test]
    fn longest_prefix_wins() {
        let mut lpm = Lpm::new();
        lpm.add(&mk_cfg("2001:db8::", 32, "::", "eth0"), Some(dev(1, "eth0"))).unwrap();
        lpm.add(&mk_cfg("2001:db8:1::", 48, "::", "eth1"), Some(dev(2, "eth1"))).unwrap();

        let hit = lpm
            .output(&Flow6::new("2001:db8:1::1".parse().unwrap()))
            .unwrap();
        assert_eq!(hit.get().dst.plen(), 48);
        hit.release();

        let hit2 = lpm
            .output(&Flow6::new("2001:db8:2::1".parse().unwrap()))
            .unwrap();
        assert_eq!(hit2.get().dst.plen(), 32);
        hit2.release();
    }

    #[test]
    fn no_match_returns_no_route() {
        let lpm = Lpm::new();
        assert_eq!(
            lpm.output(&Flow6::new("2001:db8::1".parse().unwrap())),
            Err(RouteError::NoRoute)
        );
    }

    #[test]
    fn input_requires_device_match_when_set() {
        let mut lpm = Lpm::new();
        lpm.add(&mk_cfg("2001:db8::", 32, "::", "eth0"), Some(dev(1, "eth0"))).unwrap();

        let flow_wrong_device = Flow6::new("2001:db8::1".parse().unwrap()).with_device(dev(9, "eth9"));
        assert_eq!(lpm.input(&flow_wrong_device), Err(RouteError::NoRoute));

        let flow_right_device = Flow6::new("2001:db8::1".parse().unwrap()).with_device(dev(1, "eth0"));
        lpm.input(&flow_right_device).unwrap().release();
    }

    #[test]
    fn output_prefers_direct_over_indirect_at_same_length() {
        let mut lpm = Lpm::new();
        lpm.add(&mk_cfg("2001:db8::", 64, "fe80::1", "eth0"), Some(dev(1, "eth0"))).unwrap();
        lpm.add(&mk_cfg("2001:db8::", 64, "::", "eth1"), Some(dev(2, "eth1"))).unwrap();

        let hit = lpm.output(&Flow6::new("2001:db8::1".parse().unwrap())).unwrap();
        assert!(hit.get().is_direct());
        hit.release();
    }

    #[test]
    fn earliest_wins_among_equal_length_indirect_routes() {
        let mut lpm = Lpm::new();
        lpm.add(&mk_cfg("2001:db8::", 64, "fe80::1", "eth0"), Some(dev(1, "eth0"))).unwrap();
        lpm.add(&mk_cfg("2001:db8::", 64, "fe80::2", "eth1"), Some(dev(2, "eth1"))).unwrap();

        let hit = lpm.output(&Flow6::new("2001:db8::1".parse().unwrap())).unwrap();
        assert_eq!(hit.get().gateway, "fe80::1".parse::<Ipv6Addr>().unwrap());
        hit.release();
    }

    #[test]
    fn destroy_hands_back_every_entry() {
        let mut lpm = Lpm::new();
        lpm.add(&mk_cfg("2001:db8::", 32, "::", "eth0"), Some(dev(1, "eth0"))).unwrap();
        lpm.add(&mk_cfg("2001:db9::", 32, "::", "eth0"), Some(dev(1, "eth0"))).unwrap();
        let drained = lpm.destroy(0);
        assert_eq!(drained.len(), 2);
        for e in drained {
            assert_eq!(e.table_delete(), route6_core::DeleteOutcome::FreedImmediately);
        }
    }
}
