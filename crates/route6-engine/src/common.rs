//! Shared contract for the two lookup engines (LPM, HLIST): the
//! `LookupEngine` trait, the engine-selection enum, and the matching rules
//! that are identical across both storage strategies.

use route6_core::{DeviceRef, EntryRef, Flow6, IfName, Ipv6Prefix, RouteConfig, RouteResult};
use std::net::Ipv6Addr;

/// Which storage strategy a table uses. Chosen once at startup (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Lpm,
    Hlist,
}

impl EngineKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lpm" => Some(EngineKind::Lpm),
            "hlist" => Some(EngineKind::Hlist),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Lpm => "lpm",
            EngineKind::Hlist => "hlist",
        }
    }
}

/// Optional filter applied by the admin `show` path (spec §4.2, `dump`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpFilter {
    pub device: Option<DeviceRef>,
}

impl DumpFilter {
    fn admits(&self, entry: &route6_core::RouteEntry) -> bool {
        match self.device {
            None => true,
            Some(want) => entry.device == Some(want),
        }
    }
}

/// A concrete, human-readable stand-in for the "opaque blob" `dump()`
/// returns in the source (spec §4.2). Admin layers serialize this to text.
#[derive(Debug, Clone, Copy)]
pub struct RouteDumpEntry {
    pub dst: Ipv6Prefix,
    pub gateway: Ipv6Addr,
    pub ifname: Option<IfName>,
    pub mtu: u32,
    pub flags: u32,
    pub refcount: u32,
}

impl RouteDumpEntry {
    pub fn from_entry(entry: &EntryRef) -> Self {
        let e = entry.get();
        RouteDumpEntry {
            dst: e.dst,
            gateway: e.gateway,
            ifname: e.device.map(|d| d.name),
            mtu: e.mtu,
            flags: e.flags,
            refcount: entry.refcount(),
        }
    }
}

/// The contract both engine variants implement (spec §4.2).
pub trait LookupEngine: Send {
    fn kind(&self) -> EngineKind;

    /// Idempotent per worker (spec §4.2).
    fn setup(&mut self, lcore_id: u32);

    /// Releases every entry this table holds, handing the table's own
    /// reference on each to the caller so it can be routed through the
    /// dustbin (spec §4.2, "forwarding them through the dustbin").
    fn destroy(&mut self, lcore_id: u32) -> Vec<EntryRef>;

    /// Packet-received lookup: longest match, device-constrained (spec §4.2).
    fn input(&self, flow: &Flow6) -> RouteResult<EntryRef>;

    /// Packet-about-to-transmit lookup: longest match, direct-preferred
    /// (spec §4.2).
    fn output(&self, flow: &Flow6) -> RouteResult<EntryRef>;

    /// Exact lookup by administrative identity; never increments refcount
    /// (spec §4.2).
    fn get(&self, identity: (Ipv6Prefix, IfName, Ipv6Addr)) -> Option<EntryRef>;

    /// Installs one entry. Fails with `Exists` if `get` on the same
    /// identity would succeed (spec §4.2).
    fn add(&mut self, cfg: &RouteConfig, device: Option<DeviceRef>) -> RouteResult<()>;

    /// Removes one entry, returning the table's own reference to it
    /// un-deleted: the caller (runtime layer) calls
    /// [`route6_core::EntryRef::table_delete`] and routes the outcome to
    /// the dustbin. Fails with `NotExist` if no entry matches (spec §4.2).
    fn del(&mut self, cfg: &RouteConfig) -> RouteResult<EntryRef>;

    fn dump(&self, filter: Option<&DumpFilter>) -> Vec<RouteDumpEntry>;
}

/// Registers a named engine constructor, mirroring the source's
/// `route6_method_register`/`route6_method_unregister` list so a third
/// engine could be added without touching the runtime crate.
pub trait EngineFactory: Send + Sync {
    fn kind(&self) -> EngineKind;
    fn create(&self) -> Box<dyn LookupEngine>;
}

/// Select the best entry among candidates sharing one destination prefix
/// for an *input* lookup: the route's device, if set, must equal the
/// packet's ingress device; among entries that qualify, the earliest
/// inserted wins (spec §4.2, "earliest wins").
pub(crate) fn select_input(candidates: &[EntryRef], ingress: Option<DeviceRef>) -> Option<EntryRef> {
    candidates
        .iter()
        .filter(|e| match e.get().device {
            None => true,
            Some(dev) => Some(dev) == ingress,
        })
        .min_by_key(|e| e.get().order)
        .copied()
}

/// Select the best entry among candidates sharing one destination prefix
/// for an *output* lookup: directly-attached routes are preferred over
/// indirect (gatewayed) ones at the same prefix length; ties broken by
/// insertion order (spec §4.2).
pub(crate) fn select_output(candidates: &[EntryRef]) -> Option<EntryRef> {
    let direct = candidates
        .iter()
        .filter(|e| e.get().is_direct())
        .min_by_key(|e| e.get().order)
        .copied();
    direct.or_else(|| candidates.iter().min_by_key(|e| e.get().order).copied())
}

pub(crate) fn dump_candidates(all: &[EntryRef], filter: Option<&DumpFilter>) -> Vec<RouteDumpEntry> {
    all.iter()
        .filter(|e| filter.map_or(true, |f| f.admits(e.get())))
        .map(RouteDumpEntry::from_entry)
        .collect()
}

pub(crate) fn identity_matches(
    entry: &route6_core::RouteEntry,
    dst: Ipv6Prefix,
    ifname: IfName,
    gateway: Ipv6Addr,
) -> bool {
    entry.dst == dst
        && entry.gateway == gateway
        && entry.device.map(|d| d.name) == Some(ifname)
}
