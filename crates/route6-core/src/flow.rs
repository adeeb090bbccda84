//! The lookup key passed to `input()`/`output()` (spec §4.2).

use crate::device::DeviceRef;
use std::net::Ipv6Addr;

/// Describes a single packet for the purpose of a route lookup. The
/// packet buffer itself (`mbuf`) is owned by the out-of-scope NIC/buffer
/// layer (spec §1); only the fields routing needs are carried here.
#[derive(Debug, Clone, Copy)]
pub struct Flow6 {
    pub dst: Ipv6Addr,
    /// Ingress device for `input()`; `None` when not yet known.
    pub device: Option<DeviceRef>,
    /// Preferred source hint for `output()`, e.g. from a bound socket.
    pub src_hint: Option<Ipv6Addr>,
}

impl Flow6 {
    pub fn new(dst: Ipv6Addr) -> Self {
        Self {
            dst,
            device: None,
            src_hint: None,
        }
    }

    pub fn with_device(mut self, device: DeviceRef) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_src_hint(mut self, src: Ipv6Addr) -> Self {
        self.src_hint = Some(src);
        self
    }
}
