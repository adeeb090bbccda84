//! The interface-registry seam (spec §6, "External collaborators").
//!
//! The NIC/driver layer is out of scope for this core (spec §1); it is
//! consumed only through [`InterfaceRegistry::resolve`]. A route entry
//! stores a [`DeviceRef`] — a small `Copy` handle, not an owning pointer —
//! and relies on the registry's invariant that devices outlive every route
//! naming them (spec §3, invariant 4).

use crate::constants::IFNAME_SIZE;
use core::fmt;

/// A bounded interface name, stored inline (no heap allocation) so that
/// [`DeviceRef`] and [`crate::config::RouteConfig`] stay `Copy`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IfName {
    bytes: [u8; IFNAME_SIZE],
    len: u8,
}

impl IfName {
    pub fn new(name: &str) -> Option<Self> {
        let raw = name.as_bytes();
        if raw.is_empty() || raw.len() >= IFNAME_SIZE {
            return None;
        }
        let mut bytes = [0u8; IFNAME_SIZE];
        bytes[..raw.len()].copy_from_slice(raw);
        Some(Self {
            bytes,
            len: raw.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        // Safety: constructed only from a valid &str slice in `new`.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Debug for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-owning reference to an egress/ingress interface.
///
/// Equality is by `index` alone: the index is assigned once by the
/// interface registry at device creation and is stable for the device's
/// lifetime, matching the original's pointer-equality comparison between
/// `struct netif_port *` values.
#[derive(Clone, Copy, Eq)]
pub struct DeviceRef {
    pub index: u32,
    pub name: IfName,
}

impl PartialEq for DeviceRef {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl fmt::Debug for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceRef({}, {})", self.index, self.name)
    }
}

/// Resolves interface names to stable, non-owning device handles.
///
/// Implemented by the external NIC/driver layer (spec §6: "Interface
/// registry: `interface_by_name(name) -> interface | none`"). Devices
/// returned here must outlive every route that references them; this core
/// never promotes a `DeviceRef` to ownership.
pub trait InterfaceRegistry: Send + Sync {
    fn interface_by_name(&self, name: &IfName) -> Option<DeviceRef>;
}
