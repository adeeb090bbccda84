//! The route-configuration record exchanged on the control socket and on
//! the inter-core bus (spec §6).

use crate::device::IfName;
use crate::error::{InvalidReason, RouteError, RouteResult};
use crate::prefix::Ipv6Prefix;
use std::net::Ipv6Addr;

/// Operation requested by a [`RouteConfig`] (spec §4.4, "Operation set").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Reserved, currently unsupported.
    Get,
    Add,
    Del,
    /// Reserved, currently unsupported.
    Flush,
}

/// User-configured vs. auto-configured (spec §3, `flags`).
pub mod flags {
    /// Route was installed by an administrator via the control socket.
    pub const USER_CONFIGURED: u32 = 1 << 0;
    /// Route was derived automatically (SLAAC) rather than by an admin.
    pub const AUTO_CONFIGURED: u32 = 1 << 1;
}

/// The route-configuration record (spec §6): exchanged on both the admin
/// socket and the inter-core bus, and used as the administrative identity
/// tuple `(dst, ifname, gateway)` for `get`/`add`/`del`.
#[derive(Debug, Clone, Copy)]
pub struct RouteConfig {
    pub ops: Opcode,
    pub dst: Ipv6Prefix,
    pub src: Ipv6Prefix,
    pub prefsrc: Ipv6Prefix,
    pub gateway: Ipv6Addr,
    pub ifname: IfName,
    pub mtu: u32,
    pub flags: u32,
}

impl RouteConfig {
    /// The administrative identity tuple used by `get`/`add`/`del`
    /// (spec §4.2).
    pub fn identity(&self) -> (Ipv6Prefix, IfName, Ipv6Addr) {
        (self.dst.canonicalize(), self.ifname, self.gateway)
    }

    /// Normalise the destination prefix to canonical form (spec §4.4
    /// step 1). `src`/`prefsrc` are never rewritten by this step (spec
    /// §3: "never rewritten by the destination prefix").
    pub fn canonicalized(&self) -> Self {
        let mut out = *self;
        out.dst = self.dst.canonicalize();
        out
    }

    /// Whether this route has no gateway, i.e. is directly attached.
    pub fn is_direct(&self) -> bool {
        self.gateway == Ipv6Addr::UNSPECIFIED
    }
}

/// Validate a request per spec §4.5: reject bad prefix lengths, bad
/// opcodes, and unknown interfaces. Does not check engine-table state
/// (`Exists`/`NotExist`, spec §4.2) — that is the engine's job.
pub fn validate(cfg: &RouteConfig, known_interface: bool) -> RouteResult<()> {
    if cfg.dst.plen() > 128 || cfg.src.plen() > 128 || cfg.prefsrc.plen() > 128 {
        return Err(RouteError::Invalid(InvalidReason::BadPrefixLength));
    }
    if !matches!(cfg.ops, Opcode::Get | Opcode::Add | Opcode::Del | Opcode::Flush) {
        return Err(RouteError::Invalid(InvalidReason::UnsupportedOps));
    }
    if !known_interface {
        return Err(RouteError::Invalid(InvalidReason::UnknownInterface));
    }
    Ok(())
}
