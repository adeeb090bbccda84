//! Error types for the routing core (spec §7).

use core::fmt;

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Why a request was rejected as [`RouteError::Invalid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// `plen` outside `[0, 128]`.
    BadPrefixLength,
    /// `ifname` does not name a known interface.
    UnknownInterface,
    /// `ops` decoded but is not one of `{GET, ADD, DEL, FLUSH}` for this path.
    UnsupportedOps,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::BadPrefixLength => write!(f, "prefix length out of range"),
            InvalidReason::UnknownInterface => write!(f, "unknown interface"),
            InvalidReason::UnsupportedOps => write!(f, "unsupported ops value"),
        }
    }
}

/// Errors surfaced by the routing core (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    /// Malformed request: bad opcode, bad prefix length, unknown interface.
    Invalid(InvalidReason),
    /// `ADD` for an identity tuple already present in the target table.
    Exists,
    /// `DEL` for an identity tuple absent from the target table.
    NotExist,
    /// Allocation failure for an entry or a message.
    NoMemory,
    /// Opcode reserved but not implemented (`FLUSH`, `GET` over the bus).
    NotSupported,
    /// Lookup found no matching entry.
    NoRoute,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Invalid(reason) => write!(f, "invalid request: {}", reason),
            RouteError::Exists => write!(f, "route already exists"),
            RouteError::NotExist => write!(f, "route does not exist"),
            RouteError::NoMemory => write!(f, "no memory"),
            RouteError::NotSupported => write!(f, "operation not supported"),
            RouteError::NoRoute => write!(f, "no route to destination"),
        }
    }
}

impl std::error::Error for RouteError {}
