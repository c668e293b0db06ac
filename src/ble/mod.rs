//! Bluetooth Low Energy GATT client.
//!
//! The crate talks to the visualizer in **Central** role through a host
//! BLE stack supplied by the embedding application:
//!
//! 1. **Link** - [`GattLink`] is the seam to the host stack. Its methods
//!    only *start* operations; results come back later as [`LinkEvent`]s
//!    pushed through [`Connection::notify`].
//! 2. **State machine** - [`machine::step`] is a pure reducer from
//!    (state, event) to the next [`ConnectionState`] plus the side effect
//!    to run.
//! 3. **Connection** - owns the link, runs the reducer over the event
//!    queue and publishes state changes.
//! 4. **Session** - serialized read/write of typed parameters once the
//!    services-ready gate has opened.

pub mod connection;
pub mod gate;
pub mod link;
pub mod machine;
pub mod session;

use core::fmt;

use alloc::vec::Vec;
use uuid::Uuid;

pub use connection::Connection;
pub use gate::ReadyGate;
pub use link::GattLink;
pub use session::DeviceSession;

use crate::error::FailureReason;

/// Counter identifying one connection attempt.
pub type Generation = u32;

/// 48-bit peripheral address, most significant byte first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BdAddr(pub [u8; 6]);

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

/// Connection status published to the rest of the app.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    /// Link up and services discovered.
    Connected(BdAddr),
    Failed(FailureReason),
}

impl ConnectionState {
    pub const fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Connecting => f.write_str("connecting"),
            ConnectionState::Connected(addr) => write!(f, "connected to {}", addr),
            ConnectionState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Callbacks from the host stack, in the order it reports them.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkEvent {
    /// Link layer connection established.
    LinkUp,
    /// Host stack reports the link is still being set up.
    LinkConnecting,
    /// Link lost or closed by either side.
    LinkDown { status: u16 },
    /// Connection-state callback carrying a state code we do not map.
    Unrecognized { state: u8, status: u16 },
    ServicesDiscovered { status: u16 },
    MtuChanged { mtu: u16, status: u16 },
    ReadComplete {
        characteristic: Uuid,
        status: u16,
        value: Vec<u8>,
    },
    WriteComplete { characteristic: Uuid, status: u16 },
}

impl LinkEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            LinkEvent::LinkUp => "link up",
            LinkEvent::LinkConnecting => "link connecting",
            LinkEvent::LinkDown { .. } => "link down",
            LinkEvent::Unrecognized { .. } => "unrecognized",
            LinkEvent::ServicesDiscovered { .. } => "services discovered",
            LinkEvent::MtuChanged { .. } => "mtu changed",
            LinkEvent::ReadComplete { .. } => "read complete",
            LinkEvent::WriteComplete { .. } => "write complete",
        }
    }

    /// GATT completion carried by this event, if any.
    pub fn into_completion(self) -> Option<Completion> {
        match self {
            LinkEvent::ReadComplete {
                characteristic,
                status,
                value,
            } => Some(Completion {
                kind: OpKind::Read,
                characteristic,
                status,
                value,
            }),
            LinkEvent::WriteComplete {
                characteristic,
                status,
            } => Some(Completion {
                kind: OpKind::Write,
                characteristic,
                status,
                value: Vec::new(),
            }),
            _ => None,
        }
    }
}

/// A [`LinkEvent`] stamped with the connection attempt it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct TaggedEvent {
    pub generation: Generation,
    pub event: LinkEvent,
}

/// One discovered GATT service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GattService {
    pub uuid: Uuid,
    pub characteristics: Vec<Uuid>,
}

/// A characteristic located in the discovered service tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacteristicRef {
    pub service: Uuid,
    pub characteristic: Uuid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpKind {
    Read,
    Write,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpKind::Read => "read",
            OpKind::Write => "write",
        })
    }
}

/// Finished GATT read or write.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub kind: OpKind,
    pub characteristic: Uuid,
    pub status: u16,
    /// Read payload; empty for writes.
    pub value: Vec<u8>,
}

impl Completion {
    pub fn matches(&self, kind: OpKind, characteristic: &Uuid) -> bool {
        self.kind == kind && self.characteristic == *characteristic
    }
}
