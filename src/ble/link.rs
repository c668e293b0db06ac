//! Seam to the host BLE stack.

use super::{BdAddr, CharacteristicRef, GattService, Generation};
use crate::error::LinkError;

/// Operations the connection needs from the host stack.
///
/// Every method only starts an operation and returns immediately. The
/// outcome is reported later by passing a [`super::LinkEvent`] tagged
/// with the generation given to [`GattLink::connect`] to
/// [`super::Connection::notify`]. An `Err` means the stack refused to
/// start the operation at all and no event will follow.
pub trait GattLink {
    /// Open a link to `addr`. Events for this link carry `generation`.
    fn connect(&mut self, addr: BdAddr, generation: Generation) -> Result<(), LinkError>;

    /// Start primary service discovery.
    fn discover_services(&mut self) -> Result<(), LinkError>;

    /// Ask for a larger ATT MTU.
    fn request_mtu(&mut self, mtu: u16) -> Result<(), LinkError>;

    /// Services found by the last successful discovery.
    fn services(&self) -> &[GattService];

    fn read(&mut self, target: &CharacteristicRef) -> Result<(), LinkError>;

    fn write(&mut self, target: &CharacteristicRef, value: &[u8]) -> Result<(), LinkError>;

    /// Start a graceful disconnect.
    fn disconnect(&mut self);

    /// Release the link handle. No events are expected afterwards.
    fn close(&mut self);
}
