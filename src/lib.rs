//! vizlink - BLE GATT client core for the LED strip visualizer.
//!
//! The crate covers everything between the host BLE stack and the app UI:
//!
//! - `params`: registry of every visualizer characteristic, typed
//!   descriptors and the byte codec.
//! - `ble`: connection state machine, services-ready gate and the
//!   serialized [`ble::DeviceSession`].
//! - `preset`: preset records (binary and compressed CSV) and the slot
//!   protocol.
//! - `settings`: the full settings snapshot with firmware defaults.
//!
//! The host stack plugs in through [`ble::GattLink`]; its callbacks are
//! fed back with [`ble::Connection::notify`].
//!
//! Usage: `cargo test` runs every unit and integration test on the host.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod logging;

pub mod ble;
pub mod config;
pub mod error;
pub mod params;
pub mod preset;
pub mod settings;

pub use ble::{BdAddr, Connection, ConnectionState, DeviceSession, GattLink, LinkEvent};
pub use config::SessionConfig;
pub use error::{Error, FailureReason, LinkError, Malformed};
pub use params::{AnimationMode, ColorSlot, DisplayMode, Param, ParamId, Rgb888};
pub use preset::{Preset, PresetEntry, PresetFormat, PresetManager};
pub use settings::VisualizerSettings;
