//! Protocol constants and runtime session configuration.
//!
//! Compile-time sizes and capacities live here so they can be tuned in
//! one place. Values that an embedding app may want to change per
//! session are carried by [`SessionConfig`], which is passed explicitly
//! to [`crate::ble::Connection::new`].

use embassy_time::Duration;

use crate::preset::PresetFormat;

// GATT

/// MTU requested right after service discovery (best-effort).
/// 517 is the largest ATT MTU most host stacks will accept.
pub const BLE_REQUESTED_MTU: u16 = 517;

/// Depth of the link event queue fed by host-stack callbacks.
pub const BLE_EVENT_QUEUE_DEPTH: usize = 8;

/// Maximum number of connection-state subscribers.
pub const STATE_OBSERVERS: usize = 4;

/// Maximum number of tasks parked on the services-ready gate at once.
/// Extra waiters are still woken; they just share a broadcast wake.
pub const READY_WAITERS: usize = 8;

/// Default per-operation deadline for reads and writes.
pub const BLE_OP_TIMEOUT_MS: u64 = 5_000;

/// Default deadline for link establishment plus service discovery.
pub const BLE_CONNECT_TIMEOUT_MS: u64 = 10_000;

// Device

/// Number of addressable LEDs on the strip (12 rows × 22 bands).
pub const LED_COUNT: usize = 12 * 22;

/// Number of frequency bands (length of the frequency / gain tables).
pub const BAND_COUNT: usize = 22;

// Presets

/// Number of preset slots the device exposes in its list.
pub const MAX_PRESETS: usize = 24;

/// Maximum preset name length in bytes (UTF-8, zero padded on the wire).
pub const PRESET_NAME_LEN: usize = 16;

/// Runtime configuration for one connection / session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// MTU requested after discovery.
    pub mtu: u16,
    /// Deadline for `connect()`; `None` waits until the link resolves.
    pub connect_timeout: Option<Duration>,
    /// Deadline for a single GATT read/write; `None` waits until the
    /// completion arrives or the link drops.
    pub op_timeout: Option<Duration>,
    /// Record format used for preset save/load.
    pub preset_format: PresetFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mtu: BLE_REQUESTED_MTU,
            connect_timeout: Some(Duration::from_millis(BLE_CONNECT_TIMEOUT_MS)),
            op_timeout: Some(Duration::from_millis(BLE_OP_TIMEOUT_MS)),
            preset_format: PresetFormat::CompressedCsv,
        }
    }
}
