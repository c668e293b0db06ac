//! Visualizer parameter registry.
//!
//! Every controllable device setting is one variant of [`ParamId`]. Each
//! variant maps to exactly one GATT characteristic UUID and one wire
//! size. The UUIDs are derived from a fixed base by patching a 16-bit
//! offset into bytes 2..4, which is what the firmware registers:
//!
//! ```text
//! 3E0E0000-7C7A-47B0-9FD5-1FC3044C3E63   service
//! 3E0E0001-7C7A-47B0-9FD5-1FC3044C3E63   smooth size
//! 3E0E0018-7C7A-47B0-9FD5-1FC3044C3E63   settings as preset
//! ```
//!
//! On top of the untyped registry sit the typed descriptors (one zero-sized
//! type per parameter, implementing [`Param`]) that bind each
//! characteristic to the Rust type carried on the wire.

pub mod codec;
pub mod color;
pub mod mode;

use core::fmt;

use alloc::vec::Vec;
use uuid::Uuid;

use crate::config::{BAND_COUNT, MAX_PRESETS, PRESET_NAME_LEN};

pub use codec::{decode, encode, WireValue};
pub use color::Rgb888;
pub use mode::{AnimationMode, DisplayMode};

/// Base UUID with the offset field zeroed.
const VISUALIZER_UUID_BASE: u128 = 0x3E0E_0000_7C7A_47B0_9FD5_1FC3_044C_3E63;

/// Bit position of the 16-bit offset field inside the 128-bit UUID.
const OFFSET_SHIFT: u32 = 96;

/// Primary visualizer service (offset 0).
pub const SERVICE_UUID: Uuid = visualizer_uuid(0x0000);

/// Size of one preset list record: 1 index byte + 16 name bytes.
pub const PRESET_ENTRY_SIZE: usize = 1 + PRESET_NAME_LEN;

/// Size of the first LED framebuffer half.
pub const LEDS_BUFFER_SIZE: usize = 500;

/// Size of the second LED framebuffer half (rest of 264 × RGB888).
pub const LEDS_BUFFER2_SIZE: usize = 792 - LEDS_BUFFER_SIZE;

/// Largest attribute value ATT allows. Bounds the preset record
/// characteristics; each `PresetFormat` applies its own tighter limit.
pub const ATT_MAX_VALUE_LEN: usize = 512;

/// Build the characteristic UUID for `offset`.
pub const fn visualizer_uuid(offset: u16) -> Uuid {
    Uuid::from_u128(VISUALIZER_UUID_BASE | ((offset as u128) << OFFSET_SHIFT))
}

/// One of the three palette slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorSlot {
    One,
    Two,
    Three,
}

impl ColorSlot {
    pub const ALL: [ColorSlot; 3] = [ColorSlot::One, ColorSlot::Two, ColorSlot::Three];

    /// 1-based slot number.
    pub const fn index(self) -> u8 {
        match self {
            ColorSlot::One => 1,
            ColorSlot::Two => 2,
            ColorSlot::Three => 3,
        }
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(ColorSlot::One),
            2 => Some(ColorSlot::Two),
            3 => Some(ColorSlot::Three),
            _ => None,
        }
    }
}

/// How many bytes a characteristic carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireSize {
    /// Exactly this many bytes.
    Fixed(usize),
    /// Up to this many bytes.
    AtMost(usize),
    /// No bound enforced by the client.
    Variable,
}

/// Identity of every characteristic the visualizer exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamId {
    SmoothSize,
    Gain,
    Fps,
    Color(ColorSlot),
    FftSize,
    Frequencies,
    Gains,
    Skew,
    Brightness,
    Display,
    Animation,
    LedCount,
    LedsBuffer,
    LedsBuffer2,
    PresetList,
    PresetSelectIndex,
    PresetRead,
    PresetSave,
    PresetActivate,
    PresetDelete,
    PresetReadActivatedIndex,
    SettingsAsPreset,
}

impl ParamId {
    /// Every characteristic, in offset order.
    pub const ALL: [ParamId; 24] = [
        ParamId::SmoothSize,
        ParamId::Gain,
        ParamId::Fps,
        ParamId::Color(ColorSlot::One),
        ParamId::Color(ColorSlot::Two),
        ParamId::Color(ColorSlot::Three),
        ParamId::FftSize,
        ParamId::Frequencies,
        ParamId::Gains,
        ParamId::Skew,
        ParamId::Brightness,
        ParamId::Display,
        ParamId::Animation,
        ParamId::LedCount,
        ParamId::LedsBuffer,
        ParamId::LedsBuffer2,
        ParamId::PresetList,
        ParamId::PresetSelectIndex,
        ParamId::PresetRead,
        ParamId::PresetSave,
        ParamId::PresetActivate,
        ParamId::PresetDelete,
        ParamId::PresetReadActivatedIndex,
        ParamId::SettingsAsPreset,
    ];

    /// 16-bit offset patched into the base UUID.
    pub const fn offset(self) -> u16 {
        match self {
            ParamId::SmoothSize => 0x0001,
            ParamId::Gain => 0x0002,
            ParamId::Fps => 0x0003,
            ParamId::Color(slot) => 0x0003 + slot.index() as u16,
            ParamId::FftSize => 0x0007,
            ParamId::Frequencies => 0x0008,
            ParamId::Gains => 0x0009,
            ParamId::Skew => 0x000A,
            ParamId::Brightness => 0x000B,
            ParamId::Display => 0x000C,
            ParamId::Animation => 0x000D,
            ParamId::LedCount => 0x000E,
            ParamId::LedsBuffer => 0x000F,
            ParamId::LedsBuffer2 => 0x0010,
            ParamId::PresetList => 0x0011,
            ParamId::PresetSelectIndex => 0x0012,
            ParamId::PresetRead => 0x0013,
            ParamId::PresetSave => 0x0014,
            ParamId::PresetActivate => 0x0015,
            ParamId::PresetDelete => 0x0016,
            ParamId::PresetReadActivatedIndex => 0x0017,
            ParamId::SettingsAsPreset => 0x0018,
        }
    }

    pub const fn wire_size(self) -> WireSize {
        match self {
            ParamId::SmoothSize | ParamId::Fps | ParamId::FftSize | ParamId::LedCount => {
                WireSize::Fixed(2)
            }
            ParamId::Gain | ParamId::Skew | ParamId::Brightness => WireSize::Fixed(4),
            ParamId::Color(_) => WireSize::Fixed(3),
            ParamId::Frequencies | ParamId::Gains => WireSize::Fixed(BAND_COUNT * 4),
            ParamId::Display
            | ParamId::Animation
            | ParamId::PresetSelectIndex
            | ParamId::PresetActivate
            | ParamId::PresetDelete
            | ParamId::PresetReadActivatedIndex => WireSize::Fixed(1),
            ParamId::LedsBuffer => WireSize::Fixed(LEDS_BUFFER_SIZE),
            ParamId::LedsBuffer2 => WireSize::Fixed(LEDS_BUFFER2_SIZE),
            ParamId::PresetList => WireSize::AtMost(1 + MAX_PRESETS * PRESET_ENTRY_SIZE),
            ParamId::PresetRead => WireSize::AtMost(ATT_MAX_VALUE_LEN),
            ParamId::PresetSave => WireSize::AtMost(ATT_MAX_VALUE_LEN),
            ParamId::SettingsAsPreset => WireSize::Variable,
        }
    }

    pub const fn uuid(self) -> Uuid {
        visualizer_uuid(self.offset())
    }

    pub const fn name(self) -> &'static str {
        match self {
            ParamId::SmoothSize => "SmoothSize",
            ParamId::Gain => "Gain",
            ParamId::Fps => "Fps",
            ParamId::Color(ColorSlot::One) => "Color1",
            ParamId::Color(ColorSlot::Two) => "Color2",
            ParamId::Color(ColorSlot::Three) => "Color3",
            ParamId::FftSize => "FftSize",
            ParamId::Frequencies => "Frequencies",
            ParamId::Gains => "Gains",
            ParamId::Skew => "Skew",
            ParamId::Brightness => "Brightness",
            ParamId::Display => "DisplayMode",
            ParamId::Animation => "AnimationMode",
            ParamId::LedCount => "LedCount",
            ParamId::LedsBuffer => "LedsBuffer",
            ParamId::LedsBuffer2 => "LedsBuffer2",
            ParamId::PresetList => "PresetList",
            ParamId::PresetSelectIndex => "PresetSelectIndex",
            ParamId::PresetRead => "PresetRead",
            ParamId::PresetSave => "PresetSave",
            ParamId::PresetActivate => "PresetActivate",
            ParamId::PresetDelete => "PresetDelete",
            ParamId::PresetReadActivatedIndex => "PresetReadActivatedIndex",
            ParamId::SettingsAsPreset => "SettingsAsPreset",
        }
    }

    pub fn from_offset(offset: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.offset() == offset)
    }

    /// Reverse lookup; `None` for UUIDs outside the visualizer base.
    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        let raw = uuid.as_u128();
        let offset_mask = 0xFFFFu128 << OFFSET_SHIFT;
        if raw & !offset_mask != VISUALIZER_UUID_BASE {
            return None;
        }
        Self::from_offset(((raw & offset_mask) >> OFFSET_SHIFT) as u16)
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed parameter descriptor: a characteristic plus the Rust type it carries.
pub trait Param: Copy {
    type Value: WireValue;

    fn id(self) -> ParamId;
}

macro_rules! params {
    ($($(#[$doc:meta])* $name:ident: $value:ty;)*) => {$(
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name;

        impl Param for $name {
            type Value = $value;

            fn id(self) -> ParamId {
                ParamId::$name
            }
        }
    )*};
}

params! {
    /// Rolling-average window of the analyser.
    SmoothSize: u16;
    /// Input gain.
    Gain: f32;
    /// Render rate.
    Fps: u16;
    /// FFT window length.
    FftSize: u16;
    /// Band centre frequencies (Hz).
    Frequencies: [f32; BAND_COUNT];
    /// Per-band gain multipliers.
    Gains: [f32; BAND_COUNT];
    Skew: f32;
    Brightness: f32;
    Display: DisplayMode;
    Animation: AnimationMode;
    LedCount: u16;
    /// First 500 bytes of the RGB framebuffer.
    LedsBuffer: Vec<u8>;
    /// Remaining 292 bytes of the RGB framebuffer.
    LedsBuffer2: Vec<u8>;
    /// Count byte followed by 17-byte slot records.
    PresetList: Vec<u8>;
    /// Slot served by the next `PresetRead`.
    PresetSelectIndex: u8;
    PresetRead: Vec<u8>;
    PresetSave: Vec<u8>;
    PresetActivate: u8;
    PresetDelete: u8;
    PresetReadActivatedIndex: u8;
    /// Live settings packaged as a preset record.
    SettingsAsPreset: Vec<u8>;
}

/// Palette color in one of the three slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub ColorSlot);

impl Param for Color {
    type Value = Rgb888;

    fn id(self) -> ParamId {
        ParamId::Color(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_unique_and_contiguous() {
        for (i, param) in ParamId::ALL.iter().enumerate() {
            assert_eq!(param.offset(), i as u16 + 1, "{}", param);
        }
    }

    #[test]
    fn uuid_patches_offset_into_base() {
        assert_eq!(
            SERVICE_UUID.hyphenated().to_string(),
            "3e0e0000-7c7a-47b0-9fd5-1fc3044c3e63"
        );
        assert_eq!(
            ParamId::SmoothSize.uuid().hyphenated().to_string(),
            "3e0e0001-7c7a-47b0-9fd5-1fc3044c3e63"
        );
        assert_eq!(
            ParamId::Color(ColorSlot::Three).uuid().hyphenated().to_string(),
            "3e0e0006-7c7a-47b0-9fd5-1fc3044c3e63"
        );
        assert_eq!(
            ParamId::SettingsAsPreset.uuid().hyphenated().to_string(),
            "3e0e0018-7c7a-47b0-9fd5-1fc3044c3e63"
        );
    }

    #[test]
    fn uuid_reverse_lookup() {
        for param in ParamId::ALL {
            assert_eq!(ParamId::from_uuid(&param.uuid()), Some(param));
        }
        assert_eq!(ParamId::from_uuid(&SERVICE_UUID), None);
        assert_eq!(ParamId::from_uuid(&visualizer_uuid(0x0019)), None);

        let foreign = Uuid::from_u128(0x0000_2A4D_0000_1000_8000_0080_5F9B_34FB);
        assert_eq!(ParamId::from_uuid(&foreign), None);
    }

    #[test]
    fn color_slots_map_to_offsets_4_to_6() {
        assert_eq!(Color(ColorSlot::One).id().offset(), 0x0004);
        assert_eq!(Color(ColorSlot::Two).id().offset(), 0x0005);
        assert_eq!(Color(ColorSlot::Three).id().offset(), 0x0006);
        assert_eq!(ColorSlot::from_index(0), None);
        assert_eq!(ColorSlot::from_index(4), None);
        assert_eq!(ColorSlot::from_index(2), Some(ColorSlot::Two));
    }

    #[test]
    fn wire_sizes_match_device_table() {
        assert_eq!(ParamId::Frequencies.wire_size(), WireSize::Fixed(88));
        assert_eq!(ParamId::LedsBuffer.wire_size(), WireSize::Fixed(500));
        assert_eq!(ParamId::LedsBuffer2.wire_size(), WireSize::Fixed(292));
        assert_eq!(ParamId::PresetList.wire_size(), WireSize::AtMost(409));
        assert_eq!(ParamId::PresetRead.wire_size(), WireSize::AtMost(512));
        assert_eq!(ParamId::PresetSave.wire_size(), WireSize::AtMost(512));
        assert_eq!(ParamId::SettingsAsPreset.wire_size(), WireSize::Variable);
    }
}
