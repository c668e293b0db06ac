//! Presets: named, indexed snapshots of every setting stored on the device.
//!
//! Two record formats exist for the same [`Preset`]:
//!
//! - [`PresetFormat::Binary`]: fixed 222-byte little-endian layout.
//! - [`PresetFormat::CompressedCsv`]: 15 comma-separated fields, zlib
//!   compressed. This is what the firmware stores and serves.
//!
//! The slot listing is a separate, lighter table of [`PresetEntry`]s.

pub mod binary;
pub mod csv;
pub mod manager;

use alloc::vec::Vec;
use heapless::String;

use crate::config::{MAX_PRESETS, PRESET_NAME_LEN};
use crate::error::{Error, Malformed};
use crate::params::{ATT_MAX_VALUE_LEN, PRESET_ENTRY_SIZE};
use crate::settings::VisualizerSettings;

pub use manager::PresetManager;

/// Record format used on the preset characteristics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PresetFormat {
    Binary,
    #[default]
    CompressedCsv,
}

impl PresetFormat {
    /// Largest record this format may put on the wire.
    pub const fn max_len(self) -> usize {
        match self {
            PresetFormat::Binary => binary::RECORD_SIZE,
            PresetFormat::CompressedCsv => ATT_MAX_VALUE_LEN,
        }
    }

    /// Encode `preset`. Fails with `TooLong` if the record exceeds
    /// [`max_len`](Self::max_len).
    pub fn encode(self, preset: &Preset) -> Result<Vec<u8>, Error> {
        let record = match self {
            PresetFormat::Binary => binary::encode(preset),
            PresetFormat::CompressedCsv => csv::encode(preset),
        };
        self.check_len(record.len())?;
        Ok(record)
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Preset, Error> {
        self.check_len(bytes.len())?;
        match self {
            PresetFormat::Binary => binary::decode(bytes),
            PresetFormat::CompressedCsv => csv::decode(bytes),
        }
    }

    fn check_len(self, len: usize) -> Result<(), Error> {
        let max = self.max_len();
        if len > max {
            return Err(Malformed::TooLong { max, actual: len }.into());
        }
        Ok(())
    }
}

pub type PresetName = String<PRESET_NAME_LEN>;

#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    /// Device slot.
    pub index: u8,
    pub name: PresetName,
    pub settings: VisualizerSettings,
}

impl Preset {
    /// `name` is cut to `PRESET_NAME_LEN` bytes on a char boundary.
    pub fn new(index: u8, name: &str, settings: VisualizerSettings) -> Self {
        Self {
            index,
            name: truncate_name(name),
            settings,
        }
    }

    pub fn to_settings(&self) -> VisualizerSettings {
        self.settings.clone()
    }
}

/// One row of the slot listing.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PresetEntry {
    pub index: u8,
    pub name: PresetName,
}

/// Longest prefix of `name` that fits, never splitting a character.
pub fn truncate_name(name: &str) -> PresetName {
    let mut out = PresetName::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Zero-padded 16-byte wire form.
pub(crate) fn name_to_bytes(name: &str) -> [u8; PRESET_NAME_LEN] {
    let mut out = [0u8; PRESET_NAME_LEN];
    let truncated = truncate_name(name);
    out[..truncated.len()].copy_from_slice(truncated.as_bytes());
    out
}

/// Parse a zero-padded name field. Invalid UTF-8 is an error.
pub(crate) fn name_from_bytes(bytes: &[u8]) -> Result<PresetName, Error> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = core::str::from_utf8(&bytes[..end]).map_err(|_| Malformed::Utf8)?;
    PresetName::try_from(text).map_err(|_| {
        Malformed::TooLong {
            max: PRESET_NAME_LEN,
            actual: text.len(),
        }
        .into()
    })
}

/// Listing form of a name field. Invalid UTF-8 becomes U+FFFD.
fn name_from_bytes_lossy(bytes: &[u8]) -> PresetName {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    truncate_name(&alloc::string::String::from_utf8_lossy(&bytes[..end]))
}

/// Decode the `PresetList` table: a count byte then `count` 17-byte
/// records. Entries with an empty name are free slots and are skipped.
pub fn decode_preset_list(bytes: &[u8]) -> Result<heapless::Vec<PresetEntry, MAX_PRESETS>, Error> {
    let Some((&count, records)) = bytes.split_first() else {
        return Err(Malformed::Length {
            expected: 1,
            actual: 0,
        }
        .into());
    };
    if count as usize > MAX_PRESETS {
        return Err(Malformed::EntryCount(count).into());
    }
    let needed = count as usize * PRESET_ENTRY_SIZE;
    if records.len() < needed {
        return Err(Malformed::Length {
            expected: 1 + needed,
            actual: bytes.len(),
        }
        .into());
    }

    let mut entries = heapless::Vec::new();
    for record in records[..needed].chunks_exact(PRESET_ENTRY_SIZE) {
        let name = name_from_bytes_lossy(&record[1..]);
        if name.trim().is_empty() {
            continue;
        }
        // Cannot overflow: count <= MAX_PRESETS.
        let _ = entries.push(PresetEntry {
            index: record[0],
            name,
        });
    }
    Ok(entries)
}

/// Build a `PresetList` table. Extra entries past `MAX_PRESETS` are dropped.
pub fn encode_preset_list(entries: &[PresetEntry]) -> Vec<u8> {
    let count = entries.len().min(MAX_PRESETS);
    let mut out = Vec::with_capacity(1 + count * PRESET_ENTRY_SIZE);
    out.push(count as u8);
    for entry in &entries[..count] {
        out.push(entry.index);
        out.extend_from_slice(&name_to_bytes(&entry.name));
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::params::{AnimationMode, DisplayMode, Rgb888};

    /// Preset with a non-default value in every field.
    pub fn sample_preset() -> Preset {
        let mut frequencies = [0f32; 22];
        for (i, f) in frequencies.iter_mut().enumerate() {
            *f = (i as f32 + 1.0) * 100.0;
        }
        let mut gains = [0f32; 22];
        for (i, g) in gains.iter_mut().enumerate() {
            *g = 0.5 + i as f32 * 0.125;
        }
        Preset::new(
            1,
            "Test Preset",
            VisualizerSettings {
                smooth_size: 10,
                gain: 1.5,
                fps: 60,
                colors: [
                    Rgb888::new(255, 0, 0),
                    Rgb888::new(0, 255, 0),
                    Rgb888::new(0, 0, 255),
                ],
                fft_size: 1024,
                frequencies,
                gains,
                skew: 0.2,
                brightness: 0.8,
                display_mode: DisplayMode::Spectrum,
                animation_mode: AnimationMode::Full,
            },
        )
    }

    /// Preset with the uneven values a user gets from dragging sliders.
    pub fn slider_preset() -> Preset {
        let mut p = sample_preset();
        p.settings.gain = 1.2345;
        p.settings.skew = 0.731_9;
        p.settings.brightness = 0.333_3;
        for (i, f) in p.settings.frequencies.iter_mut().enumerate() {
            *f = 40.0 * 1.37f32.powi(i as i32);
        }
        for (i, g) in p.settings.gains.iter_mut().enumerate() {
            *g = 0.1 + i as f32 * 0.137;
        }
        p
    }

    fn entry(index: u8, name: &str) -> PresetEntry {
        PresetEntry {
            index,
            name: truncate_name(name),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Names
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn name_truncates_on_char_boundary() {
        assert_eq!(truncate_name("Evening Chill Mix!").as_str(), "Evening Chill Mi");
        // 14 bytes of 'é', then a 3-byte '€' that does not fit
        let name = truncate_name("ééééééé€x");
        assert_eq!(name.as_str(), "ééééééé");
        assert!(name.len() <= PRESET_NAME_LEN);
    }

    #[test]
    fn name_bytes_are_zero_padded() {
        let bytes = name_to_bytes("abc");
        assert_eq!(&bytes[..3], b"abc");
        assert!(bytes[3..].iter().all(|&b| b == 0));
        assert_eq!(name_from_bytes(&bytes).unwrap().as_str(), "abc");
    }

    #[test]
    fn invalid_utf8_name_is_rejected() {
        let mut bytes = [0u8; 16];
        bytes[0] = 0xC3;
        assert_eq!(
            name_from_bytes(&bytes),
            Err(Error::MalformedPayload(Malformed::Utf8))
        );
    }

    // ═══════════════════════════════════════════════════════════════════
    // Slot listing
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn full_table_with_three_populated_slots() {
        let mut rows: heapless::Vec<PresetEntry, 24> = heapless::Vec::new();
        for i in 0..24u8 {
            let name = match i {
                2 => "Bass",
                5 => "Chill",
                17 => "Party",
                _ => "",
            };
            rows.push(entry(i, name)).unwrap();
        }
        let blob = encode_preset_list(&rows);
        assert_eq!(blob.len(), 1 + 24 * 17);

        let list = decode_preset_list(&blob).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], entry(2, "Bass"));
        assert_eq!(list[1], entry(5, "Chill"));
        assert_eq!(list[2], entry(17, "Party"));
    }

    #[test]
    fn empty_table() {
        assert!(decode_preset_list(&[0]).unwrap().is_empty());
        assert!(decode_preset_list(&[]).is_err());
    }

    #[test]
    fn truncated_table_is_rejected() {
        let blob = encode_preset_list(&[entry(0, "One"), entry(1, "Two")]);
        assert_eq!(
            decode_preset_list(&blob[..20]),
            Err(Error::MalformedPayload(Malformed::Length {
                expected: 35,
                actual: 20
            }))
        );
    }

    #[test]
    fn bad_name_does_not_hide_other_slots() {
        let mut blob = encode_preset_list(&[entry(0, "One"), entry(1, "Two"), entry(2, "Three")]);
        // Slot 1 name: "T" followed by a lone continuation byte.
        blob[1 + PRESET_ENTRY_SIZE + 2] = 0x80;

        let list = decode_preset_list(&blob).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], entry(0, "One"));
        assert_eq!(list[1].index, 1);
        assert_eq!(list[1].name.as_str(), "T\u{FFFD}o");
        assert_eq!(list[2], entry(2, "Three"));
    }

    #[test]
    fn oversized_count_is_rejected() {
        assert_eq!(
            decode_preset_list(&[25]),
            Err(Error::MalformedPayload(Malformed::EntryCount(25)))
        );
    }

    #[test]
    fn both_formats_round_trip_the_sample() {
        let p = sample_preset();
        for format in [PresetFormat::Binary, PresetFormat::CompressedCsv] {
            let bytes = format.encode(&p).unwrap();
            assert_eq!(format.decode(&bytes), Ok(p.clone()), "{:?}", format);
        }
    }

    #[test]
    fn slider_values_fit_compressed_record() {
        let p = slider_preset();
        let record = PresetFormat::CompressedCsv.encode(&p).unwrap();
        // Longer than the binary record, still within one attribute value.
        assert!(record.len() > binary::RECORD_SIZE);
        assert!(record.len() <= ATT_MAX_VALUE_LEN);

        let decoded = PresetFormat::CompressedCsv.decode(&record).unwrap();
        for (a, b) in decoded.settings.gains.iter().zip(p.settings.gains.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(decoded, p);
    }

    #[test]
    fn record_longer_than_format_allows() {
        assert_eq!(
            PresetFormat::Binary.decode(&[0u8; 223]),
            Err(Error::MalformedPayload(Malformed::TooLong {
                max: 222,
                actual: 223
            }))
        );
        assert_eq!(
            PresetFormat::CompressedCsv.decode(&[0u8; 513]),
            Err(Error::MalformedPayload(Malformed::TooLong {
                max: 512,
                actual: 513
            }))
        );
    }
}
