//! Fixed binary preset record.
//!
//! ```text
//! 0        index
//! 1..17    name (UTF-8, zero padded)
//! 17..19   smooth size   u16
//! 19..23   gain          f32
//! 23..25   fps           u16
//! 25..34   colors        3 × RGB
//! 34..36   fft size      u16
//! 36..124  frequencies   22 × f32
//! 124..212 gains         22 × f32
//! 212..216 skew          f32
//! 216..220 brightness    f32
//! 220      display mode
//! 221      animation mode
//! ```
//!
//! All numbers little-endian.

use alloc::vec::Vec;

use super::{name_from_bytes, name_to_bytes, Preset};
use crate::config::{BAND_COUNT, PRESET_NAME_LEN};
use crate::error::{Error, Malformed};
use crate::params::codec::exact;
use crate::params::{AnimationMode, DisplayMode, Rgb888, WireValue};
use crate::settings::VisualizerSettings;

pub const RECORD_SIZE: usize = 222;

pub fn encode(preset: &Preset) -> Vec<u8> {
    let s = &preset.settings;
    let mut out = Vec::with_capacity(RECORD_SIZE);
    out.push(preset.index);
    out.extend_from_slice(&name_to_bytes(&preset.name));
    s.smooth_size.encode_into(&mut out);
    s.gain.encode_into(&mut out);
    s.fps.encode_into(&mut out);
    for color in &s.colors {
        color.encode_into(&mut out);
    }
    s.fft_size.encode_into(&mut out);
    s.frequencies.encode_into(&mut out);
    s.gains.encode_into(&mut out);
    s.skew.encode_into(&mut out);
    s.brightness.encode_into(&mut out);
    out.push(s.display_mode.code());
    out.push(s.animation_mode.code());
    debug_assert_eq!(out.len(), RECORD_SIZE);
    out
}

pub fn decode(bytes: &[u8]) -> Result<Preset, Error> {
    if bytes.len() != RECORD_SIZE {
        return Err(Malformed::Length {
            expected: RECORD_SIZE,
            actual: bytes.len(),
        }
        .into());
    }

    let mut r = Reader { bytes, pos: 0 };
    let index = r.take::<1>()?[0];
    let name = name_from_bytes(&r.take::<PRESET_NAME_LEN>()?)?;
    let smooth_size = u16::from_le_bytes(r.take()?);
    let gain = f32::from_le_bytes(r.take()?);
    let fps = u16::from_le_bytes(r.take()?);
    let colors = [
        Rgb888::from_bytes(r.take()?),
        Rgb888::from_bytes(r.take()?),
        Rgb888::from_bytes(r.take()?),
    ];
    let fft_size = u16::from_le_bytes(r.take()?);
    let frequencies = <[f32; BAND_COUNT]>::decode(r.slice(BAND_COUNT * 4)?)?;
    let gains = <[f32; BAND_COUNT]>::decode(r.slice(BAND_COUNT * 4)?)?;
    let skew = f32::from_le_bytes(r.take()?);
    let brightness = f32::from_le_bytes(r.take()?);
    let display_mode = DisplayMode::try_from(r.take::<1>()?[0])?;
    let animation_mode = AnimationMode::try_from(r.take::<1>()?[0])?;

    Ok(Preset {
        index,
        name,
        settings: VisualizerSettings {
            smooth_size,
            gain,
            fps,
            colors,
            fft_size,
            frequencies,
            gains,
            skew,
            brightness,
            display_mode,
            animation_mode,
        },
    })
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn slice(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.pos + len;
        let out = self.bytes.get(self.pos..end).ok_or(Malformed::Length {
            expected: end,
            actual: self.bytes.len(),
        })?;
        self.pos = end;
        Ok(out)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        exact(self.slice(N)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::tests::sample_preset;

    #[test]
    fn sample_round_trip() {
        let p = sample_preset();
        let bytes = encode(&p);
        assert_eq!(bytes.len(), RECORD_SIZE);
        assert_eq!(decode(&bytes), Ok(p));
    }

    #[test]
    fn field_offsets() {
        let p = sample_preset();
        let bytes = encode(&p);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..12], b"Test Preset");
        assert_eq!(bytes[12], 0);
        assert_eq!(&bytes[17..19], &10u16.to_le_bytes());
        assert_eq!(&bytes[19..23], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[23..25], &60u16.to_le_bytes());
        assert_eq!(&bytes[25..34], &[255, 0, 0, 0, 255, 0, 0, 0, 255]);
        assert_eq!(&bytes[34..36], &1024u16.to_le_bytes());
        assert_eq!(&bytes[36..40], &100f32.to_le_bytes());
        assert_eq!(&bytes[120..124], &2200f32.to_le_bytes());
        assert_eq!(&bytes[124..128], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[212..216], &0.2f32.to_le_bytes());
        assert_eq!(&bytes[216..220], &0.8f32.to_le_bytes());
        assert_eq!(bytes[220], 0);
        assert_eq!(bytes[221], 0);
    }

    #[test]
    fn unknown_mode_byte() {
        let mut bytes = encode(&sample_preset());
        bytes[220] = 99;
        assert_eq!(decode(&bytes), Err(Error::UnknownVariant(99)));
    }

    #[test]
    fn wrong_size() {
        let bytes = encode(&sample_preset());
        assert_eq!(
            decode(&bytes[..221]),
            Err(Error::MalformedPayload(Malformed::Length {
                expected: 222,
                actual: 221
            }))
        );
    }
}
