//! 24-bit RGB color.

use core::fmt;
use core::str::FromStr;

use alloc::vec::Vec;

use super::codec::{exact, WireValue};
use crate::error::{Error, Malformed};

/// One RGB888 pixel / palette entry. Wire order is R, G, B.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb888 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb888 {
    pub const BLACK: Rgb888 = Rgb888::new(0, 0, 0);
    pub const RED: Rgb888 = Rgb888::new(255, 0, 0);
    pub const GREEN: Rgb888 = Rgb888::new(0, 255, 0);
    pub const BLUE: Rgb888 = Rgb888::new(0, 0, 255);
    pub const MAGENTA: Rgb888 = Rgb888::new(255, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// `0x00RRGGBB`.
    pub const fn packed(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub const fn from_packed(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }
}

/// `#RRGGBB`, uppercase.
impl fmt::Display for Rgb888 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Accepts `RRGGBB` or `#RRGGBB`, either case.
impl FromStr for Rgb888 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Malformed::Field("color").into());
        }
        u32::from_str_radix(hex, 16)
            .map(Self::from_packed)
            .map_err(|_| Malformed::Field("color").into())
    }
}

impl WireValue for Rgb888 {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self::from_bytes(exact(bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_text_round_trip() {
        let c = Rgb888::new(0x0A, 0xBC, 0xFF);
        assert_eq!(c.to_string(), "#0ABCFF");
        assert_eq!("#0abcff".parse::<Rgb888>(), Ok(c));
        assert_eq!("0ABCFF".parse::<Rgb888>(), Ok(c));
    }

    #[test]
    fn rejects_bad_hex() {
        assert!("#12345".parse::<Rgb888>().is_err());
        assert!("#12345G".parse::<Rgb888>().is_err());
        assert!("+12345".parse::<Rgb888>().is_err());
    }

    #[test]
    fn packed_layout() {
        assert_eq!(Rgb888::MAGENTA.packed(), 0x00FF_00FF);
        assert_eq!(Rgb888::from_packed(0x0012_3456), Rgb888::new(0x12, 0x34, 0x56));
    }
}
