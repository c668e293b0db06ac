//! Display and animation modes.
//!
//! Both are carried as a single byte; unknown codes are an error rather
//! than being mapped to a default.

use core::fmt;
use core::str::FromStr;

use alloc::vec::Vec;

use super::codec::{exact, WireValue};
use crate::error::{Error, Malformed};

/// What the strip renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DisplayMode {
    #[default]
    Spectrum = 0,
    Oscilloscope = 1,
    ColorGradient = 2,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 3] = [
        DisplayMode::Spectrum,
        DisplayMode::Oscilloscope,
        DisplayMode::ColorGradient,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            DisplayMode::Spectrum => "Spectrum",
            DisplayMode::Oscilloscope => "Oscilloscope",
            DisplayMode::ColorGradient => "ColorGradient",
        }
    }
}

impl TryFrom<u8> for DisplayMode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.code() == code)
            .ok_or(Error::UnknownVariant(code))
    }
}

/// How the spectrum columns are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AnimationMode {
    #[default]
    Full = 0,
    FullWithMax = 1,
    Points = 2,
    FullMiddle = 3,
    FullMiddleWithMax = 4,
    PointsMiddle = 5,
}

impl AnimationMode {
    pub const ALL: [AnimationMode; 6] = [
        AnimationMode::Full,
        AnimationMode::FullWithMax,
        AnimationMode::Points,
        AnimationMode::FullMiddle,
        AnimationMode::FullMiddleWithMax,
        AnimationMode::PointsMiddle,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            AnimationMode::Full => "Full",
            AnimationMode::FullWithMax => "FullWithMax",
            AnimationMode::Points => "Points",
            AnimationMode::FullMiddle => "FullMiddle",
            AnimationMode::FullMiddleWithMax => "FullMiddleWithMax",
            AnimationMode::PointsMiddle => "PointsMiddle",
        }
    }
}

impl TryFrom<u8> for AnimationMode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.code() == code)
            .ok_or(Error::UnknownVariant(code))
    }
}

// Text forms (case-insensitive) for UI pickers

impl FromStr for DisplayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(Error::MalformedPayload(Malformed::Field("display mode")))
    }
}

impl FromStr for AnimationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(Error::MalformedPayload(Malformed::Field("animation mode")))
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for AnimationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl WireValue for DisplayMode {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.code());
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Self::try_from(exact::<1>(bytes)?[0])
    }
}

impl WireValue for AnimationMode {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.code());
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Self::try_from(exact::<1>(bytes)?[0])
    }
}
