//! Byte encoding of parameter values.
//!
//! All multi-byte scalars are little-endian. Sizes are checked against
//! the registry in both directions, so a value that would not fit its
//! characteristic is rejected before it reaches the link.

use alloc::vec::Vec;

use super::{Param, ParamId, WireSize};
use crate::error::{Error, Malformed};

/// A type that can travel over a visualizer characteristic.
pub trait WireValue: Sized {
    /// Append the wire form of `self` to `out`.
    fn encode_into(&self, out: &mut Vec<u8>);

    /// Parse the wire form. The caller has already checked the registry size.
    fn decode(bytes: &[u8]) -> Result<Self, Error>;
}

/// Encode `value` for `param`.
pub fn encode<P: Param>(param: P, value: &P::Value) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    value.encode_into(&mut out);
    check_size(param.id(), out.len())?;
    Ok(out)
}

/// Decode a payload read from `param`.
pub fn decode<P: Param>(param: P, bytes: &[u8]) -> Result<P::Value, Error> {
    check_size(param.id(), bytes.len())?;
    P::Value::decode(bytes)
}

/// Validate `len` against the wire size registered for `id`.
pub fn check_size(id: ParamId, len: usize) -> Result<(), Error> {
    match id.wire_size() {
        WireSize::Fixed(expected) if len != expected => Err(Malformed::Length {
            expected,
            actual: len,
        }
        .into()),
        WireSize::AtMost(max) if len > max => Err(Malformed::TooLong { max, actual: len }.into()),
        _ => Ok(()),
    }
}

/// Borrow exactly `N` bytes.
pub(crate) fn exact<const N: usize>(bytes: &[u8]) -> Result<[u8; N], Error> {
    <[u8; N]>::try_from(bytes).map_err(|_| {
        Malformed::Length {
            expected: N,
            actual: bytes.len(),
        }
        .into()
    })
}

impl WireValue for u8 {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Ok(exact::<1>(bytes)?[0])
    }
}

impl WireValue for u16 {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Ok(u16::from_le_bytes(exact(bytes)?))
    }
}

impl WireValue for f32 {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Ok(f32::from_le_bytes(exact(bytes)?))
    }
}

impl<const N: usize> WireValue for [f32; N] {
    fn encode_into(&self, out: &mut Vec<u8>) {
        for v in self {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != N * 4 {
            return Err(Malformed::Length {
                expected: N * 4,
                actual: bytes.len(),
            }
            .into());
        }
        let mut values = [0f32; N];
        for (slot, chunk) in values.iter_mut().zip(bytes.chunks_exact(4)) {
            *slot = f32::from_le_bytes(exact(chunk)?);
        }
        Ok(values)
    }
}

/// Raw buffers are passed through untouched.
impl WireValue for Vec<u8> {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Ok(bytes.to_vec())
    }
}
