//! Compressed CSV preset record, as stored by the firmware.
//!
//! `index,name,smooth,gain,fps,#rrggbb,#rrggbb,#rrggbb,fft,[f|..],[g|..],skew,brightness,display,animation`
//!
//! Commas in the name become spaces. The text is zlib-compressed.

use core::fmt::Write;

use alloc::string::String;
use alloc::vec::Vec;
use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::decompress_to_vec_zlib;

use super::{truncate_name, Preset};
use crate::config::BAND_COUNT;
use crate::error::{Error, Malformed};
use crate::params::{AnimationMode, DisplayMode, Rgb888};
use crate::settings::VisualizerSettings;

const FIELD_COUNT: usize = 15;

/// zlib level (same as the default of most zlib front ends).
const COMPRESSION_LEVEL: u8 = 6;

pub fn encode(preset: &Preset) -> Vec<u8> {
    compress_to_vec_zlib(to_text(preset).as_bytes(), COMPRESSION_LEVEL)
}

pub fn decode(bytes: &[u8]) -> Result<Preset, Error> {
    let raw = decompress_to_vec_zlib(bytes).map_err(|_| Malformed::Compression)?;
    let text = core::str::from_utf8(&raw).map_err(|_| Malformed::Utf8)?;
    from_text(text)
}

/// Uncompressed record text.
pub fn to_text(preset: &Preset) -> String {
    let s = &preset.settings;
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "{},{},{},{},{},",
        preset.index,
        preset.name.replace(',', " "),
        s.smooth_size,
        s.gain,
        s.fps
    );
    for c in &s.colors {
        let _ = write!(out, "#{:02x}{:02x}{:02x},", c.r, c.g, c.b);
    }
    let _ = write!(out, "{},", s.fft_size);
    write_array(&mut out, &s.frequencies);
    out.push(',');
    write_array(&mut out, &s.gains);
    let _ = write!(
        out,
        ",{},{},{},{}",
        s.skew,
        s.brightness,
        s.display_mode.code(),
        s.animation_mode.code()
    );
    out
}

fn write_array(out: &mut String, values: &[f32]) {
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        let _ = write!(out, "{}", v);
    }
    out.push(']');
}

/// Parse uncompressed record text.
pub fn from_text(text: &str) -> Result<Preset, Error> {
    let fields: Vec<&str> = text.trim().split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(Malformed::Field("field count").into());
    }

    let index = parse(fields[0], "index")?;
    let name = truncate_name(fields[1]);
    let settings = VisualizerSettings {
        smooth_size: parse(fields[2], "smooth size")?,
        gain: parse(fields[3], "gain")?,
        fps: parse(fields[4], "fps")?,
        colors: [
            parse_color(fields[5])?,
            parse_color(fields[6])?,
            parse_color(fields[7])?,
        ],
        fft_size: parse(fields[8], "fft size")?,
        frequencies: parse_array(fields[9], "frequencies")?,
        gains: parse_array(fields[10], "gains")?,
        skew: parse(fields[11], "skew")?,
        brightness: parse(fields[12], "brightness")?,
        display_mode: DisplayMode::try_from(parse::<u8>(fields[13], "display mode")?)?,
        animation_mode: AnimationMode::try_from(parse::<u8>(fields[14], "animation mode")?)?,
    };
    Ok(Preset {
        index,
        name,
        settings,
    })
}

fn parse<T: core::str::FromStr>(field: &str, what: &'static str) -> Result<T, Error> {
    field
        .trim()
        .parse()
        .map_err(|_| Malformed::Field(what).into())
}

fn parse_color(field: &str) -> Result<Rgb888, Error> {
    field
        .parse()
        .map_err(|_| Malformed::Field("color").into())
}

fn parse_array(field: &str, what: &'static str) -> Result<[f32; BAND_COUNT], Error> {
    let inner = field
        .trim()
        .strip_prefix('[')
        .and_then(|f| f.strip_suffix(']'))
        .ok_or(Malformed::Field(what))?;

    let mut out = [0f32; BAND_COUNT];
    let mut count = 0;
    for value in inner.split('|') {
        let slot = out.get_mut(count).ok_or(Malformed::Field(what))?;
        *slot = parse(value, what)?;
        count += 1;
    }
    if count != BAND_COUNT {
        return Err(Malformed::Field(what).into());
    }
    Ok(out)
}
