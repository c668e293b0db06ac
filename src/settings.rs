//! Visualizer settings snapshot.
//!
//! One value holding every writable parameter. `Default` reproduces the
//! firmware's power-on configuration.

use alloc::vec::Vec;

use crate::config::{BAND_COUNT, LED_COUNT};
use crate::error::{Error, Malformed};
use crate::params::{AnimationMode, DisplayMode, Rgb888, LEDS_BUFFER2_SIZE, LEDS_BUFFER_SIZE};

/// Band centre frequencies (Hz) the firmware starts with.
pub const DEFAULT_FREQUENCIES: [f32; BAND_COUNT] = [
    41.0, 55.0, 65.0, 82.0, 110.0, 146.0, 220.0, 261.0, 329.0, 392.0, 440.0, 523.0, 880.0, 987.0,
    2000.0, 3000.0, 4000.0, 5000.0, 6000.0, 7500.0, 9000.0, 13000.0,
];

/// Per-band gain the firmware starts with.
pub const DEFAULT_GAINS: [f32; BAND_COUNT] = [
    1.3, 1.2, 1.1, 1.0, 1.0, 1.0, 1.0, 0.85, 0.75, 0.75, 0.75, 0.75, 0.75, 0.75, 1.0, 1.0, 1.0,
    1.0, 1.2, 3.0, 4.0, 4.0,
];

#[derive(Clone, Debug, PartialEq)]
pub struct VisualizerSettings {
    pub smooth_size: u16,
    pub gain: f32,
    pub fps: u16,
    pub colors: [Rgb888; 3],
    pub fft_size: u16,
    pub frequencies: [f32; BAND_COUNT],
    pub gains: [f32; BAND_COUNT],
    pub skew: f32,
    pub brightness: f32,
    pub display_mode: DisplayMode,
    pub animation_mode: AnimationMode,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            smooth_size: 10,
            gain: 1.0,
            fps: 60,
            colors: [Rgb888::BLUE, Rgb888::RED, Rgb888::MAGENTA],
            fft_size: 1024,
            frequencies: DEFAULT_FREQUENCIES,
            gains: DEFAULT_GAINS,
            skew: 1.0,
            brightness: 1.0,
            display_mode: DisplayMode::Spectrum,
            animation_mode: AnimationMode::Full,
        }
    }
}

/// Join the two framebuffer halves into `LED_COUNT` pixels.
pub fn led_frame(first: &[u8], second: &[u8]) -> Result<Vec<Rgb888>, Error> {
    if first.len() != LEDS_BUFFER_SIZE {
        return Err(Malformed::Length {
            expected: LEDS_BUFFER_SIZE,
            actual: first.len(),
        }
        .into());
    }
    if second.len() != LEDS_BUFFER2_SIZE {
        return Err(Malformed::Length {
            expected: LEDS_BUFFER2_SIZE,
            actual: second.len(),
        }
        .into());
    }

    let mut frame = Vec::with_capacity(LED_COUNT);
    let mut rgb = first.iter().chain(second.iter()).copied();
    while let (Some(r), Some(g), Some(b)) = (rgb.next(), rgb.next(), rgb.next()) {
        frame.push(Rgb888::new(r, g, b));
    }
    Ok(frame)
}
