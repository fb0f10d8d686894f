//! Temperature policy: maps a user's creativity preference to sampling
//! parameters.
//!
//! The target sampling range is `[0.0, 1.0]`. Creativity `0` maps to
//! [`FLOOR`], creativity `100` maps to [`Temperature::MAX_VALUE`], linearly in
//! between. The mapping is monotonic non-decreasing and never fails: input is
//! clamped into `[0, 100]` before mapping.

use crate::{Creativity, Temperature};

/// Temperature used for the lowest creativity preference.
pub const FLOOR: f64 = 0.2;

/// Maps a raw creativity value to a sampling temperature.
///
/// Values outside `[0, 100]` are clamped first, so `-10` and `0` yield the same
/// temperature, as do `150` and `100`.
pub fn creativity_to_temperature(creativity: i64) -> Temperature {
    temperature_for(Creativity::clamped(creativity))
}

/// Maps a validated [`Creativity`] to a sampling temperature.
pub fn temperature_for(creativity: Creativity) -> Temperature {
    let fraction = f64::from(creativity.as_u8()) / 100.0;
    let value = FLOOR + (Temperature::MAX_VALUE - FLOOR) * fraction;
    // Rounding keeps the value inside the range despite float error.
    let value = (value * 1000.0).round() / 1000.0;
    Temperature::new(value.clamp(0.0, Temperature::MAX_VALUE)).unwrap_or(Temperature::DETERMINISTIC)
}

/// Writing register the generator asks for, derived from creativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Precise, objective phrasing.
    Precise,
    /// Clear with some natural variation.
    Balanced,
    /// Engaging, varied phrasing.
    Creative,
}

impl Tone {
    /// Picks the tone band for a creativity preference.
    pub fn for_creativity(creativity: Creativity) -> Self {
        match creativity.as_u8() {
            0..=33 => Self::Precise,
            34..=66 => Self::Balanced,
            _ => Self::Creative,
        }
    }

    /// Instruction fragment inserted into the persona prompt.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Precise => "Use a precise and objective tone; avoid embellishment.",
            Self::Balanced => "Use a balanced tone: clear and direct, with natural phrasing.",
            Self::Creative => "Use a creative and engaging tone while staying actionable.",
        }
    }
}
