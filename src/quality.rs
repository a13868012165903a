//! Quality mapping — pure functions, no I/O.
//!
//! A single 0–100 quality knob feeds two independent pathways:
//!
//! - [`QualityTier`] selects the optimization pre-pass parameters
//!   (see [`optimize`](crate::optimize)).
//! - The raw value maps directly onto each final encoder's own parameter:
//!   JPEG quality, PNG compression level, WebP lossless switch, GIF palette
//!   size. The two pathways coexist on purpose: the optimize stage is a
//!   coarser encode/decode round trip that runs *before* the final encode.

use serde::{Deserialize, Serialize};

/// Quality setting for encoding (0–100). Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl From<u8> for Quality {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Discrete optimization tier derived from the quality knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Lossless,
}

impl QualityTier {
    /// Tier thresholds: ≤60 low, ≤75 medium, ≤90 high, above that lossless.
    pub fn from_quality(quality: Quality) -> Self {
        match quality.value() {
            0..=60 => Self::Low,
            61..=75 => Self::Medium,
            76..=90 => Self::High,
            _ => Self::Lossless,
        }
    }
}

/// PNG compression level on the 0–9 scale: `quality * 9 / 100`.
///
/// The encoder seam buckets this into the compression presets the PNG
/// encoder actually exposes; the arithmetic here is the public contract.
pub fn png_compression_level(quality: Quality) -> u8 {
    (quality.value() as u16 * 9 / 100) as u8
}

/// WebP encodes losslessly only at exactly quality 100.
pub fn webp_lossless(quality: Quality) -> bool {
    quality.value() == 100
}

/// GIF palette size: `quality * 256 / 100`, clamped to 1..=256.
///
/// Quality 0 would otherwise ask the encoder for a zero-color palette, which
/// no encoder accepts; the floor is 1.
pub fn gif_color_count(quality: Quality) -> u16 {
    (quality.value() as u16 * 256 / 100).clamp(1, 256)
}
