//! Background removal collaborator.
//!
//! The pipeline only depends on the [`BackgroundRemover`] contract: any image
//! in, same-or-smaller image out, or an error. The built-in implementation is
//! a border matte — it estimates the background color from the image edges
//! and clears matching pixels to full transparency. Swap in a segmentation
//! model behind the same trait for photographic subjects.

use image::{DynamicImage, Rgba, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error("image is empty")]
    EmptyImage,
    #[error("segmentation failed: {0}")]
    Segmentation(String),
}

pub trait BackgroundRemover: Sync {
    fn remove_background(&self, img: DynamicImage) -> Result<DynamicImage, BackgroundError>;
}

/// Border-sampling matte: pixels close to the average edge color become
/// transparent.
pub struct BorderMatte {
    /// Maximum per-channel distance (summed over R, G, B) for a pixel to
    /// count as background.
    pub tolerance: u32,
}

impl BorderMatte {
    pub fn new() -> Self {
        Self { tolerance: 90 }
    }

    fn background_estimate(img: &RgbaImage) -> Rgba<u8> {
        let (w, h) = img.dimensions();
        let mut sum = [0u64; 3];
        let mut count = 0u64;
        for x in 0..w {
            for y in [0, h - 1] {
                let p = img.get_pixel(x, y);
                for c in 0..3 {
                    sum[c] += p.0[c] as u64;
                }
                count += 1;
            }
        }
        for y in 0..h {
            for x in [0, w - 1] {
                let p = img.get_pixel(x, y);
                for c in 0..3 {
                    sum[c] += p.0[c] as u64;
                }
                count += 1;
            }
        }
        Rgba([
            (sum[0] / count) as u8,
            (sum[1] / count) as u8,
            (sum[2] / count) as u8,
            255,
        ])
    }

    fn distance(a: &Rgba<u8>, b: &Rgba<u8>) -> u32 {
        (0..3)
            .map(|c| (a.0[c] as i32 - b.0[c] as i32).unsigned_abs())
            .sum()
    }
}

impl Default for BorderMatte {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundRemover for BorderMatte {
    fn remove_background(&self, img: DynamicImage) -> Result<DynamicImage, BackgroundError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(BackgroundError::EmptyImage);
        }
        let mut rgba = img.into_rgba8();
        let background = Self::background_estimate(&rgba);
        for pixel in rgba.pixels_mut() {
            if Self::distance(pixel, &background) <= self.tolerance {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}
