//! Resize collaborator.
//!
//! The pipeline requests a resize through [`ResizeRequest`]: target
//! dimensions, a fit policy, and the resampling filter (the pipeline always
//! passes Lanczos3). A zero width or height means "derive from the aspect
//! ratio"; both zero never reaches this module — the pipeline skips the
//! stage entirely.

use image::DynamicImage;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Fit policy for a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Largest size that fits inside the target box, aspect preserved.
    #[default]
    Fit,
    /// Cover the target box exactly, center-cropping the overflow.
    Fill,
    /// Exact target dimensions, aspect ignored.
    Stretch,
}

#[derive(Debug, Clone, Copy)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
    pub mode: ResizeMode,
    pub filter: FilterType,
}

pub trait Resizer: Sync {
    fn resize(&self, img: DynamicImage, request: &ResizeRequest) -> Result<DynamicImage, ResizeError>;
}

/// Resizer backed by the `image` crate's resampling ops.
pub struct LanczosResizer;

impl Resizer for LanczosResizer {
    fn resize(&self, img: DynamicImage, request: &ResizeRequest) -> Result<DynamicImage, ResizeError> {
        let (width, height) = resolve_dimensions(
            (img.width(), img.height()),
            (request.width, request.height),
        )
        .ok_or(ResizeError::InvalidDimensions {
            width: request.width,
            height: request.height,
        })?;

        Ok(match request.mode {
            ResizeMode::Fit => img.resize(width, height, request.filter),
            ResizeMode::Fill => img.resize_to_fill(width, height, request.filter),
            ResizeMode::Stretch => img.resize_exact(width, height, request.filter),
        })
    }
}

/// Fill in a missing dimension from the source aspect ratio. Returns `None`
/// when both targets are zero or the source is degenerate.
fn resolve_dimensions(source: (u32, u32), target: (u32, u32)) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return None;
    }
    match target {
        (0, 0) => None,
        (w, 0) => {
            let h = (w as f64 * src_h as f64 / src_w as f64).round().max(1.0) as u32;
            Some((w, h))
        }
        (0, h) => {
            let w = (h as f64 * src_w as f64 / src_h as f64).round().max(1.0) as u32;
            Some((w, h))
        }
        (w, h) => Some((w, h)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 0])
        }))
    }

    fn request(width: u32, height: u32, mode: ResizeMode) -> ResizeRequest {
        ResizeRequest {
            width,
            height,
            mode,
            filter: FilterType::Lanczos3,
        }
    }

    #[test]
    fn fit_preserves_aspect_within_bounds() {
        let out = LanczosResizer
            .resize(gradient(400, 200), &request(100, 100, ResizeMode::Fit))
            .unwrap();
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn fill_produces_exact_dimensions() {
        let out = LanczosResizer
            .resize(gradient(400, 200), &request(100, 100, ResizeMode::Fill))
            .unwrap();
        assert_eq!((out.width(), out.height()), (100, 100));
    }

    #[test]
    fn stretch_ignores_aspect() {
        let out = LanczosResizer
            .resize(gradient(400, 200), &request(50, 300, ResizeMode::Stretch))
            .unwrap();
        assert_eq!((out.width(), out.height()), (50, 300));
    }

    #[test]
    fn zero_height_is_derived_from_aspect() {
        let out = LanczosResizer
            .resize(gradient(400, 200), &request(100, 0, ResizeMode::Fit))
            .unwrap();
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn zero_width_is_derived_from_aspect() {
        let out = LanczosResizer
            .resize(gradient(200, 400), &request(0, 100, ResizeMode::Fit))
            .unwrap();
        assert_eq!((out.width(), out.height()), (50, 100));
    }

    #[test]
    fn both_zero_is_invalid() {
        let err = LanczosResizer
            .resize(gradient(10, 10), &request(0, 0, ResizeMode::Fit))
            .unwrap_err();
        assert!(matches!(
            err,
            ResizeError::InvalidDimensions { width: 0, height: 0 }
        ));
    }

    #[test]
    fn resize_mode_deserializes_lowercase() {
        assert_eq!(
            serde_json::from_str::<ResizeMode>("\"fill\"").unwrap(),
            ResizeMode::Fill
        );
    }
}
