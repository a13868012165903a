//! Optimization collaborator.
//!
//! The optimize stage is a *pre*-pass: it re-encodes the image at a coarser,
//! tier-derived setting and the pipeline decodes the result back before the
//! final encode applies the raw quality knob. The tier table lives here; the
//! actual pass is behind the [`Optimizer`] trait so pipeline tests can stub
//! it out.

use crate::format::OutputFormat;
use crate::quality::{Quality, QualityTier, png_compression_level};
use image::DynamicImage;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("optimize pass failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Per-format parameters for one optimize pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// Lossy re-encode quality for JPEG-backed passes.
    pub quality: Quality,
    /// Compression level (0–9) for PNG passes.
    pub png_compression: u8,
}

/// Map an output format and tier to the optimize pass parameters.
///
/// The tier compresses the 0–100 knob into four working points; the final
/// encoders never see these values. The working points are the same for
/// every format today; the format parameter keeps the per-format seam open.
pub fn options_for_quality(_format: OutputFormat, tier: QualityTier) -> OptimizeOptions {
    let quality = Quality::new(match tier {
        QualityTier::Low => 50,
        QualityTier::Medium => 70,
        QualityTier::High => 85,
        QualityTier::Lossless => 100,
    });
    OptimizeOptions {
        quality,
        png_compression: png_compression_level(quality),
    }
}

pub trait Optimizer: Sync {
    /// Run one optimize pass for `format` into `out`. The buffer must come
    /// back decodable by `image::load_from_memory`.
    fn optimize(
        &self,
        out: &mut Vec<u8>,
        img: &DynamicImage,
        format: OutputFormat,
        options: &OptimizeOptions,
    ) -> Result<(), OptimizeError>;
}

/// Optimizer that re-encodes through an in-process codec.
///
/// PNG output keeps a PNG pass so alpha survives; every other target format
/// uses a JPEG pass, since HEIF and PDF are JPEG-backed downstream and the
/// remaining raster formats tolerate it.
pub struct ReencodeOptimizer;

impl Optimizer for ReencodeOptimizer {
    fn optimize(
        &self,
        out: &mut Vec<u8>,
        img: &DynamicImage,
        format: OutputFormat,
        options: &OptimizeOptions,
    ) -> Result<(), OptimizeError> {
        let mut cursor = Cursor::new(out);
        match format {
            OutputFormat::Png => {
                use image::codecs::png::{CompressionType, FilterType, PngEncoder};
                let compression = match options.png_compression {
                    0..=3 => CompressionType::Fast,
                    4..=6 => CompressionType::Default,
                    _ => CompressionType::Best,
                };
                let encoder =
                    PngEncoder::new_with_quality(&mut cursor, compression, FilterType::Adaptive);
                img.write_with_encoder(encoder)?;
            }
            _ => {
                use image::codecs::jpeg::JpegEncoder;
                let rgb = img.to_rgb8();
                let mut encoder =
                    JpegEncoder::new_with_quality(&mut cursor, options.quality.value());
                encoder.encode(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )?;
            }
        }
        Ok(())
    }
}
