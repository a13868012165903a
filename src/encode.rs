//! Final encoding: one exhaustive dispatch over the output format.
//!
//! [`ProcessedImage`] is the pipeline's terminal value. Serialization
//! consumes it — the image buffer moves into the encoder and there is no
//! second write. Per-format parameters all derive from the raw quality
//! value (see [`quality`](crate::quality)); the optimization tier never
//! reaches this layer.

use crate::format::OutputFormat;
use crate::heif::{BridgeError, HeifCodec};
use crate::pdf::{self, PdfError};
use crate::quality::{Quality, gif_color_count, png_compression_level, webp_lossless};
use image::DynamicImage;
use std::borrow::Cow;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("{format} encode failed: {source}")]
    Codec {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
    #[error("GIF encode failed: {0}")]
    Gif(#[from] gif::EncodingError),
    #[error("{format} dimensions {width}x{height} exceed the format limit of {limit}")]
    DimensionsTooLarge {
        format: &'static str,
        width: u32,
        height: u32,
        limit: u32,
    },
    #[error("intermediate PNG encode failed: {0}")]
    IntermediatePng(#[source] image::ImageError),
    #[error("HEIF conversion failed: {0}")]
    Bridge(#[from] BridgeError),
    #[error("PDF build failed: {0}")]
    Pdf(#[from] PdfError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The pipeline's output: final image plus resolved format and quality.
#[derive(Debug)]
pub struct ProcessedImage {
    pub image: DynamicImage,
    pub format: OutputFormat,
    pub quality: Quality,
}

impl ProcessedImage {
    /// Serialize to `writer`. Consumes the result; `heif` is only touched
    /// for HEIF output.
    pub fn write_to<W: Write>(self, writer: &mut W, heif: &dyn HeifCodec) -> Result<(), EncodeError> {
        match self.format {
            OutputFormat::Jpeg => encode_jpeg(writer, &self.image, self.quality),
            OutputFormat::Png => encode_png(writer, &self.image, self.quality),
            OutputFormat::WebP => encode_webp(writer, &self.image, self.quality),
            OutputFormat::Gif => encode_gif(writer, &self.image, self.quality),
            OutputFormat::Bmp => encode_bmp(writer, &self.image),
            OutputFormat::Heif => encode_heif(writer, &self.image, heif),
            OutputFormat::Pdf => Ok(pdf::write_pdf(writer, &self.image, self.quality)?),
        }
    }
}

fn encode_jpeg<W: Write>(
    writer: &mut W,
    img: &DynamicImage,
    quality: Quality,
) -> Result<(), EncodeError> {
    let rgb = img.to_rgb8();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.value());
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|source| EncodeError::Codec {
            format: "jpeg",
            source,
        })
}

fn encode_png<W: Write>(
    writer: &mut W,
    img: &DynamicImage,
    quality: Quality,
) -> Result<(), EncodeError> {
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    // The 0-9 level buckets into the three presets the encoder exposes.
    let compression = match png_compression_level(quality) {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    };
    let encoder = PngEncoder::new_with_quality(writer, compression, FilterType::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|source| EncodeError::Codec {
            format: "png",
            source,
        })
}

fn encode_webp<W: Write>(
    writer: &mut W,
    img: &DynamicImage,
    quality: Quality,
) -> Result<(), EncodeError> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let memory = if webp_lossless(quality) {
        encoder.encode_lossless()
    } else {
        encoder.encode(quality.value() as f32)
    };
    writer.write_all(&memory)?;
    Ok(())
}

fn encode_gif<W: Write>(
    writer: &mut W,
    img: &DynamicImage,
    quality: Quality,
) -> Result<(), EncodeError> {
    // GIF screen dimensions are u16; larger images would silently truncate
    let limit = u16::MAX as u32;
    if img.width() > limit || img.height() > limit {
        return Err(EncodeError::DimensionsTooLarge {
            format: "gif",
            width: img.width(),
            height: img.height(),
            limit,
        });
    }
    let rgba = img.to_rgba8();
    let colors = gif_color_count(quality) as usize;

    // NeuQuant builds the palette; sample factor 10 trades speed for fidelity.
    let quantizer = color_quant::NeuQuant::new(10, colors, rgba.as_raw());
    let palette = quantizer.color_map_rgb();
    let indices: Vec<u8> = rgba
        .as_raw()
        .chunks_exact(4)
        .map(|pix| quantizer.index_of(pix) as u8)
        .collect();

    let mut encoder = gif::Encoder::new(
        writer,
        rgba.width() as u16,
        rgba.height() as u16,
        &palette,
    )?;
    let mut frame = gif::Frame::default();
    frame.width = rgba.width() as u16;
    frame.height = rgba.height() as u16;
    frame.buffer = Cow::Owned(indices);
    encoder.write_frame(&frame)?;
    Ok(())
}

fn encode_bmp<W: Write>(writer: &mut W, img: &DynamicImage) -> Result<(), EncodeError> {
    let rgb = img.to_rgb8();
    let mut encoder = image::codecs::bmp::BmpEncoder::new(writer);
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|source| EncodeError::Codec {
            format: "bmp",
            source,
        })
}

/// Bridge encode: temp PNG → external PNG-to-HEIF conversion → verbatim copy.
///
/// The intermediate PNG keeps full fidelity; the external encoder owns the
/// HEIF-side quality. Both temp files are RAII handles and disappear on
/// every exit path.
fn encode_heif<W: Write>(
    writer: &mut W,
    img: &DynamicImage,
    heif: &dyn HeifCodec,
) -> Result<(), EncodeError> {
    let staging = tempfile::Builder::new()
        .prefix("rastermill-enc-")
        .suffix(".png")
        .tempfile()?;
    img.save_with_format(staging.path(), image::ImageFormat::Png)
        .map_err(EncodeError::IntermediatePng)?;

    let converted = tempfile::Builder::new()
        .prefix("rastermill-enc-")
        .suffix(".heic")
        .tempfile()?;
    heif.image_to_heif(staging.path(), converted.path())?;

    let bytes = std::fs::read(converted.path())?;
    writer.write_all(&bytes)?;
    Ok(())
}
