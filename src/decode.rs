//! Input decoding, including the HEIF bridge path.
//!
//! Everything the `image` crate can sniff and decode in-process goes
//! straight through [`image::load_from_memory`]. HEIF/HEIC cannot: those
//! inputs are staged to a uniquely-named temp file, converted to JPEG at
//! maximum fidelity by the injected [`HeifCodec`], and the JPEG is decoded.
//! Both temp files are removed on every exit path by their RAII handles.

use crate::heif::{BridgeError, HeifCodec};
use image::DynamicImage;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unrecognized or corrupt image data: {0}")]
    Malformed(#[from] image::ImageError),
    #[error("failed to stage HEIF input for conversion: {0}")]
    Stage(#[source] std::io::Error),
    #[error("HEIF conversion failed: {0}")]
    Bridge(#[from] BridgeError),
    #[error("failed to read converted JPEG: {0}")]
    ReadConverted(#[source] std::io::Error),
    #[error("converted JPEG did not decode: {0}")]
    ConvertedJpeg(#[source] image::ImageError),
}

/// ISO-BMFF brands that mark HEIF/HEIC containers. The brand sits at byte
/// offset 8, directly after the box size and the `ftyp` tag at offset 4.
const HEIF_BRANDS: [&[u8; 4]; 4] = [b"heic", b"heif", b"mif1", b"msf1"];

/// Whether `bytes` look like a HEIF/HEIC container.
pub fn is_heif(bytes: &[u8]) -> bool {
    let Some(header) = bytes.get(4..12) else {
        return false;
    };
    &header[..4] == b"ftyp" && HEIF_BRANDS.iter().any(|brand| &header[4..] == *brand)
}

/// Decode an uploaded byte stream into an image.
///
/// `heif` is only consulted for HEIF inputs; decoding any other format never
/// touches the filesystem.
pub fn decode(bytes: &[u8], heif: &dyn HeifCodec) -> Result<DynamicImage, DecodeError> {
    if is_heif(bytes) {
        return decode_heif(bytes, heif);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Bridge decode: stage → convert at quality 100 → read back → decode JPEG.
fn decode_heif(bytes: &[u8], heif: &dyn HeifCodec) -> Result<DynamicImage, DecodeError> {
    let mut input = tempfile::Builder::new()
        .prefix("rastermill-in-")
        .suffix(".heic")
        .tempfile()
        .map_err(DecodeError::Stage)?;
    input.write_all(bytes).map_err(DecodeError::Stage)?;
    input.flush().map_err(DecodeError::Stage)?;

    let output = tempfile::Builder::new()
        .prefix("rastermill-out-")
        .suffix(".jpg")
        .tempfile()
        .map_err(DecodeError::Stage)?;

    // Maximum fidelity here; the caller's quality knob applies at final encode.
    heif.heif_to_jpeg(input.path(), output.path(), 100)?;

    let jpeg = std::fs::read(output.path()).map_err(DecodeError::ReadConverted)?;
    image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg)
        .map_err(DecodeError::ConvertedJpeg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::path::Path;

    /// Codec stub that "converts" by writing a synthetic JPEG to the output
    /// path, so the bridge path runs without libheif installed.
    struct FakeHeifCodec {
        width: u32,
        height: u32,
    }

    impl HeifCodec for FakeHeifCodec {
        fn heif_to_jpeg(&self, _input: &Path, output: &Path, _quality: u8) -> Result<(), BridgeError> {
            let img = RgbImage::from_fn(self.width, self.height, |x, y| {
                image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
            });
            DynamicImage::ImageRgb8(img)
                .save_with_format(output, image::ImageFormat::Jpeg)
                .map_err(|e| BridgeError::Io(std::io::Error::other(e.to_string())))
        }

        fn image_to_heif(&self, _input: &Path, _output: &Path) -> Result<(), BridgeError> {
            unimplemented!("decode tests never encode")
        }
    }

    /// Codec stub whose conversions always fail.
    struct BrokenHeifCodec;

    impl HeifCodec for BrokenHeifCodec {
        fn heif_to_jpeg(&self, _: &Path, _: &Path, _: u8) -> Result<(), BridgeError> {
            Err(BridgeError::TimedOut {
                tool: "broken".into(),
                timeout: std::time::Duration::ZERO,
            })
        }

        fn image_to_heif(&self, _: &Path, _: &Path) -> Result<(), BridgeError> {
            unimplemented!()
        }
    }

    fn heif_header(brand: &[u8; 4]) -> Vec<u8> {
        let mut bytes = vec![0, 0, 0, 24];
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(brand);
        bytes.extend_from_slice(&[0u8; 32]);
        bytes
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 200])
        });
        let mut buf = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn sniffs_all_heif_brands() {
        for brand in [b"heic", b"heif", b"mif1", b"msf1"] {
            assert!(is_heif(&heif_header(brand)), "brand {brand:?}");
        }
    }

    #[test]
    fn does_not_sniff_other_data() {
        assert!(!is_heif(&png_bytes(4, 4)));
        assert!(!is_heif(b"ftypheic")); // brand must sit at offset 4
        assert!(!is_heif(&heif_header(b"avif")));
        assert!(!is_heif(b"short"));
        assert!(!is_heif(&[]));
    }

    #[test]
    fn decodes_png_without_touching_the_bridge() {
        let img = decode(&png_bytes(20, 10), &BrokenHeifCodec).unwrap();
        assert_eq!((img.width(), img.height()), (20, 10));
    }

    #[test]
    fn garbage_input_is_a_malformed_error() {
        let err = decode(&[1, 2, 3, 4, 5, 6, 7, 8], &BrokenHeifCodec).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn heif_input_goes_through_the_bridge() {
        let codec = FakeHeifCodec {
            width: 30,
            height: 12,
        };
        let img = decode(&heif_header(b"heic"), &codec).unwrap();
        assert_eq!((img.width(), img.height()), (30, 12));
    }

    #[test]
    fn bridge_failure_surfaces_as_decode_error() {
        let err = decode(&heif_header(b"heif"), &BrokenHeifCodec).unwrap_err();
        assert!(matches!(err, DecodeError::Bridge(_)), "got {err:?}");
    }
}
