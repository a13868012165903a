//! End-to-end runs through the public API: synthetic bytes in, encoded
//! bytes out, decoded back where an in-process decoder exists.

use image::{DynamicImage, RgbImage};
use rastermill::{ImageProcessor, OutputFormat, ProcessError, ProcessOptions, Quality, ResizeMode};

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 160])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn options_for(format: &str) -> ProcessOptions {
    ProcessOptions {
        output_format: Some(format.to_string()),
        ..ProcessOptions::default()
    }
}

#[test]
fn png_to_png_preserves_pixels() {
    let input = png_fixture(60, 40);
    let processor = ImageProcessor::new();

    let mut output = Vec::new();
    processor
        .process_bytes(&input, &options_for("png"), &mut output)
        .unwrap();

    let original = image::load_from_memory(&input).unwrap();
    let round_tripped = image::load_from_memory(&output).unwrap();
    assert_eq!(original.to_rgba8().as_raw(), round_tripped.to_rgba8().as_raw());
}

#[test]
fn resize_and_convert_to_jpeg() {
    let input = png_fixture(200, 100);
    let processor = ImageProcessor::new();
    let options = ProcessOptions {
        width: 100,
        height: 100,
        resize_mode: ResizeMode::Fit,
        quality: Quality::new(80),
        ..options_for("jpeg")
    };

    let mut output = Vec::new();
    processor.process_bytes(&input, &options, &mut output).unwrap();

    let decoded = image::load_from_memory(&output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 50));
}

#[test]
fn every_in_process_format_produces_decodable_output() {
    let input = png_fixture(32, 32);
    let processor = ImageProcessor::new();

    for format in ["jpeg", "png", "webp", "gif", "bmp"] {
        let mut output = Vec::new();
        processor
            .process_bytes(&input, &options_for(format), &mut output)
            .unwrap_or_else(|e| panic!("{format}: {e}"));
        let decoded = image::load_from_memory(&output)
            .unwrap_or_else(|e| panic!("{format} output did not decode: {e}"));
        assert_eq!((decoded.width(), decoded.height()), (32, 32), "{format}");
    }
}

#[test]
fn pdf_output_is_a_pdf_document() {
    let input = png_fixture(100, 50);
    let processor = ImageProcessor::new();

    let mut output = Vec::new();
    processor
        .process_bytes(&input, &options_for("pdf"), &mut output)
        .unwrap();
    assert!(output.starts_with(b"%PDF-"));
}

#[test]
fn full_option_set_runs_all_stages() {
    let input = png_fixture(120, 80);
    let processor = ImageProcessor::new();
    let options = ProcessOptions {
        width: 60,
        height: 0,
        resize_mode: ResizeMode::Fit,
        remove_background: true,
        optimize: true,
        quality: Quality::new(70),
        ..options_for("png")
    };

    let img = processor.decode(&input).unwrap();
    let result = processor.process(img, &options).unwrap();
    assert_eq!(result.format, OutputFormat::Png);
    assert_eq!((result.image.width(), result.image.height()), (60, 40));
}

#[test]
fn unsupported_format_fails_before_decode_work_matters() {
    let processor = ImageProcessor::new();
    let img = processor.decode(&png_fixture(8, 8)).unwrap();
    let err = processor
        .process(img, &options_for("tiff"))
        .unwrap_err();
    assert!(matches!(err, ProcessError::UnsupportedFormat { .. }));
}

#[test]
fn format_rejection_happens_before_decoding() {
    let processor = ImageProcessor::new();
    let mut output = Vec::new();
    // Input is garbage, but the format error must win: validation precedes decode
    let err = processor
        .process_bytes(b"garbage", &options_for("tiff"), &mut output)
        .unwrap_err();
    assert!(matches!(err, ProcessError::UnsupportedFormat { .. }));
}

#[test]
fn malformed_input_is_a_decode_error() {
    let processor = ImageProcessor::new();
    let mut output = Vec::new();
    let err = processor
        .process_bytes(b"not an image at all", &options_for("png"), &mut output)
        .unwrap_err();
    assert!(matches!(err, ProcessError::Decode(_)));
    assert!(output.is_empty(), "no partial bytes on failure");
}
