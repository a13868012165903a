//! Single-page PDF output.
//!
//! The image is JPEG-encoded at the requested quality and embedded as a
//! DCTDecode XObject on one A4 page: fit-to-page scale inside a 10 mm
//! margin, centered. Physical size derives purely from pixel dimensions and
//! the fit scale — no DPI preservation, no pagination.

use crate::quality::Quality;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("failed to encode page image: {0}")]
    PageImage(#[source] image::ImageError),
    #[error("failed to assemble document: {0}")]
    Document(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const MARGIN_MM: f64 = 10.0;

const MM_TO_PT: f64 = 72.0 / 25.4;

/// Where the image lands on the page, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Fit `width_px` × `height_px` inside the A4 margins and center it.
pub fn placement(width_px: u32, height_px: u32) -> Placement {
    let available_w = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let available_h = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
    let scale = (available_w / width_px as f64).min(available_h / height_px as f64);
    let width = width_px as f64 * scale;
    let height = height_px as f64 * scale;
    Placement {
        x: (PAGE_WIDTH_MM - width) / 2.0,
        y: (PAGE_HEIGHT_MM - height) / 2.0,
        width,
        height,
    }
}

/// Build the one-page document and serialize it to `writer`.
pub fn write_pdf<W: Write>(
    writer: &mut W,
    img: &DynamicImage,
    quality: Quality,
) -> Result<(), PdfError> {
    let mut jpeg = Vec::new();
    let rgb = img.to_rgb8();
    let mut cursor = std::io::Cursor::new(&mut jpeg);
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.value());
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(PdfError::PageImage)?;

    let place = placement(rgb.width(), rgb.height());

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => rgb.width() as i64,
            "Height" => rgb.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    ((place.width * MM_TO_PT) as f32).into(),
                    0.into(),
                    0.into(),
                    ((place.height * MM_TO_PT) as f32).into(),
                    ((place.x * MM_TO_PT) as f32).into(),
                    ((place.y * MM_TO_PT) as f32).into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            ((PAGE_WIDTH_MM * MM_TO_PT) as f32).into(),
            ((PAGE_HEIGHT_MM * MM_TO_PT) as f32).into(),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save_to(writer)?;
    Ok(())
}
