//! # rastermill
//!
//! An image conversion pipeline: take an uploaded raster image, apply a
//! caller-selected set of transforms, and re-encode it into one of a fixed
//! set of output formats (JPEG, PNG, WebP, GIF, BMP, HEIC/HEIF, PDF).
//!
//! # Architecture: One Fixed Pipeline
//!
//! Every request flows through the same ordered stages, each optional and
//! independently toggled:
//!
//! ```text
//! bytes → decode → [background removal] → [resize] → [optimize] → encode → bytes
//! ```
//!
//! A failing stage is terminal: earlier transforms are discarded and only
//! the error reaches the caller. There is no retry and no partial output.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`format`] | Closed [`OutputFormat`] enum — the validation gate and dispatch key |
//! | [`quality`] | 0–100 quality knob → tiers and per-codec encoder parameters |
//! | [`decode`] | Byte-stream decoding, including the HEIF bridge path |
//! | [`heif`] | [`HeifCodec`] capability — out-of-process HEIF transcoding with a deadline |
//! | [`background`] | Background removal collaborator (border matte by default) |
//! | [`resize`] | Fit/fill/stretch resize collaborator, Lanczos3 resampling |
//! | [`optimize`] | Tier-driven lossy pre-pass, re-decoded before final encode |
//! | [`encode`] | [`ProcessedImage`] and the exhaustive per-format encoder dispatch |
//! | [`pdf`] | Single-page A4 embed with fit-to-page placement |
//! | [`pipeline`] | [`ImageProcessor`] orchestration, options, and config |
//!
//! # Design Decisions
//!
//! ## Two Quality Pathways
//!
//! The optimize stage maps quality onto a four-point tier and re-encodes at
//! the tier's setting, then the result is decoded back; the final encoder
//! separately derives its own parameter from the raw 0–100 value. The
//! pre-pass deliberately degrades the pixel data the final encode then
//! compresses — that is the optimization, not an accident.
//!
//! ## Out-of-Process HEIF
//!
//! No pure-Rust HEIF codec sits in this stack, so HEIF goes through
//! temp-file bridging to libheif's CLI tools behind the [`HeifCodec`] trait.
//! Temp files get unique random names and RAII cleanup, so concurrent
//! requests never collide and failures never leak files. Each invocation
//! runs under a deadline and is killed on expiry.
//!
//! ## Closed Format Set
//!
//! The encoder dispatch matches on an enum, not a string: an unsupported
//! format cannot reach the encoder because it cannot be constructed. New
//! formats are added by extending [`OutputFormat`], and the compiler points
//! at every match that needs a new arm.
//!
//! ## Injected Collaborators
//!
//! Background removal, resize, optimization, and the HEIF bridge sit behind
//! traits with working defaults. Pipeline tests swap in recording stubs to
//! pin the stage order and short-circuit behavior without touching pixels.
//!
//! # Example
//!
//! ```no_run
//! use rastermill::{ImageProcessor, ProcessOptions, Quality};
//!
//! let processor = ImageProcessor::new();
//! let options = ProcessOptions {
//!     width: 1200,
//!     output_format: Some("webp".to_string()),
//!     quality: Quality::new(80),
//!     optimize: true,
//!     ..ProcessOptions::default()
//! };
//!
//! let input = std::fs::read("photo.jpg")?;
//! let mut output = Vec::new();
//! processor.process_bytes(&input, &options, &mut output)?;
//! std::fs::write("photo.webp", &output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod background;
pub mod decode;
pub mod encode;
pub mod format;
pub mod heif;
pub mod optimize;
pub mod pdf;
pub mod pipeline;
pub mod quality;
pub mod resize;

pub use background::{BackgroundError, BackgroundRemover, BorderMatte};
pub use decode::DecodeError;
pub use encode::{EncodeError, ProcessedImage};
pub use format::{OutputFormat, is_valid_format};
pub use heif::{BridgeError, HeifCodec, LibheifCli};
pub use optimize::{OptimizeError, OptimizeOptions, Optimizer, ReencodeOptimizer};
pub use pipeline::{Config, ImageProcessor, ProcessError, ProcessOptions};
pub use quality::{Quality, QualityTier};
pub use resize::{LanczosResizer, ResizeError, ResizeMode, ResizeRequest, Resizer};
