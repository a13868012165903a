//! Pipeline orchestration.
//!
//! [`ImageProcessor`] wires the collaborators together and runs the fixed
//! stage order: resolve format → background removal → resize → optimize.
//! Every stage is optional and independently toggled; a failing stage is
//! terminal and discards whatever the earlier stages produced. Collaborators
//! are injected, so tests can assert ordering and short-circuiting with
//! recording stubs and no pixel work.

use crate::background::{BackgroundError, BackgroundRemover, BorderMatte};
use crate::decode::{self, DecodeError};
use crate::encode::{EncodeError, ProcessedImage};
use crate::format::OutputFormat;
use crate::heif::{HeifCodec, LibheifCli};
use crate::optimize::{Optimizer, OptimizeError, ReencodeOptimizer, options_for_quality};
use crate::quality::{Quality, QualityTier};
use crate::resize::{LanczosResizer, ResizeError, ResizeMode, ResizeRequest, Resizer};
use image::DynamicImage;
use image::imageops::FilterType;
use serde::Deserialize;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("unsupported output format: {name}")]
    UnsupportedFormat { name: String },
    #[error("failed to decode input: {0}")]
    Decode(#[from] DecodeError),
    #[error("failed to remove background: {0}")]
    Background(#[source] BackgroundError),
    #[error("failed to resize image: {0}")]
    Resize(#[source] ResizeError),
    #[error("failed to optimize image: {0}")]
    Optimize(#[source] OptimizeError),
    #[error("failed to decode optimized image: {0}")]
    OptimizedDecode(#[source] image::ImageError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] EncodeError),
}

/// Caller-selected options for one request. Immutable once built; the HTTP
/// layer deserializes this straight from form fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    /// Target width in pixels; 0 means unconstrained.
    pub width: u32,
    /// Target height in pixels; 0 means unconstrained.
    pub height: u32,
    pub resize_mode: ResizeMode,
    /// Requested output format name; `None` or empty falls back to the
    /// configured default.
    pub output_format: Option<String>,
    pub quality: Quality,
    pub remove_background: bool,
    pub optimize: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            resize_mode: ResizeMode::default(),
            output_format: None,
            quality: Quality::default(),
            remove_background: false,
            optimize: false,
        }
    }
}

/// Process-wide defaults, set once at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub default_quality: Quality,
    pub default_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_quality: Quality::new(85),
            default_format: OutputFormat::Jpeg,
        }
    }
}

/// The processing pipeline with its injected collaborators.
pub struct ImageProcessor {
    config: Config,
    background: Box<dyn BackgroundRemover>,
    resizer: Box<dyn Resizer>,
    optimizer: Box<dyn Optimizer>,
    heif: Box<dyn HeifCodec>,
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            background: Box::new(BorderMatte::new()),
            resizer: Box::new(LanczosResizer),
            optimizer: Box::new(ReencodeOptimizer),
            heif: Box::new(LibheifCli::new()),
        }
    }

    pub fn with_background(mut self, background: Box<dyn BackgroundRemover>) -> Self {
        self.background = background;
        self
    }

    pub fn with_resizer(mut self, resizer: Box<dyn Resizer>) -> Self {
        self.resizer = resizer;
        self
    }

    pub fn with_optimizer(mut self, optimizer: Box<dyn Optimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_heif_codec(mut self, heif: Box<dyn HeifCodec>) -> Self {
        self.heif = heif;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode an uploaded byte stream, bridging HEIF inputs.
    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, ProcessError> {
        Ok(decode::decode(bytes, self.heif.as_ref())?)
    }

    /// Run the transform stages over a decoded image.
    pub fn process(
        &self,
        img: DynamicImage,
        options: &ProcessOptions,
    ) -> Result<ProcessedImage, ProcessError> {
        let format = self.resolve_format(options)?;

        let mut img = img;

        if options.remove_background {
            img = self
                .background
                .remove_background(img)
                .map_err(ProcessError::Background)?;
        }

        if options.width > 0 || options.height > 0 {
            img = self
                .resizer
                .resize(
                    img,
                    &ResizeRequest {
                        width: options.width,
                        height: options.height,
                        mode: options.resize_mode,
                        filter: FilterType::Lanczos3,
                    },
                )
                .map_err(ProcessError::Resize)?;
        }

        if options.optimize {
            let tier = QualityTier::from_quality(options.quality);
            let optimize_options = options_for_quality(format, tier);
            let mut buf = Vec::new();
            self.optimizer
                .optimize(&mut buf, &img, format, &optimize_options)
                .map_err(ProcessError::Optimize)?;
            // Full round trip: the optimize pass is lossy-in/lossy-out
            img = image::load_from_memory(&buf).map_err(ProcessError::OptimizedDecode)?;
        }

        Ok(ProcessedImage {
            image: img,
            format,
            quality: options.quality,
        })
    }

    /// Serialize a processed result to `writer`.
    pub fn write<W: Write>(&self, result: ProcessedImage, writer: &mut W) -> Result<(), ProcessError> {
        Ok(result.write_to(writer, self.heif.as_ref())?)
    }

    /// Decode, process, and encode in one call.
    pub fn process_bytes<W: Write>(
        &self,
        bytes: &[u8],
        options: &ProcessOptions,
        writer: &mut W,
    ) -> Result<(), ProcessError> {
        // Validation gate first: a bad format request must fail before any
        // decode work happens
        self.resolve_format(options)?;
        let img = self.decode(bytes)?;
        let result = self.process(img, options)?;
        self.write(result, writer)
    }

    fn resolve_format(&self, options: &ProcessOptions) -> Result<OutputFormat, ProcessError> {
        match options.output_format.as_deref() {
            None | Some("") => Ok(self.config.default_format),
            Some(name) => {
                OutputFormat::parse(name).ok_or_else(|| ProcessError::UnsupportedFormat {
                    name: name.to_string(),
                })
            }
        }
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}
