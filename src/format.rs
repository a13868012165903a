//! Output format registry.
//!
//! The set of formats this crate can write is closed, so it is an enum rather
//! than a string table: the encoder dispatch in [`encode`](crate::encode)
//! matches on [`OutputFormat`] exhaustively, and adding a format is a
//! compile-time checklist instead of a runtime string switch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A format the pipeline can encode to.
///
/// `jpg` parses to [`Jpeg`](OutputFormat::Jpeg) and `heic` to
/// [`Heif`](OutputFormat::Heif); the two spellings are equivalent everywhere
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Heif,
    Pdf,
}

impl OutputFormat {
    /// Parse a requested format name.
    ///
    /// Recognizes exactly `jpeg, jpg, png, webp, gif, bmp, heic, heif, pdf`,
    /// case-sensitive. Anything else is rejected — unknown names are not
    /// corrected or guessed.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "heic" | "heif" => Some(Self::Heif),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Canonical lowercase name, used in error messages and file suffixes.
    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Heif => "heif",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `name` is an accepted output format request.
///
/// This is the validation gate at pipeline entry; requests that fail it never
/// reach a transform stage.
pub fn is_valid_format(name: &str) -> bool {
    OutputFormat::parse(name).is_some()
}
