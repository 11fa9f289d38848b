//! # blight
//!
//! BMP and TGA raster decoding into a uniform in-memory representation.
//!
//! Every decode produces an [`Image`] whose pixels carry one of four
//! canonical layouts — [`PixelTag::Rgba32`], [`PixelTag::Rgb16`],
//! [`PixelTag::R8`], [`PixelTag::R16`] — chosen by a per-source
//! preference order filtered through the caller's [`Options`].
//!
//! ## Supported formats
//!
//! - **BMP** — OS/2 Core and Windows V1/V4/V5 info headers; depths
//!   1/4/8/16/24/32; color tables (with greyscale collapse);
//!   BITFIELDS / ALPHABITFIELDS channel masks; RLE4/RLE8.
//! - **TGA** — V1 and V2; color-mapped, truecolor and greyscale, plain
//!   or packet-RLE; V2 footer, extension area and optional tables, with
//!   every byte region validated against overlaps.
//! - **PNG / JPG** — recognized during format inference only; loading
//!   one fails with [`BlightError::FormatDisabled`].
//!
//! ## Usage
//!
//! ```no_run
//! use blight::{load, Options, PixelTag};
//!
//! let options = Options::default();
//! let image = load("textures", "stone.tga", None, &options)?;
//! assert!(image.tag()?.is_canonical_output());
//! # Ok::<(), blight::BlightError>(())
//! ```
//!
//! Decoding straight from memory works without `std`:
//!
//! ```no_run
//! use blight::{load_from_memory, ImageFormat, Options};
//!
//! # let bytes: &[u8] = &[];
//! let image = load_from_memory(bytes, Some(ImageFormat::Bmp), &Options::default())?;
//! # Ok::<(), blight::BlightError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod bmp;
mod buffer;
mod error;
mod extent;
mod format;
mod options;
mod pixel;
mod source;
mod tga;
mod transfer;

pub use bmp::{BmpCompression, BmpInfo, BmpVariant};
pub use buffer::{FormatInfo, Image, PixelContainer};
pub use error::BlightError;
pub use extent::{BlockExtent, ExtentBuffer};
pub use format::ImageFormat;
pub use options::{FormatSet, Options, OutputTagSet, DEFAULT_MAX_ALLOC};
pub use pixel::{Alpha, PixelTag};
pub use tga::{
    TgaColorMapSpec, TgaExtensionArea, TgaFooter, TgaHeader, TgaImageSpec, TgaImageType,
    TgaInfo, TgaVersion,
};

// Re-export the rgb pixel type used in the public surface.
pub use rgb::RGBA8;

/// Longest resolved path `load` accepts, in bytes.
pub const MAX_FULL_PATH: usize = 4096;

// ── Format detection ────────────────────────────────────────────────

/// Detect an image format from file content alone.
///
/// `"BM"` head ⇒ BMP, the PNG signature ⇒ PNG, a trailing
/// `TRUEVISION-XFILE` footer ⇒ TGA. Returns `None` for everything else
/// (V1 TGA files carry no magic and are only reachable by extension or
/// hint).
pub fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    ImageFormat::detect(data)
}

// ── Decoding from memory ────────────────────────────────────────────

/// Decode a BMP byte stream.
pub fn decode_bmp(data: &[u8], options: &Options) -> Result<Image<'static>, BlightError> {
    bmp::decode(data, options)
}

/// Decode a TGA byte stream.
pub fn decode_tga(data: &[u8], options: &Options) -> Result<Image<'static>, BlightError> {
    tga::decode(data, options)
}

/// Decode an in-memory file, inferring the format from content when no
/// hint is given. Applies the same whitelist and single-redirect rules
/// as [`load`].
pub fn load_from_memory(
    data: &[u8],
    format: Option<ImageFormat>,
    options: &Options,
) -> Result<Image<'static>, BlightError> {
    options.check_alloc(data.len() as u64)?;
    let format = match format {
        Some(f) => f,
        None => ImageFormat::detect(data).ok_or(BlightError::UnableToInferFormat)?,
    };
    dispatch(data, format, options, true)
}

fn dispatch(
    data: &[u8],
    format: ImageFormat,
    options: &Options,
    allow_redirect: bool,
) -> Result<Image<'static>, BlightError> {
    if !options.allowed_formats.allows(format) {
        return Err(BlightError::InputFormatDisallowed(format));
    }
    let result = match format {
        ImageFormat::Bmp => bmp::decode(data, options),
        ImageFormat::Tga => tga::decode(data, options),
        ImageFormat::Jpg | ImageFormat::Png => Err(BlightError::FormatDisabled(format)),
    };
    match result {
        Err(err) if allow_redirect && identity_mismatch(&err) => {
            // The extension (or hint) lied about the content. Disallow
            // the attempted format, re-infer from content, and try the
            // new format once.
            let mut retry = options.clone();
            retry.allowed_formats.deny(format);
            let Some(inferred) = ImageFormat::detect(data) else {
                return Err(BlightError::UnableToInferFormat);
            };
            if inferred == format {
                return Err(BlightError::UnableToVerifyFileImageFormat);
            }
            if !retry.allowed_formats.allows(inferred) {
                return Err(BlightError::UnableToInferFormat);
            }
            dispatch(data, inferred, &retry, false)
        }
        other => other,
    }
}

/// Errors that mean "this content is not the format we tried" rather
/// than "this file of that format is broken".
fn identity_mismatch(err: &BlightError) -> bool {
    matches!(
        err,
        BlightError::BmpInvalidBytesInFileHeader
            | BlightError::InvalidSizeForFormat
            | BlightError::TgaImageTypeUnsupported(_)
    )
}

// ── Loading from disk ───────────────────────────────────────────────

/// Open `path`/`filename`, infer its format, and decode it.
///
/// Inference runs in two stages: the lowercased file extension first,
/// then the content probe of [`detect_format`]. The decode obeys
/// `options.allowed_formats`; when a decoder reports that the content
/// does not match the inferred format, one redirect by content is
/// attempted before giving up.
#[cfg(feature = "std")]
pub fn load(
    path: &str,
    filename: &str,
    format: Option<ImageFormat>,
    options: &Options,
) -> Result<Image<'static>, BlightError> {
    if filename.is_empty() {
        return Err(BlightError::InvalidFileExtension);
    }
    let mut full = std::path::PathBuf::from(path);
    full.push(filename);
    let full = if options.local_path {
        full
    } else {
        std::path::absolute(&full)?
    };
    if full.as_os_str().len() > MAX_FULL_PATH {
        return Err(BlightError::FullPathTooLong);
    }

    let meta = std::fs::metadata(&full)?;
    options.check_alloc(meta.len())?;
    let data = std::fs::read(&full)?;
    if (data.len() as u64) < meta.len() {
        return Err(BlightError::PartialRead {
            got: data.len(),
            wanted: meta.len() as usize,
        });
    }

    let format = match format {
        Some(f) => f,
        None => infer_format(filename, &data)?,
    };
    dispatch(&data, format, options, true)
}

#[cfg(feature = "std")]
fn infer_format(filename: &str, data: &[u8]) -> Result<ImageFormat, BlightError> {
    if let Some((_, ext)) = filename.rsplit_once('.') {
        if let Some(f) = ImageFormat::from_extension(ext) {
            return Ok(f);
        }
    }
    ImageFormat::detect(data).ok_or(BlightError::UnableToInferFormat)
}
