use alloc::borrow::Cow;
use alloc::vec;

use crate::bmp::BmpInfo;
use crate::error::BlightError;
use crate::pixel::{Alpha, PixelTag};
use crate::tga::TgaInfo;

// ── Pixel container ─────────────────────────────────────────────────

/// Tagged byte buffer holding pixel data, owning or borrowed.
#[derive(Clone, Debug)]
pub struct PixelContainer<'a> {
    bytes: Cow<'a, [u8]>,
    tag: Option<PixelTag>,
}

impl Default for PixelContainer<'_> {
    fn default() -> Self {
        Self {
            bytes: Cow::Borrowed(&[]),
            tag: None,
        }
    }
}

impl<'a> PixelContainer<'a> {
    /// An empty, untagged container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an owned, zeroed buffer for `pixel_count` pixels of `tag`.
    pub fn alloc(&mut self, tag: PixelTag, pixel_count: usize) -> Result<(), BlightError> {
        if !self.bytes.is_empty() {
            return Err(BlightError::NotEmptyOnCreate);
        }
        if tag.is_source_only() {
            return Err(BlightError::NoImageTypeAttachedToPixelTag(tag));
        }
        let byte_len = pixel_count
            .checked_mul(tag.size_bytes())
            .ok_or(BlightError::UnexpectedEndOfImageBuffer)?;
        self.bytes = Cow::Owned(vec![0u8; byte_len]);
        self.tag = Some(tag);
        Ok(())
    }

    /// Attach a caller-supplied byte region without copying.
    pub fn attach(&mut self, tag: PixelTag, bytes: &'a [u8]) -> Result<(), BlightError> {
        if !self.bytes.is_empty() {
            return Err(BlightError::NotEmptyOnCreate);
        }
        if tag.is_source_only() {
            return Err(BlightError::NoImageTypeAttachedToPixelTag(tag));
        }
        self.bytes = Cow::Borrowed(bytes);
        self.tag = Some(tag);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.bytes, Cow::Borrowed(_))
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// The active pixel tag; empty containers have none.
    pub fn tag(&self) -> Result<PixelTag, BlightError> {
        self.tag.ok_or(BlightError::InactivePixelTag)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes.to_mut()
    }

    /// Copy borrowed data so the container owns its bytes.
    pub fn into_owned(self) -> PixelContainer<'static> {
        PixelContainer {
            bytes: Cow::Owned(self.bytes.into_owned()),
            tag: self.tag,
        }
    }
}

// ── Format-specific metadata ────────────────────────────────────────

/// Header metadata surviving a decode, by source format.
#[derive(Clone, Debug, Default)]
pub enum FormatInfo {
    #[default]
    None,
    Bmp(BmpInfo),
    Tga(TgaInfo),
}

// ── Image ───────────────────────────────────────────────────────────

/// A decoded raster image: dimensions, alpha mode, pixels, and the
/// scalar header metadata the decoder preserved.
///
/// After a successful decode the container's tag is one of the four
/// canonical outputs and `pixels.byte_len() == width * height *
/// tag.size_bytes()`.
#[derive(Clone, Debug, Default)]
pub struct Image<'a> {
    pub width: u32,
    pub height: u32,
    pub alpha: Alpha,
    pub pixels: PixelContainer<'a>,
    pub file_info: FormatInfo,
}

impl<'a> Image<'a> {
    /// An empty image with no pixel buffer.
    pub fn empty() -> Image<'static> {
        Image::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn tag(&self) -> Result<PixelTag, BlightError> {
        self.pixels.tag()
    }

    pub fn bytes(&self) -> &[u8] {
        self.pixels.bytes()
    }

    /// Zero-copy view of an `Rgba32` image as typed RGBA pixels.
    #[cfg(feature = "imgref")]
    pub fn as_rgba_imgref(&self) -> Result<imgref::ImgRef<'_, rgb::RGBA8>, BlightError> {
        use rgb::AsPixels as _;
        if self.tag()? != PixelTag::Rgba32 {
            return Err(BlightError::OutputFormatDisallowed(self.tag()?));
        }
        Ok(imgref::ImgRef::new(
            self.bytes().as_pixels(),
            self.width as usize,
            self.height as usize,
        ))
    }
}
