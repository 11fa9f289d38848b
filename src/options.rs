use crate::error::BlightError;
use crate::format::ImageFormat;
use crate::pixel::{Alpha, PixelTag};

/// Default allocation ceiling: 1 GiB.
pub const DEFAULT_MAX_ALLOC: u64 = 1 << 30;

/// Set of input formats a load call may decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatSet {
    pub bmp: bool,
    pub jpg: bool,
    pub png: bool,
    pub tga: bool,
}

impl Default for FormatSet {
    fn default() -> Self {
        Self {
            bmp: true,
            jpg: true,
            png: true,
            tga: true,
        }
    }
}

impl FormatSet {
    pub fn allows(&self, format: ImageFormat) -> bool {
        match format {
            ImageFormat::Bmp => self.bmp,
            ImageFormat::Jpg => self.jpg,
            ImageFormat::Png => self.png,
            ImageFormat::Tga => self.tga,
        }
    }

    pub fn deny(&mut self, format: ImageFormat) {
        match format {
            ImageFormat::Bmp => self.bmp = false,
            ImageFormat::Jpg => self.jpg = false,
            ImageFormat::Png => self.png = false,
            ImageFormat::Tga => self.tga = false,
        }
    }
}

/// Set of canonical output pixel tags a decode may produce.
///
/// Callers do not pick an output layout directly; they forbid the tags
/// they cannot consume and the per-source preference order selects among
/// the remainder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputTagSet {
    pub rgba32: bool,
    pub rgb16: bool,
    pub r8: bool,
    pub r16: bool,
}

impl Default for OutputTagSet {
    fn default() -> Self {
        Self {
            rgba32: true,
            rgb16: true,
            r8: true,
            r16: true,
        }
    }
}

impl OutputTagSet {
    /// Only meaningful for the four canonical tags; everything else is
    /// never an output and reads as disallowed.
    pub fn allows(&self, tag: PixelTag) -> bool {
        match tag {
            PixelTag::Rgba32 => self.rgba32,
            PixelTag::Rgb16 => self.rgb16,
            PixelTag::R8 => self.r8,
            PixelTag::R16 => self.r16,
            _ => false,
        }
    }

    pub fn only(tag: PixelTag) -> Self {
        Self {
            rgba32: tag == PixelTag::Rgba32,
            rgb16: tag == PixelTag::Rgb16,
            r8: tag == PixelTag::R8,
            r16: tag == PixelTag::R16,
        }
    }
}

/// Load/save configuration bundle.
#[derive(Clone, Debug)]
pub struct Options {
    /// Input formats `load` is permitted to decode.
    pub allowed_formats: FormatSet,
    /// Canonical output tags a decode is permitted to produce.
    pub allowed_output_tags: OutputTagSet,
    /// Alpha policy applied when saving (saving is not yet wired up).
    pub save_alpha: Alpha,
    /// Keep relative paths relative instead of resolving to absolute.
    pub local_path: bool,
    /// Ceiling on any single allocation, file buffer included.
    pub max_alloc: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allowed_formats: FormatSet::default(),
            allowed_output_tags: OutputTagSet::default(),
            save_alpha: Alpha::None,
            local_path: false,
            max_alloc: DEFAULT_MAX_ALLOC,
        }
    }
}

impl Options {
    /// Check an allocation size against the ceiling.
    pub(crate) fn check_alloc(&self, bytes: u64) -> Result<(), BlightError> {
        if bytes > self.max_alloc {
            return Err(BlightError::AllocTooLarge {
                wanted: bytes,
                limit: self.max_alloc,
            });
        }
        Ok(())
    }
}
