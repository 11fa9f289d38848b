use crate::format::ImageFormat;
use crate::pixel::PixelTag;

/// Errors from Blight decoding and dispatch.
///
/// A closed taxonomy: callers match on the kind, never on the message.
#[derive(Debug, thiserror::Error)]
pub enum BlightError {
    // ── Path / IO ───────────────────────────────────────────────────

    #[error("resolved file path is too long")]
    FullPathTooLong,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("short read: got {got} of {wanted} bytes")]
    PartialRead { got: usize, wanted: usize },

    #[cfg(feature = "std")]
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    // ── Policy ──────────────────────────────────────────────────────

    #[error("{0:?} is recognized but its decoder is disabled")]
    FormatDisabled(ImageFormat),

    #[error("input format {0:?} is not in the allowed set")]
    InputFormatDisallowed(ImageFormat),

    #[error("output pixel tag {0:?} is not in the allowed set")]
    OutputFormatDisallowed(PixelTag),

    #[error("no permitted output pixel format for this source")]
    NoImageFormatsAllowed,

    #[error("allocation of {wanted} bytes exceeds the {limit}-byte ceiling")]
    AllocTooLarge { wanted: u64, limit: u64 },

    // ── Inference ───────────────────────────────────────────────────

    #[error("file format could not be inferred from extension or content")]
    UnableToInferFormat,

    #[error("file content does not match any verifiable image format")]
    UnableToVerifyFileImageFormat,

    #[error("file name carries no usable extension")]
    InvalidFileExtension,

    // ── Structural ──────────────────────────────────────────────────

    #[error("file is smaller than the minimum for its format")]
    InvalidSizeForFormat,

    #[error("byte range [{begin}, {end}) overlaps an already-claimed region")]
    OverlappingData { begin: u32, end: u32 },

    #[error("write past the end of the image buffer")]
    UnexpectedEndOfImageBuffer,

    #[error("image dimensions {width}x{height} are too large")]
    DimensionTooLarge { width: u32, height: u32 },

    #[error("color table index {index} out of range (table has {entries} entries)")]
    InvalidColorTableIndex { index: u16, entries: u16 },

    // ── BMP ─────────────────────────────────────────────────────────

    #[error("invalid bytes in BMP file header")]
    BmpInvalidBytesInFileHeader,

    #[error("invalid bytes in BMP info header")]
    BmpInvalidBytesInInfoHeader,

    #[error("BMP info header size {0} names no supported header version")]
    BmpInvalidHeaderSizeOrVersionUnsupported(u32),

    #[error("BMP width/height fields are invalid")]
    BmpInvalidSizeInfo,

    #[error("BMP bit depth {0} is invalid")]
    BmpInvalidColorDepth(u16),

    #[error("BMP color count {0} is invalid for the stated bit depth")]
    BmpInvalidColorCount(u32),

    #[error("BMP color table is missing or truncated")]
    BmpInvalidColorTable,

    #[error("BMP color space {0:#010x} is unsupported")]
    BmpColorSpaceUnsupported(u32),

    #[error("BMP compression {0} is recognized but unsupported")]
    BmpCompressionUnsupported(u32),

    #[error("BMP compression tag {0} is invalid for this header")]
    BmpInvalidCompression(u32),

    #[error("BMP channel masks overlap or exceed the bit depth")]
    BmpInvalidColorMasks,

    #[error("BMP RLE cursor moved outside the image bounds")]
    BmpRleCoordinatesOutOfBounds,

    #[error("BMP RLE stream is malformed or truncated")]
    BmpInvalidRleData,

    // ── TGA ─────────────────────────────────────────────────────────

    #[error("TGA image type {0} is unsupported")]
    TgaImageTypeUnsupported(u8),

    #[error("TGA color map data present in a non-color-mapped image")]
    TgaColorMapDataInNonColorMapImage,

    #[error("TGA color map type {0} is non-standard")]
    TgaNonStandardColorTableUnsupported(u8),

    #[error("TGA color map entry depth {0} is non-standard")]
    TgaNonStandardColorDepthUnsupported(u8),

    #[error("TGA pixel depth {0} does not fit any pixel format for this image type")]
    TgaNonStandardColorDepthForPixelFormat(u8),

    #[error("TGA color-mapped image has {0}-bit indices, expected 8")]
    TgaColorTableImageNot8BitColorDepth(u8),

    #[error("TGA image carries no pixel data")]
    TgaNoData,

    #[error("TGA flavor (interleaved pixel data) is unsupported")]
    TgaFlavorUnsupported,

    // ── Container ───────────────────────────────────────────────────

    #[error("pixel container already holds data")]
    NotEmptyOnCreate,

    #[error("pixel container carries no active pixel tag")]
    InactivePixelTag,

    #[error("pixel tag {0:?} names a file layout, not an image type")]
    NoImageTypeAttachedToPixelTag(PixelTag),
}
