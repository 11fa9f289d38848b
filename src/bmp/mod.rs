//! BMP (Windows / OS/2 device-independent bitmap) decoder.
//!
//! Handles the Core (OS/2), V1, V4 and V5 info-header variants, color
//! tables at depths 1/4/8, BITFIELDS / ALPHABITFIELDS channel masks,
//! and RLE4/RLE8 compression.

mod decode;

pub(crate) use decode::decode;

use crate::error::BlightError;

/// Info-header variant, selected by the stated header size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BmpVariant {
    /// 12-byte OS/2 BITMAPCOREHEADER.
    Core,
    /// 40-byte BITMAPINFOHEADER.
    V1,
    /// 108-byte BITMAPV4HEADER.
    V4,
    /// 124-byte BITMAPV5HEADER.
    V5,
}

impl BmpVariant {
    pub(crate) fn from_header_size(size: u32) -> Result<Self, BlightError> {
        match size {
            12 => Ok(Self::Core),
            40 => Ok(Self::V1),
            108 => Ok(Self::V4),
            124 => Ok(Self::V5),
            other => Err(BlightError::BmpInvalidHeaderSizeOrVersionUnsupported(other)),
        }
    }
}

/// Supported compression tags.
///
/// The header field also names JPEG/PNG/CMYK variants; those are
/// recognized and rejected with
/// [`BmpCompressionUnsupported`](BlightError::BmpCompressionUnsupported).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BmpCompression {
    Rgb,
    Rle8,
    Rle4,
    Bitfields,
    AlphaBitfields,
}

impl BmpCompression {
    pub(crate) fn from_u32(raw: u32) -> Result<Self, BlightError> {
        match raw {
            0 => Ok(Self::Rgb),
            1 => Ok(Self::Rle8),
            2 => Ok(Self::Rle4),
            3 => Ok(Self::Bitfields),
            6 => Ok(Self::AlphaBitfields),
            4 | 5 | 7 | 8 | 9 => Err(BlightError::BmpCompressionUnsupported(raw)),
            other => Err(BlightError::BmpInvalidCompression(other)),
        }
    }

    pub(crate) fn is_rle(self) -> bool {
        matches!(self, Self::Rle8 | Self::Rle4)
    }

    pub(crate) fn is_bitfields(self) -> bool {
        matches!(self, Self::Bitfields | Self::AlphaBitfields)
    }
}

/// Scalar header state preserved on a decoded BMP image.
#[derive(Clone, Debug)]
pub struct BmpInfo {
    pub file_size: u32,
    pub data_offset: u32,
    pub variant: BmpVariant,
    /// Stored width; Core headers read it as a signed 16-bit value.
    pub width: i32,
    /// Stored height; the sign selects bottom-up (positive) vs
    /// top-down (negative) row order.
    pub height: i32,
    pub depth: u16,
    pub compression: BmpCompression,
    /// Stated size of the compressed pixel data; often zero.
    pub data_size: u32,
    pub color_count: u32,
    /// R, G, B, A channel masks in effect (declared or standard).
    pub masks: [u32; 4],
    /// V4/V5 color-space tag; zero for earlier variants.
    pub color_space: u32,
    /// CIE-XYZ endpoints (9 fixed-point words), V4+.
    pub endpoints: Option<[u32; 9]>,
    /// Per-channel gamma (16.16 fixed point), V4+.
    pub gamma: [u32; 3],
    /// ICC profile (offset, size) from a V5 header. Recognized, never
    /// resolved.
    pub profile: Option<(u32, u32)>,
}
