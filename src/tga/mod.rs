//! TGA (Truevision Targa) decoder.
//!
//! Handles V1 and V2 files; color-mapped, truecolor and greyscale
//! images, each plain or packet-RLE compressed; the V2 footer and
//! 495-byte extension area; and the scanline / color-correction tables.
//! Every byte region read is reserved in an extent buffer so files with
//! overlapping structures are rejected.

mod decode;

pub(crate) use decode::decode;

use alloc::string::String;

use crate::error::BlightError;
use crate::pixel::Alpha;

/// Whether the file carries the 26-byte V2 footer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TgaVersion {
    V1,
    V2,
}

/// The six supported image types. Huffman variants (32/33) and unknown
/// values are rejected before any pixel work starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TgaImageType {
    ColorMap = 1,
    TrueColor = 2,
    Greyscale = 3,
    RleColorMap = 9,
    RleTrueColor = 10,
    RleGreyscale = 11,
}

impl TgaImageType {
    pub(crate) fn from_u8(raw: u8) -> Result<Self, BlightError> {
        match raw {
            0 => Err(BlightError::TgaNoData),
            1 => Ok(Self::ColorMap),
            2 => Ok(Self::TrueColor),
            3 => Ok(Self::Greyscale),
            9 => Ok(Self::RleColorMap),
            10 => Ok(Self::RleTrueColor),
            11 => Ok(Self::RleGreyscale),
            other => Err(BlightError::TgaImageTypeUnsupported(other)),
        }
    }

    pub(crate) fn is_rle(self) -> bool {
        matches!(self, Self::RleColorMap | Self::RleTrueColor | Self::RleGreyscale)
    }

    pub(crate) fn is_color_map(self) -> bool {
        matches!(self, Self::ColorMap | Self::RleColorMap)
    }

    pub(crate) fn is_greyscale(self) -> bool {
        matches!(self, Self::Greyscale | Self::RleGreyscale)
    }
}

/// Color-map declaration from the header trio.
#[derive(Clone, Copy, Debug, Default)]
pub struct TgaColorMapSpec {
    pub first_index: u16,
    pub length: u16,
    pub entry_bits: u8,
}

/// Image declaration from the header trio.
#[derive(Clone, Copy, Debug, Default)]
pub struct TgaImageSpec {
    pub origin_x: u16,
    pub origin_y: u16,
    pub width: u16,
    pub height: u16,
    pub depth: u8,
    /// Bits 0–3 attribute depth, bit 4 right-to-left, bit 5 top origin,
    /// bits 6–7 interleave (unsupported).
    pub descriptor: u8,
}

/// The 18-byte header trio.
#[derive(Clone, Copy, Debug)]
pub struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: TgaImageType,
    pub color_map: TgaColorMapSpec,
    pub image: TgaImageSpec,
}

/// V2 footer offsets.
#[derive(Clone, Copy, Debug, Default)]
pub struct TgaFooter {
    pub extension_offset: u32,
    pub developer_offset: u32,
}

/// Scalar contents of the 495-byte V2 extension area.
#[derive(Clone, Debug, Default)]
pub struct TgaExtensionArea {
    pub author: String,
    pub comments: String,
    /// Month, day, year, hour, minute, second.
    pub timestamp: [u16; 6],
    pub job_name: String,
    /// Hours, minutes, seconds.
    pub job_time: [u16; 3],
    pub software_id: String,
    /// Version number ×100 plus a letter suffix.
    pub software_version: (u16, u8),
    pub key_color: u32,
    pub aspect_ratio: (u16, u16),
    pub gamma: (u16, u16),
    pub color_correction_offset: u32,
    pub postage_stamp_offset: u32,
    pub scanline_offset: u32,
    pub attribute_type: u8,
}

/// Scalar header state preserved on a decoded TGA image.
#[derive(Clone, Debug)]
pub struct TgaInfo {
    pub file_type: TgaVersion,
    pub file_size: u32,
    pub header: TgaHeader,
    pub footer: Option<TgaFooter>,
    pub extension: Option<TgaExtensionArea>,
    pub alpha: Alpha,
}
