use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use rgb::alt::ARGB;
use rgb::RGBA8;

use super::{
    TgaColorMapSpec, TgaExtensionArea, TgaFooter, TgaHeader, TgaImageSpec, TgaImageType,
    TgaInfo, TgaVersion,
};
use crate::buffer::{FormatInfo, Image};
use crate::error::BlightError;
use crate::extent::ExtentBuffer;
use crate::format::{TGA_FOOTER_LEN, TGA_FOOTER_SIGNATURE};
use crate::options::Options;
use crate::pixel::{Alpha, PixelTag};
use crate::source::ByteCursor;
use crate::transfer::{
    select_output_tag, transfer_palette_row, IndexDepth, Palette, RowTransfer,
};

const HEADER_LEN: u32 = 18;
const EXTENSION_LEN: u32 = 495;

const DESC_ATTR_BITS: u8 = 0x0F;
const DESC_RIGHT_TO_LEFT: u8 = 0x10;
const DESC_TOP_ORIGIN: u8 = 0x20;
const DESC_INTERLEAVE: u8 = 0xC0;

const PACKET_RLE: u8 = 0x80;
const PACKET_LEN: u8 = 0x7F;

pub(crate) fn decode(data: &[u8], options: &Options) -> Result<Image<'static>, BlightError> {
    TgaDecoder::new(data, options)?.run()
}

struct TgaDecoder<'a> {
    bytes: ByteCursor<'a>,
    options: &'a Options,
    extents: ExtentBuffer,
    file_size: u32,
    version: TgaVersion,
    footer: Option<TgaFooter>,
    extension: Option<TgaExtensionArea>,
    alpha: Alpha,
    palette: Option<Palette>,
}

impl<'a> TgaDecoder<'a> {
    fn new(data: &'a [u8], options: &'a Options) -> Result<Self, BlightError> {
        options.check_alloc(data.len() as u64)?;
        let file_size = u32::try_from(data.len()).map_err(|_| BlightError::InvalidSizeForFormat)?;
        Ok(Self {
            bytes: ByteCursor::new(data),
            options,
            extents: ExtentBuffer::new(),
            file_size,
            version: TgaVersion::V1,
            footer: None,
            extension: None,
            alpha: Alpha::None,
            palette: None,
        })
    }

    fn run(mut self) -> Result<Image<'static>, BlightError> {
        if self.file_size < HEADER_LEN {
            return Err(BlightError::InvalidSizeForFormat);
        }
        self.probe_footer()?;
        let header = self.read_header()?;
        self.read_extension_area(&header)?;
        self.read_optional_tables(&header)?;
        self.read_image_id(&header)?;
        self.read_color_map(&header)?;
        self.decode_pixels(header)
    }

    // ── Footer / header phases ──────────────────────────────────────

    fn probe_footer(&mut self) -> Result<(), BlightError> {
        let Some(tail) = self.bytes.tail(TGA_FOOTER_LEN) else {
            return Ok(());
        };
        if &tail[8..] != TGA_FOOTER_SIGNATURE {
            return Ok(());
        }
        self.version = TgaVersion::V2;
        self.footer = Some(TgaFooter {
            extension_offset: u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]),
            developer_offset: u32::from_le_bytes([tail[4], tail[5], tail[6], tail[7]]),
        });
        self.extents.validate_and_add(
            self.file_size - TGA_FOOTER_LEN as u32,
            self.file_size,
            self.file_size,
        )
    }

    fn read_header(&mut self) -> Result<TgaHeader, BlightError> {
        let id_length = self.bytes.read_u8()?;
        let color_map_type = self.bytes.read_u8()?;
        let image_type_raw = self.bytes.read_u8()?;
        let color_map = TgaColorMapSpec {
            first_index: self.bytes.read_u16_le()?,
            length: self.bytes.read_u16_le()?,
            entry_bits: self.bytes.read_u8()?,
        };
        let image = TgaImageSpec {
            origin_x: self.bytes.read_u16_le()?,
            origin_y: self.bytes.read_u16_le()?,
            width: self.bytes.read_u16_le()?,
            height: self.bytes.read_u16_le()?,
            depth: self.bytes.read_u8()?,
            descriptor: self.bytes.read_u8()?,
        };
        self.extents.validate_and_add(0, HEADER_LEN, self.file_size)?;

        let image_type = TgaImageType::from_u8(image_type_raw)?;

        if color_map_type > 1 {
            return Err(BlightError::TgaNonStandardColorTableUnsupported(
                color_map_type,
            ));
        }
        if !image_type.is_color_map() && (color_map_type == 1 || color_map.length > 0) {
            return Err(BlightError::TgaColorMapDataInNonColorMapImage);
        }
        if image_type.is_color_map() && (color_map_type == 0 || color_map.length == 0) {
            return Err(BlightError::TgaNonStandardColorTableUnsupported(
                color_map_type,
            ));
        }
        if image.width == 0 || image.height == 0 {
            return Err(BlightError::TgaNoData);
        }
        if image.descriptor & DESC_INTERLEAVE != 0 {
            return Err(BlightError::TgaFlavorUnsupported);
        }

        Ok(TgaHeader {
            id_length,
            color_map_type,
            image_type,
            color_map,
            image,
        })
    }

    // ── Extension area & optional tables (V2) ───────────────────────

    fn read_extension_area(&mut self, header: &TgaHeader) -> Result<(), BlightError> {
        let Some(footer) = self.footer else {
            return Ok(());
        };
        let offset = footer.extension_offset;
        if offset == 0 {
            return Ok(());
        }
        let stated_len = self.bytes.slice_at(offset as usize, 2)?;
        if u16::from_le_bytes([stated_len[0], stated_len[1]]) != EXTENSION_LEN as u16 {
            // Unknown extension revision: keep the footer, skip the rest.
            return Ok(());
        }
        let end = offset
            .checked_add(EXTENSION_LEN)
            .ok_or(BlightError::UnexpectedEof)?;
        self.extents.validate_and_add(offset, end, self.file_size)?;
        let blob = self.bytes.slice_at(offset as usize, EXTENSION_LEN as usize)?;

        let mut timestamp = [0u16; 6];
        for (i, t) in timestamp.iter_mut().enumerate() {
            *t = read_u16_at(blob, 367 + i * 2);
        }
        let mut job_time = [0u16; 3];
        for (i, t) in job_time.iter_mut().enumerate() {
            *t = read_u16_at(blob, 420 + i * 2);
        }

        let ext = TgaExtensionArea {
            author: nul_string(&blob[2..43]),
            comments: nul_string(&blob[43..367]),
            timestamp,
            job_name: nul_string(&blob[379..420]),
            job_time,
            software_id: nul_string(&blob[426..467]),
            software_version: (read_u16_at(blob, 467), blob[469]),
            key_color: read_u32_at(blob, 470),
            aspect_ratio: (read_u16_at(blob, 474), read_u16_at(blob, 476)),
            gamma: (read_u16_at(blob, 478), read_u16_at(blob, 480)),
            color_correction_offset: read_u32_at(blob, 482),
            postage_stamp_offset: read_u32_at(blob, 486),
            scanline_offset: read_u32_at(blob, 490),
            attribute_type: blob[494],
        };

        let depth = header.image.depth;
        self.alpha = match ext.attribute_type {
            3 if depth == 32 => Alpha::Normal,
            4 => Alpha::Premultiplied,
            _ => Alpha::None,
        };
        self.extension = Some(ext);
        Ok(())
    }

    fn read_optional_tables(&mut self, header: &TgaHeader) -> Result<(), BlightError> {
        let Some(ext) = self.extension.clone() else {
            return Ok(());
        };
        if ext.scanline_offset != 0 {
            let byte_len = u32::from(header.image.height) * 4;
            let end = ext
                .scanline_offset
                .checked_add(byte_len)
                .ok_or(BlightError::UnexpectedEof)?;
            self.extents
                .validate_and_add(ext.scanline_offset, end, self.file_size)?;
            let blob = self
                .bytes
                .slice_at(ext.scanline_offset as usize, byte_len as usize)?;
            // Row-offset table; read and dropped (rows are decoded
            // sequentially).
            let _scanlines: Vec<u32> = blob
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
        }
        if ext.color_correction_offset != 0 {
            let byte_len = 256 * 8;
            let end = ext
                .color_correction_offset
                .checked_add(byte_len)
                .ok_or(BlightError::UnexpectedEof)?;
            self.extents
                .validate_and_add(ext.color_correction_offset, end, self.file_size)?;
            let blob = self
                .bytes
                .slice_at(ext.color_correction_offset as usize, byte_len as usize)?;
            // Correction ramp is recognized but never applied.
            let _corrections: Vec<ARGB<u16>> = blob
                .chunks_exact(8)
                .map(|c| ARGB {
                    a: u16::from_le_bytes([c[0], c[1]]),
                    r: u16::from_le_bytes([c[2], c[3]]),
                    g: u16::from_le_bytes([c[4], c[5]]),
                    b: u16::from_le_bytes([c[6], c[7]]),
                })
                .collect();
        }
        // The postage-stamp image is never read.
        Ok(())
    }

    // ── Image id & color map ────────────────────────────────────────

    fn read_image_id(&mut self, header: &TgaHeader) -> Result<(), BlightError> {
        let id_length = u32::from(header.id_length);
        self.extents
            .validate_and_add(HEADER_LEN, HEADER_LEN + id_length, self.file_size)
    }

    fn read_color_map(&mut self, header: &TgaHeader) -> Result<(), BlightError> {
        if !header.image_type.is_color_map() {
            return Ok(());
        }
        if header.image.depth != 8 {
            return Err(BlightError::TgaColorTableImageNot8BitColorDepth(
                header.image.depth,
            ));
        }
        let spec = header.color_map;
        if spec.length > 256 || spec.first_index != 0 {
            return Err(BlightError::TgaNonStandardColorTableUnsupported(
                header.color_map_type,
            ));
        }
        let entry_bytes = color_map_entry_bytes(&spec)?;
        let start = HEADER_LEN + u32::from(header.id_length);
        let byte_len = u32::from(spec.length) * entry_bytes;
        self.extents
            .validate_and_add(start, start + byte_len, self.file_size)?;
        let blob = self.bytes.slice_at(start as usize, byte_len as usize)?;

        let mut entries = Vec::with_capacity(usize::from(spec.length));
        for chunk in blob.chunks_exact(entry_bytes as usize) {
            entries.push(match (entry_bytes, spec.entry_bits) {
                (2, 15) => {
                    let v = u16::from_le_bytes([chunk[0], chunk[1]]);
                    RGBA8 {
                        r: ((v >> 10) as u8 & 0x1F) << 3,
                        g: ((v >> 5) as u8 & 0x1F) << 3,
                        b: (v as u8 & 0x1F) << 3,
                        a: 255,
                    }
                }
                (2, _) => {
                    let v = u16::from_le_bytes([chunk[0], chunk[1]]);
                    RGBA8 {
                        r: ((v >> 11) as u8 & 0x1F) << 3,
                        g: ((v >> 5) as u8 & 0x3F) << 2,
                        b: (v as u8 & 0x1F) << 3,
                        a: 255,
                    }
                }
                (3, _) => RGBA8 {
                    r: chunk[2],
                    g: chunk[1],
                    b: chunk[0],
                    a: 255,
                },
                _ => RGBA8 {
                    r: chunk[2],
                    g: chunk[1],
                    b: chunk[0],
                    a: chunk[3],
                },
            });
        }
        self.palette = Some(Palette::from_rgba(entries));
        Ok(())
    }

    // ── Pixel phases ────────────────────────────────────────────────

    fn source_tag(&self, header: &TgaHeader) -> Result<PixelTag, BlightError> {
        let depth = header.image.depth;
        if header.image_type.is_color_map() {
            return Ok(self
                .palette
                .as_ref()
                .map_or(PixelTag::Rgba32, Palette::source_tag));
        }
        if header.image_type.is_greyscale() {
            return match depth {
                8 => Ok(PixelTag::U8R),
                15 | 16 => Ok(PixelTag::U16R),
                other => Err(BlightError::TgaNonStandardColorDepthForPixelFormat(other)),
            };
        }
        match depth {
            15 => Ok(PixelTag::U16Rgb15),
            16 => Ok(PixelTag::U16Rgb),
            24 => Ok(PixelTag::U24Rgb),
            32 => {
                if self.alpha != Alpha::None {
                    Ok(PixelTag::U32Rgba)
                } else {
                    Ok(PixelTag::U32Rgb)
                }
            }
            other => Err(BlightError::TgaNonStandardColorDepthForPixelFormat(other)),
        }
    }

    fn decode_pixels(mut self, header: TgaHeader) -> Result<Image<'static>, BlightError> {
        let width = usize::from(header.image.width);
        let height = usize::from(header.image.height);
        let depth = header.image.depth;
        let attr_bits = header.image.descriptor & DESC_ATTR_BITS;

        // V1 files have no extension area; a 32-bit image declaring 8
        // attribute bits still carries straight alpha.
        if self.extension.is_none() && depth == 32 && attr_bits == 8 {
            self.alpha = Alpha::Normal;
        }

        let src_tag = self.source_tag(&header)?;
        let out_tag = select_output_tag(src_tag, &self.options.allowed_output_tags)?;

        let cm_bytes = if header.image_type.is_color_map() {
            u32::from(header.color_map.length) * color_map_entry_bytes(&header.color_map)?
        } else {
            0
        };
        let data_start = HEADER_LEN + u32::from(header.id_length) + cm_bytes;
        let data_end = self
            .extents
            .first_beyond(data_start)
            .unwrap_or(self.file_size);
        self.extents
            .validate_and_add(data_start, data_end, self.file_size)?;
        let region = self
            .bytes
            .slice_at(data_start as usize, (data_end - data_start) as usize)?;

        let bytes_pp = usize::from(depth.div_ceil(8));
        let expected = width
            .checked_mul(height)
            .and_then(|p| p.checked_mul(bytes_pp))
            .ok_or(BlightError::DimensionTooLarge {
                width: header.image.width.into(),
                height: header.image.height.into(),
            })?;

        let pixel_count = width * height;
        let out_bytes = pixel_count
            .checked_mul(out_tag.size_bytes())
            .ok_or(BlightError::DimensionTooLarge {
                width: header.image.width.into(),
                height: header.image.height.into(),
            })?;
        self.options.check_alloc(out_bytes as u64)?;

        let rle_plane;
        let src_data: &[u8] = if header.image_type.is_rle() {
            rle_plane = decode_rle_plane(region, bytes_pp, expected)?;
            &rle_plane
        } else {
            if region.len() < expected {
                return Err(BlightError::UnexpectedEof);
            }
            &region[..expected]
        };

        let mut image = Image {
            width: header.image.width.into(),
            height: header.image.height.into(),
            alpha: self.alpha,
            ..Image::empty()
        };
        image.pixels.alloc(out_tag, pixel_count)?;

        let top_origin = header.image.descriptor & DESC_TOP_ORIGIN != 0;
        let right_to_left = header.image.descriptor & DESC_RIGHT_TO_LEFT != 0;
        let src_row_len = width * bytes_pp;
        let dst_row_len = width * out_tag.size_bytes();

        // Destination cursor computed once; the row loop just steps it.
        let (start_row, step) = if top_origin {
            (0isize, dst_row_len as isize)
        } else {
            (((height - 1) * dst_row_len) as isize, -(dst_row_len as isize))
        };

        let mut cursor = start_row;
        if let Some(palette) = self.palette.as_ref() {
            for file_row in 0..height {
                let src_row = &src_data[file_row * src_row_len..(file_row + 1) * src_row_len];
                let start = cursor as usize;
                let dst = &mut image.pixels.bytes_mut()[start..start + dst_row_len];
                transfer_palette_row(IndexDepth::U8, src_row, palette, dst, out_tag)?;
                if right_to_left {
                    reverse_row_pixels(dst, out_tag.size_bytes());
                }
                cursor += step;
            }
        } else {
            let xfer = RowTransfer::standard(src_tag, out_tag, self.alpha != Alpha::None);
            for file_row in 0..height {
                let src_row = &src_data[file_row * src_row_len..(file_row + 1) * src_row_len];
                let start = cursor as usize;
                let dst = &mut image.pixels.bytes_mut()[start..start + dst_row_len];
                xfer.transfer_row(src_row, dst)?;
                if right_to_left {
                    reverse_row_pixels(dst, out_tag.size_bytes());
                }
                cursor += step;
            }
        }

        image.file_info = FormatInfo::Tga(TgaInfo {
            file_type: self.version,
            file_size: self.file_size,
            header,
            footer: self.footer,
            extension: self.extension,
            alpha: self.alpha,
        });
        Ok(image)
    }
}

fn color_map_entry_bytes(spec: &TgaColorMapSpec) -> Result<u32, BlightError> {
    match spec.entry_bits {
        15 | 16 => Ok(2),
        24 => Ok(3),
        32 => Ok(4),
        other => Err(BlightError::TgaNonStandardColorDepthUnsupported(other)),
    }
}

// ── Packet RLE ──────────────────────────────────────────────────────

/// Decode the packet stream into a flat plane of `expected` bytes in
/// file scan order. Packets are terminated only by their count and may
/// straddle row boundaries.
fn decode_rle_plane(
    region: &[u8],
    bytes_pp: usize,
    expected: usize,
) -> Result<Vec<u8>, BlightError> {
    let mut out = vec![0u8; expected];
    let mut cursor = ByteCursor::new(region);
    let mut filled = 0usize;

    while filled < expected {
        let head = cursor.read_u8()?;
        let run = (usize::from(head & PACKET_LEN) + 1) * bytes_pp;
        if filled + run > expected {
            return Err(BlightError::UnexpectedEndOfImageBuffer);
        }
        if head & PACKET_RLE != 0 {
            let px = cursor.read_slice(bytes_pp)?;
            for chunk in out[filled..filled + run].chunks_exact_mut(bytes_pp) {
                chunk.copy_from_slice(px);
            }
        } else {
            out[filled..filled + run].copy_from_slice(cursor.read_slice(run)?);
        }
        filled += run;
    }
    Ok(out)
}

fn reverse_row_pixels(row: &mut [u8], pixel_size: usize) {
    let width = row.len() / pixel_size;
    for i in 0..width / 2 {
        let j = width - 1 - i;
        for b in 0..pixel_size {
            row.swap(i * pixel_size + b, j * pixel_size + b);
        }
    }
}

// ── Small helpers ───────────────────────────────────────────────────

fn read_u16_at(blob: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([blob[at], blob[at + 1]])
}

fn read_u32_at(blob: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([blob[at], blob[at + 1], blob[at + 2], blob[at + 3]])
}

/// NUL-terminated fixed field to an owned string, lossily.
fn nul_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
