use alloc::vec;
use alloc::vec::Vec;

use rgb::RGBA8;

use super::{BmpCompression, BmpInfo, BmpVariant};
use crate::buffer::{FormatInfo, Image};
use crate::error::BlightError;
use crate::options::Options;
use crate::pixel::{Alpha, PixelTag};
use crate::source::ByteCursor;
use crate::transfer::{
    select_output_tag, transfer_palette_row, IndexDepth, Palette, RowTransfer,
};

/// 14-byte file header plus the smallest (Core) info header.
const MIN_FILE_LEN: usize = 26;

const STANDARD_MASKS_16: [u32; 4] = [0x7C00, 0x03E0, 0x001F, 0];
const STANDARD_MASKS_32: [u32; 4] = [0xFF0000, 0x00FF00, 0x0000FF, 0];

pub(crate) fn decode(data: &[u8], options: &Options) -> Result<Image<'static>, BlightError> {
    options.check_alloc(data.len() as u64)?;
    BmpDecoder::new(data, options).run()
}

struct BmpDecoder<'a> {
    bytes: ByteCursor<'a>,
    options: &'a Options,
    width: u32,
    height: u32,
    top_down: bool,
    depth: u16,
    compression: BmpCompression,
    variant: BmpVariant,
    data_offset: u32,
    masks: [u32; 4],
    masks_declared: bool,
    headers_end: u32,
    color_count: u32,
    palette: Option<Palette>,
}

impl<'a> BmpDecoder<'a> {
    fn new(data: &'a [u8], options: &'a Options) -> Self {
        Self {
            bytes: ByteCursor::new(data),
            options,
            width: 0,
            height: 0,
            top_down: false,
            depth: 0,
            compression: BmpCompression::Rgb,
            variant: BmpVariant::V1,
            data_offset: 0,
            masks: [0; 4],
            masks_declared: false,
            headers_end: 0,
            color_count: 0,
            palette: None,
        }
    }

    fn run(mut self) -> Result<Image<'static>, BlightError> {
        let mut info = self.decode_headers()?;
        self.decode_palette()?;
        self.resolve_masks();
        info.masks = self.masks;

        let src_tag = self.source_tag();
        let out_tag = select_output_tag(src_tag, &self.options.allowed_output_tags)?;

        let pixel_count = (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or(BlightError::DimensionTooLarge {
                width: self.width,
                height: self.height,
            })?;
        let out_bytes = pixel_count
            .checked_mul(out_tag.size_bytes())
            .ok_or(BlightError::DimensionTooLarge {
                width: self.width,
                height: self.height,
            })?;
        self.options.check_alloc(out_bytes as u64)?;

        let alpha_mask_present = self.depth >= 16 && self.masks[3] != 0;
        let mut image = Image {
            width: self.width,
            height: self.height,
            alpha: if alpha_mask_present {
                Alpha::Normal
            } else {
                Alpha::None
            },
            ..Image::empty()
        };
        image.pixels.alloc(out_tag, pixel_count)?;

        if self.compression.is_rle() {
            self.decode_rle_pixels(&mut image, out_tag)?;
        } else {
            self.decode_flat_pixels(&mut image, src_tag, out_tag)?;
        }

        image.file_info = FormatInfo::Bmp(info);
        Ok(image)
    }

    // ── Header phases ───────────────────────────────────────────────

    fn decode_headers(&mut self) -> Result<BmpInfo, BlightError> {
        let file_len = self.bytes.len();
        if file_len < 2 || &self.bytes.read_array::<2>()? != b"BM" {
            return Err(BlightError::BmpInvalidBytesInFileHeader);
        }
        if file_len < MIN_FILE_LEN {
            return Err(BlightError::InvalidSizeForFormat);
        }

        let file_size_field = self.bytes.read_u32_le()?;
        if self.bytes.read_array::<4>()? != [0u8; 4] {
            return Err(BlightError::BmpInvalidBytesInFileHeader);
        }
        self.data_offset = self.bytes.read_u32_le()?;

        let ihsize = self.bytes.read_u32_le()?;
        self.variant = BmpVariant::from_header_size(ihsize)?;

        let (width_raw, height_raw, planes, depth);
        let mut compression_raw = 0u32;
        let mut data_size = 0u32;
        let mut color_count = 0u32;
        let mut color_space = 0u32;
        let mut endpoints = None;
        let mut gamma = [0u32; 3];
        let mut profile = None;

        if self.variant == BmpVariant::Core {
            // OS/2 stores unsigned 16-bit dimensions; these are read
            // signed, matching long-standing decoder behavior.
            width_raw = i32::from(self.bytes.read_i16_le()?);
            height_raw = i32::from(self.bytes.read_i16_le()?);
            planes = self.bytes.read_u16_le()?;
            depth = self.bytes.read_u16_le()?;
        } else {
            width_raw = self.bytes.read_i32_le()?;
            height_raw = self.bytes.read_i32_le()?;
            planes = self.bytes.read_u16_le()?;
            depth = self.bytes.read_u16_le()?;
            compression_raw = self.bytes.read_u32_le()?;
            data_size = self.bytes.read_u32_le()?;
            let _x_ppm = self.bytes.read_u32_le()?;
            let _y_ppm = self.bytes.read_u32_le()?;
            color_count = self.bytes.read_u32_le()?;
            let _important = self.bytes.read_u32_le()?;
        }

        self.compression = if self.variant == BmpVariant::Core {
            BmpCompression::Rgb
        } else {
            BmpCompression::from_u32(compression_raw)?
        };

        self.headers_end = 14 + ihsize;

        if matches!(self.variant, BmpVariant::V4 | BmpVariant::V5) {
            self.masks = [
                self.bytes.read_u32_le()?,
                self.bytes.read_u32_le()?,
                self.bytes.read_u32_le()?,
                self.bytes.read_u32_le()?,
            ];
            self.masks_declared = self.masks != [0; 4];
            color_space = self.bytes.read_u32_le()?;
            validate_color_space(color_space)?;
            let mut pts = [0u32; 9];
            for p in pts.iter_mut() {
                *p = self.bytes.read_u32_le()?;
            }
            endpoints = Some(pts);
            for g in gamma.iter_mut() {
                *g = self.bytes.read_u32_le()?;
            }
        }
        if self.variant == BmpVariant::V5 {
            let _intent = self.bytes.read_u32_le()?;
            let profile_data = self.bytes.read_u32_le()?;
            let profile_size = self.bytes.read_u32_le()?;
            self.bytes.skip(4)?;
            if profile_data != 0 || profile_size != 0 {
                profile = Some((profile_data, profile_size));
            }
        }

        // V1 keeps BITFIELDS masks outside the header proper.
        if self.variant == BmpVariant::V1 && self.compression.is_bitfields() {
            self.masks[0] = self.bytes.read_u32_le()?;
            self.masks[1] = self.bytes.read_u32_le()?;
            self.masks[2] = self.bytes.read_u32_le()?;
            self.headers_end += 12;
            if self.compression == BmpCompression::AlphaBitfields {
                self.masks[3] = self.bytes.read_u32_le()?;
                self.headers_end += 4;
            }
            self.masks_declared = true;
        }

        if planes != 1 {
            return Err(BlightError::BmpInvalidBytesInInfoHeader);
        }
        if width_raw <= 0 || height_raw == 0 {
            return Err(BlightError::BmpInvalidSizeInfo);
        }
        self.top_down = height_raw < 0;
        self.width = width_raw as u32;
        self.height = height_raw.unsigned_abs();

        if !matches!(depth, 1 | 4 | 8 | 16 | 24 | 32) {
            return Err(BlightError::BmpInvalidColorDepth(depth));
        }
        self.depth = depth;

        match self.compression {
            BmpCompression::Rle8 if depth != 8 => {
                return Err(BlightError::BmpInvalidCompression(compression_raw));
            }
            BmpCompression::Rle4 if depth != 4 => {
                return Err(BlightError::BmpInvalidCompression(compression_raw));
            }
            BmpCompression::Bitfields | BmpCompression::AlphaBitfields if depth == 24 => {
                return Err(BlightError::BmpInvalidCompression(compression_raw));
            }
            _ => {}
        }

        if self.data_offset == 0 || self.data_offset < self.headers_end {
            return Err(BlightError::BmpInvalidBytesInInfoHeader);
        }
        if self.data_offset as usize > file_len {
            return Err(BlightError::InvalidSizeForFormat);
        }
        self.color_count = color_count;

        Ok(BmpInfo {
            file_size: file_size_field,
            data_offset: self.data_offset,
            variant: self.variant,
            width: width_raw,
            height: height_raw,
            depth,
            compression: self.compression,
            data_size,
            color_count,
            masks: [0; 4],
            color_space,
            endpoints,
            gamma,
            profile,
        })
    }

    fn decode_palette(&mut self) -> Result<(), BlightError> {
        if self.depth > 8 {
            return Ok(());
        }
        let max_colors = 1u32 << self.depth;
        let stated = self.color_count;
        let count = if stated < 2 {
            max_colors
        } else if stated <= max_colors {
            stated
        } else {
            return Err(BlightError::BmpInvalidColorCount(stated));
        };

        let entry_size: u32 = if self.variant == BmpVariant::Core { 3 } else { 4 };
        let available = self.data_offset - self.headers_end;
        if count * entry_size > available {
            return Err(BlightError::BmpInvalidColorTable);
        }

        self.bytes.seek_to(self.headers_end as usize)?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (b, g, r) = if entry_size == 3 {
                let [b, g, r] = self.bytes.read_array::<3>()?;
                (b, g, r)
            } else {
                let [b, g, r, _] = self.bytes.read_array::<4>()?;
                (b, g, r)
            };
            entries.push(RGBA8 { r, g, b, a: 255 });
        }
        self.palette = Some(Palette::from_rgba(entries));
        Ok(())
    }

    fn resolve_masks(&mut self) {
        if self.depth == 16 && !self.masks_declared {
            self.masks = STANDARD_MASKS_16;
        }
        if (self.depth == 24 || self.depth == 32) && !self.masks_declared {
            self.masks = STANDARD_MASKS_32;
        }
    }

    fn source_tag(&self) -> PixelTag {
        match self.depth {
            1 | 4 | 8 => self
                .palette
                .as_ref()
                .map_or(PixelTag::Rgba32, Palette::source_tag),
            16 => {
                if self.masks[3] != 0 {
                    PixelTag::U16Rgba
                } else {
                    PixelTag::U16Rgb
                }
            }
            24 => PixelTag::U24Rgb,
            _ => {
                if self.masks[3] != 0 {
                    PixelTag::U32Rgba
                } else {
                    PixelTag::U32Rgb
                }
            }
        }
    }

    // ── Pixel phases ────────────────────────────────────────────────

    fn row_stride(&self) -> usize {
        (self.width as usize * self.depth as usize).div_ceil(32) * 4
    }

    /// Destination row cursor: `(start, step)` in bytes, computed once
    /// per image so the row loop never branches on direction.
    fn dst_row_cursor(&self, dst_row_len: usize) -> (isize, isize) {
        if self.top_down {
            (0, dst_row_len as isize)
        } else {
            (
                ((self.height as usize - 1) * dst_row_len) as isize,
                -(dst_row_len as isize),
            )
        }
    }

    fn decode_flat_pixels(
        &mut self,
        image: &mut Image<'static>,
        src_tag: PixelTag,
        out_tag: PixelTag,
    ) -> Result<(), BlightError> {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.row_stride();
        let dst_row_len = width * out_tag.size_bytes();

        self.bytes.seek_to(self.data_offset as usize)?;

        let (mut cursor, step) = self.dst_row_cursor(dst_row_len);

        if self.depth <= 8 {
            let index_depth = match self.depth {
                1 => IndexDepth::U1,
                4 => IndexDepth::U4,
                _ => IndexDepth::U8,
            };
            let palette = self.palette.as_ref().ok_or(BlightError::BmpInvalidColorTable)?;
            for _ in 0..height {
                let src_row = self.bytes.read_slice(stride)?;
                let start = cursor as usize;
                let dst = &mut image.pixels.bytes_mut()[start..start + dst_row_len];
                transfer_palette_row(index_depth, src_row, palette, dst, out_tag)?;
                cursor += step;
            }
            return Ok(());
        }

        let xfer = RowTransfer::from_masks(src_tag, out_tag, self.masks, self.depth)?;
        let src_row_len = width * src_tag.size_bytes();
        for _ in 0..height {
            let src_row = self.bytes.read_slice(stride)?;
            let start = cursor as usize;
            let dst = &mut image.pixels.bytes_mut()[start..start + dst_row_len];
            xfer.transfer_row(&src_row[..src_row_len], dst)?;
            cursor += step;
        }
        Ok(())
    }

    fn decode_rle_pixels(
        &mut self,
        image: &mut Image<'static>,
        out_tag: PixelTag,
    ) -> Result<(), BlightError> {
        let width = self.width as usize;
        let height = self.height as usize;
        let plane = self.decode_rle_plane(width, height)?;

        let palette = self.palette.as_ref().ok_or(BlightError::BmpInvalidColorTable)?;
        let dst_row_len = width * out_tag.size_bytes();
        let (mut cursor, step) = self.dst_row_cursor(dst_row_len);
        for file_row in 0..height {
            let start = cursor as usize;
            let dst = &mut image.pixels.bytes_mut()[start..start + dst_row_len];
            transfer_palette_row(
                IndexDepth::U8,
                &plane[file_row * width..(file_row + 1) * width],
                palette,
                dst,
                out_tag,
            )?;
            cursor += step;
        }
        Ok(())
    }

    /// Run the RLE4/RLE8 escape state machine, producing one palette
    /// index per byte in file-row order.
    fn decode_rle_plane(&mut self, width: usize, height: usize) -> Result<Vec<u8>, BlightError> {
        let mut plane = vec![0u8; width * height];
        let mut line = 0usize;
        let mut pos = 0usize;
        let rle4 = self.compression == BmpCompression::Rle4;

        self.bytes.seek_to(self.data_offset as usize)?;

        loop {
            let n = self.rle_byte()?;
            let b = self.rle_byte()?;
            if n > 0 {
                let run = usize::from(n);
                if line >= height || pos + run > width {
                    return Err(BlightError::BmpRleCoordinatesOutOfBounds);
                }
                let row = &mut plane[line * width..(line + 1) * width];
                if rle4 {
                    for (i, cell) in row[pos..pos + run].iter_mut().enumerate() {
                        *cell = if i % 2 == 0 { b >> 4 } else { b & 0x0F };
                    }
                } else {
                    row[pos..pos + run].fill(b);
                }
                pos += run;
                continue;
            }
            match b {
                0 => {
                    // End of line.
                    line += 1;
                    pos = 0;
                    if line > height {
                        return Err(BlightError::BmpRleCoordinatesOutOfBounds);
                    }
                }
                1 => break,
                2 => {
                    let dx = usize::from(self.rle_byte()?);
                    let dy = usize::from(self.rle_byte()?);
                    pos += dx;
                    line += dy;
                    if pos > width || line > height {
                        return Err(BlightError::BmpRleCoordinatesOutOfBounds);
                    }
                }
                m => {
                    // Absolute mode: m literal indices, padded so the
                    // stream stays on a 2-byte boundary.
                    let count = usize::from(m);
                    if line >= height || pos + count > width {
                        return Err(BlightError::BmpRleCoordinatesOutOfBounds);
                    }
                    let row = &mut plane[line * width..(line + 1) * width];
                    if rle4 {
                        let byte_count = count.div_ceil(2);
                        for i in 0..count {
                            if i % 2 == 0 {
                                let byte = self.rle_byte()?;
                                row[pos + i] = byte >> 4;
                                if i + 1 < count {
                                    row[pos + i + 1] = byte & 0x0F;
                                }
                            }
                        }
                        if byte_count % 2 == 1 {
                            self.rle_byte()?;
                        }
                    } else {
                        for cell in row[pos..pos + count].iter_mut() {
                            *cell = self.rle_byte()?;
                        }
                        if count % 2 == 1 {
                            self.rle_byte()?;
                        }
                    }
                    pos += count;
                }
            }
        }
        Ok(plane)
    }

    fn rle_byte(&mut self) -> Result<u8, BlightError> {
        self.bytes
            .read_u8()
            .map_err(|_| BlightError::BmpInvalidRleData)
    }
}

fn validate_color_space(tag: u32) -> Result<(), BlightError> {
    // LCS_CALIBRATED_RGB, 'sRGB', 'Win ', 'LINK', 'MBED'.
    match tag {
        0 | 0x7352_4742 | 0x5769_6E20 | 0x4C49_4E4B | 0x4D42_4544 => Ok(()),
        other => Err(BlightError::BmpColorSpaceUnsupported(other)),
    }
}
