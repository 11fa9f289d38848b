//! Color transfer engine.
//!
//! One [`RowTransfer`] is built per decode from a `(source tag, output
//! tag)` pair, either with the standard channel positions for the source
//! layout or from caller-supplied bitfield masks. Decoders then feed it
//! one row at a time. Channel widening uses plain shifts (a 5-bit value
//! becomes `v << 3`; the low bits stay zero).

use alloc::vec::Vec;

use rgb::RGBA8;

use crate::error::BlightError;
use crate::options::OutputTagSet;
use crate::pixel::PixelTag;

// ── Per-channel extraction ──────────────────────────────────────────

/// Precomputed mask/shift pair turning a masked source word into an
/// 8-bit channel: align the mask to bit 0, then shift to 8 significant
/// bits (truncating anything beyond 8).
#[derive(Clone, Copy, Debug, Default)]
struct ChannelShift {
    mask: u32,
    rshift: u32,
    post: i8,
}

impl ChannelShift {
    fn from_mask(mask: u32) -> Self {
        if mask == 0 {
            return Self::default();
        }
        Self {
            mask,
            rshift: mask.trailing_zeros(),
            post: mask.count_ones() as i8 - 8,
        }
    }

    #[inline]
    fn extract(self, v: u32) -> u8 {
        if self.mask == 0 {
            return 0;
        }
        let c = (v & self.mask) >> self.rshift;
        if self.post >= 0 {
            (c >> self.post as u32) as u8
        } else {
            (c << (-self.post) as u32) as u8
        }
    }

    fn present(self) -> bool {
        self.mask != 0
    }
}

// ── Row transfer ────────────────────────────────────────────────────

pub(crate) struct RowTransfer {
    src: PixelTag,
    dst: PixelTag,
    r: ChannelShift,
    g: ChannelShift,
    b: ChannelShift,
    a: ChannelShift,
}

impl RowTransfer {
    /// Standard channel positions for `src`. `alpha_present` selects
    /// whether the layout's alpha bits are honored or filled with 255.
    pub(crate) fn standard(src: PixelTag, dst: PixelTag, alpha_present: bool) -> Self {
        debug_assert!(src.is_source_only());
        debug_assert!(dst.is_canonical_output());
        let (r, g, b, a) = match src {
            PixelTag::U16Rgb15 => (0x7C00, 0x03E0, 0x001F, 0x8000),
            PixelTag::U16Rgb => (0xF800, 0x07E0, 0x001F, 0),
            PixelTag::U16Rgba => (0x7C00, 0x03E0, 0x001F, 0x8000),
            PixelTag::U24Rgb | PixelTag::U32Rgb => (0xFF0000, 0x00FF00, 0x0000FF, 0),
            PixelTag::U32Rgba => (0xFF0000, 0x00FF00, 0x0000FF, 0xFF00_0000),
            // Greyscale layouts never consult the masks.
            _ => (0, 0, 0, 0),
        };
        let a = if alpha_present { a } else { 0 };
        Self {
            src,
            dst,
            r: ChannelShift::from_mask(r),
            g: ChannelShift::from_mask(g),
            b: ChannelShift::from_mask(b),
            a: ChannelShift::from_mask(a),
        }
    }

    /// Caller-supplied masks (the BMP BITFIELDS / ALPHABITFIELDS path).
    ///
    /// Masks must be pairwise disjoint, the color masks non-zero, and
    /// their union must fit in `depth` bits.
    pub(crate) fn from_masks(
        src: PixelTag,
        dst: PixelTag,
        masks: [u32; 4],
        depth: u16,
    ) -> Result<Self, BlightError> {
        let [r, g, b, a] = masks;
        if r == 0 || g == 0 || b == 0 {
            return Err(BlightError::BmpInvalidColorMasks);
        }
        if r & g != 0 || r & b != 0 || g & b != 0 || a & (r | g | b) != 0 {
            return Err(BlightError::BmpInvalidColorMasks);
        }
        let union = r | g | b | a;
        if depth < 32 && union >> depth != 0 {
            return Err(BlightError::BmpInvalidColorMasks);
        }
        Ok(Self {
            src,
            dst,
            r: ChannelShift::from_mask(r),
            g: ChannelShift::from_mask(g),
            b: ChannelShift::from_mask(b),
            a: ChannelShift::from_mask(a),
        })
    }

    /// Read `dst.len() / dst_size` source pixels from `src` and write
    /// them to `dst` in the output layout.
    pub(crate) fn transfer_row(&self, src: &[u8], dst: &mut [u8]) -> Result<(), BlightError> {
        let ssz = self.src.size_bytes();
        let dsz = self.dst.size_bytes();
        let pixels = dst.len() / dsz;
        if src.len() < pixels * ssz {
            return Err(BlightError::UnexpectedEof);
        }

        match self.src {
            PixelTag::U8R => {
                for (s, d) in src.chunks_exact(1).zip(dst.chunks_exact_mut(dsz)) {
                    write_grey8(self.dst, d, s[0]);
                }
            }
            PixelTag::U16R => {
                for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(dsz)) {
                    write_grey16(self.dst, d, u16::from_le_bytes([s[0], s[1]]));
                }
            }
            _ => {
                // Grey computed from a 16-bit color word carries the
                // historical -8 bias; see write_color.
                let narrow_color = ssz == 2;
                for (s, d) in src.chunks_exact(ssz).zip(dst.chunks_exact_mut(dsz)) {
                    let v = load_le(s);
                    let a = if self.a.present() { self.a.extract(v) } else { 255 };
                    write_color(
                        self.dst,
                        d,
                        self.r.extract(v),
                        self.g.extract(v),
                        self.b.extract(v),
                        a,
                        narrow_color,
                    );
                }
            }
        }
        Ok(())
    }
}

#[inline]
fn load_le(s: &[u8]) -> u32 {
    match *s {
        [a] => u32::from(a),
        [a, b] => u32::from_le_bytes([a, b, 0, 0]),
        [a, b, c] => u32::from_le_bytes([a, b, c, 0]),
        [a, b, c, d] => u32::from_le_bytes([a, b, c, d]),
        _ => 0,
    }
}

// ── Destination pixel writers ───────────────────────────────────────

#[inline]
fn pack_565(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
}

#[inline]
fn write_color(dst_tag: PixelTag, d: &mut [u8], r: u8, g: u8, b: u8, a: u8, narrow: bool) {
    match dst_tag {
        PixelTag::Rgba32 => d.copy_from_slice(&[r, g, b, a]),
        PixelTag::Rgb16 => d.copy_from_slice(&pack_565(r, g, b).to_ne_bytes()),
        PixelTag::R8 => {
            let grey = ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8;
            // 15/16-bit sources historically undershoot by up to 8.
            d[0] = if narrow { grey.saturating_sub(8) } else { grey };
        }
        PixelTag::R16 => {
            let grey = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
            d.copy_from_slice(&(grey * 257).to_ne_bytes());
        }
        _ => {}
    }
}

#[inline]
fn write_grey8(dst_tag: PixelTag, d: &mut [u8], grey: u8) {
    match dst_tag {
        PixelTag::Rgba32 => d.copy_from_slice(&[grey, grey, grey, 255]),
        PixelTag::Rgb16 => d.copy_from_slice(&pack_565(grey, grey, grey).to_ne_bytes()),
        PixelTag::R8 => d[0] = grey,
        PixelTag::R16 => d.copy_from_slice(&(u16::from(grey) * 257).to_ne_bytes()),
        _ => {}
    }
}

#[inline]
fn write_grey16(dst_tag: PixelTag, d: &mut [u8], grey: u16) {
    let g8 = (grey >> 8) as u8;
    match dst_tag {
        PixelTag::Rgba32 => d.copy_from_slice(&[g8, g8, g8, 255]),
        PixelTag::Rgb16 => d.copy_from_slice(&pack_565(g8, g8, g8).to_ne_bytes()),
        PixelTag::R8 => d[0] = g8,
        PixelTag::R16 => d.copy_from_slice(&grey.to_ne_bytes()),
        _ => {}
    }
}

// ── Palette ─────────────────────────────────────────────────────────

/// Color table consumed when decoding index pixels. All-grey opaque
/// tables collapse to a plain grey ramp so index images can come out as
/// `R8` without a detour through RGBA.
pub(crate) enum Palette {
    Rgba(Vec<RGBA8>),
    Gray(Vec<u8>),
}

impl Palette {
    pub(crate) fn from_rgba(entries: Vec<RGBA8>) -> Self {
        let all_grey = entries
            .iter()
            .all(|e| e.r == e.g && e.g == e.b && e.a == 255);
        if all_grey {
            Palette::Gray(entries.iter().map(|e| e.r).collect())
        } else {
            Palette::Rgba(entries)
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Palette::Rgba(v) => v.len(),
            Palette::Gray(v) => v.len(),
        }
    }

    /// The tag the output-format preference order sees for this table.
    pub(crate) fn source_tag(&self) -> PixelTag {
        match self {
            Palette::Rgba(_) => PixelTag::Rgba32,
            Palette::Gray(_) => PixelTag::R8,
        }
    }
}

/// Bit width of packed color-table indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IndexDepth {
    U1,
    U4,
    U8,
}

/// Unpack `pixels` indices from `index_bytes` (high-order index first
/// within a byte), look each up in `palette`, and write the entry in
/// the `dst_tag` layout.
pub(crate) fn transfer_palette_row(
    depth: IndexDepth,
    index_bytes: &[u8],
    palette: &Palette,
    dst: &mut [u8],
    dst_tag: PixelTag,
) -> Result<(), BlightError> {
    let dsz = dst_tag.size_bytes();
    let pixels = dst.len() / dsz;
    for (i, d) in dst.chunks_exact_mut(dsz).take(pixels).enumerate() {
        let idx = match depth {
            IndexDepth::U8 => usize::from(*index_bytes.get(i).ok_or(BlightError::UnexpectedEof)?),
            IndexDepth::U4 => {
                let byte = *index_bytes.get(i / 2).ok_or(BlightError::UnexpectedEof)?;
                usize::from(if i % 2 == 0 { byte >> 4 } else { byte & 0x0F })
            }
            IndexDepth::U1 => {
                let byte = *index_bytes.get(i / 8).ok_or(BlightError::UnexpectedEof)?;
                usize::from((byte >> (7 - i % 8)) & 1)
            }
        };
        if idx >= palette.len() {
            return Err(BlightError::InvalidColorTableIndex {
                index: idx as u16,
                entries: palette.len() as u16,
            });
        }
        match palette {
            Palette::Rgba(entries) => {
                let e = entries[idx];
                write_color(dst_tag, d, e.r, e.g, e.b, e.a, false);
            }
            Palette::Gray(entries) => write_grey8(dst_tag, d, entries[idx]),
        }
    }
    Ok(())
}

// ── Output-format preference ────────────────────────────────────────

/// Pick the first allowed canonical output tag for a source layout.
pub(crate) fn select_output_tag(
    src: PixelTag,
    allowed: &OutputTagSet,
) -> Result<PixelTag, BlightError> {
    use PixelTag::*;
    let prefs = if src == U16R {
        [R16, R8, Rgba32, Rgb16]
    } else if !src.is_color() {
        [R8, R16, Rgba32, Rgb16]
    } else if src.size_bytes() == 2 && !src.has_alpha() {
        [Rgb16, Rgba32, R8, R16]
    } else {
        [Rgba32, Rgb16, R8, R16]
    };
    prefs
        .into_iter()
        .find(|t| allowed.allows(*t))
        .ok_or(BlightError::NoImageFormatsAllowed)
}
