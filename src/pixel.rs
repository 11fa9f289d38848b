/// Pixel memory layout tag.
///
/// Three families share the catalog:
///
/// - **Canonical outputs** — the only layouts a decoded [`crate::Image`]
///   may carry: [`Rgba32`](Self::Rgba32), [`Rgb16`](Self::Rgb16),
///   [`R8`](Self::R8), [`R16`](Self::R16).
/// - **Auxiliary in-memory layouts** — pass-through tags a caller may
///   attach to a borrowed buffer; never produced by a decoder.
/// - **Source layouts** — how pixel bytes sit in a file before transfer.
///   These tag a decode's input side only; allocating a container with
///   one fails with
///   [`NoImageTypeAttachedToPixelTag`](crate::BlightError::NoImageTypeAttachedToPixelTag).
///
/// Multi-byte words are native-endian in memory and little-endian in
/// files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelTag {
    /// Four 8-bit channels, R,G,B,A byte order.
    Rgba32,
    /// 5-6-5 R,G,B packed in one u16.
    Rgb16,
    /// Single 8-bit grey channel.
    R8,
    /// Single 16-bit grey channel.
    R16,

    /// Four f32 channels.
    Rgba128F,
    /// Four u32 channels.
    Rgba128,
    /// Single f32 channel.
    R32F,
    /// Two f32 channels.
    Rg64F,
    /// Three 8-bit channels, B,G,R byte order.
    Bgr24,
    /// B,G,R plus one padding byte (not alpha).
    Bgr32,

    /// Source: one grey byte.
    U8R,
    /// Source: one little-endian grey u16.
    U16R,
    /// Source: 5-6-5 R,G,B in a little-endian u16.
    U16Rgb,
    /// Source: 5-5-5 R,G,B in a little-endian u16 (top bit unused).
    U16Rgb15,
    /// Source: 16-bit word with caller-supplied channel masks.
    U16Rgba,
    /// Source: three bytes, B,G,R file order.
    U24Rgb,
    /// Source: four bytes, B,G,R,x file order.
    U32Rgb,
    /// Source: four bytes, B,G,R,A file order.
    U32Rgba,
}

impl PixelTag {
    /// Bytes one pixel of this layout occupies.
    pub fn size_bytes(self) -> usize {
        match self {
            Self::R8 | Self::U8R => 1,
            Self::Rgb16
            | Self::R16
            | Self::U16R
            | Self::U16Rgb
            | Self::U16Rgb15
            | Self::U16Rgba => 2,
            Self::Bgr24 | Self::U24Rgb => 3,
            Self::Rgba32 | Self::R32F | Self::Bgr32 | Self::U32Rgb | Self::U32Rgba => 4,
            Self::Rg64F => 8,
            Self::Rgba128F | Self::Rgba128 => 16,
        }
    }

    /// Whether the layout carries chroma (more than one color channel).
    pub fn is_color(self) -> bool {
        !matches!(
            self,
            Self::R8 | Self::R16 | Self::R32F | Self::U8R | Self::U16R
        )
    }

    /// Whether the layout carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Rgba32 | Self::Rgba128F | Self::Rgba128 | Self::U16Rgba | Self::U32Rgba
        )
    }

    /// Whether this tag describes a file layout rather than an
    /// in-memory image layout.
    pub fn is_source_only(self) -> bool {
        matches!(
            self,
            Self::U8R
                | Self::U16R
                | Self::U16Rgb
                | Self::U16Rgb15
                | Self::U16Rgba
                | Self::U24Rgb
                | Self::U32Rgb
                | Self::U32Rgba
        )
    }

    /// Whether this tag is one of the four layouts a decode may output.
    pub fn is_canonical_output(self) -> bool {
        matches!(self, Self::Rgba32 | Self::Rgb16 | Self::R8 | Self::R16)
    }
}

/// Alpha interpretation of a decoded image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alpha {
    /// No alpha channel, or one that must be ignored.
    #[default]
    None,
    /// Straight (non-premultiplied) alpha.
    Normal,
    /// Color channels already multiplied by alpha.
    Premultiplied,
}
