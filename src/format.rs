//! Image file format identification.

/// The TGA V2 footer signature, bytes 8..26 of the trailing 26.
pub(crate) const TGA_FOOTER_SIGNATURE: &[u8; 18] = b"TRUEVISION-XFILE.\0";

/// Length of a TGA V2 footer.
pub(crate) const TGA_FOOTER_LEN: usize = 26;

/// File formats the dispatcher can name.
///
/// `Jpg` and `Png` are recognized during inference but their decoders
/// are not wired up; loading one fails with
/// [`FormatDisabled`](crate::BlightError::FormatDisabled).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Bmp,
    Jpg,
    Png,
    Tga,
}

impl ImageFormat {
    /// Map a file extension (case-insensitive, no leading dot) to a
    /// format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let mut buf = [0u8; 4];
        let ext_bytes = ext.as_bytes();
        if ext_bytes.is_empty() || ext_bytes.len() > buf.len() {
            return None;
        }
        for (i, &b) in ext_bytes.iter().enumerate() {
            buf[i] = b.to_ascii_lowercase();
        }
        match &buf[..ext_bytes.len()] {
            b"bmp" | b"dib" => Some(ImageFormat::Bmp),
            b"png" => Some(ImageFormat::Png),
            b"jpg" | b"jpeg" => Some(ImageFormat::Jpg),
            b"tga" | b"icb" | b"vda" | b"vst" | b"tpic" => Some(ImageFormat::Tga),
            _ => None,
        }
    }

    /// Probe file content. `data` is the whole file; the head identifies
    /// BMP and PNG, the 26-byte tail identifies a V2 TGA.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() >= 2 && &data[..2] == b"BM" {
            return Some(ImageFormat::Bmp);
        }
        if data.len() >= 8 && data[..8] == [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'] {
            return Some(ImageFormat::Png);
        }
        if data.len() >= TGA_FOOTER_LEN {
            let tail = &data[data.len() - TGA_FOOTER_LEN..];
            if &tail[8..24] == b"TRUEVISION-XFILE" {
                return Some(ImageFormat::Tga);
            }
        }
        None
    }
}
