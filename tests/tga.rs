//! TGA decoding against synthesized files: image types, RLE packets,
//! origin corners, the V2 footer/extension machinery, and extent
//! overlap rejection.

use blight::{
    decode_tga, Alpha, BlightError, FormatInfo, Options, OutputTagSet, PixelTag, TgaVersion,
};

// ── File builders ───────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn tga_header(
    id_length: u8,
    cm_type: u8,
    image_type: u8,
    cm_first: u16,
    cm_len: u16,
    cm_bits: u8,
    width: u16,
    height: u16,
    depth: u8,
    descriptor: u8,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(18);
    out.push(id_length);
    out.push(cm_type);
    out.push(image_type);
    out.extend_from_slice(&cm_first.to_le_bytes());
    out.extend_from_slice(&cm_len.to_le_bytes());
    out.push(cm_bits);
    out.extend_from_slice(&[0; 4]); // origin x/y
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.push(depth);
    out.push(descriptor);
    out
}

fn tga_footer(extension_offset: u32, developer_offset: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(26);
    out.extend_from_slice(&extension_offset.to_le_bytes());
    out.extend_from_slice(&developer_offset.to_le_bytes());
    out.extend_from_slice(b"TRUEVISION-XFILE.\0");
    out
}

/// A 495-byte extension area with the given scalar fields.
fn tga_extension(
    author: &str,
    attribute_type: u8,
    scanline_offset: u32,
    color_correction_offset: u32,
) -> Vec<u8> {
    let mut out = vec![0u8; 495];
    out[0..2].copy_from_slice(&495u16.to_le_bytes());
    out[2..2 + author.len()].copy_from_slice(author.as_bytes());
    out[482..486].copy_from_slice(&color_correction_offset.to_le_bytes());
    out[490..494].copy_from_slice(&scanline_offset.to_le_bytes());
    out[494] = attribute_type;
    out
}

fn truecolor(width: u16, height: u16, depth: u8, descriptor: u8, pixels: &[u8]) -> Vec<u8> {
    let mut out = tga_header(0, 0, 2, 0, 0, 0, width, height, depth, descriptor);
    out.extend_from_slice(pixels);
    out
}

fn rgba_pixels(image: &blight::Image<'_>) -> Vec<[u8; 4]> {
    assert_eq!(image.tag().unwrap(), PixelTag::Rgba32);
    image
        .bytes()
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect()
}

// ── Truecolor ───────────────────────────────────────────────────────

#[test]
fn truecolor_24bit_bottom_left_origin() {
    // File rows are bottom-up by default. BGR bytes.
    let pixels = [
        0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, // file row 0: red, green
        0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF, // file row 1: blue, white
    ];
    let data = truecolor(2, 2, 24, 0, &pixels);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!((image.width, image.height), (2, 2));
    let px = rgba_pixels(&image);
    assert_eq!(px[0], [0, 0, 255, 255]); // top row comes from file row 1
    assert_eq!(px[1], [255, 255, 255, 255]);
    assert_eq!(px[2], [255, 0, 0, 255]);
    assert_eq!(px[3], [0, 255, 0, 255]);

    match image.file_info {
        FormatInfo::Tga(ref info) => {
            assert_eq!(info.file_type, TgaVersion::V1);
            assert!(info.footer.is_none());
        }
        ref other => panic!("expected TGA info, got {other:?}"),
    }
}

#[test]
fn truecolor_top_left_origin_keeps_row_order() {
    let pixels = [
        0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00,
        0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
    ];
    let data = truecolor(2, 2, 24, 0x20, &pixels);
    let image = decode_tga(&data, &Options::default()).unwrap();
    let px = rgba_pixels(&image);
    assert_eq!(px[0], [255, 0, 0, 255]);
    assert_eq!(px[3], [255, 255, 255, 255]);
}

#[test]
fn right_to_left_origin_reverses_rows() {
    let pixels = [
        0x00, 0x00, 0xFF, // red
        0x00, 0xFF, 0x00, // green
        0xFF, 0x00, 0x00, // blue
    ];
    let data = truecolor(3, 1, 24, 0x10, &pixels);
    let image = decode_tga(&data, &Options::default()).unwrap();
    let px = rgba_pixels(&image);
    assert_eq!(px[0], [0, 0, 255, 255]);
    assert_eq!(px[1], [0, 255, 0, 255]);
    assert_eq!(px[2], [255, 0, 0, 255]);
}

#[test]
fn truecolor_32bit_with_attr_bits_carries_alpha() {
    // V1, descriptor says 8 attribute bits: BGRA honored.
    let data = truecolor(1, 1, 32, 0x08, &[3, 2, 1, 77]);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(image.alpha, Alpha::Normal);
    assert_eq!(rgba_pixels(&image)[0], [1, 2, 3, 77]);
}

#[test]
fn truecolor_32bit_without_attr_bits_fills_alpha() {
    let data = truecolor(1, 1, 32, 0, &[3, 2, 1, 77]);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(image.alpha, Alpha::None);
    assert_eq!(rgba_pixels(&image)[0], [1, 2, 3, 255]);
}

#[test]
fn truecolor_16bit_prefers_rgb16() {
    // 5-6-5 word with all bits set.
    let data = truecolor(1, 1, 16, 0, &[0xFF, 0xFF]);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(image.tag().unwrap(), PixelTag::Rgb16);
    let word = u16::from_ne_bytes([image.bytes()[0], image.bytes()[1]]);
    assert_eq!(word, 0xFFFF);
}

#[test]
fn truecolor_15bit_is_555() {
    let options = Options {
        allowed_output_tags: OutputTagSet::only(PixelTag::Rgba32),
        ..Options::default()
    };
    // 0x7C00 = red in 5-5-5.
    let data = truecolor(1, 1, 15, 0, &[0x00, 0x7C]);
    let image = decode_tga(&data, &options).unwrap();
    assert_eq!(rgba_pixels(&image)[0], [248, 0, 0, 255]);
}

// ── Greyscale ───────────────────────────────────────────────────────

#[test]
fn greyscale_8bit_prefers_r8() {
    let mut data = tga_header(0, 0, 3, 0, 0, 0, 3, 1, 8, 0);
    data.extend_from_slice(&[10, 200, 30]);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(image.tag().unwrap(), PixelTag::R8);
    assert_eq!(image.bytes(), &[10, 200, 30]);
}

#[test]
fn greyscale_16bit_prefers_r16() {
    let mut data = tga_header(0, 0, 3, 0, 0, 0, 1, 1, 16, 0x08);
    data.extend_from_slice(&0xABCDu16.to_le_bytes());
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(image.tag().unwrap(), PixelTag::R16);
    let word = u16::from_ne_bytes([image.bytes()[0], image.bytes()[1]]);
    assert_eq!(word, 0xABCD);
}

#[test]
fn greyscale_16bit_to_r8_takes_high_byte() {
    let options = Options {
        allowed_output_tags: OutputTagSet::only(PixelTag::R8),
        ..Options::default()
    };
    let mut data = tga_header(0, 0, 3, 0, 0, 0, 1, 1, 16, 0x08);
    data.extend_from_slice(&0xABCDu16.to_le_bytes());
    let image = decode_tga(&data, &options).unwrap();
    assert_eq!(image.bytes(), &[0xAB]);
}

// ── Color-mapped ────────────────────────────────────────────────────

#[test]
fn color_map_24bit_entries() {
    let mut data = tga_header(0, 1, 1, 0, 3, 24, 3, 1, 8, 0);
    // Map entries stored BGR.
    data.extend_from_slice(&[0x00, 0x00, 0xFF]); // red
    data.extend_from_slice(&[0x00, 0xFF, 0x00]); // green
    data.extend_from_slice(&[0xFF, 0x00, 0x00]); // blue
    data.extend_from_slice(&[2, 0, 1]);
    let image = decode_tga(&data, &Options::default()).unwrap();
    let px = rgba_pixels(&image);
    assert_eq!(px[0], [0, 0, 255, 255]);
    assert_eq!(px[1], [255, 0, 0, 255]);
    assert_eq!(px[2], [0, 255, 0, 255]);
}

#[test]
fn color_map_15bit_entries_widen() {
    let mut data = tga_header(0, 1, 1, 0, 1, 15, 1, 1, 8, 0);
    data.extend_from_slice(&0x7C00u16.to_le_bytes());
    data.push(0);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(rgba_pixels(&image)[0], [248, 0, 0, 255]);
}

#[test]
fn color_map_32bit_keeps_alpha() {
    let mut data = tga_header(0, 1, 1, 0, 1, 32, 1, 1, 8, 0);
    data.extend_from_slice(&[1, 2, 3, 128]); // B,G,R,A
    data.push(0);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(rgba_pixels(&image)[0], [3, 2, 1, 128]);
}

#[test]
fn grey_color_map_collapses_to_r8() {
    let mut data = tga_header(0, 1, 1, 0, 2, 24, 2, 1, 8, 0);
    data.extend_from_slice(&[0, 0, 0]);
    data.extend_from_slice(&[200, 200, 200]);
    data.extend_from_slice(&[1, 0]);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(image.tag().unwrap(), PixelTag::R8);
    assert_eq!(image.bytes(), &[200, 0]);
}

#[test]
fn color_map_index_out_of_range() {
    let mut data = tga_header(0, 1, 1, 0, 2, 24, 1, 1, 8, 0);
    data.extend_from_slice(&[0, 0, 0, 1, 1, 1]);
    data.push(7);
    let err = decode_tga(&data, &Options::default()).unwrap_err();
    assert!(matches!(
        err,
        BlightError::InvalidColorTableIndex { index: 7, entries: 2 }
    ));
}

// ── Packet RLE ──────────────────────────────────────────────────────

#[test]
fn rle_truecolor_repeat_packet() {
    let mut data = tga_header(0, 0, 10, 0, 0, 0, 3, 1, 24, 0);
    data.extend_from_slice(&[0x82, 0x11, 0x22, 0x33]); // 3x B=11 G=22 R=33
    data.extend_from_slice(&tga_footer(0, 0));
    let image = decode_tga(&data, &Options::default()).unwrap();
    let px = rgba_pixels(&image);
    assert_eq!(px, vec![[0x33, 0x22, 0x11, 255]; 3]);
    match image.file_info {
        FormatInfo::Tga(ref info) => assert_eq!(info.file_type, TgaVersion::V2),
        ref other => panic!("expected TGA info, got {other:?}"),
    }
}

#[test]
fn rle_mixes_repeat_and_literal_packets() {
    let mut data = tga_header(0, 0, 10, 0, 0, 0, 3, 1, 24, 0);
    data.extend_from_slice(&[0x81, 0x11, 0x22, 0x33]); // 2x repeat
    data.extend_from_slice(&[0x00, 0x44, 0x55, 0x66]); // 1x literal
    let image = decode_tga(&data, &Options::default()).unwrap();
    let px = rgba_pixels(&image);
    assert_eq!(px[0], [0x33, 0x22, 0x11, 255]);
    assert_eq!(px[1], [0x33, 0x22, 0x11, 255]);
    assert_eq!(px[2], [0x66, 0x55, 0x44, 255]);
}

#[test]
fn rle_packets_straddle_rows() {
    // One 4-pixel repeat packet covering two 2-pixel rows.
    let mut data = tga_header(0, 0, 11, 0, 0, 0, 2, 2, 8, 0);
    data.extend_from_slice(&[0x83, 0xAA]);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(image.tag().unwrap(), PixelTag::R8);
    assert_eq!(image.bytes(), &[0xAA; 4]);
}

#[test]
fn rle_overflow_past_image_rejected() {
    let mut data = tga_header(0, 0, 11, 0, 0, 0, 2, 1, 8, 0);
    data.extend_from_slice(&[0x87, 0xAA]); // 8 pixels into a 2-pixel image
    let err = decode_tga(&data, &Options::default()).unwrap_err();
    assert!(matches!(err, BlightError::UnexpectedEndOfImageBuffer));
}

#[test]
fn rle_truncated_stream_rejected() {
    let mut data = tga_header(0, 0, 10, 0, 0, 0, 4, 1, 24, 0);
    data.extend_from_slice(&[0x83, 0x11]);
    let err = decode_tga(&data, &Options::default()).unwrap_err();
    assert!(matches!(err, BlightError::UnexpectedEof));
}

// ── Footer / extension / extents ────────────────────────────────────

#[test]
fn v2_extension_area_parsed() {
    let header = tga_header(0, 0, 2, 0, 0, 0, 1, 1, 32, 0x08);
    let pixels = [1u8, 2, 3, 4];
    let ext_off = (header.len() + pixels.len()) as u32;
    let ext = tga_extension("painter", 3, 0, 0);
    let footer = tga_footer(ext_off, 0);

    let mut data = header;
    data.extend_from_slice(&pixels);
    data.extend_from_slice(&ext);
    data.extend_from_slice(&footer);

    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(image.alpha, Alpha::Normal);
    match image.file_info {
        FormatInfo::Tga(ref info) => {
            assert_eq!(info.file_type, TgaVersion::V2);
            let ext = info.extension.as_ref().expect("extension parsed");
            assert_eq!(ext.author, "painter");
            assert_eq!(ext.attribute_type, 3);
        }
        ref other => panic!("expected TGA info, got {other:?}"),
    }
}

#[test]
fn extension_attribute_premultiplied() {
    let header = tga_header(0, 0, 2, 0, 0, 0, 1, 1, 32, 0x08);
    let pixels = [1u8, 2, 3, 4];
    let ext_off = (header.len() + pixels.len()) as u32;

    let mut data = header;
    data.extend_from_slice(&pixels);
    data.extend_from_slice(&tga_extension("", 4, 0, 0));
    data.extend_from_slice(&tga_footer(ext_off, 0));

    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(image.alpha, Alpha::Premultiplied);
}

#[test]
fn wrong_extension_length_skipped_silently() {
    let header = tga_header(0, 0, 2, 0, 0, 0, 1, 1, 24, 0);
    let pixels = [9u8, 9, 9];
    let ext_off = (header.len() + pixels.len()) as u32;
    let mut ext = tga_extension("", 0, 0, 0);
    ext[0..2].copy_from_slice(&494u16.to_le_bytes());

    let mut data = header;
    data.extend_from_slice(&pixels);
    data.extend_from_slice(&ext);
    data.extend_from_slice(&tga_footer(ext_off, 0));

    let image = decode_tga(&data, &Options::default()).unwrap();
    match image.file_info {
        FormatInfo::Tga(ref info) => {
            assert_eq!(info.file_type, TgaVersion::V2);
            assert!(info.extension.is_none());
            assert!(info.footer.is_some());
        }
        ref other => panic!("expected TGA info, got {other:?}"),
    }
}

#[test]
fn extension_overlapping_header_rejected() {
    // Extension offset 10 points into the header trio; bytes 10..12 of
    // the header (origin_y) read back as the stated length 495.
    let mut header = tga_header(0, 0, 2, 0, 0, 0, 2, 2, 24, 0);
    header[10..12].copy_from_slice(&495u16.to_le_bytes());

    let mut data = header;
    data.extend_from_slice(&[0u8; 600]);
    data.extend_from_slice(&tga_footer(10, 0));

    let err = decode_tga(&data, &Options::default()).unwrap_err();
    assert!(matches!(err, BlightError::OverlappingData { begin: 10, .. }));
}

#[test]
fn scanline_table_overlapping_extension_rejected() {
    let header = tga_header(0, 0, 2, 0, 0, 0, 1, 1, 24, 0);
    let pixels = [0u8, 0, 0];
    let ext_off = (header.len() + pixels.len()) as u32;
    // Scanline table offset pointing at the extension area itself.
    let ext = tga_extension("", 0, ext_off, 0);

    let mut data = header;
    data.extend_from_slice(&pixels);
    data.extend_from_slice(&ext);
    data.extend_from_slice(&tga_footer(ext_off, 0));

    let err = decode_tga(&data, &Options::default()).unwrap_err();
    assert!(matches!(err, BlightError::OverlappingData { .. }));
}

#[test]
fn scanline_and_correction_tables_read() {
    let header = tga_header(0, 0, 2, 0, 0, 0, 1, 1, 24, 0);
    let pixels = [5u8, 6, 7];
    let scan_off = (header.len() + pixels.len()) as u32;
    let scan_table = 0u32.to_le_bytes();
    let cc_off = scan_off + 4;
    let cc_table = vec![0u8; 256 * 8];
    let ext_off = cc_off + cc_table.len() as u32;
    let ext = tga_extension("", 0, scan_off, cc_off);

    let mut data = header;
    data.extend_from_slice(&pixels);
    data.extend_from_slice(&scan_table);
    data.extend_from_slice(&cc_table);
    data.extend_from_slice(&ext);
    data.extend_from_slice(&tga_footer(ext_off, 0));

    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(rgba_pixels(&image)[0], [7, 6, 5, 255]);
}

#[test]
fn image_id_skipped_via_extent() {
    let mut data = tga_header(4, 0, 2, 0, 0, 0, 1, 1, 24, 0);
    data.extend_from_slice(b"name");
    data.extend_from_slice(&[1, 2, 3]);
    let image = decode_tga(&data, &Options::default()).unwrap();
    assert_eq!(rgba_pixels(&image)[0], [3, 2, 1, 255]);
}

// ── Rejection paths ─────────────────────────────────────────────────

#[test]
fn no_data_image_type_rejected() {
    let data = tga_header(0, 0, 0, 0, 0, 0, 1, 1, 24, 0);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaNoData
    ));
}

#[test]
fn huffman_image_type_unsupported() {
    let data = tga_header(0, 0, 32, 0, 0, 0, 1, 1, 24, 0);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaImageTypeUnsupported(32)
    ));
}

#[test]
fn zero_dimensions_rejected() {
    let data = tga_header(0, 0, 2, 0, 0, 0, 0, 1, 24, 0);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaNoData
    ));
}

#[test]
fn interleaved_flavor_unsupported() {
    let data = tga_header(0, 0, 2, 0, 0, 0, 1, 1, 24, 0x40);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaFlavorUnsupported
    ));
}

#[test]
fn color_map_on_truecolor_rejected() {
    let data = tga_header(0, 1, 2, 0, 4, 24, 1, 1, 24, 0);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaColorMapDataInNonColorMapImage
    ));
}

#[test]
fn nonstandard_color_map_type_rejected() {
    let data = tga_header(0, 2, 1, 0, 4, 24, 1, 1, 8, 0);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaNonStandardColorTableUnsupported(2)
    ));
}

#[test]
fn color_map_image_without_map_rejected() {
    let data = tga_header(0, 0, 1, 0, 0, 0, 1, 1, 8, 0);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaNonStandardColorTableUnsupported(0)
    ));
}

#[test]
fn color_map_image_wrong_depth_rejected() {
    let mut data = tga_header(0, 1, 1, 0, 1, 24, 1, 1, 16, 0);
    data.extend_from_slice(&[0, 0, 0, 0, 0]);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaColorTableImageNot8BitColorDepth(16)
    ));
}

#[test]
fn nonstandard_map_entry_bits_rejected() {
    let mut data = tga_header(0, 1, 1, 0, 1, 13, 1, 1, 8, 0);
    data.extend_from_slice(&[0, 0, 0]);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaNonStandardColorDepthUnsupported(13)
    ));
}

#[test]
fn truecolor_bad_depth_rejected() {
    let mut data = tga_header(0, 0, 2, 0, 0, 0, 1, 1, 8, 0);
    data.push(0);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::TgaNonStandardColorDepthForPixelFormat(8)
    ));
}

#[test]
fn tiny_file_rejected() {
    assert!(matches!(
        decode_tga(&[0u8; 10], &Options::default()).unwrap_err(),
        BlightError::InvalidSizeForFormat
    ));
}

#[test]
fn truncated_pixels_rejected() {
    let mut data = tga_header(0, 0, 2, 0, 0, 0, 2, 2, 24, 0);
    data.extend_from_slice(&[0; 5]);
    assert!(matches!(
        decode_tga(&data, &Options::default()).unwrap_err(),
        BlightError::UnexpectedEof
    ));
}
