use crate::error::AssetError;
use crate::packed;
use crate::palette::{self, PaletteTable, PALETTE_BLOCK_LEN};

pub const HEADER_LEN: usize = 8;

pub const FLAG_EMBEDDED_PALETTE: u8 = 0b0000_0001;
pub const FLAG_PACKED_PIXELS: u8 = 0b0000_0010;
const KNOWN_FLAGS: u8 = FLAG_EMBEDDED_PALETTE | FLAG_PACKED_PIXELS;

/// Container header, little-endian on disk:
/// frame_count u16, flags u8, reserved u8, height u16, width u16.
/// The height-before-width ordering matches the original asset layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VgaHeader {
    pub frame_count: u16,
    pub width: u16,
    pub height: u16,
    pub has_embedded_palette: bool,
    pub packed_pixels: bool,
    /// Byte offset of the first frame's pixel data; derived, not stored.
    pub pixel_data_offset: usize,
}

impl VgaHeader {
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn total_pixel_len(&self) -> usize {
        self.frame_len() * self.frame_count as usize
    }
}

/// One raster frame: palette-index bytes, row-major, top row first.
/// `pixel_indices.len()` always equals `width * height`.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub width: u16,
    pub height: u16,
    pub frame_index: u16,
    pub pixel_indices: Vec<u8>,
}

/// Fully decoded container. Parsing is all-or-nothing: a failure anywhere
/// yields no frames at all.
#[derive(Debug)]
pub struct VgaContainer {
    pub palette: PaletteTable,
    pub frames: Vec<DecodedFrame>,
}

pub fn parse_header(raw: &[u8]) -> Result<VgaHeader, AssetError> {
    if raw.len() < HEADER_LEN {
        return Err(AssetError::TruncatedContainer(format!(
            "file is {} bytes, header needs {}",
            raw.len(),
            HEADER_LEN
        )));
    }

    let frame_count = u16::from_le_bytes([raw[0], raw[1]]);
    let flags = raw[2];
    let height = u16::from_le_bytes([raw[4], raw[5]]);
    let width = u16::from_le_bytes([raw[6], raw[7]]);

    if flags & !KNOWN_FLAGS != 0 {
        return Err(AssetError::UnsupportedVariant { flags });
    }
    if frame_count == 0 {
        return Err(AssetError::MalformedContainer(
            "declared frame count is 0".to_string(),
        ));
    }
    if width == 0 || height == 0 {
        return Err(AssetError::MalformedContainer(format!(
            "declared dimensions {}x{}",
            width, height
        )));
    }

    let has_embedded_palette = flags & FLAG_EMBEDDED_PALETTE != 0;
    let pixel_data_offset = HEADER_LEN
        + if has_embedded_palette {
            PALETTE_BLOCK_LEN
        } else {
            0
        };

    Ok(VgaHeader {
        frame_count,
        width,
        height,
        has_embedded_palette,
        packed_pixels: flags & FLAG_PACKED_PIXELS != 0,
        pixel_data_offset,
    })
}

pub fn decode(raw: &[u8]) -> Result<VgaContainer, AssetError> {
    let header = parse_header(raw)?;

    let palette_block = if header.has_embedded_palette {
        let end = HEADER_LEN + PALETTE_BLOCK_LEN;
        if raw.len() < end {
            return Err(AssetError::MalformedPalette(format!(
                "palette block holds {} of {} bytes",
                raw.len() - HEADER_LEN,
                PALETTE_BLOCK_LEN
            )));
        }
        Some(&raw[HEADER_LEN..end])
    } else {
        None
    };
    let palette = palette::resolve(palette_block)?;

    let total_len = header.total_pixel_len();
    let body = &raw[header.pixel_data_offset..];
    let pixels = if header.packed_pixels {
        packed::expand(body, total_len)?
    } else {
        if body.len() < total_len {
            return Err(AssetError::TruncatedContainer(format!(
                "pixel data holds {} of {} bytes ({} frames of {}x{})",
                body.len(),
                total_len,
                header.frame_count,
                header.width,
                header.height
            )));
        }
        body[..total_len].to_vec()
    };

    let frame_len = header.frame_len();
    let frames = pixels
        .chunks_exact(frame_len)
        .enumerate()
        .map(|(i, chunk)| DecodedFrame {
            width: header.width,
            height: header.height,
            frame_index: i as u16,
            pixel_indices: chunk.to_vec(),
        })
        .collect();

    Ok(VgaContainer { palette, frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb;

    fn header_bytes(frame_count: u16, flags: u8, width: u16, height: u16) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&frame_count.to_le_bytes());
        out.push(flags);
        out.push(0);
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out
    }

    #[test]
    fn header_fields_parse_little_endian() {
        let raw = header_bytes(2, FLAG_EMBEDDED_PALETTE, 320, 200);
        let hdr = parse_header(&raw).expect("parse header");
        assert_eq!(hdr.frame_count, 2);
        assert_eq!(hdr.width, 320);
        assert_eq!(hdr.height, 200);
        assert!(hdr.has_embedded_palette);
        assert!(!hdr.packed_pixels);
        assert_eq!(hdr.pixel_data_offset, HEADER_LEN + PALETTE_BLOCK_LEN);
    }

    #[test]
    fn short_header_is_truncated() {
        let err = parse_header(&[0u8; 7]).unwrap_err();
        assert_eq!(err.kind(), "truncated-container");
    }

    #[test]
    fn zero_frames_or_dimensions_are_malformed() {
        let err = parse_header(&header_bytes(0, 0, 4, 4)).unwrap_err();
        assert_eq!(err.kind(), "malformed-container");
        let err = parse_header(&header_bytes(1, 0, 0, 4)).unwrap_err();
        assert_eq!(err.kind(), "malformed-container");
        let err = parse_header(&header_bytes(1, 0, 4, 0)).unwrap_err();
        assert_eq!(err.kind(), "malformed-container");
    }

    #[test]
    fn unknown_flag_bits_are_unsupported() {
        let err = parse_header(&header_bytes(1, 0b0000_0100, 4, 4)).unwrap_err();
        assert_eq!(err.kind(), "unsupported-variant");
    }

    #[test]
    fn uncompressed_frames_split_in_order() {
        let mut raw = header_bytes(2, 0, 3, 2);
        raw.extend_from_slice(&[1, 2, 3, 4, 5, 6]); // frame 0
        raw.extend_from_slice(&[7, 8, 9, 10, 11, 12]); // frame 1
        let container = decode(&raw).expect("decode");
        assert_eq!(container.frames.len(), 2);
        assert_eq!(container.frames[0].frame_index, 0);
        assert_eq!(container.frames[0].pixel_indices, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(container.frames[1].frame_index, 1);
        assert_eq!(container.frames[1].pixel_indices[0], 7);
        // No embedded palette: grayscale default
        assert_eq!(container.palette.color(9), Rgb { r: 9, g: 9, b: 9 });
    }

    #[test]
    fn two_declared_frames_with_data_for_one_fail_truncated() {
        let mut raw = header_bytes(2, 0, 4, 2);
        raw.extend_from_slice(&[0u8; 8]); // only one frame's worth
        let err = decode(&raw).unwrap_err();
        assert_eq!(err.kind(), "truncated-container");
    }

    #[test]
    fn embedded_palette_is_scaled_and_applied() {
        let mut raw = header_bytes(1, FLAG_EMBEDDED_PALETTE, 2, 1);
        let mut block = vec![0u8; PALETTE_BLOCK_LEN];
        block[15] = 63; // entry 5 = (63, 0, 0)
        raw.extend_from_slice(&block);
        raw.extend_from_slice(&[5, 0]);
        let container = decode(&raw).expect("decode");
        assert_eq!(container.palette.color(5), Rgb { r: 255, g: 0, b: 0 });
    }

    #[test]
    fn cut_palette_block_is_malformed_palette() {
        let mut raw = header_bytes(1, FLAG_EMBEDDED_PALETTE, 2, 1);
        raw.extend_from_slice(&[0u8; 100]);
        let err = decode(&raw).unwrap_err();
        assert_eq!(err.kind(), "malformed-palette");
    }

    #[test]
    fn packed_variant_expands_through_opcode_stream() {
        let mut raw = header_bytes(1, FLAG_PACKED_PIXELS, 4, 2);
        // short run: 8 x 0x11 (0x45 -> 5 + 3)
        raw.extend_from_slice(&[0x45, 0x11, packed::OP_TERMINATOR]);
        let container = decode(&raw).expect("decode packed");
        assert_eq!(container.frames.len(), 1);
        assert_eq!(container.frames[0].pixel_indices, vec![0x11; 8]);
    }

    #[test]
    fn packed_stream_short_of_declared_pixels_is_truncated() {
        let mut raw = header_bytes(2, FLAG_PACKED_PIXELS, 4, 2);
        raw.extend_from_slice(&[0x45, 0x11, packed::OP_TERMINATOR]); // 8 of 16
        let err = decode(&raw).unwrap_err();
        assert_eq!(err.kind(), "truncated-container");
    }
}
