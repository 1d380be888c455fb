use crate::error::AssetError;
use crate::palette::{PaletteTable, PALETTE_ENTRIES};
use crate::vga::DecodedFrame;

pub const FILE_HEADER_LEN: usize = 14;
pub const INFO_HEADER_LEN: usize = 40;
pub const COLOR_TABLE_LEN: usize = PALETTE_ENTRIES * 4;
pub const PIXEL_DATA_OFFSET: usize = FILE_HEADER_LEN + INFO_HEADER_LEN + COLOR_TABLE_LEN;

// 72 dpi in pixels per metre, the value the original tooling stamped.
const RESOLUTION_PPM: i32 = 2835;

pub fn padded_row_len(width: usize) -> usize {
    (width + 3) & !3
}

/// Serialize one frame as an 8-bit palette-indexed BMP: file header, info
/// header, 256-entry BGRA color table, then rows bottom-up with each row
/// zero-padded to a 4-byte boundary. Output is deterministic.
pub fn encode(frame: &DecodedFrame, palette: &PaletteTable) -> Result<Vec<u8>, AssetError> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    if frame.pixel_indices.len() != width * height {
        return Err(AssetError::InconsistentFrame(format!(
            "{} index bytes for a {}x{} frame",
            frame.pixel_indices.len(),
            width,
            height
        )));
    }

    let row_len = padded_row_len(width);
    let image_size = row_len * height;
    let file_size = PIXEL_DATA_OFFSET + image_size;

    let mut out = Vec::with_capacity(file_size);

    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]); // two reserved words
    out.extend_from_slice(&(PIXEL_DATA_OFFSET as u32).to_le_bytes());

    out.extend_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes()); // positive: bottom-up
    out.extend_from_slice(&1u16.to_le_bytes()); // planes
    out.extend_from_slice(&8u16.to_le_bytes()); // bits per pixel
    out.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
    out.extend_from_slice(&(image_size as u32).to_le_bytes());
    out.extend_from_slice(&RESOLUTION_PPM.to_le_bytes());
    out.extend_from_slice(&RESOLUTION_PPM.to_le_bytes());
    out.extend_from_slice(&(PALETTE_ENTRIES as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // all colors important

    for index in 0..=u8::MAX {
        let c = palette.color(index);
        out.extend_from_slice(&[c.b, c.g, c.r, 0]);
    }

    // Source rows are top-first; the row order inverts, bytes within a row
    // do not.
    let pad = [0u8; 3];
    for row in frame.pixel_indices.chunks_exact(width).rev() {
        out.extend_from_slice(row);
        out.extend_from_slice(&pad[..row_len - width]);
    }

    Ok(out)
}
