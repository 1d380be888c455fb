#![allow(dead_code)]

use std::path::Path;

pub const FLAG_EMBEDDED_PALETTE: u8 = 0b0000_0001;
pub const FLAG_PACKED_PIXELS: u8 = 0b0000_0010;
pub const PALETTE_BLOCK_LEN: usize = 256 * 3;

// BMP layout constants mirrored from the encoder's pinned format.
pub const BMP_COLOR_TABLE_OFFSET: usize = 14 + 40;
pub const BMP_PIXEL_DATA_OFFSET: usize = 14 + 40 + 256 * 4;

pub fn combined_output(output: &std::process::Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// Assemble a container: header, optional palette block, pixel payload.
pub fn build_container(
    frame_count: u16,
    flags: u8,
    width: u16,
    height: u16,
    palette_block: Option<&[u8]>,
    pixels: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&frame_count.to_le_bytes());
    out.push(flags);
    out.push(0);
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    if let Some(block) = palette_block {
        out.extend_from_slice(block);
    }
    out.extend_from_slice(pixels);
    out
}

/// Palette block with every component zero except one pinned entry.
pub fn palette_block_with_entry(index: usize, r6: u8, g6: u8, b6: u8) -> Vec<u8> {
    let mut block = vec![0u8; PALETTE_BLOCK_LEN];
    block[index * 3] = r6;
    block[index * 3 + 1] = g6;
    block[index * 3 + 2] = b6;
    block
}

/// Write a manifest JSON file describing the given (name, bytes) assets.
pub fn write_manifest(path: &Path, assets: &[(&str, &[u8])]) {
    let entries: Vec<serde_json::Value> = assets
        .iter()
        .map(|(name, data)| {
            serde_json::json!({
                "name": name,
                "size": data.len(),
                "crc32": crc32fast::hash(data),
            })
        })
        .collect();
    let manifest = serde_json::json!({ "version": 1, "entries": entries });
    std::fs::write(path, serde_json::to_vec_pretty(&manifest).unwrap()).expect("write manifest");
}

pub fn padded_row_len(width: usize) -> usize {
    (width + 3) & !3
}

/// Read pixel (row, col) of an 8-bit bottom-up BMP produced by the tool,
/// returning (index, (r, g, b)) resolved through its color table.
pub fn read_bmp_pixel(bmp: &[u8], width: usize, height: usize, row: usize, col: usize) -> (u8, (u8, u8, u8)) {
    let row_len = padded_row_len(width);
    let stored_row = height - 1 - row;
    let index = bmp[BMP_PIXEL_DATA_OFFSET + stored_row * row_len + col];
    let entry = BMP_COLOR_TABLE_OFFSET + index as usize * 4;
    let (b, g, r) = (bmp[entry], bmp[entry + 1], bmp[entry + 2]);
    (index, (r, g, b))
}
