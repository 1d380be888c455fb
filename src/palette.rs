use crate::error::AssetError;

pub const PALETTE_ENTRIES: usize = 256;
pub const PALETTE_BLOCK_LEN: usize = PALETTE_ENTRIES * 3;

/// Highest value the original hardware's color DAC could express.
pub const DAC_MAX: u8 = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Always exactly 256 entries, so any pixel index byte resolves in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteTable {
    entries: [Rgb; PALETTE_ENTRIES],
}

impl PaletteTable {
    pub fn color(&self, index: u8) -> Rgb {
        self.entries[index as usize]
    }

    /// Fallback when a container carries no palette block: the identity
    /// grayscale ramp, entry i = (i, i, i). Identical across runs.
    pub fn grayscale() -> Self {
        let mut entries = [Rgb { r: 0, g: 0, b: 0 }; PALETTE_ENTRIES];
        for (i, entry) in entries.iter_mut().enumerate() {
            let v = i as u8;
            *entry = Rgb { r: v, g: v, b: v };
        }
        Self { entries }
    }
}

/// Expand a 6-bit DAC component (0-63) to the 8-bit range. Components above
/// 63 saturate, matching how the original tooling treated out-of-range bytes.
pub fn scale_dac_component(v: u8) -> u8 {
    let v = v.min(DAC_MAX) as u32;
    ((v * 255 + 31) / 63) as u8
}

/// Produce the 256-entry table for a container. `raw` is the embedded
/// 768-byte block of 6-bit components, or `None` for the pinned default.
pub fn resolve(raw: Option<&[u8]>) -> Result<PaletteTable, AssetError> {
    let block = match raw {
        Some(block) => block,
        None => return Ok(PaletteTable::grayscale()),
    };

    if block.len() != PALETTE_BLOCK_LEN {
        return Err(AssetError::MalformedPalette(format!(
            "palette block is {} bytes, expected {}",
            block.len(),
            PALETTE_BLOCK_LEN
        )));
    }

    let mut entries = [Rgb { r: 0, g: 0, b: 0 }; PALETTE_ENTRIES];
    for (entry, triple) in entries.iter_mut().zip(block.chunks_exact(3)) {
        *entry = Rgb {
            r: scale_dac_component(triple[0]),
            g: scale_dac_component(triple[1]),
            b: scale_dac_component(triple[2]),
        };
    }
    Ok(PaletteTable { entries })
}
