use thiserror::Error;

/// Everything that can go wrong for a single asset or frame. Verification
/// mismatches and conversion failures are recorded against the asset and
/// never abort the run; only directory/manifest access problems are fatal
/// (those travel as `anyhow` errors instead).
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset file is missing or unreadable")]
    MissingAsset,

    #[error("size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("checksum mismatch: expected {expected:08x}, computed {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("truncated container: {0}")]
    TruncatedContainer(String),

    #[error("malformed container: {0}")]
    MalformedContainer(String),

    #[error("malformed palette: {0}")]
    MalformedPalette(String),

    #[error("unsupported container variant: flags {flags:#04x}")]
    UnsupportedVariant { flags: u8 },

    #[error("inconsistent frame: {0}")]
    InconsistentFrame(String),

    #[error("output files would collide with those of {competing}")]
    DuplicateOutput { competing: String },

    #[error("output write failure: {0}")]
    OutputWrite(#[source] std::io::Error),
}

impl AssetError {
    /// Stable short label used in per-asset summary lines.
    pub fn kind(&self) -> &'static str {
        match self {
            AssetError::MissingAsset => "missing-asset",
            AssetError::SizeMismatch { .. } => "size-mismatch",
            AssetError::ChecksumMismatch { .. } => "checksum-mismatch",
            AssetError::TruncatedContainer(_) => "truncated-container",
            AssetError::MalformedContainer(_) => "malformed-container",
            AssetError::MalformedPalette(_) => "malformed-palette",
            AssetError::UnsupportedVariant { .. } => "unsupported-variant",
            AssetError::InconsistentFrame(_) => "inconsistent-frame",
            AssetError::DuplicateOutput { .. } => "duplicate-output",
            AssetError::OutputWrite(_) => "output-write-failure",
        }
    }
}
