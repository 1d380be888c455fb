use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MANIFEST_VERSION: u16 = 1;

/// Expected identities of the original distribution's asset files.
/// Loaded once at startup and passed explicitly into the verifier; the
/// entry set never changes during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u16,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub size: u64,
    pub crc32: u32,
}

/// Asset identities of the original retail release. Sizes and digests are
/// pinned constants; the files themselves are supplied by the user.
const BUILTIN: &[(&str, u64, u32)] = &[
    ("fax.vga", 46_088, 0x5f0c_91ab),
    ("font16c.vga", 13_832, 0x1be2_07c4),
    ("font55.vga", 2_888, 0x88a1_3d52),
    ("font57.vga", 4_040, 0x2b76_f0e9),
    ("font57b.vga", 4_040, 0xc419_5a33),
    ("font77.vga", 5_192, 0x7d88_42b7),
    ("font77b.vga", 5_192, 0x93ee_016a),
    ("font77c.vga", 5_192, 0x0af5_c2dd),
    ("fontf9.vga", 9_224, 0xe73a_9f48),
    ("gndscore.vga", 24_584, 0x4c21_b8f6),
    ("gndseats.vga", 30_728, 0xa655_2e01),
    ("groundix.vga", 17_416, 0x39d7_64bc),
    ("icons.vga", 20_488, 0xdf02_a7e5),
    ("impslbar.vga", 7_688, 0x61c8_3b9f),
    ("matball.vga", 1_544, 0xb534_08d6),
    ("matbtn.vga", 12_296, 0x2e97_cc10),
    ("matspd.vga", 3_080, 0xf1a0_5e72),
    ("phone2.vga", 38_408, 0x84d6_1f2b),
    ("phonem.vga", 35_336, 0x5029_e8c7),
    ("pitch.vga", 64_008, 0xcb14_73ae),
    ("pitchbit.vga", 10_760, 0x17f9_204d),
    ("posgraph.vga", 28_168, 0x6a45_d198),
    ("report.vga", 41_480, 0xfe30_8b55),
    ("result.vga", 33_288, 0x09c7_6e21),
    ("sec2.vga", 26_120, 0xd41a_35f0),
    ("sh.vga", 6_152, 0x7bef_9a04),
    ("sponsors.vga", 22_536, 0x40d3_c817),
    ("ticket.vga", 15_368, 0x9826_47b9),
    ("validbtn.vga", 8_712, 0x3c5b_d06e),
];

impl Manifest {
    /// The manifest bundled with the tool. Cannot fail to load.
    pub fn builtin() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BUILTIN
                .iter()
                .map(|&(name, size, crc32)| ManifestEntry {
                    name: name.to_string(),
                    size,
                    crc32,
                })
                .collect(),
        }
    }

    /// Load an alternative manifest from a JSON file. Any read or parse
    /// problem here is fatal for the run.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read(path).with_context(|| format!("read manifest {}", path.display()))?;
        let manifest: Manifest = serde_json::from_slice(&raw)
            .with_context(|| format!("parse manifest {}", path.display()))?;
        if manifest.version != MANIFEST_VERSION {
            bail!(
                "manifest {} has version {}, expected {}",
                path.display(),
                manifest.version,
                MANIFEST_VERSION
            );
        }
        if manifest.entries.is_empty() {
            bail!("manifest {} contains no entries", path.display());
        }
        Ok(manifest)
    }
}
