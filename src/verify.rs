use crate::manifest::{Manifest, ManifestEntry};
use anyhow::{bail, Result};
use crc32fast::Hasher;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Mutually exclusive, exhaustive per-entry outcome. Mismatches are data,
/// not errors; verification itself only fails when the directory cannot be
/// accessed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    Ok,
    SizeMismatch { expected: u64, actual: u64 },
    ChecksumMismatch { expected: u32, actual: u32 },
    Missing,
}

impl VerifyStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, VerifyStatus::Ok)
    }

    pub fn label(&self) -> &'static str {
        match self {
            VerifyStatus::Ok => "ok",
            VerifyStatus::SizeMismatch { .. } => "size-mismatch",
            VerifyStatus::ChecksumMismatch { .. } => "checksum-mismatch",
            VerifyStatus::Missing => "missing",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            VerifyStatus::Ok => "ok".to_string(),
            VerifyStatus::SizeMismatch { expected, actual } => {
                format!("size-mismatch (expected {} bytes, found {})", expected, actual)
            }
            VerifyStatus::ChecksumMismatch { expected, actual } => {
                format!(
                    "checksum-mismatch (expected {:08x}, computed {:08x})",
                    expected, actual
                )
            }
            VerifyStatus::Missing => "missing".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub entry: ManifestEntry,
    pub status: VerifyStatus,
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// One result per manifest entry, in manifest order.
    pub results: Vec<VerificationResult>,
    /// Files in the directory that no manifest entry covers.
    pub extra_files: usize,
    pub checked_bytes: u64,
    pub elapsed: Duration,
}

impl VerifyReport {
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.status.is_ok())
    }

    pub fn count(&self, label: &str) -> usize {
        self.results
            .iter()
            .filter(|r| r.status.label() == label)
            .count()
    }
}

/// Check every manifest entry against the files in `dir`. Never touches the
/// files beyond reading; a single unreadable file records as `missing` for
/// its entry and the scan continues.
pub fn verify_directory(dir: &Path, manifest: &Manifest) -> Result<VerifyReport> {
    if !dir.is_dir() {
        bail!("asset directory {} is not accessible", dir.display());
    }
    let started = Instant::now();

    let mut checked_bytes = 0u64;
    let mut results = Vec::with_capacity(manifest.entries.len());
    for entry in &manifest.entries {
        let status = verify_entry(&dir.join(&entry.name), entry, &mut checked_bytes);
        results.push(VerificationResult {
            entry: entry.clone(),
            status,
        });
    }

    Ok(VerifyReport {
        results,
        extra_files: count_extras(dir, manifest),
        checked_bytes,
        elapsed: started.elapsed(),
    })
}

fn verify_entry(path: &Path, entry: &ManifestEntry, checked_bytes: &mut u64) -> VerifyStatus {
    let meta = match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta,
        _ => return VerifyStatus::Missing,
    };

    if meta.len() != entry.size {
        // Checksum is guaranteed to fail here, skip the read.
        return VerifyStatus::SizeMismatch {
            expected: entry.size,
            actual: meta.len(),
        };
    }

    match file_crc32(path) {
        Ok(actual) => {
            *checked_bytes += meta.len();
            if actual == entry.crc32 {
                VerifyStatus::Ok
            } else {
                VerifyStatus::ChecksumMismatch {
                    expected: entry.crc32,
                    actual,
                }
            }
        }
        // Present but unreadable counts the same as absent.
        Err(_) => VerifyStatus::Missing,
    }
}

pub fn file_crc32(path: &Path) -> std::io::Result<u32> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

fn count_extras(dir: &Path, manifest: &Manifest) -> usize {
    let known: HashSet<&str> = manifest.entries.iter().map(|e| e.name.as_str()).collect();
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| !known.contains(e.file_name().to_string_lossy().as_ref()))
        .count()
}
