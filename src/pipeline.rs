use crate::bmp;
use crate::error::AssetError;
use crate::manifest::Manifest;
use crate::progress::{AssetProgress, ProgressConfig};
use crate::verify::{self, VerifyReport, VerifyStatus};
use crate::vga;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::bounded;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct ConvertJob {
    index: usize,
    name: String,
    path: PathBuf,
}

/// Outcome of one manifest entry's conversion. `error` is set both for
/// verification failures (the asset never entered the pipeline) and for
/// failures in any conversion stage.
#[derive(Debug)]
pub struct ConvertOutcome {
    pub index: usize,
    pub name: String,
    pub frames_written: usize,
    pub error: Option<AssetError>,
}

#[derive(Debug)]
pub struct ConvertSummary {
    pub verify: VerifyReport,
    /// One outcome per manifest entry, in manifest order.
    pub outcomes: Vec<ConvertOutcome>,
    pub converted: usize,
    pub failed: usize,
    pub frames_written: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

impl ConvertSummary {
    pub fn all_converted(&self) -> bool {
        self.failed == 0
    }
}

/// Run the full pipeline: verify as a gate, then parse, resolve and encode
/// every asset that verified `ok`. Assets are independent, so they are
/// spread across a small worker pool; no asset's failure stops the others.
pub fn convert_directory(
    assets_dir: &Path,
    output_dir: &Path,
    manifest: &Manifest,
    workers_override: Option<usize>,
    progress_cfg: ProgressConfig,
) -> Result<ConvertSummary> {
    let started = Instant::now();

    let report = verify::verify_directory(assets_dir, manifest)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;

    let mut outcomes: Vec<ConvertOutcome> = Vec::with_capacity(report.results.len());
    let mut jobs: Vec<ConvertJob> = Vec::new();

    // Output names are derived from the asset stem, so two entries whose
    // names differ only in extension would overwrite each other's frames.
    // The first entry in manifest order keeps the stem; later claimants fail.
    let mut stems: HashMap<String, String> = HashMap::new();
    for (index, result) in report.results.iter().enumerate() {
        match result.status {
            VerifyStatus::Ok => {
                let name = result.entry.name.clone();
                let stem = asset_stem(&name).to_string();
                if let Some(holder) = stems.get(&stem) {
                    outcomes.push(ConvertOutcome {
                        index,
                        name,
                        frames_written: 0,
                        error: Some(AssetError::DuplicateOutput {
                            competing: holder.clone(),
                        }),
                    });
                    continue;
                }
                stems.insert(stem, name.clone());
                jobs.push(ConvertJob {
                    index,
                    path: assets_dir.join(&name),
                    name,
                });
            }
            status => outcomes.push(ConvertOutcome {
                index,
                name: result.entry.name.clone(),
                frames_written: 0,
                error: Some(verify_failure(status)),
            }),
        }
    }

    let workers = workers_override
        .unwrap_or_else(num_cpus::get)
        .max(1)
        .min(jobs.len().max(1));

    let progress = AssetProgress::new("convert", jobs.len() as u64, progress_cfg);
    let job_count = jobs.len();

    let (job_tx, job_rx) = bounded::<ConvertJob>(job_count.max(1));
    let (result_tx, result_rx) = bounded::<ConvertOutcome>(job_count.max(1));

    std::thread::scope(|scope| -> Result<()> {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    let outcome = match convert_one_asset(&job.path, &job.name, output_dir) {
                        Ok(frames_written) => ConvertOutcome {
                            index: job.index,
                            name: job.name,
                            frames_written,
                            error: None,
                        },
                        Err(err) => ConvertOutcome {
                            index: job.index,
                            name: job.name,
                            frames_written: 0,
                            error: Some(err),
                        },
                    };
                    if result_tx.send(outcome).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        for job in jobs {
            job_tx
                .send(job)
                .map_err(|_| anyhow!("conversion workers exited early"))?;
        }
        drop(job_tx);

        for _ in 0..job_count {
            let outcome = result_rx
                .recv()
                .map_err(|_| anyhow!("conversion workers exited early"))?;
            let note = match &outcome.error {
                None => format!("frames={}", outcome.frames_written),
                Some(err) => format!("failed [{}]", err.kind()),
            };
            progress.asset_done(&outcome.name, &note);
            outcomes.push(outcome);
        }
        Ok(())
    })?;

    outcomes.sort_by_key(|o| o.index);

    let converted = outcomes.iter().filter(|o| o.error.is_none()).count();
    let failed = outcomes.len() - converted;
    let frames_written = outcomes.iter().map(|o| o.frames_written).sum();
    progress.finish(&format!("{} converted, {} failed", converted, failed));

    Ok(ConvertSummary {
        verify: report,
        outcomes,
        converted,
        failed,
        frames_written,
        workers,
        elapsed: started.elapsed(),
    })
}

/// Decode one container and write one BMP per frame, ascending frame order.
/// Returns the number of frames written.
fn convert_one_asset(path: &Path, name: &str, output_dir: &Path) -> Result<usize, AssetError> {
    let raw = std::fs::read(path).map_err(|_| AssetError::MissingAsset)?;
    let container = vga::decode(&raw)?;

    let stem = asset_stem(name);
    let mut written = 0usize;
    for frame in &container.frames {
        let bytes = bmp::encode(frame, &container.palette)?;
        let out_path = output_dir.join(format!("{}_{:03}.bmp", stem, frame.frame_index));
        std::fs::write(&out_path, bytes).map_err(AssetError::OutputWrite)?;
        written += 1;
    }
    Ok(written)
}

fn verify_failure(status: VerifyStatus) -> AssetError {
    match status {
        VerifyStatus::Missing => AssetError::MissingAsset,
        VerifyStatus::SizeMismatch { expected, actual } => {
            AssetError::SizeMismatch { expected, actual }
        }
        VerifyStatus::ChecksumMismatch { expected, actual } => {
            AssetError::ChecksumMismatch { expected, actual }
        }
        VerifyStatus::Ok => unreachable!("ok status is not a failure"),
    }
}

fn asset_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}
