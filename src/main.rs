mod bmp;
mod error;
mod manifest;
mod packed;
mod palette;
mod pipeline;
mod progress;
mod verify;
mod vga;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::HumanBytes;
use manifest::Manifest;
use pipeline::ConvertSummary;
use progress::{ProgressConfig, ProgressMode};
use std::path::PathBuf;
use std::time::Duration;
use verify::VerifyReport;

#[derive(Parser)]
#[command(
    name = "pm2assets",
    version,
    about = "Verify original Premier Manager 2 files and convert VGA containers into indexed BMP images"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the files in a directory against the asset manifest
    Verify {
        assets_dir: PathBuf,

        /// Alternative manifest (JSON) instead of the built-in table
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Verify, then convert every VGA container into per-frame BMP files
    Convert {
        assets_dir: PathBuf,
        output_dir: PathBuf,

        /// Alternative manifest (JSON) instead of the built-in table
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Worker threads for per-asset conversion. Default: auto.
        #[arg(long)]
        workers: Option<usize>,

        /// Progress display mode: auto (TTY-aware), rich, plain, quiet.
        #[arg(long, value_enum, default_value_t = ProgressMode::Auto)]
        progress: ProgressMode,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Verify {
            assets_dir,
            manifest,
        } => {
            let manifest = load_manifest(manifest.as_deref())?;
            let report = verify::verify_directory(&assets_dir, &manifest)?;
            print_verify_report(&report);
            if !report.all_ok() {
                std::process::exit(1);
            }
        }

        Commands::Convert {
            assets_dir,
            output_dir,
            manifest,
            workers,
            progress,
        } => {
            let manifest = load_manifest(manifest.as_deref())?;
            let summary = pipeline::convert_directory(
                &assets_dir,
                &output_dir,
                &manifest,
                workers,
                ProgressConfig::new(progress),
            )?;
            print_convert_summary(&summary, &output_dir);
            if !summary.all_converted() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn load_manifest(path: Option<&std::path::Path>) -> Result<Manifest> {
    match path {
        Some(path) => Manifest::load(path),
        None => Ok(Manifest::builtin()),
    }
}

fn print_verify_report(report: &VerifyReport) {
    for result in &report.results {
        println!("{:<16} {}", result.entry.name, result.status.describe());
    }
    println!(
        "Verify summary: entries={} ok={} size_mismatch={} checksum_mismatch={} missing={} extras={} checked={} duration={}",
        report.results.len(),
        report.count("ok"),
        report.count("size-mismatch"),
        report.count("checksum-mismatch"),
        report.count("missing"),
        report.extra_files,
        HumanBytes(report.checked_bytes),
        fmt_duration(report.elapsed),
    );
}

fn print_convert_summary(summary: &ConvertSummary, output_dir: &std::path::Path) {
    println!(
        "Verify gate: entries={} ok={} extras={}",
        summary.verify.results.len(),
        summary.verify.count("ok"),
        summary.verify.extra_files,
    );
    for outcome in &summary.outcomes {
        match &outcome.error {
            None => println!(
                "{:<16} converted frames={}",
                outcome.name, outcome.frames_written
            ),
            Some(err) => println!("{:<16} FAILED [{}] {}", outcome.name, err.kind(), err),
        }
    }
    println!(
        "Convert summary: output={} assets={} converted={} failed={} frames={} workers={} duration={}",
        output_dir.display(),
        summary.outcomes.len(),
        summary.converted,
        summary.failed,
        summary.frames_written,
        summary.workers,
        fmt_duration(summary.elapsed),
    );
}

fn fmt_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
