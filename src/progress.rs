use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lower")]
pub enum ProgressMode {
    Auto,
    Rich,
    Plain,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedProgressMode {
    Rich,
    Plain,
    Quiet,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    pub mode: ProgressMode,
    tty_override: Option<bool>,
}

impl ProgressConfig {
    pub fn new(mode: ProgressMode) -> Self {
        Self {
            mode,
            tty_override: None,
        }
    }

    #[cfg(test)]
    pub fn with_tty_override(mut self, is_tty: bool) -> Self {
        self.tty_override = Some(is_tty);
        self
    }

    pub fn resolve_mode(self) -> ResolvedProgressMode {
        let is_tty = self
            .tty_override
            .unwrap_or_else(|| std::io::stderr().is_terminal());
        match self.mode {
            ProgressMode::Auto => {
                if is_tty {
                    ResolvedProgressMode::Rich
                } else {
                    ResolvedProgressMode::Plain
                }
            }
            ProgressMode::Rich => ResolvedProgressMode::Rich,
            ProgressMode::Plain => ResolvedProgressMode::Plain,
            ProgressMode::Quiet => ResolvedProgressMode::Quiet,
        }
    }
}

/// Per-asset progress for the convert pipeline. Updates come from the
/// result collector, one tick per finished asset.
pub struct AssetProgress {
    label: &'static str,
    mode: ResolvedProgressMode,
    bar: Option<ProgressBar>,
}

impl AssetProgress {
    pub fn new(label: &'static str, total_assets: u64, config: ProgressConfig) -> Self {
        let mode = config.resolve_mode();
        let bar = if mode == ResolvedProgressMode::Rich {
            let bar = ProgressBar::new(total_assets.max(1));
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} {msg}",
                )
                .expect("valid progress template"),
            );
            bar.set_message("starting");
            Some(bar)
        } else {
            None
        };
        Self { label, mode, bar }
    }

    pub fn asset_done(&self, name: &str, outcome: &str) {
        match self.mode {
            ResolvedProgressMode::Rich => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                    bar.set_message(format!("{} {}", name, outcome));
                }
            }
            ResolvedProgressMode::Plain => {
                eprintln!("[PROGRESS] {}: {} {}", self.label, name, outcome);
            }
            ResolvedProgressMode::Quiet => {}
        }
    }

    pub fn finish(&self, message: &str) {
        match self.mode {
            ResolvedProgressMode::Rich => {
                if let Some(bar) = &self.bar {
                    bar.finish_with_message(message.to_string());
                }
            }
            ResolvedProgressMode::Plain => {
                eprintln!("[DONE] {}: {}", self.label, message);
            }
            ResolvedProgressMode::Quiet => {}
        }
    }
}
