use crate::core::config::{ConfigFile, InstallerConfig};
use crate::core::extract::ExtractOutcome;
use crate::core::patch::PatchResult;
use crate::core::pipeline::{Pipeline, PipelineSummary};
use crate::core::progress::{ProgressEvent, ProgressSink};
use crate::error::{Result, SetupError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Command-line values that take precedence over `config.toml`.
#[derive(Debug, Default, Clone)]
pub struct InstallOverrides {
    pub url: Option<String>,
    pub target_dir: Option<PathBuf>,
    pub app_data_dir: Option<PathBuf>,
}

impl InstallOverrides {
    pub fn apply(self, mut file: ConfigFile) -> ConfigFile {
        if self.url.is_some() {
            file.download_url = self.url;
        }
        if self.target_dir.is_some() {
            file.extract_dir = self.target_dir;
        }
        if self.app_data_dir.is_some() {
            file.app_data_dir = self.app_data_dir;
        }
        file
    }
}

/// Renders pipeline events as a progress bar with log lines printed above it.
struct TerminalSink {
    bar: ProgressBar,
}

impl TerminalSink {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{bar:40.magenta/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━╾─");
        bar.set_style(style);
        Self { bar }
    }
}

impl ProgressSink for TerminalSink {
    fn emit(&mut self, event: ProgressEvent) {
        if let Some(fraction) = event.progress {
            self.bar.set_position((fraction * 100.0).round() as u64);
        }

        match (event.message, event.done) {
            (Some(message), true) => self.bar.finish_with_message(message),
            (Some(message), false) => self.bar.println(message),
            (None, true) => self.bar.finish(),
            (None, false) => {}
        }
    }
}

pub fn install(overrides: InstallOverrides) -> Result<()> {
    println!("🔧 Installing Turbo C 3");
    println!();

    let file = overrides.apply(ConfigFile::load()?);
    let config = InstallerConfig::resolve(file)?;

    println!("📁 Install directory: {}", config.extract_dir.display());
    println!("🌐 Download URL: {}", config.download_url);
    println!();

    let pipeline = Pipeline::new(config);
    let mut sink = TerminalSink::new();

    match pipeline.run(&mut sink) {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e @ SetupError::MissingHostConfig { .. }) => {
            println!();
            println!("⚠️  DOSBox does not appear to be installed.");
            println!("   Install DOSBox and start it once so it writes its configuration,");
            println!("   then run this installer again. The extracted files are kept and");
            println!("   the next run skips extraction.");
            Err(e)
        }
        Err(e) => Err(e),
    }
}

fn print_summary(summary: &PipelineSummary) {
    println!();
    match &summary.extraction {
        ExtractOutcome::Extracted { entries } => {
            println!(
                "✅ Extracted {} entries from a {} byte archive",
                entries.len(),
                summary.downloaded_bytes
            );
        }
        ExtractOutcome::AlreadyPresent => {
            println!("ℹ️  Install directory already existed, extraction skipped");
        }
    }

    match &summary.patch {
        PatchResult::Applied { config, backup } => {
            println!("✅ DOSBox configured: {}", config.display());
            println!("   Backup of the previous configuration: {}", backup.display());
        }
        PatchResult::AlreadyApplied { config } => {
            println!("✅ DOSBox was already configured: {}", config.display());
        }
        PatchResult::MissingHostConfig { .. } => {}
    }

    println!();
    println!("Start DOSBox to launch Turbo C.");
}
