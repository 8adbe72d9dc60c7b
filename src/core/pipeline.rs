use crate::core::config::{InstallerConfig, ARCHIVE_NAME};
use crate::core::extract::{ExtractOutcome, Extractor};
use crate::core::fetch::Fetcher;
use crate::core::patch::{ConfigPatcher, PatchResult};
use crate::core::progress::{ProgressEvent, ProgressSink};
use crate::error::{Result, SetupError};
use std::fmt;
use tracing::{error, info};

pub const MISSING_DOSBOX_HINT: &str = "Please install DOSBox, then try again...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Download,
    Extract,
    Configure,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Download => "Download",
            Step::Extract => "Extraction",
            Step::Configure => "Configuration",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub downloaded_bytes: usize,
    pub extraction: ExtractOutcome,
    pub patch: PatchResult,
}

/// Download, extract, configure. Each step runs only if the previous one succeeded, and
/// re-running after a failure is safe because extraction and patching are both no-ops
/// once done.
pub struct Pipeline {
    config: InstallerConfig,
    fetcher: Option<Fetcher>,
}

impl Pipeline {
    pub fn new(config: InstallerConfig) -> Self {
        Self {
            config,
            fetcher: None,
        }
    }

    /// Uses `fetcher` instead of building the default HTTP client on each run.
    pub fn with_fetcher(config: InstallerConfig, fetcher: Fetcher) -> Self {
        Self {
            config,
            fetcher: Some(fetcher),
        }
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn run(&self, sink: &mut dyn ProgressSink) -> Result<PipelineSummary> {
        info!(url = %self.config.download_url, "starting install");

        let downloaded = self.download(sink);
        let buffer = report(sink, Step::Download, downloaded)?;
        sink.progress(0.0);

        let extracted = Extractor::new().extract(&buffer, &self.config.extract_dir, sink);
        let extraction = report(sink, Step::Extract, extracted)?;
        let downloaded_bytes = buffer.len();
        drop(buffer);

        sink.log("Writing configuration files...");
        let patcher = ConfigPatcher::new(self.config.dosbox_dir());
        let patched = patcher.patch(&self.config.extract_dir);
        let patch = report(sink, Step::Configure, patched)?;

        match &patch {
            PatchResult::Applied { config, backup } => {
                sink.log(&format!("Saved previous configuration to {}", backup.display()));
                sink.log(&format!("Updated {}", config.display()));
            }
            PatchResult::AlreadyApplied { config } => {
                sink.log(&format!("{} is already configured", config.display()));
            }
            PatchResult::MissingHostConfig { dir } => {
                info!(dir = %dir.display(), "DOSBox is not installed");
                sink.emit(ProgressEvent::done(MISSING_DOSBOX_HINT));
                return Err(SetupError::MissingHostConfig { dir: dir.clone() });
            }
        }

        sink.emit(ProgressEvent::done("Done!"));
        info!("install finished");

        Ok(PipelineSummary {
            downloaded_bytes,
            extraction,
            patch,
        })
    }

    fn download(&self, sink: &mut dyn ProgressSink) -> Result<Vec<u8>> {
        let url = &self.config.download_url;
        sink.log(&format!("Downloading {ARCHIVE_NAME} from {url}"));

        let handle = match &self.fetcher {
            Some(fetcher) => fetcher.spawn(url.clone()),
            None => Fetcher::new()?.spawn(url.clone()),
        };
        handle.wait(|progress| sink.progress(progress.fraction()))
    }
}

/// Turns a failed step into a terminal event before handing the error back.
fn report<T>(sink: &mut dyn ProgressSink, step: Step, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        error!(%step, error = %e, "step failed");
        sink.emit(ProgressEvent::done(format!("{step} failed: {e}")));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_emits_terminal_event_on_failure() {
        let mut events: Vec<ProgressEvent> = Vec::new();
        let result: Result<()> = report(
            &mut events,
            Step::Configure,
            Err(SetupError::ConfigFileNotFound {
                dir: "DOSBox".into(),
            }),
        );

        assert!(result.is_err());
        assert_eq!(events.len(), 1);
        assert!(events[0].done);
        assert_eq!(
            events[0].message.as_deref(),
            Some("Configuration failed: No dosbox*.conf file found in DOSBox")
        );
    }

    #[test]
    fn test_report_is_silent_on_success() {
        let mut events: Vec<ProgressEvent> = Vec::new();
        let value = report(&mut events, Step::Download, Ok(3)).unwrap();

        assert_eq!(value, 3);
        assert!(events.is_empty());
    }
}
