use crate::error::{Result, SetupError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_PATTERN: &str = "dosbox*.conf";

/// The `[autoexec]` block that mounts the extracted tree and starts Turbo C.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStanza {
    lines: [String; 5],
}

impl ConfigStanza {
    pub fn for_extract_dir(extract_dir: &Path) -> Self {
        Self {
            lines: [
                "[autoexec]".to_string(),
                format!("mount c {}", extract_dir.display()),
                "c:".to_string(),
                "cd TURBOC3\\BIN".to_string(),
                "tc.exe".to_string(),
            ],
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines joined with `\n`, no trailing newline.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    /// True when the last five lines of `content` are this stanza. Carriage returns left
    /// over from CRLF files are ignored.
    pub fn is_applied_to(&self, content: &str) -> bool {
        let lines: Vec<&str> = content
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        if lines.len() < self.lines.len() {
            return false;
        }

        lines[lines.len() - self.lines.len()..]
            .iter()
            .zip(self.lines.iter())
            .all(|(have, want)| *have == want.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchResult {
    Applied { config: PathBuf, backup: PathBuf },
    AlreadyApplied { config: PathBuf },
    MissingHostConfig { dir: PathBuf },
}

/// Read-only view of the host configuration, used by `doctor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigInspection {
    pub dosbox_dir: PathBuf,
    pub dosbox_dir_exists: bool,
    pub config_file: Option<PathBuf>,
    pub stanza_applied: bool,
}

pub struct ConfigPatcher {
    dosbox_dir: PathBuf,
}

impl ConfigPatcher {
    pub fn new(dosbox_dir: PathBuf) -> Self {
        Self { dosbox_dir }
    }

    pub fn dosbox_dir(&self) -> &Path {
        &self.dosbox_dir
    }

    /// All `dosbox*.conf` files in the DOSBox directory, sorted by path.
    pub fn find_config_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}{}{}",
            glob::Pattern::escape(&self.dosbox_dir.to_string_lossy()),
            std::path::MAIN_SEPARATOR,
            CONFIG_PATTERN
        );
        debug!(pattern = %pattern, "searching for DOSBox configuration");

        let mut matches: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| SetupError::config_error(format!("invalid pattern {pattern}: {e}")))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(
                        path = %e.path().display(),
                        error = %e.error(),
                        "skipping unreadable configuration candidate"
                    );
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        matches.sort();
        Ok(matches)
    }

    /// The lexicographically first match wins when several versions are installed.
    pub fn locate_config_file(&self) -> Result<PathBuf> {
        self.find_config_files()?
            .into_iter()
            .next()
            .ok_or_else(|| SetupError::ConfigFileNotFound {
                dir: self.dosbox_dir.clone(),
            })
    }

    pub fn patch(&self, extract_dir: &Path) -> Result<PatchResult> {
        if !self.dosbox_dir.is_dir() {
            return Ok(PatchResult::MissingHostConfig {
                dir: self.dosbox_dir.clone(),
            });
        }

        let config = self.locate_config_file()?;
        let stanza = ConfigStanza::for_extract_dir(extract_dir);

        // Raw bytes: the backup must be an exact copy whatever the file's encoding.
        let old_config = std::fs::read(&config).map_err(|source| SetupError::ConfigWrite {
            path: config.clone(),
            source,
        })?;

        if stanza.is_applied_to(&String::from_utf8_lossy(&old_config)) {
            debug!(config = %config.display(), "stanza already present");
            return Ok(PatchResult::AlreadyApplied { config });
        }

        let backup = backup_path(&config);
        std::fs::write(&backup, &old_config).map_err(|source| SetupError::ConfigWrite {
            path: backup.clone(),
            source,
        })?;
        debug!(backup = %backup.display(), "saved previous configuration");

        std::fs::write(&config, stanza.render()).map_err(|source| SetupError::ConfigWrite {
            path: config.clone(),
            source,
        })?;

        Ok(PatchResult::Applied { config, backup })
    }

    pub fn inspect(&self, extract_dir: &Path) -> Result<ConfigInspection> {
        let dosbox_dir_exists = self.dosbox_dir.is_dir();
        let config_file = if dosbox_dir_exists {
            self.find_config_files()?.into_iter().next()
        } else {
            None
        };

        let stanza_applied = match &config_file {
            Some(path) => std::fs::read(path)
                .map(|content| {
                    ConfigStanza::for_extract_dir(extract_dir)
                        .is_applied_to(&String::from_utf8_lossy(&content))
                })
                .unwrap_or(false),
            None => false,
        };

        Ok(ConfigInspection {
            dosbox_dir: self.dosbox_dir.clone(),
            dosbox_dir_exists,
            config_file,
            stanza_applied,
        })
    }
}

/// `dosbox-0.74.conf` → `dosbox-0.74.conf.bak`
pub fn backup_path(config: &Path) -> PathBuf {
    let mut name = config.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}
