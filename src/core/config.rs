use crate::error::{Result, SetupError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://github.com/taaaf11/turbo-c--for-download/raw/main/TURBOC3.zip";
pub const ARCHIVE_NAME: &str = "TURBOC3.zip";
pub const EXTRACT_DIR_NAME: &str = "TURBOC3_extract_dir";

/// Values read from `config.toml`. Every field is optional; anything left out falls back
/// to the built-in default when resolved into an [`InstallerConfig`].
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ConfigFile {
    pub download_url: Option<String>,
    pub extract_dir: Option<PathBuf>,
    pub app_data_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SetupError::config_error(e.to_string()))
    }

    /// Loads `path` if it exists. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn load() -> Result<Self> {
        match get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Fully resolved settings for one pipeline run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InstallerConfig {
    pub download_url: String,
    pub extract_dir: PathBuf,
    pub app_data_dir: PathBuf,
}

impl InstallerConfig {
    pub fn new(download_url: String, extract_dir: PathBuf, app_data_dir: PathBuf) -> Self {
        Self {
            download_url,
            extract_dir,
            app_data_dir,
        }
    }

    /// Merges the file with the environment. Explicit file values win over the
    /// home/app-data lookups, which are only consulted when needed.
    pub fn resolve(file: ConfigFile) -> Result<Self> {
        let extract_dir = match file.extract_dir {
            Some(dir) => dir,
            None => default_extract_dir()?,
        };
        let app_data_dir = match file.app_data_dir {
            Some(dir) => dir,
            None => local_app_data_dir()?,
        };

        Ok(Self {
            download_url: file
                .download_url
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_URL.to_string()),
            extract_dir,
            app_data_dir,
        })
    }

    pub fn load() -> Result<Self> {
        Self::resolve(ConfigFile::load()?)
    }

    pub fn dosbox_dir(&self) -> PathBuf {
        self.app_data_dir.join("DOSBox")
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("turbo-setup").join("config.toml"))
}

pub fn default_extract_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join("Documents").join(EXTRACT_DIR_NAME))
        .ok_or(SetupError::HomeDirectoryNotFound)
}

/// `LOCALAPPDATA` first, then the platform's local data directory.
pub fn local_app_data_dir() -> Result<PathBuf> {
    std::env::var_os("LOCALAPPDATA")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::data_local_dir)
        .ok_or(SetupError::AppDataNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_partial_config() {
        let content = r#"
download_url = "http://localhost:8000/TURBOC3.zip"
extract_dir = "/opt/turbo"
"#;
        let file = ConfigFile::parse(content).unwrap();
        assert_eq!(
            file.download_url.as_deref(),
            Some("http://localhost:8000/TURBOC3.zip")
        );
        assert_eq!(file.extract_dir, Some(PathBuf::from("/opt/turbo")));
        assert_eq!(file.app_data_dir, None);
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        let err = ConfigFile::parse("download_url = [").unwrap_err();
        assert!(matches!(err, SetupError::ConfigError { .. }));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_resolve_prefers_file_values() {
        let file = ConfigFile {
            download_url: None,
            extract_dir: Some(PathBuf::from("/tmp/turbo")),
            app_data_dir: Some(PathBuf::from("/tmp/appdata")),
        };
        let config = InstallerConfig::resolve(file).unwrap();
        assert_eq!(config.download_url, DEFAULT_DOWNLOAD_URL);
        assert_eq!(config.extract_dir, PathBuf::from("/tmp/turbo"));
        assert_eq!(config.dosbox_dir(), PathBuf::from("/tmp/appdata").join("DOSBox"));
    }
}
