use crate::core::progress::ProgressSink;
use crate::error::Result;
use crate::utils::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionEntry {
    pub name: String,
    pub compressed_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Entries written, in archive order.
    Extracted { entries: Vec<ExtractionEntry> },
    /// The target directory was already there; nothing was touched.
    AlreadyPresent,
}

/// Rounds to one decimal place.
pub fn rounded_fraction(extracted: u64, total: u64) -> f64 {
    if total == 0 {
        return 1.0;
    }
    ((extracted as f64 / total as f64) * 10.0).round() / 10.0
}

pub struct Extractor;

impl Default for Extractor {
    fn default() -> Self {
        Self
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    /// Unpacks `buffer` into `target_dir`.
    ///
    /// The directory doubles as the "already installed" marker: when it exists the whole
    /// step is skipped. Progress per entry is the running compressed size over the whole
    /// buffer length, so archive metadata keeps it slightly below the true fraction.
    pub fn extract(
        &self,
        buffer: &[u8],
        target_dir: &Path,
        sink: &mut dyn ProgressSink,
    ) -> Result<ExtractOutcome> {
        if !fs::create_fresh_dir(target_dir)? {
            debug!(dir = %target_dir.display(), "extraction skipped");
            sink.log(&format!("Directory {} already exists", target_dir.display()));
            return Ok(ExtractOutcome::AlreadyPresent);
        }

        let mut archive = match ZipArchive::new(Cursor::new(buffer)) {
            Ok(archive) => archive,
            Err(e) => {
                // The directory is still empty; leaving it would mark the install as done.
                let _ = std::fs::remove_dir(target_dir);
                return Err(e.into());
            }
        };
        let total_size = buffer.len() as u64;
        let mut extracted_size: u64 = 0;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let entry = ExtractionEntry {
                name: file.name().to_string(),
                compressed_size: file.compressed_size(),
            };

            sink.log(&format!("Extracting: {}", entry.name));

            match file.enclosed_name() {
                Some(relative) => {
                    let outpath = target_dir.join(relative);
                    if file.is_dir() {
                        fs::ensure_dir_exists(&outpath)?;
                    } else {
                        fs::write_entry(&mut file, &outpath)?;
                    }

                    #[cfg(unix)]
                    {
                        if let Some(mode) = file.unix_mode() {
                            fs::set_mode(&outpath, mode)?;
                        }
                    }
                }
                None => {
                    warn!(entry = %entry.name, "skipping entry outside the target directory");
                    sink.log(&format!("Skipping unsafe path: {}", entry.name));
                }
            }

            extracted_size += entry.compressed_size;
            sink.progress(rounded_fraction(extracted_size, total_size));
            entries.push(entry);
        }

        debug!(dir = %target_dir.display(), count = entries.len(), "extraction finished");
        Ok(ExtractOutcome::Extracted { entries })
    }
}
