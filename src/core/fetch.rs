use crate::error::{Result, SetupError};
use std::io::Read;
use std::sync::mpsc::{channel, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Number of progress updates a full transfer is split into.
const PROGRESS_STEPS: u64 = 100;

/// Upper bound for the up-front buffer reservation, whatever the server claims.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// The downloaded archive, held entirely in memory.
pub type ArchiveBuffer = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub bytes_received: u64,
    pub total_bytes: u64,
}

impl DownloadProgress {
    /// An empty body is complete by definition, so a zero total reports `1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            self.bytes_received as f64 / self.total_bytes as f64
        }
    }
}

pub fn chunk_size(total_bytes: u64) -> u64 {
    (total_bytes / PROGRESS_STEPS).max(1)
}

/// Reads exactly `total_bytes` from `reader` in [`chunk_size`] pieces, reporting after
/// each piece. A body that ends early or runs past the declared length is rejected.
pub fn read_with_progress<R, F>(
    mut reader: R,
    total_bytes: u64,
    url: &str,
    mut on_progress: F,
) -> Result<ArchiveBuffer>
where
    R: Read,
    F: FnMut(DownloadProgress),
{
    let chunk = chunk_size(total_bytes);
    let mut buffer = Vec::with_capacity(total_bytes.min(MAX_PREALLOCATION) as usize);
    let mut bytes_received: u64 = 0;

    loop {
        let read = reader
            .by_ref()
            .take(chunk)
            .read_to_end(&mut buffer)
            .map_err(|e| SetupError::download_failed(url, e.to_string()))?;

        if read == 0 {
            break;
        }

        bytes_received += read as u64;
        if bytes_received > total_bytes {
            return Err(SetupError::download_failed(
                url,
                format!("received more than the declared {total_bytes} bytes"),
            ));
        }

        on_progress(DownloadProgress {
            bytes_received,
            total_bytes,
        });
    }

    if bytes_received < total_bytes {
        return Err(SetupError::download_failed(
            url,
            format!("connection closed after {bytes_received} of {total_bytes} bytes"),
        ));
    }

    if total_bytes == 0 {
        on_progress(DownloadProgress {
            bytes_received: 0,
            total_bytes: 0,
        });
    }

    Ok(buffer)
}

pub enum FetchMessage {
    Progress(DownloadProgress),
    Finished(Result<ArchiveBuffer>),
}

/// A transfer running on its own thread.
pub struct FetchHandle {
    url: String,
    receiver: Receiver<FetchMessage>,
    worker: JoinHandle<()>,
}

impl FetchHandle {
    /// Blocks until the transfer ends, handing every progress update to `on_progress`
    /// on the calling thread.
    pub fn wait<F>(self, mut on_progress: F) -> Result<ArchiveBuffer>
    where
        F: FnMut(DownloadProgress),
    {
        let mut outcome = None;
        for message in self.receiver.iter() {
            match message {
                FetchMessage::Progress(progress) => on_progress(progress),
                FetchMessage::Finished(result) => {
                    outcome = Some(result);
                    break;
                }
            }
        }

        if self.worker.join().is_err() {
            warn!("download worker panicked");
        }

        outcome.unwrap_or_else(|| {
            Err(SetupError::download_failed(
                &self.url,
                "download worker stopped without a result",
            ))
        })
    }
}

#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::blocking::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("turbo-setup/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| SetupError::download_failed("", e.to_string()))?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    pub fn fetch<F>(&self, url: &str, on_progress: F) -> Result<ArchiveBuffer>
    where
        F: FnMut(DownloadProgress),
    {
        debug!(url, "requesting archive");

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| SetupError::download_failed(url, e.to_string()))?;

        let total_bytes = response
            .content_length()
            .ok_or_else(|| SetupError::MissingContentLength {
                url: url.to_string(),
            })?;

        debug!(url, total_bytes, chunk = chunk_size(total_bytes), "streaming body");

        let buffer = read_with_progress(response, total_bytes, url, on_progress)?;
        debug!(url, bytes = buffer.len(), "download complete");
        Ok(buffer)
    }

    /// Starts downloading `url` on a worker thread.
    pub fn spawn(&self, url: String) -> FetchHandle {
        let (sender, receiver) = channel();
        let fetcher = self.clone();
        let worker_url = url.clone();

        let worker = thread::spawn(move || {
            let url = worker_url;
            let progress_sender = sender.clone();
            let result = fetcher.fetch(&url, |progress| {
                let _ = progress_sender.send(FetchMessage::Progress(progress));
            });
            let _ = sender.send(FetchMessage::Finished(result));
        });

        FetchHandle {
            url,
            receiver,
            worker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(body: &[u8], total: u64) -> (Result<ArchiveBuffer>, Vec<DownloadProgress>) {
        let mut seen = Vec::new();
        let result = read_with_progress(Cursor::new(body.to_vec()), total, "test://", |p| {
            seen.push(p)
        });
        (result, seen)
    }

    #[test]
    fn test_chunk_size_is_clamped() {
        assert_eq!(chunk_size(0), 1);
        assert_eq!(chunk_size(99), 1);
        assert_eq!(chunk_size(1000), 10);
    }

    #[test]
    fn test_progress_is_monotonic_and_ends_at_one() {
        let body = vec![7u8; 1234];
        let (result, seen) = collect(&body, body.len() as u64);

        assert_eq!(result.unwrap(), body);
        let fractions: Vec<f64> = seen.iter().map(|p| p.fraction()).collect();
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*fractions.last().unwrap(), 1.0);
        assert!(fractions.len() >= 100);
    }

    #[test]
    fn test_zero_length_body_reports_complete() {
        let (result, seen) = collect(&[], 0);

        assert!(result.unwrap().is_empty());
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].fraction(), 1.0);
        assert!(!seen[0].fraction().is_nan());
    }

    #[test]
    fn test_truncated_body_fails() {
        let (result, _) = collect(&[1, 2, 3], 10);
        assert!(matches!(result, Err(SetupError::DownloadFailed { .. })));
    }

    #[test]
    fn test_silent_worker_names_the_url() {
        let (sender, receiver) = channel::<FetchMessage>();
        let handle = FetchHandle {
            url: "http://mirror/TURBOC3.zip".to_string(),
            receiver,
            worker: thread::spawn(move || drop(sender)),
        };

        let err = handle.wait(|_| {}).unwrap_err();

        assert!(err.to_string().contains("http://mirror/TURBOC3.zip"));
    }

    #[test]
    fn test_oversized_body_fails() {
        let (result, _) = collect(&[0; 20], 10);
        assert!(matches!(result, Err(SetupError::DownloadFailed { .. })));
    }
}
