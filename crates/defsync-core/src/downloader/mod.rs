//! Single-stream HTTP GET of a definitions file to its staged path.
//!
//! The body is written chunk by chunk straight to the destination file, so
//! an interrupted transfer leaves a partial file behind. That is expected:
//! the checksum gate rejects it on the next run and it gets downloaded again.

mod headers;
mod progress;

pub use progress::{DownloadProgress, ProgressSink};

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::str;
use std::time::{Duration, Instant};

use crate::config::NetworkConfig;
use crate::error::{TransportError, UpdateError};
use crate::orchestrator::Fetcher;
use headers::HeaderState;

/// Bytes handed to us per write callback.
pub const CHUNK_SIZE: usize = 16 * 1024;

pub struct Downloader {
    connect_timeout: Duration,
    low_speed_limit: u32,
    low_speed_time: Duration,
    progress: Option<ProgressSink>,
}

impl Downloader {
    pub fn new(network: &NetworkConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(network.connect_timeout_secs),
            low_speed_limit: network.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(network.low_speed_time_secs),
            progress: None,
        }
    }

    /// Report progress after every chunk.
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Stream `url` into `dest`, replacing whatever is there. Returns bytes written.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64, UpdateError> {
        tracing::info!("starting definitions download from {}", url);
        let written = self
            .transfer(url, dest)
            .map_err(|source| UpdateError::Download {
                url: url.to_string(),
                source,
            })?;
        tracing::info!("download complete: {} bytes to {}", written, dest.display());
        Ok(written)
    }

    fn transfer(&self, url: &str, dest: &Path) -> Result<u64, TransportError> {
        let mut file = File::create(dest).map_err(TransportError::Storage)?;
        let headers = RefCell::new(HeaderState::default());
        let storage_error: RefCell<Option<io::Error>> = RefCell::new(None);
        let mut written = 0u64;
        let started = Instant::now();

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.fail_on_error(true)?;
        easy.buffer_size(CHUNK_SIZE)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    headers.borrow_mut().feed(line);
                }
                true
            })?;
            transfer.write_function(|data| {
                let result = file.write_all(data).and_then(|()| file.flush());
                if let Err(e) = result {
                    tracing::warn!("definitions write failed: {}", e);
                    *storage_error.borrow_mut() = Some(e);
                    return Ok(0); // abort transfer
                }
                written += data.len() as u64;
                if let Some(sink) = &self.progress {
                    sink(&DownloadProgress {
                        bytes_done: written,
                        total_bytes: headers.borrow().content_length(),
                        elapsed: started.elapsed(),
                    });
                }
                Ok(data.len())
            })?;
            transfer.perform()
        };

        if let Some(e) = storage_error.into_inner() {
            return Err(TransportError::Storage(e));
        }
        if let Err(e) = performed {
            if e.is_http_returned_error() {
                return Err(TransportError::Http(easy.response_code()?));
            }
            return Err(TransportError::Curl(e));
        }
        let code = easy.response_code()?;
        if code != 0 && !(200..300).contains(&code) {
            return Err(TransportError::Http(code));
        }
        if headers.borrow().content_length().is_none() {
            tracing::debug!("server sent no Content-Length; progress total was unknown");
        }
        file.sync_all().map_err(TransportError::Storage)?;
        Ok(written)
    }
}

impl Fetcher for Downloader {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, UpdateError> {
        Downloader::download(self, url, dest)
    }
}
