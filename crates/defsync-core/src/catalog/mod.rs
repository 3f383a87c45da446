//! Definitions catalog: fetch the vendor's public page and pick the newest release.
//!
//! One GET per call and no retry; a failed fetch ends the run and the next
//! scheduled invocation tries again.

mod parse;

use std::time::Duration;

use crate::config::NetworkConfig;
use crate::error::{TransportError, UpdateError};
use crate::orchestrator::CatalogSource;
use crate::release::Release;

#[derive(Debug, Clone)]
pub struct CatalogClient {
    url: String,
    connect_timeout: Duration,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(url: impl Into<String>, network: &NetworkConfig) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(network.connect_timeout_secs),
            timeout: Duration::from_secs(network.catalog_timeout_secs),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the catalog page and return the body. Follows redirects.
    fn fetch_page(&self) -> Result<String, TransportError> {
        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(&self.url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Http(code));
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Fetch the catalog and parse the newest release.
    pub fn fetch_latest(&self) -> Result<Release, UpdateError> {
        tracing::info!("obtaining latest definitions from {}", self.url);
        let html = self.fetch_page().map_err(|source| UpdateError::CatalogFetch {
            url: self.url.clone(),
            source,
        })?;
        tracing::debug!(bytes = html.len(), "catalog page received");
        let release = parse::parse_latest(&html)?;
        tracing::info!(
            "found latest definitions: {} - {}",
            release.version,
            release.download_url
        );
        Ok(release)
    }

    /// Absolute URL for a release's link, resolving page-relative hrefs
    /// against the catalog URL.
    pub fn resolve_download_url(&self, release: &Release) -> Result<String, UpdateError> {
        if let Ok(absolute) = url::Url::parse(&release.download_url) {
            return Ok(absolute.to_string());
        }
        let base = url::Url::parse(&self.url)
            .map_err(|e| UpdateError::parse(format!("catalog url {:?} is invalid: {e}", self.url)))?;
        base.join(&release.download_url)
            .map(|u| u.to_string())
            .map_err(|e| {
                UpdateError::parse(format!(
                    "cannot resolve download link {:?}: {e}",
                    release.download_url
                ))
            })
    }
}

impl CatalogSource for CatalogClient {
    fn fetch_latest(&self) -> Result<Release, UpdateError> {
        CatalogClient::fetch_latest(self)
    }

    fn download_url(&self, release: &Release) -> Result<String, UpdateError> {
        self.resolve_download_url(release)
    }
}
