//! The published definitions release as scraped from the catalog page.

/// A single published definitions update.
///
/// `download_url` is kept exactly as it appeared in the catalog (absolute or
/// page-relative); `expected_checksum` is uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub download_url: String,
    pub version: String,
    pub expected_checksum: String,
}

impl Release {
    /// Name the staged file gets on disk: last path segment of `download_url`.
    pub fn file_name(&self) -> Option<String> {
        file_name_from_url(&self.download_url)
    }

    /// True when `installed` is the same release. Versions are opaque:
    /// there is no ordering, only equality.
    pub fn matches_installed(&self, installed: &str) -> bool {
        self.version == installed
    }
}

/// Extracts the last path segment from an absolute or relative URL.
///
/// Query and fragment are ignored. Returns `None` when the path is empty,
/// ends in `/`, the segment is `.`/`..`, or it still contains a character
/// some filesystem treats as a separator or drive marker (`\`, `:`, NUL).
pub fn file_name_from_url(url: &str) -> Option<String> {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            let end = url.find(['?', '#']).unwrap_or(url.len());
            url[..end].to_string()
        }
    };
    let segment = path.rsplit('/').next()?;
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    if segment.contains(['\\', ':', '\0']) {
        return None;
    }
    Some(segment.to_string())
}
