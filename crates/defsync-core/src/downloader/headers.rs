//! Track `Content-Length` across the response header lines curl hands us.

/// Accumulates header lines for the current response. A status line starts
/// a new response (redirect hop), so earlier lengths are forgotten.
#[derive(Debug, Default, Clone)]
pub(crate) struct HeaderState {
    content_length: Option<u64>,
}

impl HeaderState {
    pub(crate) fn feed(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            self.content_length = None;
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                self.content_length = value.trim().parse::<u64>().ok();
            }
        }
    }

    pub(crate) fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}
