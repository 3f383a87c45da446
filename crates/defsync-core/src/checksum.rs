//! Checksum gate for staged definitions files.
//!
//! Digests are computed by streaming the file in fixed-size blocks so large
//! definitions files never have to fit in memory.

use md5::Md5;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::UpdateError;

const BUF_SIZE: usize = 64 * 1024;

/// Digest algorithm, picked from the length of the published checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Sha256,
}

impl Algorithm {
    /// 32 hex chars is MD5 (what the vendor publishes), 64 is SHA-256.
    pub fn for_hex_len(len: usize) -> Option<Self> {
        match len {
            32 => Some(Algorithm::Md5),
            64 => Some(Algorithm::Sha256),
            _ => None,
        }
    }
}

/// True if `s` looks like a checksum we know how to verify.
pub fn is_valid_checksum(s: &str) -> bool {
    Algorithm::for_hex_len(s.len()).is_some() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Compute the digest of a file and return it as uppercase hex.
pub fn digest_path(path: &Path, algorithm: Algorithm) -> Result<String, UpdateError> {
    match algorithm {
        Algorithm::Md5 => stream_digest::<Md5>(path),
        Algorithm::Sha256 => stream_digest::<Sha256>(path),
    }
}

fn stream_digest<D: Digest>(path: &Path) -> Result<String, UpdateError> {
    let mut f = File::open(path).map_err(|e| UpdateError::io(path, e))?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf).map_err(|e| UpdateError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode_upper(hasher.finalize()))
}

/// Check a file against an expected hex digest.
///
/// Returns `Ok(false)` on mismatch (including an expected value of unknown
/// length); only I/O failures are errors. The file is never touched.
pub fn verify(path: &Path, expected_hex: &str) -> Result<bool, UpdateError> {
    tracing::info!("verifying checksum of {}", path.display());
    let Some(algorithm) = Algorithm::for_hex_len(expected_hex.len()) else {
        tracing::warn!("expected checksum {:?} has unsupported length", expected_hex);
        return Ok(false);
    };
    let actual = digest_path(path, algorithm)?;
    if actual == expected_hex.to_ascii_uppercase() {
        tracing::info!("checksum verified");
        Ok(true)
    } else {
        tracing::warn!("checksum {} does not match {}", actual, expected_hex);
        Ok(false)
    }
}
