//! Checksum command: digest of a file, uppercase hex as the catalog publishes it.

use anyhow::Result;
use defsync_core::checksum::{self, Algorithm};
use std::path::Path;

pub fn run_checksum(path: &Path, algorithm: Algorithm) -> Result<()> {
    let digest = checksum::digest_path(path, algorithm)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
