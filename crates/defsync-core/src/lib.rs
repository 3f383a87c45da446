pub mod config;
pub mod error;
pub mod logging;

// Update pipeline, leaf-first.
pub mod catalog;
pub mod checksum;
pub mod downloader;
pub mod orchestrator;
pub mod release;
pub mod retry;
pub mod scanner;
pub mod workspace;

pub use error::{TransportError, UpdateError};
pub use orchestrator::{CycleReport, UpdateOrchestrator, UpdateOutcome, VersionCheck};
pub use release::Release;
