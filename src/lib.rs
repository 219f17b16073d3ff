pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliArgs, LogFormat};

pub use adapters::{http::RetryPolicy, plex::PlexLibrary, trakt::TraktClient};
pub use config::toml_config::SyncConfig;
pub use core::sync_sequence::{CollectionJob, FailurePolicy, RunSummary, SyncSequence};
pub use utils::error::{Result, SyncError};
