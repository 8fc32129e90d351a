//! Tag configuration and storage
//!
//! The JSON configuration describing which tag to emulate and where it is
//! kept on disk.

pub mod config;

pub use config::{ConfigError, HceConfig, RecordSpec, CONFIG_ENV};
