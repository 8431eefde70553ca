//! Kiln - build bootstrap and cache orchestrator
//!
//! Gets a site ready to build: fingerprints the plugin set and sentinel
//! files, clears the cache when it can no longer be trusted, scaffolds the
//! working directories, and writes the plugin dispatch tables.

pub mod bootstrap;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod lifecycle;
pub mod materialize;
pub mod output;
pub mod plugin;
pub mod report;
pub mod state;
pub mod templates;
pub mod ui;
pub mod workers;

pub use error::{KilnError, KilnResult};
