//! Cache invalidation and directory management
//!
//! Decides at the start of every run whether the on-disk cache is still
//! trustworthy and prepares the cache and output trees.
//!
//! # Decision Table
//!
//! | Condition | Purge | Reason |
//! |-----------|-------|--------|
//! | `json/` present, output missing | yes | corrupt-directory |
//! | No stored fingerprint | no | first-run |
//! | Stored fingerprint differs | yes | fingerprint-mismatch |
//! | Stored fingerprint matches | no | none |
//!
//! Scaffolding runs after the decision regardless of its outcome.

pub mod layout;
pub mod manager;
pub mod status;

pub use layout::SiteLayout;
pub use manager::{CacheDecision, CacheDirManager, PurgeOutcome, PurgeReason};
pub use status::{CacheStatus, FileStatusStore, MemoryStatusStore, StatusStore};
