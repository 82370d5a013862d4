//! gamewatch - watch-list reconciliation and game library deduplication
//!
//! This crate keeps two local stores in line with outside sources:
//! - Watched forum threads, synchronized from a list of thread URLs
//! - The installed game library, fed from local game directories
//! - Remote catalog lookups with interactive conflict resolution
//! - Duplicate detection by normalized name and remote id

pub mod app;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod notify;
pub mod prompt;
pub mod threads;

pub use app::App;
pub use config::Config;
pub use error::{WatchError, WatchResult};
