//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Save file: loading the save document from disk
//! - HTTP fetcher: reqwest adapter for asset backups
//! - Atomic write: temp-file-and-rename output
//! - Config: Application configuration

pub mod atomic_write;
pub mod config;
pub mod http_fetcher;
pub mod save_file;
