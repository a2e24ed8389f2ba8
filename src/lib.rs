//! Fileset Agent Library
//!
//! Pull-driven file enumeration and restore engine for list-driven backup
//! jobs. The job controller owns the loop; this crate decides which objects
//! exist, classifies them and recreates them, but never touches file content.

pub mod backup;
pub mod config;
pub mod descriptor;
pub mod filter;
pub mod fs;
pub mod report;
pub mod restore;
pub mod utils;

// Re-export commonly used types
pub use config::JobOptions;
pub use utils::errors::EngineError;
pub type Result<T> = std::result::Result<T, EngineError>;
