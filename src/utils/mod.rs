//! Utility modules for the fileset agent.

pub mod errors;
pub mod logger;

pub use errors::{EngineError, Result};
