//! Common utilities shared by the orchestrator, the process layer and the CLI

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
