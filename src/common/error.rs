//! Error types for deptest
//!
//! Messages name the project or dependency involved so a broken
//! configuration can be fixed without digging through logs.

use std::io;
use thiserror::Error;

use crate::testing::TestOutcomes;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for deptest
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Project '{0}' was not found. Please update the config file")]
    UnknownProject(String),

    #[error("Project '{dependency}' (dependency of '{project}') was not found. Please update the config file")]
    UnknownDependency { project: String, dependency: String },

    #[error("Project '{project}' has no profile named '{profile}'")]
    UnknownProfile { project: String, profile: String },

    #[error("Project '{0}' is used as a dependency but has no port configured")]
    MissingPort(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Process Errors ===
    #[error("Failed to launch {what} for '{project}': {source}")]
    ProcessLaunch {
        what: String,
        project: String,
        #[source]
        source: io::Error,
    },

    #[error("Server for '{project}' did not answer on port {port} after {attempts} attempts")]
    ReadinessTimeout {
        project: String,
        port: u16,
        attempts: u32,
    },

    #[error("Failed to stop server for '{project}': {reason}")]
    Teardown { project: String, reason: String },

    #[error("Interrupted by {0}")]
    Interrupted(&'static str),

    /// A fatal error after some targets already ran
    #[error("{source}")]
    RunAborted {
        outcomes: TestOutcomes,
        #[source]
        source: Box<Error>,
    },

    // === Coverage Errors ===
    #[error("Failed to enumerate tests in '{module}': {reason}")]
    Enumeration { module: String, reason: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an unknown dependency error
    pub fn unknown_dependency(project: &str, dependency: &str) -> Self {
        Self::UnknownDependency {
            project: project.to_string(),
            dependency: dependency.to_string(),
        }
    }

    /// Create a process launch error
    pub fn launch(what: &str, project: &str, source: io::Error) -> Self {
        Self::ProcessLaunch {
            what: what.to_string(),
            project: project.to_string(),
            source,
        }
    }

    /// The underlying error, looking through [`Error::RunAborted`]
    pub fn root(&self) -> &Error {
        match self {
            Error::RunAborted { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error comes from the configuration rather than the environment
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.root(),
            Error::UnknownProject(_)
                | Error::UnknownDependency { .. }
                | Error::UnknownProfile { .. }
                | Error::MissingPort(_)
                | Error::Config(_)
                | Error::ConfigParse(_)
        )
    }
}
