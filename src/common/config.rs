//! Configuration file handling
//!
//! The configuration is a YAML document describing every project that can
//! take part in a run: the project under test and the servers it depends on.
//!
//! ```yaml
//! projects:
//!   authsvc:
//!     dir: ../authsvc
//!     port: 9001
//!     fixtures: [users]
//!   core:
//!     dir: ../core
//!     deps: [authsvc]
//!     tests:
//!       default:
//!         - [core.tests.login]
//!         - tests: [core.tests.admin]
//!           overrides:
//!             authsvc:
//!               fixtures: [admins]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Profile used when none is given on the command line
pub const DEFAULT_PROFILE: &str = "default";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// All known projects, keyed by name
    #[serde(default)]
    pub projects: BTreeMap<String, Project>,

    /// How management commands are invoked
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Readiness polling policy for dependency servers
    #[serde(default)]
    pub readiness: ReadinessConfig,
}

/// A single configured project
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Project {
    /// Project name (filled from the map key)
    #[serde(skip)]
    pub name: String,

    /// Working directory for every command run for this project
    pub dir: PathBuf,

    /// Port the server listens on when this project is a dependency
    #[serde(default)]
    pub port: Option<u16>,

    /// Projects whose servers must be live while this project is tested
    #[serde(default)]
    pub deps: Vec<String>,

    /// Apps reset before fixtures are loaded
    #[serde(default)]
    pub reset: Vec<String>,

    /// Fixtures loaded before the server starts
    #[serde(default)]
    pub fixtures: Vec<String>,

    /// Settings module passed as `--settings=<module>`
    #[serde(default)]
    pub settings: Option<String>,

    /// Test plan: profiles of run groups
    #[serde(default)]
    pub tests: TestPlan,

    /// Test modules inspected by the coverage check
    #[serde(default)]
    pub apps: Vec<String>,
}

/// Run groups of a project, either per profile or as a single default list
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum TestPlan {
    Profiles(BTreeMap<String, Vec<RunGroup>>),
    Default(Vec<RunGroup>),
}

impl Default for TestPlan {
    fn default() -> Self {
        TestPlan::Profiles(BTreeMap::new())
    }
}

impl TestPlan {
    /// Look up the run groups of a profile
    pub fn profile(&self, name: &str) -> Option<&[RunGroup]> {
        match self {
            TestPlan::Profiles(profiles) => profiles.get(name).map(Vec::as_slice),
            TestPlan::Default(groups) if name == DEFAULT_PROFILE => Some(groups.as_slice()),
            TestPlan::Default(_) => None,
        }
    }

    /// All run groups across every profile
    pub fn all_groups(&self) -> Vec<&RunGroup> {
        match self {
            TestPlan::Profiles(profiles) => profiles.values().flatten().collect(),
            TestPlan::Default(groups) => groups.iter().collect(),
        }
    }
}

/// One execution unit: targets run against one freshly started set of dependencies
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RunGroup {
    /// A single test target
    Single(String),
    /// Ordered test targets with project default setup
    Targets(Vec<String>),
    /// Test targets plus per-dependency setup overrides
    Detailed(DetailedGroup),
}

/// Structured form of a run group
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DetailedGroup {
    /// Ordered test targets
    pub tests: Vec<String>,

    /// Dependency name -> setup override for this group only
    #[serde(default)]
    pub overrides: BTreeMap<String, SetupOverride>,
}

/// Replacement reset/fixture lists for one dependency
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct SetupOverride {
    #[serde(default)]
    pub reset: Option<Vec<String>>,

    #[serde(default)]
    pub fixtures: Option<Vec<String>>,
}

/// Whether dependency command output is shown
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    Display,
    #[default]
    Suppress,
}

/// How management commands are built
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Interpreter executable
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Management script passed as the first interpreter argument
    #[serde(default = "default_manage")]
    pub manage: String,

    /// Extra arguments placed before the target in `test` invocations
    #[serde(default = "default_test_args")]
    pub test_args: Vec<String>,

    /// Management command that prints a JSON test tree for a module
    #[serde(default = "default_enumerate_command")]
    pub enumerate_command: String,

    /// Show or discard output of reset/fixture/server commands
    #[serde(default)]
    pub dependency_stdout: OutputMode,

    /// Exit code treated as a test failure; any non-zero code when unset
    #[serde(default)]
    pub failure_exit_code: Option<i32>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            manage: default_manage(),
            test_args: default_test_args(),
            enumerate_command: default_enumerate_command(),
            dependency_stdout: OutputMode::default(),
            failure_exit_code: None,
        }
    }
}

fn default_interpreter() -> String {
    "python".to_string()
}
fn default_manage() -> String {
    "manage.py".to_string()
}
fn default_test_args() -> Vec<String> {
    vec!["-v0".to_string()]
}
fn default_enumerate_command() -> String {
    "listtests".to_string()
}

/// Readiness polling policy
#[derive(Debug, Deserialize, Clone)]
pub struct ReadinessConfig {
    /// Host the readiness check connects to
    #[serde(default = "default_host")]
    pub host: String,

    /// Delay between attempts
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            interval_ms: default_interval(),
            max_attempts: default_max_attempts(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_interval() -> u64 {
    2000
}
fn default_max_attempts() -> u32 {
    30
}
fn default_request_timeout() -> u64 {
    1000
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// Relative project directories are resolved against the directory
    /// containing the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_dirs(base);
        }
        Ok(config)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config =
            serde_yaml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        for (name, project) in config.projects.iter_mut() {
            project.name = name.clone();
        }
        Ok(config)
    }

    fn resolve_dirs(&mut self, base: &Path) {
        for project in self.projects.values_mut() {
            if project.dir.is_relative() {
                project.dir = base.join(&project.dir);
            }
        }
    }

    /// Get a project by name
    pub fn project(&self, name: &str) -> Result<&Project> {
        self.projects
            .get(name)
            .ok_or_else(|| Error::UnknownProject(name.to_string()))
    }

    /// Resolve every declared dependency of a project, in declaration order
    ///
    /// Fails on the first name that is not a configured project.
    pub fn dependencies_of(&self, project: &Project) -> Result<Vec<&Project>> {
        project
            .deps
            .iter()
            .map(|dep| {
                self.projects
                    .get(dep)
                    .ok_or_else(|| Error::unknown_dependency(&project.name, dep))
            })
            .collect()
    }
}
