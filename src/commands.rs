//! CLI argument definitions

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML configuration file
    pub configfile: PathBuf,

    /// Name of the project whose tests are run
    pub project_to_test: String,

    /// Profile to run (default: "default")
    pub profile: Option<String>,

    /// Show output of dependency reset, fixture and server commands
    #[arg(short = 'd', long)]
    pub dependency_stdout: bool,

    /// Report tests not selected by any profile instead of running them
    #[arg(short = 'c', long)]
    pub check_coverage: bool,
}
