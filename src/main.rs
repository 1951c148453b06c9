//! deptest - integration test runner for interdependent service projects
//!
//! Starts and seeds every dependency server of a project, runs its test
//! targets group by group, tears the servers down and reports the results.

use clap::Parser;
use deptest::{cli, commands::RunArgs, common::logging};

#[derive(Parser)]
#[command(name = "deptest", about = "Test runner for interdependent projects")]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    // Argument errors exit 1 like every other failure; help/version exit 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    match cli::dispatch(cli.args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
