//! Command-line interface for the `repo-index` binary.
//!
//! Refreshes the overview, repository tables and last-updated footer of a
//! README from a YAML configuration and the GitHub API. The access token is
//! taken from `GITHUB_TOKEN`; without it only the manual metadata is used.

use std::{env, path::PathBuf, process};

use clap::{ArgAction, Parser};
use repo_index::{Error, RefreshOptions, refresh};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TOKEN_VARIABLE: &str = "GITHUB_TOKEN";

/// Command line interface for refreshing the project index README.
#[derive(Debug, Parser)]
#[command(
    name = "repo-index",
    version,
    about = "Refresh README repository tables with live GitHub data"
)]
struct Cli {
    /// Path to the README containing the managed marker regions.
    #[arg(long = "readme", value_name = "PATH", default_value = "README.md")]
    readme: PathBuf,

    /// Path to the YAML configuration listing tracked repositories.
    #[arg(long = "config", value_name = "PATH", default_value = "repos.yaml")]
    config: PathBuf,

    /// Skip CI status checks.
    #[arg(long = "skip-ci", action = ArgAction::SetTrue)]
    skip_ci: bool,
}

impl Cli {
    fn into_options(self) -> RefreshOptions {
        RefreshOptions {
            readme_path: self.readme,
            config_path: self.config,
            skip_ci: self.skip_ci,
        }
    }
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(error) = run().await {
        eprintln!("{}", error.to_display_string());
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration, README and client setup errors.
async fn run() -> Result<(), Error> {
    let options = Cli::parse().into_options();
    let token = env::var(TOKEN_VARIABLE).ok();

    let report = refresh(&options, token.as_deref()).await?;

    if report.changed {
        info!("README updated successfully: {} repos rendered", report.total);
    } else {
        info!("README already up to date");
    }

    Ok(())
}
