use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use propagate::App;
use propagate::Config;
use propagate::clients::git::GitClient;
use propagate::validate_inputs;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "propagate", version)]
#[command(
    about = "Copy the contents of a folder onto every local branch of a git repository, then commit and push each branch",
    long_about = None
)]
pub struct Cli {
    /// Git repository to update
    pub repo: PathBuf,
    /// Folder whose immediate children are copied into the repository root
    pub source: PathBuf,
    /// Branch processed first and checked out at the end (git config: propagate.defaultBranch, default: main)
    #[arg(long)]
    pub default_branch: Option<String>,
    /// Remote to push to (git config: propagate.remote, default: origin)
    #[arg(long)]
    pub remote: Option<String>,
    /// Print the run report as JSON on stdout; progress goes to stderr
    #[arg(long)]
    pub json: bool,
    /// Exit with a failure status if any branch failed
    #[arg(long)]
    pub strict: bool,
}

fn setup_logging() -> Result<()> {
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env()?;
    tracing_subscriber::fmt()
        .with_timer(timer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        // Usage errors exit with 1 rather than clap's default of 2
        Err(e) => {
            e.print()?;
            return Ok(ExitCode::FAILURE);
        }
    };

    setup_logging()?;

    validate_inputs(&cli.repo, &cli.source)?;

    let git = GitClient::new(cli.repo.clone());
    let config = Config::load(&git)
        .await?
        .with_overrides(cli.default_branch, cli.remote);
    let app = App::new(config, cli.repo, git);

    // Keep stdout parseable when it carries the JSON report
    let report = if cli.json {
        let report = app
            .cmd_propagate(&cli.source, &mut std::io::stderr())
            .await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        report
    } else {
        app.cmd_propagate(&cli.source, &mut std::io::stdout())
            .await?
    };

    if cli.strict && report.has_failures() {
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
