#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, coded};
use roster_core::config::{EffectiveConfig, resolve_config};
use roster_core::error::ErrorCode;
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "roster: subscriber list dashboard",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags and the configured preference.
    fn output_mode(&self, configured: Option<&str>) -> OutputMode {
        output::resolve_output_mode(self.format, self.json, configured)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Show one page of subscribers",
        long_about = "Load the saved view, apply filter, sort and page flags in that order, render the page and save the new view.",
        after_help = "EXAMPLES:\n    # First page, default order\n    roster list\n\n    # Active Plan 1 subscribers matching \"smith\", newest joins first\n    roster list --search smith --plan \"Plan 1\" --status Active --sort joinDate --sort joinDate\n\n    # Open a shared link without saving it\n    roster list --url '?status=Expired&page=2' --no-save\n\n    # Emit machine-readable output\n    roster list --format json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Show summary statistics",
        long_about = "Show subscriber totals, revenue and the plan distribution over all records.",
        after_help = "EXAMPLES:\n    # Summary with distribution bars\n    roster stats\n\n    # Emit machine-readable output\n    roster stats --format json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        about = "Decode and normalize a view link",
        long_about = "Decode a query fragment (or the saved view) and print its canonical link.",
        after_help = "EXAMPLES:\n    # Inspect the saved view\n    roster link\n\n    # Normalize a pasted URL\n    roster link 'https://dash.example/subs?page=2&plan=Plan+3'"
    )]
    Link(cmd::link::LinkArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ROSTER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "roster=debug,info"
        } else {
            "roster=info,warn"
        })
    });

    let format = env::var("ROSTER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, config: &EffectiveConfig, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    match &cli.command {
        Commands::List(args) => cmd::list::run_list(args, output, project_root, &config.project),
        Commands::Stats(args) => {
            cmd::stats::run_stats(args, output, project_root, &config.project)
        }
        Commands::Link(args) => cmd::link::run_link(args, output, project_root, &config.project),
    }
}

fn report(output: OutputMode, err: &anyhow::Error) -> ExitCode {
    debug!(error = ?err, "command failed");
    let cli_error = CliError::from(err);
    if output::render_error(output, &cli_error).is_err() {
        eprintln!("error: {}", cli_error.message);
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => return report(cli.output_mode(None), &err.into()),
    };

    let config = match resolve_config(&project_root) {
        Ok(config) => config,
        Err(err) => {
            let env_format = env::var("FORMAT").ok();
            let output = cli.output_mode(env_format.as_deref());
            return report(output, &coded(ErrorCode::ConfigParseError, err));
        }
    };
    let output = cli.output_mode(config.resolved_output.as_deref());

    match run(&cli, &config, output, &project_root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(output, &err),
    }
}
