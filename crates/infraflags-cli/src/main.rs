mod cmd;
mod connect;
mod output;

use clap::{Parser, Subcommand};
use cmd::{
    check::CheckArgs, config::ConfigSubcommand, flags::FlagsArgs,
    requirements::RequirementsArgs,
};
use infraflags_cli::root;
use std::path::PathBuf;

/// Usage and setup errors exit like an indeterminate check.
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(
    name = "infraflags",
    about = "Verify that the infrastructure flags an application requires are deployed to an environment",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .infraflags/ or .git/)
    #[arg(long, global = true, env = "INFRAFLAGS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log platform calls and decisions to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check required flags against what is deployed to an environment
    Check(CheckArgs),

    /// Show the flag mapping deployed in a change set
    Flags(FlagsArgs),

    /// List the flags this application requires
    Requirements(RequirementsArgs),

    /// Manage .infraflags/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Check(args) => match cmd::check::run(&root, args, cli.json) {
            Ok(status) => std::process::exit(status.exit_code()),
            Err(e) => Err(e),
        },
        Commands::Flags(args) => cmd::flags::run(&root, args, cli.json),
        Commands::Requirements(args) => cmd::requirements::run(&root, args, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(EXIT_ERROR);
    }
}
