//! wslports CLI - Discover WSL services and plan host port forwards
//!
//! A command-line tool for scanning the listening TCP services of every WSL
//! distribution and writing a port forwarder configuration for them.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::scan::ScanArgs;

#[derive(Parser)]
#[command(name = "wslports")]
#[command(author, version, about = "Discover WSL services and plan host port forwards")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Show debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan all instances and write the forwarder configuration (default)
    Scan(ScanArgs),

    /// List the WSL instances that would be scanned
    #[command(alias = "ls")]
    Instances {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate a forwarder configuration file
    Validate {
        /// Configuration file to check
        file: std::path::PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Scan(args)) => commands::scan::run(args).await?,
        Some(Commands::Instances { json }) => commands::instances::run(json).await?,
        Some(Commands::Validate { file }) => {
            let code = commands::validate::run(&file).await;
            std::process::exit(code);
        }
        None => commands::scan::run(ScanArgs::default()).await?,
    }

    Ok(())
}
