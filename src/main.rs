use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use turbo_setup::commands;
use turbo_setup::commands::install::InstallOverrides;

#[derive(Parser)]
#[clap(name = "turbo-setup")]
#[clap(about = "Install Turbo C 3 and configure DOSBox to launch it")]
#[clap(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Print debug diagnostics to stderr
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download Turbo C, extract it and patch the DOSBox configuration
    Install {
        /// Archive URL (default: the TURBOC3.zip mirror on GitHub)
        #[clap(long)]
        url: Option<String>,
        /// Directory to extract into (default: ~/Documents/TURBOC3_extract_dir)
        #[clap(long)]
        target_dir: Option<PathBuf>,
        /// Local application data directory containing DOSBox/ (default: LOCALAPPDATA)
        #[clap(long)]
        app_data_dir: Option<PathBuf>,
    },
    /// Check the Turbo C install and the DOSBox configuration
    Doctor {
        /// Output format: text or json
        #[clap(short, long, default_value = "text")]
        format: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("turbo_setup={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Install {
            url,
            target_dir,
            app_data_dir,
        } => commands::install::install(InstallOverrides {
            url,
            target_dir,
            app_data_dir,
        })
        .map_err(|e| anyhow::anyhow!(e)),
        Commands::Doctor { format } => {
            commands::doctor::check_environment(&format).map_err(|e| anyhow::anyhow!(e))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
