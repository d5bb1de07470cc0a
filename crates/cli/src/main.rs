use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "satchel", about = "Multi-provider school-journal sync", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "satchel.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Initialize the Satchel data directory and configuration
    Init {
        /// Data directory path
        #[arg(long, default_value = "/var/lib/satchel")]
        data_dir: String,
    },
    /// Run a sync pass for every configured account
    Sync {
        /// Test provider logins without syncing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show profiles, last sync runs, and unread counts
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            commands::init::run(&data_dir).await?;
        }
        Commands::Sync { dry_run } => {
            commands::sync::run(&cli.config, dry_run).await?;
        }
        Commands::Status => {
            commands::status::run(&cli.config).await?;
        }
    }

    Ok(())
}
