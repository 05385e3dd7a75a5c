use clap::{Parser, Subcommand};
use focos_core::storage::LoggingConfig;
use focos_core::Config;

mod commands;
mod logger;

#[derive(Parser)]
#[command(name = "focos", version, about = "Block distracting sites through the hosts file")]
struct Cli {
    /// Log debug output from focos to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Block sites right now, until `unblock`
    Block {
        /// Sites to block (URLs are fine, e.g. https://reddit.com/r/all)
        sites: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove the focos block from the hosts file
    Unblock {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which sites are currently blocked
    Status {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report whether this process already has administrator rights
    Elevated,
    /// Run a timed blocking session
    Session {
        #[command(subcommand)]
        mode: commands::session::SessionMode,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let filter = Config::load()
        .map(|c| c.logging.filter)
        .unwrap_or_else(|_| LoggingConfig::default().filter);
    logger::init(cli.verbose, &filter);

    let result = match cli.command {
        Commands::Block { sites, json } => commands::block::block(sites, json).await,
        Commands::Unblock { json } => commands::block::unblock(json).await,
        Commands::Status { json } => commands::block::status(json).await,
        Commands::Elevated => commands::block::elevated().await,
        Commands::Session { mode } => commands::session::run(mode).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
