//! steam-fetch: Steam game metadata proxy
//!
//! Command-line entry point for the REST server and one-shot queries.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use steam_fetch::{
    config::{Config, LogFormat},
    steam::{Capability, CatalogView},
    types::AppId,
};
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "steam-fetch")]
#[command(about = "Steam game metadata proxy: store API, page scraping and community pages")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "steam-fetch.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Listen address (overrides server.listen_addr)
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Reconciled details for one app
    Details {
        appid: AppId,
    },

    /// Scrape a store page without the Web API
    Scrape {
        appid: AppId,

        /// Extraction strategy (dom, pattern)
        #[arg(short, long)]
        strategy: Option<Capability>,
    },

    /// Fetch a community hub page through the age gate
    Community {
        appid: AppId,

        /// Sub-page such as "discussions" or "screenshots"
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Popular games
    Popular {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Games on sale, largest discount first
    Discounted {
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Upcoming releases
    Upcoming {
        #[arg(short, long, default_value = "30")]
        limit: usize,
    },

    /// Search the store
    Search {
        query: String,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Games in a store category (action, rpg, indie, free, ...)
    Category {
        name: String,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Weekly top sellers
    TopSellers {
        /// Two-letter country code
        #[arg(short, long, default_value = "US")]
        country: String,
    },

    /// Games ranked by concurrent players
    Charts,

    /// Current player count for one app
    Players {
        appid: AppId,
    },

    /// Copy Steam's app list into the local games table
    Sync,

    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn init_logging(config: &Config, verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => config.logging.level.as_tracing_level(),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    match config.logging.format {
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(false)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .json()
                .with_max_level(level)
                .with_target(false)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { path } = cli.command {
        return commands::init_config(path).await;
    }

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    let ignored = config.apply_env_overrides();
    config.validate()?;

    init_logging(&config, cli.verbose)?;
    for message in ignored {
        warn!("{}", message);
    }
    debug!("Using configuration from {}", cli.config.display());

    match cli.command {
        Commands::Serve { listen } => commands::serve(config, listen).await,
        Commands::Details { appid } => commands::details(config, appid).await,
        Commands::Scrape { appid, strategy } => commands::scrape(config, appid, strategy).await,
        Commands::Community { appid, section } => {
            commands::community(config, appid, section).await
        }
        Commands::Popular { limit } => commands::catalog(config, CatalogView::Popular, limit).await,
        Commands::Discounted { limit } => {
            commands::catalog(config, CatalogView::Discounted, limit).await
        }
        Commands::Upcoming { limit } => {
            commands::catalog(config, CatalogView::Upcoming, limit).await
        }
        Commands::Search { query, limit } => {
            commands::catalog(config, CatalogView::Search(query), limit).await
        }
        Commands::Category { name, limit } => {
            commands::catalog(config, CatalogView::Category(name), limit).await
        }
        Commands::TopSellers { country } => commands::top_sellers(config, country).await,
        Commands::Charts => commands::charts(config).await,
        Commands::Players { appid } => commands::current_players(config, appid).await,
        Commands::Sync => commands::sync_apps(config).await,
        Commands::Init { .. } => Ok(()),
    }
}
