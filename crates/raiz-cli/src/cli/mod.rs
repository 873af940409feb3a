//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use raiz_core::config;
use raiz_core::i18n::Language;
use raiz_core::logging::{self, LogGuard};
use tokio_util::sync::CancellationToken;

mod commands;

#[derive(Parser)]
#[command(name = "raiz")]
#[command(version)]
#[command(about = "Plant image tools for the RaizSábia backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend origin (overrides RAIZ_API_ORIGIN, API_ORIGIN and config)
    #[arg(long, global = true, value_name = "URL")]
    api_origin: Option<String>,

    /// Language for labels and messages (pt, en)
    #[arg(long, global = true, value_name = "LANG")]
    lang: Option<Language>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Fetch a plant's images and report how each one loads
    Images {
        /// Numeric plant identifier
        #[arg(value_name = "PLANT_ID")]
        plant_id: i64,

        /// Evict and reload every image once after the first pass
        #[arg(long = "retry-all")]
        retry_all: bool,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a single image URL with retries
    Check {
        #[arg(value_name = "URL")]
        url: String,

        /// Retries after the first attempt (default from config)
        #[arg(long, value_name = "N")]
        retries: Option<u32>,
    },

    /// Print the absolute URL a raw image reference resolves to
    Normalize {
        /// Raw value as stored by the backend
        #[arg(value_name = "RAW", allow_hyphen_values = true)]
        raw: String,

        /// Plant the image belongs to
        #[arg(long, value_name = "ID")]
        plant: i64,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Save the default language (pt, en) to the config file
    Language {
        #[arg(value_name = "LANG")]
        lang: Language,
    },
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        api_origin,
        lang,
    } = cli;

    match command {
        Commands::Images {
            plant_id,
            retry_all,
            json,
        } => {
            let (config, _log_guard) = prepare(lang)?;
            commands::images::run(commands::images::ImagesRunOptions {
                config: &config,
                api_origin: api_origin.as_deref(),
                plant_id,
                retry_all,
                json,
                interrupt: interrupt_token(),
            })
            .await
        }

        Commands::Check { url, retries } => {
            let (config, _log_guard) = prepare(lang)?;
            commands::check::run(&config, &url, retries, &interrupt_token()).await
        }

        Commands::Normalize { raw, plant } => {
            let (config, _log_guard) = prepare(lang)?;
            commands::normalize::run(&config, api_origin.as_deref(), &raw, plant)
        }

        // no config load here: these must work on a broken file
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Language { lang } => commands::config::language(lang),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}

/// Loads config, applies the language override and installs logging.
fn prepare(lang: Option<Language>) -> Result<(config::Config, LogGuard)> {
    let mut config = config::Config::load().context("load config")?;
    if let Some(lang) = lang {
        config.language = lang;
    }
    let guard = logging::init(&config.logging).context("init logging")?;
    Ok((config, guard))
}

/// Token cancelled on the first Ctrl+C.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}
