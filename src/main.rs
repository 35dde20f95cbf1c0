use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use torrent_finder::bot::messages::MessageFactory;
use torrent_finder::bot::{run_bot, TelegramClient};
use torrent_finder::core::config::{Config, ConfigOverrides};
use torrent_finder::core::error::FindError;
use torrent_finder::core::startup::{build_state, controller_settings, resolve_bot_token, TOKEN_ENV_VAR};
use torrent_finder::core::tracing_init::init_tracing;
use torrent_finder::finder::TorrentFinder;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(
    name = "torrent-finder",
    version,
    about = "Find the best Torznab magnet and send it to Transmission"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Enable debug logging regardless of config
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search once and send the best match to Transmission
    Search(SearchArgs),

    /// Print the Transmission status report
    Status {
        /// Only torrents that are still downloading
        #[arg(long)]
        active: bool,
    },

    /// Run the Telegram bot until Ctrl+C
    Bot(BotArgs),
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Title to search for
    title: String,

    /// Override download directory for this run
    #[arg(long)]
    download_dir: Option<String>,

    /// Start the download immediately
    #[arg(long, conflicts_with = "no_start")]
    start: bool,

    /// Add paused regardless of config
    #[arg(long)]
    no_start: bool,

    /// Override Transmission host
    #[arg(long)]
    host: Option<String>,

    /// Override Transmission port
    #[arg(long)]
    port: Option<u16>,

    /// Transmission RPC username
    #[arg(long)]
    username: Option<String>,

    /// Transmission RPC password
    #[arg(long)]
    password: Option<String>,

    /// Override Torznab categories for this run
    #[arg(long)]
    categories: Option<String>,
}

impl SearchArgs {
    fn overrides(&self) -> ConfigOverrides {
        let start = match (self.start, self.no_start) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        ConfigOverrides {
            download_dir: self.download_dir.clone(),
            start,
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            categories: self.categories.clone(),
        }
    }
}

#[derive(Debug, Args)]
struct BotArgs {
    /// Telegram Bot API token (overrides config and TELEGRAM_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Restrict the bot to a single chat id
    #[arg(long)]
    chat_id: Option<i64>,

    /// Results shown per page
    #[arg(long)]
    max_results: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let mut config = Config::from_file(&cli.config).with_context(|| {
        format!(
            "Failed to load configuration from '{}'. \
            Copy config.example.toml to config.toml and adjust the values.",
            cli.config.display()
        )
    })?;

    if let Command::Search(args) = &cli.command {
        config.apply_overrides(&args.overrides());
        config.validate().context("Invalid command line overrides")?;
    }

    init_tracing(&config.logging, cli.debug);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.runtime.worker_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(cli, config))
}

async fn async_main(cli: Cli, config: Config) -> Result<()> {
    info!(
        config_path = %cli.config.display(),
        worker_threads = config.runtime.worker_threads,
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "torrent-finder starting"
    );

    match cli.command {
        Command::Search(args) => run_search(config, &args.title, cli.debug).await,
        Command::Status { active } => run_status(config, active).await,
        Command::Bot(args) => run_bot_command(config, args, cli.debug).await,
    }
}

async fn run_search(config: Config, title: &str, debug: bool) -> Result<()> {
    let start = config.transmission.start;
    let state = build_state(config)?;
    let finder = TorrentFinder::new(Arc::clone(&state.indexer), Arc::clone(&state.daemon));

    match finder.find_and_submit(title, start, None, debug).await {
        Ok(candidate) => {
            info!(title = candidate.display_title(), start, "Done");
            Ok(())
        }
        Err(FindError::NoCandidates(query)) => {
            error!(
                query = %query,
                "Torznab returned no matching items. Check URL/key, indexers, or try a broader query."
            );
            bail!("No candidates found from Torznab for '{query}'")
        }
        Err(e) => Err(e).context("Failed to send torrent to Transmission"),
    }
}

async fn run_status(config: Config, active_only: bool) -> Result<()> {
    let state = build_state(config)?;
    let statuses = state
        .daemon
        .list_status(active_only)
        .await
        .context("Failed to query Transmission")?;

    println!("{}", MessageFactory::new().status_message(&statuses, active_only));
    Ok(())
}

async fn run_bot_command(config: Config, args: BotArgs, debug: bool) -> Result<()> {
    let mut telegram = config.telegram_or_default();
    if let Some(chat_id) = args.chat_id {
        telegram.chat_id = Some(chat_id);
    }
    if let Some(max_results) = args.max_results {
        telegram.max_results = max_results.max(1);
    }

    let Some(token) = resolve_bot_token(args.token.as_deref(), &telegram, env::var(TOKEN_ENV_VAR).ok())
    else {
        bail!("Telegram bot token missing: pass --token, set telegram.bot_token or export {TOKEN_ENV_VAR}");
    };

    let transport = TelegramClient::new(&token).context("Failed to create Telegram client")?;
    let settings = controller_settings(&config, &telegram, debug);
    let state = build_state(config)?;

    run_bot(state, Arc::new(transport), telegram, settings).await
}
