use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use modbot::application::bot::{BotHandle, ControlRequest};
use modbot::application::errors::{BotError, CommandError};
use modbot::application::messaging::MessageParser;
use modbot::application::services::PluginHost;
use modbot::domain::entities::{Client, Event, EventType};
use modbot::domain::traits::Connection;
use modbot::infrastructure::adapters::ConsoleConnection;
use modbot::infrastructure::config::Config;
use modbot::infrastructure::plugins::LibraryLoader;
use modbot::plugins::{PluginSource, SourceChain, StaticCatalog};

#[derive(Parser)]
#[command(name = "modbot")]
#[command(about = "A chat bot host driven by plugins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// List the plugin modules that can be configured
    Plugins,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config),
        Commands::Version => {
            println!("modbot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
        Commands::Plugins => list_plugins(&cli.config),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: &str) -> Result<Config, BotError> {
    let mut config = if Path::new(path).exists() {
        Config::load(path)?
    } else {
        tracing::warn!("Config file {} not found, using defaults", path);
        Config::example()
    };
    config.apply_env()?;
    Ok(config)
}

/// Built-in plugins first, then shared libraries from the plugin directory
fn plugin_source(config: &Config) -> Result<SourceChain, BotError> {
    let settings = config.bot_settings()?;
    Ok(SourceChain::new()
        .with_source(StaticCatalog::builtin())
        .with_source(LibraryLoader::new(settings.plugin_dir)))
}

fn run_bot(config_path: &str) -> Result<(), BotError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(serve(config_path))
}

async fn serve(config_path: &str) -> Result<(), BotError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let mut config = load_config(config_path)?;
        let settings = config.bot_settings()?;
        let source = plugin_source(&config)?;

        let connection = Arc::new(ConsoleConnection::new(&settings));
        let bot = BotHandle::new(connection.clone());
        let host = PluginHost::start(&source, bot, &mut config)?;

        let leftover = config.section_names();
        if !leftover.is_empty() {
            tracing::debug!("Sections not used by any plugin: {:?}", leftover);
        }

        tracing::info!("Starting {}: plugins {:?}", settings.name, host.plugins().aliases());

        let operator = connection.operator().clone();
        host.dispatch_event(
            &Event::new(EventType::ClientEntered)
                .with("clid", operator.id.clone())
                .with("client_nickname", operator.display_name()),
        );

        let parser = MessageParser::new(settings.prefix.clone());
        let request = run_console(&host, &parser, &operator, &mut lines).await?;

        let report = host.shutdown();
        if !report.is_clean() {
            tracing::warn!("{} exit hook(s) failed", report.failures.len());
        }
        connection.quit()?;

        match request {
            ControlRequest::Stop => {
                tracing::info!("Bot stopped");
                return Ok(());
            }
            ControlRequest::Restart => {
                tracing::info!("Restarting, reloading configuration from {}", config_path);
            }
        }
    }
}

/// Feed console lines to the host until a plugin or the operator asks to stop
async fn run_console<R>(
    host: &PluginHost,
    parser: &MessageParser,
    operator: &Client,
    lines: &mut Lines<R>,
) -> Result<ControlRequest, BotError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        if let Some(request) = host.bot().take_request() {
            return Ok(request);
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("Console input closed");
                    return Ok(ControlRequest::Stop);
                };
                let message = parser.parse(operator.id.clone(), line, Some(operator.clone()));
                match host.receive(&message) {
                    Ok(_) => {}
                    Err(CommandError::NotFound(name)) => {
                        println!("Unknown command: {}{}", parser.prefix(), name);
                    }
                    Err(e) => tracing::warn!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                return Ok(ControlRequest::Stop);
            }
        }
    }
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::example().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}

fn list_plugins(config_path: &str) -> Result<(), BotError> {
    let config = load_config(config_path)?;
    let source = plugin_source(&config)?;
    for module in source.available() {
        println!("{}", module);
    }
    Ok(())
}
