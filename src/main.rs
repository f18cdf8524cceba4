use clap::{Parser, Subcommand};
use std::path::PathBuf;
use telegram_sink::cli::run::RelayArgs;
use telegram_sink::config::resolve_config_path;
use telegram_sink::LogLevel;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "telegram-sink")]
#[command(about = "Forward log lines to a Telegram chat", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send each line read from stdin as a log event
    Relay {
        /// Level of the relayed events
        #[arg(long, default_value = "information")]
        level: LogLevel,

        /// Defaults to the config value, then the host name
        #[arg(long)]
        application_name: Option<String>,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telegram_sink=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Relay {
            level,
            application_name,
        } => {
            let args = RelayArgs {
                level,
                application_name,
            };
            telegram_sink::cli::run::run(config_path, args).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { stdout } => {
                telegram_sink::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                telegram_sink::cli::config::validate(config_path)?;
            }
        },
    }

    Ok(())
}
