use crate::batching::{BatcherHandle, PeriodicBatcher};
use crate::config::{load_config, Config, ConfigError};
use crate::event::{LogEvent, LogLevel};
use chrono::Local;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct RelayArgs {
    /// Level given to every relayed line
    pub level: LogLevel,
    pub application_name: Option<String>,
}

pub async fn run(config_path: Option<PathBuf>, args: RelayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/telegram-sink/config.yml");
            eprintln!("  /etc/telegram-sink/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'telegram-sink config init' to generate one.");
            std::process::exit(1);
        }
    };

    relay(&config_path, args).await.map_err(|e| e.into())
}

async fn relay(config_path: &Path, args: RelayArgs) -> Result<(), RelayError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    let application_name = resolve_application_name(&config, args.application_name);
    let options = config
        .sink_options_builder()
        .application_name(application_name)
        .build()?;

    info!(
        chat_id = %options.chat_id(),
        batch_size_limit = options.batch_size_limit(),
        period = ?options.period(),
        "Relaying stdin to Telegram"
    );

    let batcher = PeriodicBatcher::from_options(options)?;
    let handle = batcher.handle();
    let stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = relay_lines(stdin, &handle, args.level) => {
            let relayed = result?;
            info!(relayed = relayed, "End of input");
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    batcher.shutdown().await?;

    if handle.dropped() > 0 {
        warn!(dropped = handle.dropped(), "Some lines were dropped");
    }
    info!("Relay shutdown complete");
    Ok(())
}

/// Flag, then config file, then the host name.
fn resolve_application_name(config: &Config, flag: Option<String>) -> String {
    flag.or_else(|| config.format.application_name.clone())
        .or_else(|| {
            hostname::get()
                .ok()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_default()
}

/// Queue every non-empty line as one event. Returns the number of lines queued.
pub async fn relay_lines<R>(reader: R, handle: &BatcherHandle, level: LogLevel) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut relayed = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        if handle.emit(line_event(&line, level)) {
            relayed += 1;
        }
    }

    Ok(relayed)
}

/// Braces are doubled so the line is taken literally, not as a template.
fn line_event(line: &str, level: LogLevel) -> LogEvent {
    let template = line.replace('{', "{{").replace('}', "}}");
    LogEvent::new(Local::now().fixed_offset(), level, &template)
}
