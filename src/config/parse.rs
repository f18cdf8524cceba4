use super::types::*;
use crate::sink::options::MAX_PERIOD;
use crate::config::{env_var_pattern, expand_env_vars};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("bot token must not be empty")]
    EmptyBotToken,

    #[error("batch size limit must be at least 1")]
    InvalidBatchSize,

    #[error("batch period must be greater than zero and at most one day")]
    InvalidPeriod,

    #[error("invalid bot API url '{url}': {message}")]
    InvalidApiUrl { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse a config from YAML text, expanding `$env{VAR}` references first.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);

    check_unexpanded_vars(&yaml_string)?;

    let config: Config = serde_yaml::from_str(&yaml_string)?;

    validate_config(&config)?;

    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let mut unexpanded_vars: Vec<String> = env_var_pattern()
        .captures_iter(yaml_string)
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with the actual value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables\n\
             2. Replace the variables in the config file with actual values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.telegram.bot_token.trim().is_empty() {
        errors.push("telegram.bot_token cannot be empty".to_string());
    }

    if config.telegram.chat_id.trim().is_empty() {
        errors.push("telegram.chat_id cannot be empty".to_string());
    }

    if config.batching.batch_size_limit == 0 {
        errors.push("batching.batch_size_limit must be at least 1".to_string());
    }

    if config.batching.period.is_zero() {
        errors.push("batching.period must be greater than zero".to_string());
    } else if config.batching.period > MAX_PERIOD {
        errors.push("batching.period must be at most 1day".to_string());
    }

    if config.batching.queue_limit == 0 {
        errors.push("batching.queue_limit must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}
