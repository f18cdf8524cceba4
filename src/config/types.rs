use crate::event::LogLevel;
use crate::sink::options::{
    ParseMode, SinkOptions, SinkOptionsBuilder, DEFAULT_BATCH_SIZE_LIMIT, DEFAULT_PERIOD,
    DEFAULT_QUEUE_LIMIT,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub batching: BatchingConfig,
    #[serde(default)]
    pub format: FormatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Accepts both `"-100123"` and `-100123` in YAML.
    #[serde(deserialize_with = "string_or_number")]
    pub chat_id: String,
    #[serde(default)]
    pub topic_id: Option<i64>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub parse_mode: ParseMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchingConfig {
    #[serde(default = "default_batch_size_limit")]
    pub batch_size_limit: usize,
    #[serde(default = "default_period", with = "humantime_serde")]
    pub period: Duration,
    #[serde(default = "default_queue_limit")]
    pub queue_limit: usize,
    #[serde(default = "default_true")]
    pub send_as_single_messages: bool,
    #[serde(default)]
    pub minimum_level: LogLevel,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_size_limit: default_batch_size_limit(),
            period: default_period(),
            queue_limit: default_queue_limit(),
            send_as_single_messages: true,
            minimum_level: LogLevel::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    #[serde(default = "default_true")]
    pub include_stack_trace: bool,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub application_name: Option<String>,
    #[serde(default)]
    pub output_template: Option<String>,
    #[serde(default)]
    pub use_custom_html_formatting: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            include_stack_trace: true,
            date_format: None,
            application_name: None,
            output_template: None,
            use_custom_html_formatting: false,
        }
    }
}

fn default_batch_size_limit() -> usize {
    DEFAULT_BATCH_SIZE_LIMIT
}

fn default_period() -> Duration {
    DEFAULT_PERIOD
}

fn default_queue_limit() -> usize {
    DEFAULT_QUEUE_LIMIT
}

fn default_true() -> bool {
    true
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

impl Config {
    /// Seed a [`SinkOptionsBuilder`] from the file. Callbacks, format
    /// providers and custom escaping functions are code-only and are added
    /// by the caller.
    pub fn sink_options_builder(&self) -> SinkOptionsBuilder {
        let mut builder = SinkOptions::builder(&self.telegram.bot_token, &self.telegram.chat_id)
            .parse_mode(self.telegram.parse_mode)
            .batch_size_limit(self.batching.batch_size_limit)
            .period(self.batching.period)
            .queue_limit(self.batching.queue_limit)
            .send_batches_as_single_messages(self.batching.send_as_single_messages)
            .minimum_level(self.batching.minimum_level)
            .include_stack_trace(self.format.include_stack_trace)
            .use_custom_html_formatting(self.format.use_custom_html_formatting);

        if let Some(topic_id) = self.telegram.topic_id {
            builder = builder.topic_id(topic_id);
        }
        if let Some(url) = &self.telegram.api_url {
            builder = builder.bot_api_url(url);
        }
        if let Some(format) = &self.format.date_format {
            builder = builder.date_format(format);
        }
        if let Some(name) = &self.format.application_name {
            builder = builder.application_name(name);
        }
        if let Some(template) = &self.format.output_template {
            builder = builder.output_template(template);
        }

        builder
    }
}
