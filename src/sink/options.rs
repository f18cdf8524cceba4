use crate::config::ConfigError;
use crate::event::{FormatProvider, LogLevel};
use crate::sink::client::SendError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BOT_API_URL: &str = "https://api.telegram.org/bot";
/// strftime equivalent of `dd.MM.yyyy HH:mm:sszzz`
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S%:z";
pub const DEFAULT_BATCH_SIZE_LIMIT: usize = 1;
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);
pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_QUEUE_LIMIT: usize = 100_000;
/// Timeout applied to every single send, independent of the batch period
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Markup dialect of outgoing messages. Selects both the `parse_mode` sent
/// to the API and the markup the built-in renderer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Html,
    Markdown,
}

impl ParseMode {
    pub fn as_wire(&self) -> &'static str {
        match self {
            ParseMode::Html => "HTML",
            ParseMode::Markdown => "markdown",
        }
    }
}

pub type HtmlFormatter = Arc<dyn Fn(&str) -> String + Send + Sync>;
pub type FailureCallback = Arc<dyn Fn(&SendError) + Send + Sync>;

/// Validated sink configuration. Built with [`SinkOptions::builder`].
#[derive(Clone)]
pub struct SinkOptions {
    bot_token: String,
    chat_id: String,
    topic_id: Option<i64>,
    batch_size_limit: usize,
    period: Duration,
    queue_limit: usize,
    minimum_level: LogLevel,
    send_batches_as_single_messages: bool,
    include_stack_trace: bool,
    date_format: String,
    application_name: String,
    use_custom_html_formatting: bool,
    custom_html_formatter: Option<HtmlFormatter>,
    bot_api_url: String,
    output_template: Option<String>,
    parse_mode: ParseMode,
    format_provider: Option<Arc<dyn FormatProvider>>,
    failure_callback: Option<FailureCallback>,
}

impl SinkOptions {
    pub fn builder(bot_token: impl Into<String>, chat_id: impl Into<String>) -> SinkOptionsBuilder {
        SinkOptionsBuilder::new(bot_token.into(), chat_id.into())
    }

    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn topic_id(&self) -> Option<i64> {
        self.topic_id
    }

    pub fn batch_size_limit(&self) -> usize {
        self.batch_size_limit
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn queue_limit(&self) -> usize {
        self.queue_limit
    }

    pub fn minimum_level(&self) -> LogLevel {
        self.minimum_level
    }

    pub fn send_batches_as_single_messages(&self) -> bool {
        self.send_batches_as_single_messages
    }

    pub fn include_stack_trace(&self) -> bool {
        self.include_stack_trace
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn use_custom_html_formatting(&self) -> bool {
        self.use_custom_html_formatting
    }

    /// Whether the built-in HTML escaping applies to message text
    pub fn escape_enabled(&self) -> bool {
        !self.use_custom_html_formatting
    }

    pub fn custom_html_formatter(&self) -> Option<&HtmlFormatter> {
        self.custom_html_formatter.as_ref()
    }

    pub fn bot_api_url(&self) -> &str {
        &self.bot_api_url
    }

    pub fn output_template(&self) -> Option<&str> {
        self.output_template.as_deref()
    }

    pub fn parse_mode(&self) -> ParseMode {
        self.parse_mode
    }

    pub fn format_provider(&self) -> Option<&Arc<dyn FormatProvider>> {
        self.format_provider.as_ref()
    }

    pub fn failure_callback(&self) -> Option<&FailureCallback> {
        self.failure_callback.as_ref()
    }

    /// `{bot_api_url}{bot_token}/sendMessage`
    pub fn send_message_url(&self) -> String {
        format!("{}{}/sendMessage", self.bot_api_url, self.bot_token)
    }
}

impl fmt::Debug for SinkOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkOptions")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("topic_id", &self.topic_id)
            .field("batch_size_limit", &self.batch_size_limit)
            .field("period", &self.period)
            .field("queue_limit", &self.queue_limit)
            .field("minimum_level", &self.minimum_level)
            .field("send_batches_as_single_messages", &self.send_batches_as_single_messages)
            .field("include_stack_trace", &self.include_stack_trace)
            .field("date_format", &self.date_format)
            .field("application_name", &self.application_name)
            .field("use_custom_html_formatting", &self.use_custom_html_formatting)
            .field("custom_html_formatter", &self.custom_html_formatter.is_some())
            .field("bot_api_url", &self.bot_api_url)
            .field("output_template", &self.output_template)
            .field("parse_mode", &self.parse_mode)
            .field("format_provider", &self.format_provider.is_some())
            .field("failure_callback", &self.failure_callback.is_some())
            .finish()
    }
}

/// Builder for [`SinkOptions`]; every field but the token and chat id has a default.
pub struct SinkOptionsBuilder {
    options: SinkOptions,
}

impl SinkOptionsBuilder {
    fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            options: SinkOptions {
                bot_token,
                chat_id,
                topic_id: None,
                batch_size_limit: DEFAULT_BATCH_SIZE_LIMIT,
                period: DEFAULT_PERIOD,
                queue_limit: DEFAULT_QUEUE_LIMIT,
                minimum_level: LogLevel::Verbose,
                send_batches_as_single_messages: true,
                include_stack_trace: true,
                date_format: DEFAULT_DATE_FORMAT.to_string(),
                application_name: String::new(),
                use_custom_html_formatting: false,
                custom_html_formatter: None,
                bot_api_url: DEFAULT_BOT_API_URL.to_string(),
                output_template: None,
                parse_mode: ParseMode::Html,
                format_provider: None,
                failure_callback: None,
            },
        }
    }

    pub fn topic_id(mut self, topic_id: i64) -> Self {
        self.options.topic_id = Some(topic_id);
        self
    }

    pub fn batch_size_limit(mut self, limit: usize) -> Self {
        self.options.batch_size_limit = limit;
        self
    }

    pub fn period(mut self, period: Duration) -> Self {
        self.options.period = period;
        self
    }

    pub fn queue_limit(mut self, limit: usize) -> Self {
        self.options.queue_limit = limit;
        self
    }

    pub fn minimum_level(mut self, level: LogLevel) -> Self {
        self.options.minimum_level = level;
        self
    }

    pub fn send_batches_as_single_messages(mut self, single: bool) -> Self {
        self.options.send_batches_as_single_messages = single;
        self
    }

    pub fn include_stack_trace(mut self, include: bool) -> Self {
        self.options.include_stack_trace = include;
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.options.date_format = format.into();
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.options.application_name = name.into();
        self
    }

    pub fn use_custom_html_formatting(mut self, enabled: bool) -> Self {
        self.options.use_custom_html_formatting = enabled;
        self
    }

    /// Custom escaping function. Ignored unless custom HTML formatting is enabled.
    pub fn custom_html_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.options.custom_html_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn bot_api_url(mut self, url: impl Into<String>) -> Self {
        self.options.bot_api_url = url.into();
        self
    }

    pub fn output_template(mut self, template: impl Into<String>) -> Self {
        self.options.output_template = Some(template.into());
        self
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.options.parse_mode = mode;
        self
    }

    pub fn format_provider(mut self, provider: Arc<dyn FormatProvider>) -> Self {
        self.options.format_provider = Some(provider);
        self
    }

    pub fn failure_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SendError) + Send + Sync + 'static,
    {
        self.options.failure_callback = Some(Arc::new(callback));
        self
    }

    /// Validate and produce the options.
    pub fn build(self) -> Result<SinkOptions, ConfigError> {
        let mut options = self.options;

        if options.bot_token.trim().is_empty() {
            return Err(ConfigError::EmptyBotToken);
        }

        if options.batch_size_limit == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }

        if options.period.is_zero() || options.period > MAX_PERIOD {
            return Err(ConfigError::InvalidPeriod);
        }

        if options.queue_limit == 0 {
            return Err(ConfigError::Validation(
                "queue_limit must be at least 1".to_string(),
            ));
        }

        if options.bot_api_url.trim().is_empty() {
            options.bot_api_url = DEFAULT_BOT_API_URL.to_string();
        }

        Url::parse(&options.send_message_url()).map_err(|e| ConfigError::InvalidApiUrl {
            url: options.bot_api_url.clone(),
            message: e.to_string(),
        })?;

        if options
            .output_template
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            options.output_template = None;
        }

        if !options.use_custom_html_formatting {
            options.custom_html_formatter = None;
        }

        Ok(options)
    }
}
