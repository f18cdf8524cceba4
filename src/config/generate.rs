pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# TELEGRAM SINK CONFIGURATION
# =============================================================================
# Forwards log events to a Telegram chat through the bot API.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/telegram-sink/config.yml
#   3. /etc/telegram-sink/config.yml
#
# Any value may reference an environment variable as $env{...}. Variables are
# expanded before parsing, and an unset variable fails the load.

# =============================================================================
# TELEGRAM
# =============================================================================

telegram:
  # Token issued by @BotFather (required)
  bot_token: "123456:replace-with-your-token"

  # Destination chat. Channels and supergroups use a -100 prefix.
  chat_id: "-1001234567890"

  # Forum topic to post into (optional)
  # topic_id: 42

  # Alternative bot API base url, e.g. a local bot API server (optional)
  # api_url: https://api.telegram.org/bot

  # Markup of outgoing messages: 'html' or 'markdown'
  parse_mode: html

# =============================================================================
# BATCHING
# =============================================================================

batching:
  # Events per batch. 1 sends every event as soon as it arrives.
  batch_size_limit: 1

  # Flush interval for partially filled batches
  period: 1s

  # Maximum events waiting to be sent; further events are dropped
  queue_limit: 100000

  # true: one message per distinct event; false: one merged message per batch
  send_as_single_messages: true

  # verbose, debug, information, warning, error or fatal
  minimum_level: verbose

# =============================================================================
# FORMAT
# =============================================================================

format:
  # Append the exception trace to messages that carry one
  include_stack_trace: true

  # strftime format of the occurrence timestamps
  date_format: "%d.%m.%Y %H:%M:%S%:z"

  # Shown in the occurrence line and available as {ApplicationName}
  # application_name: my-service

  # Replaces the built-in layout. Tokens: {Level}, {Level:e}, {Level:u},
  # {Timestamp:<strftime>}, {Message}, {Exception}, {NewLine}, {AnyProperty}
  # output_template: "{Level:e} {Message}{NewLine}{Exception}"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_starter_config_loads() {
        let config = parse_config(&generate_starter_config()).unwrap();

        assert_eq!(config.telegram.chat_id, "-1001234567890");
        assert_eq!(config.batching.batch_size_limit, 1);
        assert!(config.sink_options_builder().build().is_ok());
    }
}
