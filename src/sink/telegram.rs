use crate::config::ConfigError;
use crate::event::{LogEvent, PropertyValue};
use crate::sink::aggregate::aggregate;
use crate::sink::client::{TelegramClient, Transport};
use crate::sink::dispatch::BatchDispatcher;
use crate::sink::options::SinkOptions;
use crate::SELFLOG_TARGET;
use tracing::debug;

pub const APPLICATION_NAME_PROPERTY: &str = "ApplicationName";

/// Batch entry point: tag, deduplicate, render and send.
///
/// The HTTP client is created with the sink and released when it is dropped.
pub struct TelegramSink<T: Transport = TelegramClient> {
    options: SinkOptions,
    dispatcher: BatchDispatcher<T>,
}

impl TelegramSink<TelegramClient> {
    pub fn new(options: SinkOptions) -> Result<Self, ConfigError> {
        let client = TelegramClient::new(&options)?;
        Ok(Self::with_transport(options, client))
    }
}

impl<T: Transport> TelegramSink<T> {
    pub fn with_transport(options: SinkOptions, transport: T) -> Self {
        Self {
            dispatcher: BatchDispatcher::new(transport, options.clone()),
            options,
        }
    }

    pub fn options(&self) -> &SinkOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    /// Process one batch. Never fails; send and render failures go to the
    /// diagnostics target and the failure callback.
    pub async fn emit_batch(&self, events: Vec<LogEvent>) {
        let received = events.len();
        let application_name = PropertyValue::Str(self.options.application_name().to_string());

        let events = events.into_iter().map(|mut event| {
            event.add_property_if_absent(APPLICATION_NAME_PROPERTY, application_name.clone());
            event
        });

        let units = aggregate(
            events,
            self.options.minimum_level(),
            self.options.include_stack_trace(),
        );

        debug!(
            target: SELFLOG_TARGET,
            received = received,
            units = units.len(),
            "Emitting batch"
        );

        self.dispatcher.dispatch(&units).await;
    }

    /// Called by the batcher on a period tick with nothing queued.
    pub async fn on_empty_batch(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LogLevel;
    use crate::sink::client::{SendError, SendMessageRequest};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn post(&self, request: &SendMessageRequest) -> Result<u16, SendError> {
            self.sent.lock().unwrap().push(request.text.clone());
            Ok(200)
        }
    }

    fn event(level: LogLevel, template: &str) -> LogEvent {
        let ts = Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap().fixed_offset();
        LogEvent::new(ts, level, template)
    }

    #[tokio::test]
    async fn test_application_name_property_added() {
        let options = SinkOptions::builder("t", "c")
            .application_name("billing")
            .output_template("[{ApplicationName:l}] {Message}")
            .build()
            .unwrap();
        let sink = TelegramSink::with_transport(options, Recorder::default());

        sink.emit_batch(vec![
            event(LogLevel::Information, "started"),
            event(LogLevel::Information, "own").with_property(APPLICATION_NAME_PROPERTY, "other"),
        ])
        .await;

        let sent = sink.transport().sent.lock().unwrap();
        assert_eq!(*sent, vec!["[billing] started", "[other] own"]);
    }

    #[tokio::test]
    async fn test_batch_below_minimum_level_sends_nothing() {
        let options = SinkOptions::builder("t", "c")
            .minimum_level(LogLevel::Error)
            .send_batches_as_single_messages(false)
            .build()
            .unwrap();
        let sink = TelegramSink::with_transport(options, Recorder::default());

        sink.emit_batch(vec![
            event(LogLevel::Debug, "noise"),
            event(LogLevel::Warning, "almost"),
        ])
        .await;

        assert!(sink.transport().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let options = SinkOptions::builder("t", "c").build().unwrap();
        let sink = TelegramSink::with_transport(options, Recorder::default());

        sink.on_empty_batch().await;
        sink.emit_batch(Vec::new()).await;

        assert!(sink.transport().sent.lock().unwrap().is_empty());
    }
}
