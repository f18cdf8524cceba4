use crate::render::MessageFormatter;
use crate::sink::aggregate::DeduplicatedUnit;
use crate::sink::client::{SendError, SendMessageRequest, Transport};
use crate::sink::options::SinkOptions;
use crate::SELFLOG_TARGET;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Renders units and posts them, one message per unit or one merged block.
///
/// Sends are sequential. A failed send is logged and reported to the
/// failure callback; it never stops the rest of the batch.
pub struct BatchDispatcher<T: Transport> {
    transport: T,
    formatter: MessageFormatter,
    options: SinkOptions,
}

impl<T: Transport> BatchDispatcher<T> {
    pub fn new(transport: T, options: SinkOptions) -> Self {
        Self {
            formatter: MessageFormatter::from_options(&options),
            transport,
            options,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn dispatch(&self, units: &[DeduplicatedUnit]) {
        if units.is_empty() {
            return;
        }

        if self.options.send_batches_as_single_messages() {
            for unit in units {
                if let Some(message) = self.render(unit) {
                    self.send(message).await;
                }
            }
        } else {
            let mut block = String::new();
            for unit in units {
                if let Some(message) = self.render(unit) {
                    block.push_str(&message);
                    block.push('\n');
                }
            }
            if block.is_empty() {
                return;
            }
            self.send(block).await;
        }
    }

    /// Format a unit, turning a panic in user-supplied formatting code into
    /// a reported failure.
    fn render(&self, unit: &DeduplicatedUnit) -> Option<String> {
        match catch_unwind(AssertUnwindSafe(|| self.formatter.format(unit))) {
            Ok(message) => Some(message),
            Err(payload) => {
                let error = SendError::Render(panic_message(payload.as_ref()));
                warn!(target: SELFLOG_TARGET, error = %error, "Failed to render message");
                self.report_failure(&error);
                None
            }
        }
    }

    async fn send(&self, text: String) {
        let chat_id = self.options.chat_id();
        debug!(target: SELFLOG_TARGET, chat_id = %chat_id, message = %text, "Trying to send message");

        let request = SendMessageRequest::new(&self.options, text);
        match self.transport.post(&request).await {
            Ok(status) => {
                debug!(target: SELFLOG_TARGET, chat_id = %chat_id, status = status, "Message sent");
            }
            Err(e) => {
                warn!(target: SELFLOG_TARGET, chat_id = %chat_id, error = %e, "Failed to send message");
                self.report_failure(&e);
            }
        }
    }

    fn report_failure(&self, error: &SendError) {
        let Some(callback) = self.options.failure_callback() else {
            return;
        };

        if catch_unwind(AssertUnwindSafe(|| callback(error))).is_err() {
            warn!(target: SELFLOG_TARGET, "Failure callback panicked");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "formatter panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{LogEvent, LogLevel};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<SendMessageRequest>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn post(&self, request: &SendMessageRequest) -> Result<u16, SendError> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(200)
        }
    }

    fn units(messages: &[&str]) -> Vec<DeduplicatedUnit> {
        let ts = Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap().fixed_offset();
        messages
            .iter()
            .map(|m| DeduplicatedUnit::new(LogEvent::new(ts, LogLevel::Information, m), true))
            .collect()
    }

    fn options(single: bool) -> SinkOptions {
        SinkOptions::builder("t", "-1")
            .send_batches_as_single_messages(single)
            .output_template("{Message}")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_single_messages_in_order() {
        let dispatcher = BatchDispatcher::new(Recorder::default(), options(true));
        dispatcher.dispatch(&units(&["a", "b", "c"])).await;

        let sent = dispatcher.transport().sent.lock().unwrap();
        let texts: Vec<&str> = sent.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_block_mode_sends_one_message() {
        let dispatcher = BatchDispatcher::new(Recorder::default(), options(false));
        dispatcher.dispatch(&units(&["a", "b", "c"])).await;

        let sent = dispatcher.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "a\nb\nc\n");
    }

    #[tokio::test]
    async fn test_empty_batch_sends_nothing() {
        let dispatcher = BatchDispatcher::new(Recorder::default(), options(false));
        dispatcher.dispatch(&[]).await;

        assert!(dispatcher.transport().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_formatter_is_isolated() {
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);

        let options = SinkOptions::builder("t", "-1")
            .use_custom_html_formatting(true)
            .custom_html_formatter(|s: &str| {
                if s.contains("boom") {
                    panic!("bad formatter");
                }
                s.to_string()
            })
            .output_template("{Message}")
            .failure_callback(move |e| {
                assert!(matches!(e, SendError::Render(msg) if msg == "bad formatter"));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        let dispatcher = BatchDispatcher::new(Recorder::default(), options);
        dispatcher.dispatch(&units(&["ok", "boom", "fine"])).await;

        let sent = dispatcher.transport().sent.lock().unwrap();
        let texts: Vec<&str> = sent.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["ok", "fine"]);
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_block_with_nothing_rendered_is_not_sent() {
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);

        let options = SinkOptions::builder("t", "-1")
            .send_batches_as_single_messages(false)
            .use_custom_html_formatting(true)
            .custom_html_formatter(|_: &str| -> String { panic!("always broken") })
            .output_template("{Message}")
            .failure_callback(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        let dispatcher = BatchDispatcher::new(Recorder::default(), options);
        dispatcher.dispatch(&units(&["a", "b"])).await;

        assert!(dispatcher.transport().sent.lock().unwrap().is_empty());
        assert_eq!(failures.load(Ordering::SeqCst), 2);
    }
}
