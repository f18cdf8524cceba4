use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use telegram_sink::sink::{SendError, SendMessageRequest, SinkOptions, TelegramSink, Transport};
use telegram_sink::{LogLevel, PeriodicBatcher, TelegramLayer};
use tracing_subscriber::layer::SubscriberExt;

#[derive(Clone, Default)]
struct Recorder {
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transport for Recorder {
    async fn post(&self, request: &SendMessageRequest) -> Result<u16, SendError> {
        self.sent.lock().unwrap().push(request.text.clone());
        Ok(200)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("upstream refused")]
struct Refused;

fn batcher(template: &str, recorder: &Recorder) -> PeriodicBatcher<Recorder> {
    let options = SinkOptions::builder("t", "c")
        .minimum_level(LogLevel::Information)
        .output_template(template)
        .build()
        .unwrap();
    PeriodicBatcher::spawn(TelegramSink::with_transport(options, recorder.clone()))
}

#[tokio::test]
async fn test_events_at_or_above_minimum_level_are_forwarded() {
    let recorder = Recorder::default();
    let batcher = batcher("{Level}|{Message}|{order_id}|{SourceContext:l}", &recorder);

    let subscriber = tracing_subscriber::registry().with(TelegramLayer::new(batcher.handle()));
    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!("below minimum");
        tracing::info!(order_id = 42, "Order placed");
        tracing::warn!(target: "telegram_sink::selflog", "internal diagnostics");
        tracing::warn!(target: "hyper::client", "http stack noise");
    });

    batcher.shutdown().await.unwrap();
    assert_eq!(
        *recorder.sent.lock().unwrap(),
        vec!["Information|Order placed|42|layer_tests"]
    );
}

#[tokio::test]
async fn test_recorded_error_becomes_exception() {
    let recorder = Recorder::default();
    let batcher = batcher("{Message}{Exception}", &recorder);

    let subscriber = tracing_subscriber::registry().with(TelegramLayer::new(batcher.handle()));
    tracing::subscriber::with_default(subscriber, || {
        let err = Refused;
        tracing::error!(error = &err as &(dyn std::error::Error + 'static), "Call failed");
    });

    batcher.shutdown().await.unwrap();
    let sent = recorder.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("Call failed\n<strong>upstream refused</strong>"));
    assert!(sent[0].contains("Type: <code>Refused</code>"));
}

#[tokio::test]
async fn test_display_error_field_becomes_exception() {
    let recorder = Recorder::default();
    let batcher = batcher("{Exception}", &recorder);

    let subscriber = tracing_subscriber::registry().with(TelegramLayer::new(batcher.handle()));
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!(error = %"disk full", "Write failed");
    });

    batcher.shutdown().await.unwrap();
    let sent = recorder.sent.lock().unwrap();
    assert!(sent[0].contains("Message: <code>disk full</code>"));
    assert!(sent[0].contains("Type: <code>Error</code>"));
}
