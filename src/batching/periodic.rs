use crate::config::ConfigError;
use crate::event::{LogEvent, LogLevel};
use crate::sink::client::{TelegramClient, Transport};
use crate::sink::options::SinkOptions;
use crate::sink::telegram::TelegramSink;
use crate::SELFLOG_TARGET;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

const FAR_FUTURE_SECS: u64 = 86400 * 365 * 30;

/// Cheap, cloneable entry point for producers.
#[derive(Clone)]
pub struct BatcherHandle {
    tx: mpsc::Sender<LogEvent>,
    dropped: Arc<AtomicU64>,
    minimum_level: LogLevel,
}

impl BatcherHandle {
    /// Queue an event without waiting. Returns false when the queue is full
    /// or the batcher has shut down; the event is then dropped and counted.
    pub fn emit(&self, event: LogEvent) -> bool {
        if self.tx.try_send(event).is_ok() {
            return true;
        }

        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        if dropped == 1 || dropped % 1000 == 0 {
            warn!(target: SELFLOG_TARGET, dropped = dropped, "Event queue unavailable, dropping events");
        }
        false
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn minimum_level(&self) -> LogLevel {
        self.minimum_level
    }
}

/// Owns the batching task of one sink.
///
/// Events are flushed when `batch_size_limit` of them are queued or when the
/// period elapses, whichever comes first. Batches never overlap.
pub struct PeriodicBatcher<T: Transport + 'static = TelegramClient> {
    handle: BatcherHandle,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<TelegramSink<T>>,
}

impl PeriodicBatcher<TelegramClient> {
    pub fn from_options(options: SinkOptions) -> Result<Self, ConfigError> {
        Ok(Self::spawn(TelegramSink::new(options)?))
    }
}

impl<T: Transport + 'static> PeriodicBatcher<T> {
    /// Start the batching task on the current tokio runtime.
    pub fn spawn(sink: TelegramSink<T>) -> Self {
        let options = sink.options();
        let (tx, rx) = mpsc::channel(options.queue_limit());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = BatcherHandle {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            minimum_level: options.minimum_level(),
        };

        let task = tokio::spawn(run_batcher(sink, rx, shutdown_rx));

        Self {
            handle,
            shutdown_tx,
            task,
        }
    }

    pub fn handle(&self) -> BatcherHandle {
        self.handle.clone()
    }

    pub fn emit(&self, event: LogEvent) -> bool {
        self.handle.emit(event)
    }

    /// Stop accepting events, flush what is queued and wait for the task.
    /// Hands the sink back; dropping it releases the HTTP client.
    pub async fn shutdown(self) -> Result<TelegramSink<T>, JoinError> {
        let _ = self.shutdown_tx.send(true);
        self.task.await
    }
}

async fn run_batcher<T: Transport>(
    sink: TelegramSink<T>,
    mut rx: mpsc::Receiver<LogEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> TelegramSink<T> {
    let batch_size_limit = sink.options().batch_size_limit();
    let period = sink.options().period();

    let mut buffer: Vec<LogEvent> = Vec::with_capacity(batch_size_limit);
    let mut ticker = tokio::time::interval_at(first_tick(period), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(
        target: SELFLOG_TARGET,
        batch_size_limit = batch_size_limit,
        period = ?period,
        "Batcher started"
    );

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Some(event) => {
                        buffer.push(event);
                        if buffer.len() >= batch_size_limit {
                            sink.emit_batch(std::mem::take(&mut buffer)).await;
                        }
                    }
                    None => break,
                }
            }

            _ = ticker.tick() => {
                if buffer.is_empty() {
                    sink.on_empty_batch().await;
                } else {
                    sink.emit_batch(std::mem::take(&mut buffer)).await;
                }
            }

            _ = shutdown_rx.changed() => break,
        }
    }

    rx.close();
    while let Ok(event) = rx.try_recv() {
        buffer.push(event);
    }

    flush_remaining(&sink, buffer, batch_size_limit).await;

    debug!(target: SELFLOG_TARGET, "Batcher shutdown complete");
    sink
}

/// One period from now, or a far-future deadline when that overflows.
fn first_tick(period: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(period)
        .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS))
}

async fn flush_remaining<T: Transport>(
    sink: &TelegramSink<T>,
    mut buffer: Vec<LogEvent>,
    batch_size_limit: usize,
) {
    while !buffer.is_empty() {
        let rest = buffer.split_off(batch_size_limit.min(buffer.len()));
        sink.emit_batch(buffer).await;
        buffer = rest;
    }
}
