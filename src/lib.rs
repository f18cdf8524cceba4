pub mod batching;
pub mod cli;
pub mod config;
pub mod event;
pub mod layer;
pub mod render;
pub mod sink;

/// `tracing` target of the sink's own diagnostics.
pub const SELFLOG_TARGET: &str = "telegram_sink::selflog";

pub use batching::{BatcherHandle, PeriodicBatcher};
pub use event::{ExceptionInfo, LogEvent, LogLevel, PropertyValue};
pub use layer::TelegramLayer;
pub use sink::{SendError, SinkOptions, TelegramSink};
