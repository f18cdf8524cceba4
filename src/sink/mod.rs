pub mod aggregate;
pub mod client;
pub mod dispatch;
pub mod options;
pub mod telegram;

pub use aggregate::{aggregate, DeduplicatedUnit};
pub use client::{SendError, SendMessageRequest, TelegramClient, Transport};
pub use dispatch::BatchDispatcher;
pub use options::{ParseMode, SinkOptions, SinkOptionsBuilder};
pub use telegram::{TelegramSink, APPLICATION_NAME_PROPERTY};
