use crate::batching::BatcherHandle;
use crate::event::{ExceptionInfo, LogEvent, LogLevel, PropertyValue};
use chrono::Local;
use std::collections::BTreeMap;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Targets never forwarded: the sink's own diagnostics and the HTTP stack
/// it sends through.
const INTERNAL_TARGETS: &[&str] = &["telegram_sink", "reqwest", "hyper", "h2", "rustls"];

pub const SOURCE_CONTEXT_PROPERTY: &str = "SourceContext";

/// Forwards `tracing` events to a [`PeriodicBatcher`](crate::batching::PeriodicBatcher).
///
/// The `message` field becomes the message template; other fields become
/// properties. Errors recorded with `record_error`, or fields named `error`
/// or `exception`, become the event's exception.
pub struct TelegramLayer {
    handle: BatcherHandle,
}

impl TelegramLayer {
    pub fn new(handle: BatcherHandle) -> Self {
        Self { handle }
    }
}

impl<S: Subscriber> Layer<S> for TelegramLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal(metadata.target()) {
            return;
        }

        let level = LogLevel::from(*metadata.level());
        if level < self.handle.minimum_level() {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut log_event = LogEvent::new(Local::now().fixed_offset(), level, &visitor.message);
        log_event.properties = visitor.properties;
        log_event.exception = visitor.exception;
        log_event.add_property_if_absent(
            SOURCE_CONTEXT_PROPERTY,
            PropertyValue::Str(metadata.target().to_string()),
        );

        self.handle.emit(log_event);
    }
}

fn is_internal(target: &str) -> bool {
    INTERNAL_TARGETS.iter().any(|prefix| {
        target
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    properties: BTreeMap<String, PropertyValue>,
    exception: Option<ExceptionInfo>,
}

impl EventVisitor {
    fn is_exception_field(field: &Field) -> bool {
        matches!(field.name(), "error" | "exception")
    }

    fn insert(&mut self, field: &Field, value: PropertyValue) {
        self.properties.insert(field.name().to_string(), value);
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else if Self::is_exception_field(field) && self.exception.is_none() {
            self.exception = Some(ExceptionInfo::new("Error", value));
        } else {
            self.insert(field, PropertyValue::Str(value.to_string()));
        }
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.exception = Some(ExceptionInfo::from_error(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, PropertyValue::Int(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, PropertyValue::UInt(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, PropertyValue::Float(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, PropertyValue::Bool(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{:?}", value);
        if field.name() == "message" {
            self.message = text;
        } else if Self::is_exception_field(field) && self.exception.is_none() {
            self.exception = Some(ExceptionInfo::new("Error", text));
        } else {
            self.insert(field, PropertyValue::Str(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_targets() {
        assert!(is_internal("telegram_sink"));
        assert!(is_internal("telegram_sink::selflog"));
        assert!(is_internal("hyper::proto::h1"));
        assert!(!is_internal("hyperion"));
        assert!(!is_internal("my_app::reqwest_wrapper"));
    }
}
