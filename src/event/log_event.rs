use crate::event::level::LogLevel;
use crate::event::template::{MessageTemplate, TemplateToken};
use crate::event::value::{FormatProvider, PropertyValue};
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use std::fmt;

/// Error information carried by a log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub type_name: String,
    pub message: String,
    /// Formatted trace (cause chain, backtrace) without the header line
    pub trace: Option<String>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Capture a Rust error. The type name comes from the leading identifier
    /// of its `Debug` output and the trace lists the `source()` chain.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self::with_type_name(debug_type_name(&format!("{:?}", error)), error)
    }

    /// Capture an error whose concrete type is known. The type name is the
    /// last path segment of `std::any::type_name`, without generics.
    pub fn from_typed_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::with_type_name(short_type_name(std::any::type_name::<E>()), error)
    }

    fn with_type_name(type_name: String, error: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(format!("Caused by: {}", cause));
            source = cause.source();
        }

        Self {
            type_name,
            message: error.to_string(),
            trace: if causes.is_empty() {
                None
            } else {
                Some(causes.join("\n"))
            },
        }
    }

    /// Header line followed by the trace, if any
    pub fn full_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)?;
        if let Some(trace) = &self.trace {
            write!(f, "\n{}", trace)?;
        }
        Ok(())
    }
}

fn short_type_name(full: &str) -> String {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path).to_string()
}

fn debug_type_name(debug: &str) -> String {
    let name: String = debug
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    match name.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => name,
        _ => "Error".to_string(),
    }
}

/// A single log event as handed to the sink by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub timestamp: DateTime<FixedOffset>,
    pub level: LogLevel,
    pub message_template: MessageTemplate,
    pub properties: BTreeMap<String, PropertyValue>,
    pub exception: Option<ExceptionInfo>,
}

impl LogEvent {
    pub fn new(timestamp: DateTime<FixedOffset>, level: LogLevel, template: &str) -> Self {
        Self {
            timestamp,
            level,
            message_template: MessageTemplate::parse(template),
            properties: BTreeMap::new(),
            exception: None,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn add_property_if_absent(&mut self, name: &str, value: PropertyValue) {
        if !self.properties.contains_key(name) {
            self.properties.insert(name.to_string(), value);
        }
    }

    /// Render the message template against the event's properties
    pub fn render_message(&self) -> String {
        self.render_message_with(None)
    }

    /// Render the message, letting `provider` override property rendering.
    /// Properties missing from the event are written as their token text.
    pub fn render_message_with(&self, provider: Option<&dyn FormatProvider>) -> String {
        let mut out = String::new();

        for token in self.message_template.tokens() {
            match token {
                TemplateToken::Text(text) => out.push_str(text),
                TemplateToken::Property(property) => {
                    let Some(value) = self.properties.get(&property.name) else {
                        out.push_str(&property.raw);
                        continue;
                    };

                    let format = property.format.as_deref();
                    match provider.and_then(|p| p.format_value(value, format)) {
                        Some(rendered) => out.push_str(&rendered),
                        None => value.render_into(&mut out, format),
                    }
                }
            }
        }

        out
    }
}
