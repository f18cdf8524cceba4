use crate::event::FormatProvider;
use crate::render::default::DefaultRenderer;
use crate::render::output_template::OutputTemplateRenderer;
use crate::sink::aggregate::DeduplicatedUnit;
use crate::sink::options::SinkOptions;
use std::sync::Arc;

/// How a unit becomes message text, chosen once from the options.
#[derive(Clone)]
pub enum MessageFormatter {
    /// Plain message rendering through the provider. Skips the occurrence
    /// and exception sections entirely.
    Provider(Arc<dyn FormatProvider>),
    Template(OutputTemplateRenderer),
    Default(DefaultRenderer),
}

impl MessageFormatter {
    pub fn from_options(options: &SinkOptions) -> Self {
        if let Some(provider) = options.format_provider() {
            return MessageFormatter::Provider(Arc::clone(provider));
        }

        match options.output_template() {
            Some(template) => {
                MessageFormatter::Template(OutputTemplateRenderer::compile(template, options))
            }
            None => MessageFormatter::Default(DefaultRenderer::new(options)),
        }
    }

    pub fn format(&self, unit: &DeduplicatedUnit) -> String {
        match self {
            MessageFormatter::Provider(provider) => {
                unit.log_event.render_message_with(Some(provider.as_ref()))
            }
            MessageFormatter::Template(renderer) => renderer.format(unit),
            MessageFormatter::Default(renderer) => renderer.render(unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ExceptionInfo, LogEvent, LogLevel, PropertyValue};
    use chrono::{TimeZone, Utc};

    struct Shouting;

    impl FormatProvider for Shouting {
        fn format_value(&self, value: &PropertyValue, _format: Option<&str>) -> Option<String> {
            match value {
                PropertyValue::Str(s) => Some(s.to_uppercase()),
                _ => None,
            }
        }
    }

    fn unit() -> DeduplicatedUnit {
        let ts = Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap().fixed_offset();
        let event = LogEvent::new(ts, LogLevel::Error, "Lost {Peer}")
            .with_property("Peer", "node-1")
            .with_exception(ExceptionInfo::new("Disconnect", "gone"));
        DeduplicatedUnit::new(event, true)
    }

    #[test]
    fn test_provider_wins_and_skips_decoration() {
        let options = SinkOptions::builder("t", "c")
            .format_provider(Arc::new(Shouting))
            .output_template("{Level} {Message}")
            .build()
            .unwrap();

        let formatter = MessageFormatter::from_options(&options);
        assert!(matches!(formatter, MessageFormatter::Provider(_)));
        assert_eq!(formatter.format(&unit()), "Lost NODE-1");
    }

    #[test]
    fn test_template_before_default() {
        let options = SinkOptions::builder("t", "c")
            .output_template("{Level:u}: {Message}")
            .build()
            .unwrap();

        let formatter = MessageFormatter::from_options(&options);
        assert_eq!(formatter.format(&unit()), "ERROR: Lost \"node-1\"");
    }

    #[test]
    fn test_default_renderer_fallback() {
        let options = SinkOptions::builder("t", "c").build().unwrap();
        let formatter = MessageFormatter::from_options(&options);

        assert!(matches!(formatter, MessageFormatter::Default(_)));
        let rendered = formatter.format(&unit());
        assert!(rendered.starts_with("❗ Lost \"node-1\"\n\n"));
        assert!(rendered.contains("Stack Trace"));
    }
}
