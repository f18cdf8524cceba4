use crate::event::MessageTemplate;
use crate::render::escape::Escaper;
use crate::render::tokens::{RenderContext, TokenRenderer};
use crate::sink::aggregate::DeduplicatedUnit;
use crate::sink::options::SinkOptions;

const DEFAULT_WRITE_CAPACITY: usize = 256;

/// An output template compiled into a fixed sequence of token renderers.
///
/// Built once per sink; holds no per-batch state.
#[derive(Clone)]
pub struct OutputTemplateRenderer {
    renderers: Vec<TokenRenderer>,
    ctx: RenderContext,
}

impl OutputTemplateRenderer {
    pub fn compile(template: &str, options: &SinkOptions) -> Self {
        let parsed = MessageTemplate::parse(template);
        let renderers = parsed.tokens().iter().map(TokenRenderer::for_token).collect();

        Self {
            renderers,
            ctx: RenderContext {
                escaper: Escaper::from_options(options),
                markup: options.parse_mode().into(),
            },
        }
    }

    pub fn renderers(&self) -> &[TokenRenderer] {
        &self.renderers
    }

    pub fn format(&self, unit: &DeduplicatedUnit) -> String {
        let mut out = String::with_capacity(DEFAULT_WRITE_CAPACITY);
        for renderer in &self.renderers {
            renderer.render(unit, &self.ctx, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ExceptionInfo, LogEvent, LogLevel};
    use chrono::{TimeZone, Utc};

    fn unit() -> DeduplicatedUnit {
        let ts = Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 5).unwrap().fixed_offset();
        let event = LogEvent::new(ts, LogLevel::Error, "Job {JobId:l} failed")
            .with_property("JobId", "nightly")
            .with_exception(ExceptionInfo::new("Timeout", "took too long"));
        DeduplicatedUnit::new(event, false)
    }

    #[test]
    fn test_compile_and_format() {
        let options = SinkOptions::builder("t", "c").build().unwrap();
        let renderer = OutputTemplateRenderer::compile(
            "{Level:e} [{Timestamp:%H:%M:%S}] {Message}{NewLine}{Exception}",
            &options,
        );

        assert_eq!(
            renderer.format(&unit()),
            "❗ [10:00:05] Job nightly failed\n\
             \n<strong>took too long</strong>\n\n\
             Message: <code>took too long</code>\n\
             Type: <code>Timeout</code>\n\n"
        );
    }

    #[test]
    fn test_compiled_renderer_is_reusable() {
        let options = SinkOptions::builder("t", "c").build().unwrap();
        let renderer = OutputTemplateRenderer::compile("{Level} {Unknown}", &options);

        assert_eq!(renderer.renderers().len(), 3);
        assert_eq!(renderer.format(&unit()), "Error {Unknown}");
        assert_eq!(renderer.format(&unit()), "Error {Unknown}");
    }
}
