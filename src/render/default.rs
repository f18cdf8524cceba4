use crate::event::value::format_timestamp;
use crate::render::escape::{Escaper, Markup};
use crate::sink::aggregate::DeduplicatedUnit;
use crate::sink::options::SinkOptions;

/// Built-in message layout used when neither a format provider nor an
/// output template is configured.
#[derive(Clone)]
pub struct DefaultRenderer {
    escaper: Escaper,
    markup: Markup,
    application_name: String,
    date_format: String,
}

impl DefaultRenderer {
    pub fn new(options: &SinkOptions) -> Self {
        Self {
            escaper: Escaper::from_options(options),
            markup: options.parse_mode().into(),
            application_name: options.application_name().to_string(),
            date_format: options.date_format().to_string(),
        }
    }

    pub fn render(&self, unit: &DeduplicatedUnit) -> String {
        let mut out = String::new();
        let event = &unit.log_event;

        let message = self.escaper.escape(&event.render_message());
        out.push_str(&format!("{} {}\n", event.level.emoji(), message));
        out.push('\n');

        let has_name = !self.application_name.trim().is_empty();
        let has_date = !self.date_format.trim().is_empty();

        if has_name || has_date {
            let name_part = if has_name {
                format!("{}: ", self.escaper.escape(&self.application_name))
            } else {
                String::new()
            };

            let date_part = if !has_date {
                String::new()
            } else if unit.is_single_occurrence() {
                format!(
                    "The message occurred on {}",
                    format_timestamp(&unit.first_occurrence, &self.date_format)
                )
            } else {
                format!(
                    "The message occurred first on {} and last on {}",
                    format_timestamp(&unit.first_occurrence, &self.date_format),
                    format_timestamp(&unit.last_occurrence, &self.date_format)
                )
            };

            out.push_str(&self.markup.italic(&format!("{}{}", name_part, date_part)));
            out.push('\n');
        }

        write_exception_block(&mut out, unit, &self.escaper, self.markup);
        out
    }
}

/// Append the exception section of a unit: headline, message, type and,
/// when the unit asks for it, the full trace. Writes nothing for events
/// without an exception.
pub fn write_exception_block(
    out: &mut String,
    unit: &DeduplicatedUnit,
    escaper: &Escaper,
    markup: Markup,
) {
    let Some(exception) = &unit.log_event.exception else {
        return;
    };

    let message = escaper.escape(&exception.message);
    let type_name = escaper.escape(&exception.type_name);

    out.push_str(&format!("\n{}\n\n", markup.bold(&message)));
    out.push_str(&format!("Message: {}\n", markup.code(&message)));
    out.push_str(&format!("Type: {}\n\n", markup.code(&type_name)));

    if unit.include_stack_trace {
        let trace = escaper.escape(&exception.full_text());
        out.push_str(&format!("Stack Trace\n{}\n", markup.block(&trace)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ExceptionInfo, LogEvent, LogLevel};
    use crate::sink::options::ParseMode;
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<FixedOffset> {
        let base = Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap();
        (base + chrono::Duration::seconds(secs)).fixed_offset()
    }

    fn failing_unit(include_stack_trace: bool) -> DeduplicatedUnit {
        let event = LogEvent::new(at(0), LogLevel::Error, "Disk <sda> failed").with_exception(
            ExceptionInfo::new("IoError", "no space & no hope").with_trace("Caused by: ENOSPC"),
        );
        DeduplicatedUnit::new(event, include_stack_trace)
    }

    #[test]
    fn test_full_layout_with_exception() {
        let options = SinkOptions::builder("t", "c")
            .application_name("billing")
            .date_format("%Y-%m-%d %H:%M:%S")
            .build()
            .unwrap();
        let renderer = DefaultRenderer::new(&options);

        let rendered = renderer.render(&failing_unit(true));

        assert_eq!(
            rendered,
            "❗ Disk &lt;sda&gt; failed\n\
             \n\
             <i>billing: The message occurred on 2026-01-28 10:00:00</i>\n\
             \n<strong>no space &amp; no hope</strong>\n\n\
             Message: <code>no space &amp; no hope</code>\n\
             Type: <code>IoError</code>\n\n\
             Stack Trace\n<code>IoError: no space &amp; no hope\nCaused by: ENOSPC</code>\n"
        );
    }

    #[test]
    fn test_stack_trace_gated() {
        let options = SinkOptions::builder("t", "c").build().unwrap();
        let rendered = DefaultRenderer::new(&options).render(&failing_unit(false));

        assert!(!rendered.contains("Stack Trace"));
        assert!(rendered.contains("Type: <code>IoError</code>"));
    }

    #[test]
    fn test_occurrence_window_line() {
        let options = SinkOptions::builder("t", "c").date_format("%H:%M:%S").build().unwrap();
        let mut unit = DeduplicatedUnit::new(LogEvent::new(at(0), LogLevel::Warning, "hot"), true);
        unit.widen(at(30));

        let rendered = DefaultRenderer::new(&options).render(&unit);
        assert_eq!(
            rendered,
            "⚠ hot\n\n<i>The message occurred first on 10:00:00 and last on 10:00:30</i>\n"
        );
    }

    #[test]
    fn test_no_name_and_no_date_skips_italic_line() {
        let options = SinkOptions::builder("t", "c").date_format("").build().unwrap();
        let unit = DeduplicatedUnit::new(LogEvent::new(at(0), LogLevel::Information, "hi"), true);

        assert_eq!(DefaultRenderer::new(&options).render(&unit), "ℹ hi\n\n");
    }

    #[test]
    fn test_markdown_layout() {
        let options = SinkOptions::builder("t", "c")
            .parse_mode(ParseMode::Markdown)
            .date_format("")
            .build()
            .unwrap();

        let rendered = DefaultRenderer::new(&options).render(&failing_unit(true));
        assert!(rendered.starts_with("❗ Disk <sda> failed\n\n"));
        assert!(rendered.contains("*no space & no hope*"));
        assert!(rendered.contains("Message: `no space & no hope`"));
        assert!(rendered.contains("Stack Trace\n```\nIoError: no space & no hope\nCaused by: ENOSPC\n```\n"));
    }
}
