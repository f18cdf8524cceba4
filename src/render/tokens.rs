use crate::event::template::{PropertyToken, TemplateToken};
use crate::event::value::{format_timestamp, DEFAULT_TIMESTAMP_FORMAT};
use crate::render::default::write_exception_block;
use crate::render::escape::{Escaper, Markup};
use crate::sink::aggregate::DeduplicatedUnit;

pub const LEVEL_PROPERTY: &str = "Level";
pub const NEW_LINE_PROPERTY: &str = "NewLine";
pub const EXCEPTION_PROPERTY: &str = "Exception";
pub const MESSAGE_PROPERTY: &str = "Message";
pub const TIMESTAMP_PROPERTY: &str = "Timestamp";

/// Renders one output-template token for a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRenderer {
    Text(String),
    Level { format: Option<String> },
    NewLine,
    Exception,
    Message,
    Timestamp { format: Option<String> },
    Property(PropertyToken),
}

/// Shared state every token renderer reads from.
#[derive(Clone)]
pub struct RenderContext {
    pub escaper: Escaper,
    pub markup: Markup,
}

impl TokenRenderer {
    /// Pick the renderer for a template token.
    pub fn for_token(token: &TemplateToken) -> Self {
        match token {
            TemplateToken::Text(text) => TokenRenderer::Text(text.clone()),
            TemplateToken::Property(property) => match property.name.as_str() {
                LEVEL_PROPERTY => TokenRenderer::Level {
                    format: property.format.clone(),
                },
                NEW_LINE_PROPERTY => TokenRenderer::NewLine,
                EXCEPTION_PROPERTY => TokenRenderer::Exception,
                MESSAGE_PROPERTY => TokenRenderer::Message,
                TIMESTAMP_PROPERTY => TokenRenderer::Timestamp {
                    format: property.format.clone(),
                },
                _ => TokenRenderer::Property(property.clone()),
            },
        }
    }

    pub fn render(&self, unit: &DeduplicatedUnit, ctx: &RenderContext, out: &mut String) {
        let event = &unit.log_event;

        match self {
            TokenRenderer::Text(text) => out.push_str(&ctx.escaper.escape(text)),
            TokenRenderer::Level { format } => {
                let level = event.level.as_str();
                match format.as_deref() {
                    Some("e") => out.push_str(event.level.emoji()),
                    Some("u") => out.push_str(&level.to_uppercase()),
                    Some("l") => out.push_str(&level.to_lowercase()),
                    _ => out.push_str(level),
                }
            }
            TokenRenderer::NewLine => out.push('\n'),
            TokenRenderer::Exception => write_exception_block(out, unit, &ctx.escaper, ctx.markup),
            TokenRenderer::Message => {
                let mut message = String::new();
                for token in event.message_template.tokens() {
                    match token {
                        TemplateToken::Text(text) => message.push_str(&ctx.escaper.escape(text)),
                        TemplateToken::Property(property) => {
                            render_property(property, unit, &mut message)
                        }
                    }
                }
                out.push_str(&ctx.escaper.escape(&message));
            }
            TokenRenderer::Timestamp { format } => {
                let format = format.as_deref().unwrap_or(DEFAULT_TIMESTAMP_FORMAT);
                out.push_str(&format_timestamp(&event.timestamp, format));
            }
            TokenRenderer::Property(property) => render_property(property, unit, out),
        }
    }
}

/// Look the property up on the event; unknown names are written back as
/// their token text.
fn render_property(property: &PropertyToken, unit: &DeduplicatedUnit, out: &mut String) {
    match unit.log_event.properties.get(&property.name) {
        Some(value) => value.render_into(out, property.format.as_deref()),
        None => out.push_str(&property.raw),
    }
}
