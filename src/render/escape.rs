use crate::sink::options::{HtmlFormatter, ParseMode, SinkOptions};

/// Replace the characters Telegram's HTML parse mode reserves.
///
/// With `should_escape == false` the input is returned untouched.
pub fn html_escape(value: &str, should_escape: bool) -> String {
    if !should_escape {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes message text according to the sink options.
///
/// A custom formatter, when configured, replaces the built-in escaping
/// entirely.
#[derive(Clone)]
pub struct Escaper {
    custom: Option<HtmlFormatter>,
    should_escape: bool,
}

impl Escaper {
    pub fn from_options(options: &SinkOptions) -> Self {
        Self {
            custom: options.custom_html_formatter().cloned(),
            should_escape: options.escape_enabled() && options.parse_mode() == ParseMode::Html,
        }
    }

    pub fn escape(&self, value: &str) -> String {
        match &self.custom {
            Some(formatter) => formatter(value),
            None => html_escape(value, self.should_escape),
        }
    }
}

/// Inline markup for the built-in renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Html,
    Markdown,
}

impl From<ParseMode> for Markup {
    fn from(mode: ParseMode) -> Self {
        match mode {
            ParseMode::Html => Markup::Html,
            ParseMode::Markdown => Markup::Markdown,
        }
    }
}

impl Markup {
    pub fn italic(&self, text: &str) -> String {
        match self {
            Markup::Html => format!("<i>{}</i>", text),
            Markup::Markdown => format!("_{}_", text),
        }
    }

    pub fn bold(&self, text: &str) -> String {
        match self {
            Markup::Html => format!("<strong>{}</strong>", text),
            Markup::Markdown => format!("*{}*", text),
        }
    }

    pub fn code(&self, text: &str) -> String {
        match self {
            Markup::Html => format!("<code>{}</code>", text),
            Markup::Markdown => format!("`{}`", text),
        }
    }

    /// Multi-line block, used for stack traces
    pub fn block(&self, text: &str) -> String {
        match self {
            Markup::Html => format!("<code>{}</code>", text),
            Markup::Markdown => format!("```\n{}\n```", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a < b && c > d", true), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn test_passthrough_is_identity() {
        for input in ["", "plain", "<b>&amp;</b>", "ünïcödé ❗"] {
            assert_eq!(html_escape(input, false), input);
        }
    }

    #[test]
    fn test_escape_is_not_idempotent() {
        let once = html_escape("<tag>", true);
        let twice = html_escape(&once, true);
        assert_eq!(once, "&lt;tag&gt;");
        assert_ne!(twice, once);
        assert_eq!(twice, "&amp;lt;tag&amp;gt;");
    }

    #[test]
    fn test_escaper_uses_custom_formatter() {
        let options = SinkOptions::builder("t", "c")
            .use_custom_html_formatting(true)
            .custom_html_formatter(|s| s.replace('*', "\\*"))
            .build()
            .unwrap();

        let escaper = Escaper::from_options(&options);
        assert_eq!(escaper.escape("*bold* <x>"), "\\*bold\\* <x>");
    }

    #[test]
    fn test_escaper_disabled_by_custom_formatting_flag() {
        let options = SinkOptions::builder("t", "c")
            .use_custom_html_formatting(true)
            .build()
            .unwrap();

        let escaper = Escaper::from_options(&options);
        assert_eq!(escaper.escape("<b>ok</b>"), "<b>ok</b>");
    }

    #[test]
    fn test_markdown_mode_does_not_entity_escape() {
        let options = SinkOptions::builder("t", "c")
            .parse_mode(ParseMode::Markdown)
            .build()
            .unwrap();

        let escaper = Escaper::from_options(&options);
        assert_eq!(escaper.escape("a < b"), "a < b");
    }

    #[test]
    fn test_markup() {
        assert_eq!(Markup::Html.italic("x"), "<i>x</i>");
        assert_eq!(Markup::Html.bold("x"), "<strong>x</strong>");
        assert_eq!(Markup::Markdown.code("x"), "`x`");
        assert_eq!(Markup::Markdown.block("x"), "```\nx\n```");
    }
}
