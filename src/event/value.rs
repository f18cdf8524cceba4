use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Default strftime format for timestamp values rendered without a specifier
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";

/// A structured property value attached to a log event.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Timestamp(DateTime<FixedOffset>),
    Seq(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

/// Overrides how property values are turned into text when a message is
/// rendered. Returning `None` falls back to the default rendering.
pub trait FormatProvider: Send + Sync {
    fn format_value(&self, value: &PropertyValue, format: Option<&str>) -> Option<String>;
}

impl PropertyValue {
    /// Render the value with an optional format specifier.
    ///
    /// Strings are quoted unless the specifier is `l`. Timestamps take a
    /// strftime specifier. Floats accept a single digit giving the number of
    /// decimals.
    pub fn render(&self, format: Option<&str>) -> String {
        let mut out = String::new();
        self.render_into(&mut out, format);
        out
    }

    pub fn render_into(&self, out: &mut String, format: Option<&str>) {
        match self {
            PropertyValue::Null => out.push_str("null"),
            PropertyValue::Bool(b) => {
                let _ = write!(out, "{}", b);
            }
            PropertyValue::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            PropertyValue::UInt(u) => {
                let _ = write!(out, "{}", u);
            }
            PropertyValue::Float(f) => match float_precision(format) {
                Some(precision) => {
                    let _ = write!(out, "{:.*}", precision, f);
                }
                None => {
                    let _ = write!(out, "{}", f);
                }
            },
            PropertyValue::Str(s) => {
                if format == Some("l") {
                    out.push_str(s);
                } else {
                    out.push('"');
                    out.push_str(&s.replace('"', "\\\""));
                    out.push('"');
                }
            }
            PropertyValue::Timestamp(ts) => {
                out.push_str(&format_timestamp(ts, format.unwrap_or(DEFAULT_TIMESTAMP_FORMAT)));
            }
            PropertyValue::Seq(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render_into(out, None);
                }
                out.push(']');
            }
            PropertyValue::Map(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    value.render_into(out, None);
                }
                out.push('}');
            }
        }
    }
}

/// Format a timestamp with a strftime string. An invalid format string
/// yields an empty string instead of panicking.
pub fn format_timestamp(ts: &DateTime<FixedOffset>, format: &str) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", ts.format(format));
    out
}

fn float_precision(format: Option<&str>) -> Option<usize> {
    let format = format?;
    if format.len() == 1 {
        format.parse().ok()
    } else {
        None
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<u64> for PropertyValue {
    fn from(u: u64) -> Self {
        PropertyValue::UInt(u)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<DateTime<FixedOffset>> for PropertyValue {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        PropertyValue::Timestamp(ts)
    }
}
