pub mod level;
pub mod log_event;
pub mod template;
pub mod value;

pub use level::LogLevel;
pub use log_event::{ExceptionInfo, LogEvent};
pub use template::{MessageTemplate, PropertyToken, TemplateToken};
pub use value::{FormatProvider, PropertyValue};
