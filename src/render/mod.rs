pub mod default;
pub mod escape;
pub mod formatter;
pub mod output_template;
pub mod tokens;

pub use default::DefaultRenderer;
pub use escape::{html_escape, Escaper, Markup};
pub use formatter::MessageFormatter;
pub use output_template::OutputTemplateRenderer;
pub use tokens::TokenRenderer;
